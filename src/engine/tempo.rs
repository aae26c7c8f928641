// Tempo - bounded BPM value and the controller that mediates changes
// Every path that can change the tempo (slider, text entry, tap) goes
// through TempoController, so no out-of-range value is ever observable.

use std::fmt;
use std::time::Duration;

use crate::messaging::channels::{SharedNotificationProducer, notify};
use crate::messaging::notification::{Notification, NotificationCategory};

/// Tempo in whole BPM, always within [`Tempo::MIN`, `Tempo::MAX`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Tempo(u16);

impl Tempo {
    pub const MIN: u16 = 30;
    pub const MAX: u16 = 250;
    pub const DEFAULT: Tempo = Tempo(100);

    /// Accepts only in-range values
    pub fn new(bpm: u16) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&bpm).then_some(Self(bpm))
    }

    /// Clamps into range; the value is wide so callers can feed raw
    /// arithmetic results (tap inference, stored preferences) directly
    pub fn clamped(bpm: i64) -> Self {
        Self(bpm.clamp(Self::MIN as i64, Self::MAX as i64) as u16)
    }

    /// Parse user-entered text; whitespace is tolerated, anything that is
    /// not an in-range integer is rejected
    pub fn parse(text: &str) -> Option<Self> {
        text.trim().parse::<u16>().ok().and_then(Self::new)
    }

    pub fn bpm(&self) -> u16 {
        self.0
    }

    /// Duration of one beat
    pub fn beat_duration(&self) -> Duration {
        Duration::from_secs_f64(60.0 / self.0 as f64)
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} BPM", self.0)
    }
}

/// Owner of the canonical tempo and of the text shown in the BPM field.
///
/// The text field commits on explicit confirmation (losing focus): while
/// typing, the canonical tempo follows the text only when it already
/// parses in range, so partial input never corrupts state and never
/// snaps the field back under the user's cursor.
pub struct TempoController {
    tempo: Tempo,
    input: String,
    notifications: SharedNotificationProducer,
}

impl TempoController {
    pub fn new(initial: Tempo, notifications: SharedNotificationProducer) -> Self {
        Self {
            tempo: initial,
            input: initial.bpm().to_string(),
            notifications,
        }
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// The text buffer bound to the BPM entry widget
    pub fn input_mut(&mut self) -> &mut String {
        &mut self.input
    }

    /// Slider path: the widget range is fixed to [MIN, MAX], so the value
    /// is valid by construction. Returns the new tempo if it changed.
    pub fn set_from_slider(&mut self, bpm: u16) -> Option<Tempo> {
        self.apply(Tempo::clamped(bpm as i64))
    }

    /// Live-typing path: called on every keystroke. Commits the tempo
    /// only when the current text already parses in range; the text
    /// itself is left exactly as typed.
    pub fn preview_input(&mut self) -> Option<Tempo> {
        let tempo = Tempo::parse(&self.input)?;
        if tempo == self.tempo {
            return None;
        }
        self.tempo = tempo;
        Some(tempo)
    }

    /// Confirmation path: called when the entry loses focus or Enter is
    /// pressed. Invalid text reverts the display to the last valid tempo
    /// and raises a warning; the canonical tempo is unchanged.
    pub fn commit_input(&mut self) -> Option<Tempo> {
        match Tempo::parse(&self.input) {
            Some(tempo) => self.apply(tempo),
            None => {
                self.input = self.tempo.bpm().to_string();
                notify(
                    &self.notifications,
                    Notification::warning(
                        NotificationCategory::Tempo,
                        format!(
                            "Invalid tempo: BPM must be between {} and {}",
                            Tempo::MIN,
                            Tempo::MAX
                        ),
                    ),
                );
                None
            }
        }
    }

    /// Tap path: the inferencer clamps before emitting, so the value is
    /// valid by construction. Raises an informational notification.
    pub fn set_from_tap(&mut self, tempo: Tempo) -> Option<Tempo> {
        let changed = self.apply(tempo);
        notify(
            &self.notifications,
            Notification::info(
                NotificationCategory::Tempo,
                format!("Tempo set to {} BPM", tempo.bpm()),
            ),
        );
        changed
    }

    fn apply(&mut self, tempo: Tempo) -> Option<Tempo> {
        self.input = tempo.bpm().to_string();
        if tempo == self.tempo {
            return None;
        }
        self.tempo = tempo;
        Some(tempo)
    }
}
