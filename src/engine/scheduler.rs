// Beat scheduler - the timing core of the metronome
//
// Beats are never derived from counting timer callbacks. The scheduler
// keeps an absolute deadline for the next beat and, on every poll, fires
// every beat whose deadline has elapsed, advancing the deadline by
// exactly one beat interval per firing. Poll cadence only bounds how
// late an individual beat can fire; it cannot make the grid drift.

use std::time::Duration;

use crate::clock::Clock;
use crate::engine::tempo::Tempo;
use crate::messaging::channels::{SharedNotificationProducer, notify};
use crate::messaging::notification::{Notification, NotificationCategory};

/// How often the host loop should call [`BeatScheduler::poll`] while
/// running. Also the upper bound on how late a single beat can fire.
pub const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Beats per measure; position 0 is the accented downbeat
pub const BEATS_PER_MEASURE: u8 = 4;

/// Minimum spacing between repeated sink-failure notifications
const FAILURE_REPORT_INTERVAL: Duration = Duration::from_secs(10);

/// Transport state of the metronome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Running,
}

impl PlaybackState {
    pub fn is_running(&self) -> bool {
        matches!(self, PlaybackState::Running)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, PlaybackState::Stopped)
    }
}

/// Why a beat trigger was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    #[error("audio output is not available")]
    Unavailable,
    #[error("click queue is full")]
    QueueFull,
}

/// Consumer of scheduled beats: plays a click and drives the beat display.
/// Must tolerate being called at up to 250 BPM (one trigger per ~240 ms).
pub trait BeatSink {
    fn trigger(&mut self, position: u8) -> Result<(), SinkError>;
}

/// The beat scheduling state machine.
///
/// Owns the playback state, the beat position, and the next-beat
/// deadline. All methods run on one cooperative context (the UI thread);
/// nothing here is shared across threads, so no locking is involved. The
/// host drives it by calling `poll` roughly every [`POLL_INTERVAL`].
pub struct BeatScheduler<C: Clock> {
    clock: C,
    state: PlaybackState,
    tempo: Tempo,
    next_beat_at: Option<Duration>,
    position: u8,
    sink: Option<Box<dyn BeatSink>>,
    notifications: SharedNotificationProducer,
    last_failure_report: Option<Duration>,
}

impl<C: Clock> BeatScheduler<C> {
    pub fn new(clock: C, tempo: Tempo, notifications: SharedNotificationProducer) -> Self {
        Self {
            clock,
            state: PlaybackState::Stopped,
            tempo,
            next_beat_at: None,
            position: 0,
            sink: None,
            notifications,
            last_failure_report: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    /// Position of the next beat to fire, in [0, 3]. Owned by the
    /// scheduler; consumers read it passively.
    pub fn position(&self) -> u8 {
        self.position
    }

    /// Register the beat sink. Exactly one registration is active at a
    /// time; a new one replaces the old. The scheduler also runs with no
    /// sink at all, firing silently.
    pub fn set_sink(&mut self, sink: Box<dyn BeatSink>) {
        self.sink = Some(sink);
    }

    pub fn clear_sink(&mut self) {
        self.sink = None;
    }

    /// Start playback at `tempo`. The beat position resets to 0 and the
    /// first beat fires within this call, not after one full interval.
    ///
    /// Starting while already running at the same tempo is a no-op (no
    /// audible glitch); at a different tempo it re-grids like
    /// [`set_tempo`](Self::set_tempo). Returns the number of beats fired.
    pub fn start(&mut self, tempo: Tempo) -> usize {
        if self.state.is_running() {
            if tempo == self.tempo {
                return 0;
            }
            return self.set_tempo(tempo);
        }

        self.tempo = tempo;
        self.state = PlaybackState::Running;
        self.position = 0;
        self.next_beat_at = Some(self.clock.now());
        self.poll()
    }

    /// Stop playback. Effective immediately: the pending deadline is
    /// cleared and a poll that was already due observes Stopped and
    /// no-ops, so no beat fires after this returns. Idempotent.
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.next_beat_at = None;
        self.position = 0;
    }

    /// Change the tempo. While running, a new beat grid begins at the
    /// current clock time (phase discontinuity accepted) and a beat
    /// fires immediately on it; the beat position carries over. While
    /// stopped, only the tempo used by the next `start` is updated.
    pub fn set_tempo(&mut self, tempo: Tempo) -> usize {
        self.tempo = tempo;
        if self.state.is_stopped() {
            return 0;
        }
        self.next_beat_at = Some(self.clock.now());
        self.poll()
    }

    /// Fire every beat whose deadline has elapsed. Loops when more than
    /// one boundary was crossed since the last call (e.g. after a stall),
    /// so a coarse or jittery caller cannot lose beats. Returns the
    /// number fired.
    pub fn poll(&mut self) -> usize {
        if !self.state.is_running() {
            return 0;
        }

        let now = self.clock.now();
        let period = self.tempo.beat_duration();
        let mut fired = 0;

        while let Some(deadline) = self.next_beat_at {
            if deadline > now {
                break;
            }
            self.fire(now);
            // Advance from the previous deadline, never from "now", so
            // per-poll lateness does not accumulate into the grid
            self.next_beat_at = Some(deadline + period);
            fired += 1;
        }

        fired
    }

    fn fire(&mut self, now: Duration) {
        if let Some(sink) = self.sink.as_mut() {
            match sink.trigger(self.position) {
                Ok(()) => self.last_failure_report = None,
                Err(err) => self.report_failure(now, err),
            }
        }
        self.position = (self.position + 1) % BEATS_PER_MEASURE;
    }

    /// A failed trigger never stops scheduling; the audio path may
    /// recover later. Reported at most once per
    /// [`FAILURE_REPORT_INTERVAL`]; a successful trigger re-arms
    /// immediate reporting.
    fn report_failure(&mut self, now: Duration, err: SinkError) {
        let due = match self.last_failure_report {
            None => true,
            Some(reported_at) => now.saturating_sub(reported_at) >= FAILURE_REPORT_INTERVAL,
        };
        if !due {
            return;
        }

        self.last_failure_report = Some(now);
        notify(
            &self.notifications,
            Notification::error(
                NotificationCategory::Audio,
                format!("Click playback failed ({err}); the metronome keeps running"),
            ),
        );
    }
}
