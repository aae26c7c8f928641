// Click synthesis - pre-rendered metronome click buffers
// Clicks are short enveloped bursts rendered once per sound type at the
// stream sample rate, so the audio callback only copies samples.

use std::f32::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Click timbre selected by the user; serialized lowercase in preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundType {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl SoundType {
    pub const ALL: [SoundType; 4] = [
        SoundType::Sine,
        SoundType::Square,
        SoundType::Sawtooth,
        SoundType::Triangle,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SoundType::Sine => "sine",
            SoundType::Square => "square",
            SoundType::Sawtooth => "sawtooth",
            SoundType::Triangle => "triangle",
        }
    }

    /// Stable index into per-sound lookup tables
    pub fn index(&self) -> usize {
        match self {
            SoundType::Sine => 0,
            SoundType::Square => 1,
            SoundType::Sawtooth => 2,
            SoundType::Triangle => 3,
        }
    }
}

impl fmt::Display for SoundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Click flavour: the downbeat (position 0) is accented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickType {
    Accent,
    Regular,
}

/// Pre-rendered accent and regular clicks for one sound type
#[derive(Debug, Clone)]
pub struct ClickBank {
    accent: Vec<f32>,
    regular: Vec<f32>,
}

impl ClickBank {
    /// Duration of a click
    const CLICK_DURATION_MS: f32 = 10.0;

    const ACCENT_FREQUENCY_HZ: f32 = 1200.0;
    const REGULAR_FREQUENCY_HZ: f32 = 800.0;
    const ACCENT_AMPLITUDE: f32 = 0.6;
    const REGULAR_AMPLITUDE: f32 = 0.4;

    pub fn new(sound: SoundType, sample_rate: f32) -> Self {
        let num_samples = ((Self::CLICK_DURATION_MS / 1000.0) * sample_rate) as usize;

        Self {
            accent: Self::render(
                sound,
                sample_rate,
                num_samples,
                Self::ACCENT_FREQUENCY_HZ,
                Self::ACCENT_AMPLITUDE,
            ),
            regular: Self::render(
                sound,
                sample_rate,
                num_samples,
                Self::REGULAR_FREQUENCY_HZ,
                Self::REGULAR_AMPLITUDE,
            ),
        }
    }

    /// Render one click: the selected waveform under a fast exponential
    /// decay envelope
    fn render(
        sound: SoundType,
        sample_rate: f32,
        num_samples: usize,
        frequency: f32,
        amplitude: f32,
    ) -> Vec<f32> {
        let mut samples = Vec::with_capacity(num_samples);
        let phase_increment = frequency / sample_rate;
        let mut phase = 0.0f32;

        for i in 0..num_samples {
            let t = i as f32 / num_samples as f32;
            let envelope = (-t * 8.0).exp();

            samples.push(Self::waveform(sound, phase) * envelope * amplitude);

            phase += phase_increment;
            if phase >= 1.0 {
                phase -= 1.0;
            }
        }

        samples
    }

    /// One cycle of the waveform at normalized phase in [0, 1)
    fn waveform(sound: SoundType, phase: f32) -> f32 {
        match sound {
            SoundType::Sine => (phase * 2.0 * PI).sin(),
            SoundType::Square => {
                if phase < 0.5 { 1.0 } else { -1.0 }
            }
            SoundType::Sawtooth => (phase * 2.0) - 1.0,
            SoundType::Triangle => {
                if phase < 0.5 {
                    (phase * 4.0) - 1.0
                } else {
                    3.0 - (phase * 4.0)
                }
            }
        }
    }

    /// Samples for the given click flavour
    pub fn click(&self, click: ClickType) -> &[f32] {
        match click {
            ClickType::Accent => &self.accent,
            ClickType::Regular => &self.regular,
        }
    }

    /// Length of a click in samples
    pub fn click_len(&self) -> usize {
        self.accent.len()
    }
}
