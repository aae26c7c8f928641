// Command types - messages drained by the audio callback

use crate::audio::click::SoundType;

/// Commands consumed at the head of each audio callback
#[derive(Debug, Clone, Copy)]
pub enum Command {
    /// Play the click for the given beat position (0 = accented downbeat)
    Click { position: u8 },
    /// Switch the click timbre
    SetSound(SoundType),
}
