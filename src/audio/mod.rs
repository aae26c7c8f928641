// Audio module - click synthesis and CPAL output

pub mod click;
pub mod engine;

pub use click::{ClickBank, ClickType, SoundType};
pub use engine::{AtomicF32, AudioBeatSink, AudioEngine, AudioError};
