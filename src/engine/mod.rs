// Engine - the metronome timing core
// Beat scheduling, tempo mediation, and tap-tempo inference

pub mod scheduler;
pub mod tap;
pub mod tempo;

pub use scheduler::{BEATS_PER_MEASURE, BeatScheduler, BeatSink, PlaybackState, SinkError};
pub use tap::TapTempo;
pub use tempo::{Tempo, TempoController};
