// Metrobeat - Library exports for tests and benchmarks

pub mod audio;
pub mod clock;
pub mod engine;
pub mod messaging;
pub mod prefs;
pub mod stats;
pub mod ui;

// Re-export commonly used types for convenience
pub use audio::click::{ClickBank, ClickType, SoundType};
pub use audio::engine::{AtomicF32, AudioBeatSink, AudioEngine, AudioError};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use engine::scheduler::{
    BEATS_PER_MEASURE, BeatScheduler, BeatSink, POLL_INTERVAL, PlaybackState, SinkError,
};
pub use engine::tap::TapTempo;
pub use engine::tempo::{Tempo, TempoController};
pub use messaging::channels::{create_command_channel, create_notification_channel};
pub use messaging::notification::{Notification, NotificationCategory, NotificationLevel};
pub use prefs::Preferences;
pub use stats::session::{DailyStats, PracticeSession, StatsMap, format_duration};
pub use stats::store::StatsStore;
