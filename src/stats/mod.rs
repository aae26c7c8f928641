// Practice statistics - per-day usage tracking, persistence, and merge

pub mod session;
pub mod store;

pub use session::{DailyStats, PracticeSession, StatsMap, format_duration};
pub use store::{StatsError, StatsStore};
