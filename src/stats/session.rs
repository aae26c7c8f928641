// Statistics data model
// Field names stay camelCase on disk so existing exports remain readable.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One continuous stretch of metronome playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeSession {
    /// Wall-clock start, milliseconds since the Unix epoch
    pub start_time: i64,
    /// Wall-clock end; `None` while the session is still open
    pub end_time: Option<i64>,
    pub duration_ms: u64,
}

impl PracticeSession {
    /// A session that has just started
    pub fn open(start_time: i64) -> Self {
        Self {
            start_time,
            end_time: None,
            duration_ms: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    /// Close the session at `end_time` and fix its duration
    pub fn close(&mut self, end_time: i64) {
        self.end_time = Some(end_time);
        self.duration_ms = end_time.saturating_sub(self.start_time).max(0) as u64;
    }
}

/// All practice accumulated on one calendar day (local timezone)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    /// `YYYY-MM-DD`
    pub date: String,
    pub total_duration_ms: u64,
    pub sessions: Vec<PracticeSession>,
}

impl DailyStats {
    pub fn empty(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            total_duration_ms: 0,
            sessions: Vec::new(),
        }
    }

    /// Recompute the total from the sessions. Stored totals are treated
    /// as derived data: after any merge they are recomputed, never
    /// trusted.
    pub fn recompute_total(&mut self) {
        self.total_duration_ms = self.sessions.iter().map(|s| s.duration_ms).sum();
    }
}

/// Practice history keyed by `YYYY-MM-DD`; ordered so the UI can render
/// it chronologically without sorting
pub type StatsMap = BTreeMap<String, DailyStats>;

/// Format a duration in milliseconds as `HH:MM:SS`
pub fn format_duration(ms: u64) -> String {
    let seconds = (ms / 1000) % 60;
    let minutes = (ms / 60_000) % 60;
    let hours = ms / 3_600_000;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
