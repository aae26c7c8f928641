// Statistics store - session tracking, JSON persistence, export/merge

use std::collections::btree_map::Entry;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Local};

use crate::stats::session::{DailyStats, PracticeSession, StatsMap};

/// Statistics persistence errors
#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed statistics payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no config directory available")]
    NoConfigDir,
}

/// Owner of the practice history.
///
/// Session tracking takes the current wall-clock time as a parameter so
/// tests can feed fixed instants. At most one session is open at any
/// time: starting a new one closes a dangling one first, which also
/// covers a session left open across midnight.
pub struct StatsStore {
    path: Option<PathBuf>,
    data: StatsMap,
}

impl StatsStore {
    /// A store with no backing file; `save` is a no-op. For tests and
    /// for running without a config directory.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: StatsMap::new(),
        }
    }

    /// Open the store at `path`. A missing file yields an empty history.
    /// A malformed one is discarded and the history starts empty; the
    /// swallowed error is returned alongside so the caller can surface
    /// it, because losing stats silently would look like a reset.
    pub fn load(path: PathBuf) -> (Self, Option<StatsError>) {
        let (data, recovered) = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<StatsMap>(&text) {
                Ok(data) => (data, None),
                Err(err) => (StatsMap::new(), Some(StatsError::Json(err))),
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => (StatsMap::new(), None),
            Err(err) => (StatsMap::new(), Some(StatsError::Io(err))),
        };

        (
            Self {
                path: Some(path),
                data,
            },
            recovered,
        )
    }

    /// Default location under the platform config directory
    pub fn default_path() -> Result<PathBuf, StatsError> {
        Ok(dirs::config_dir()
            .ok_or(StatsError::NoConfigDir)?
            .join("metrobeat")
            .join("stats.json"))
    }

    pub fn data(&self) -> &StatsMap {
        &self.data
    }

    pub fn day(&self, date: &str) -> Option<&DailyStats> {
        self.data.get(date)
    }

    /// Local calendar key for `now`
    pub fn date_key(now: DateTime<Local>) -> String {
        now.format("%Y-%m-%d").to_string()
    }

    /// Begin a practice session at `now`. Any dangling open session is
    /// closed first.
    pub fn start_session(&mut self, now: DateTime<Local>) {
        self.end_session(now);

        let key = Self::date_key(now);
        self.data
            .entry(key.clone())
            .or_insert_with(|| DailyStats::empty(key))
            .sessions
            .push(PracticeSession::open(now.timestamp_millis()));
    }

    /// Close the open session (if any) at `now` and add its duration to
    /// that day's total. Harmless when nothing is open.
    pub fn end_session(&mut self, now: DateTime<Local>) {
        let end_ms = now.timestamp_millis();
        for day in self.data.values_mut() {
            if let Some(session) = day.sessions.iter_mut().find(|s| s.is_open()) {
                session.close(end_ms);
                day.total_duration_ms += session.duration_ms;
                return;
            }
        }
    }

    /// Merge an imported history into this one. Per date, session lists
    /// are concatenated (never deduplicated: importing the same export
    /// twice doubles the counts by design) and the day's total is
    /// recomputed from the sessions, ignoring whatever total the import
    /// carried.
    pub fn merge(&mut self, imported: StatsMap) {
        for (date, imported_day) in imported {
            match self.data.entry(date) {
                Entry::Occupied(mut entry) => {
                    let day = entry.get_mut();
                    day.sessions.extend(imported_day.sessions);
                    day.recompute_total();
                }
                Entry::Vacant(entry) => {
                    let mut day = imported_day;
                    day.recompute_total();
                    entry.insert(day);
                }
            }
        }
    }

    /// The full history as a reversible text payload
    pub fn export(&self) -> Result<String, StatsError> {
        Ok(serde_json::to_string(&self.data)?)
    }

    /// Parse `text` and merge it in. All-or-nothing: a malformed payload
    /// leaves the history untouched.
    pub fn import_merge(&mut self, text: &str) -> Result<(), StatsError> {
        let imported: StatsMap = serde_json::from_str(text)?;
        self.merge(imported);
        Ok(())
    }

    /// Write the history to the backing file, creating parent
    /// directories as needed
    pub fn save(&self) -> Result<(), StatsError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(&self.data)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Local> {
        Local.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_session_lifecycle_accumulates_duration() {
        let mut store = StatsStore::in_memory();

        store.start_session(at(0));
        store.end_session(at(90));
        store.start_session(at(200));
        store.end_session(at(260));

        let key = StatsStore::date_key(at(0));
        let day = store.day(&key).expect("day recorded");
        assert_eq!(day.sessions.len(), 2);
        assert_eq!(day.total_duration_ms, 150_000);
        assert!(day.sessions.iter().all(|s| !s.is_open()));
    }

    #[test]
    fn test_start_closes_dangling_session() {
        let mut store = StatsStore::in_memory();

        store.start_session(at(0));
        // No explicit end: the next start closes the first session
        store.start_session(at(60));

        let key = StatsStore::date_key(at(0));
        let day = store.day(&key).unwrap();
        assert_eq!(day.sessions.len(), 2);
        assert_eq!(day.sessions[0].duration_ms, 60_000);
        assert!(day.sessions[1].is_open());
        assert_eq!(day.total_duration_ms, 60_000);
    }

    #[test]
    fn test_end_without_open_session_is_harmless() {
        let mut store = StatsStore::in_memory();
        store.end_session(at(10));
        assert!(store.data().is_empty());
    }

    #[test]
    fn test_merge_recomputes_totals_from_sessions() {
        let mut store = StatsStore::in_memory();
        store.data.insert("2024-01-01".to_string(), DailyStats {
            date: "2024-01-01".to_string(),
            total_duration_ms: 1000,
            sessions: vec![PracticeSession {
                start_time: 0,
                end_time: Some(1000),
                duration_ms: 1000,
            }],
        });

        let mut imported = StatsMap::new();
        imported.insert("2024-01-01".to_string(), DailyStats {
            date: "2024-01-01".to_string(),
            // Deliberately wrong stored total: must be ignored
            total_duration_ms: 999,
            sessions: vec![PracticeSession {
                start_time: 5000,
                end_time: Some(5500),
                duration_ms: 500,
            }],
        });

        store.merge(imported);

        let day = store.day("2024-01-01").unwrap();
        assert_eq!(day.sessions.len(), 2);
        assert_eq!(day.total_duration_ms, 1500);
    }

    #[test]
    fn test_merge_recomputes_totals_for_new_dates_too() {
        let mut store = StatsStore::in_memory();

        let mut imported = StatsMap::new();
        imported.insert("2024-02-02".to_string(), DailyStats {
            date: "2024-02-02".to_string(),
            total_duration_ms: 123_456, // stale
            sessions: vec![PracticeSession {
                start_time: 0,
                end_time: Some(2000),
                duration_ms: 2000,
            }],
        });
        store.merge(imported);

        assert_eq!(store.day("2024-02-02").unwrap().total_duration_ms, 2000);
    }

    #[test]
    fn test_import_is_all_or_nothing() {
        let mut store = StatsStore::in_memory();
        store.start_session(at(0));
        store.end_session(at(10));
        let before = store.export().unwrap();

        assert!(store.import_merge("{not json").is_err());
        assert!(store.import_merge("[1, 2, 3]").is_err());

        assert_eq!(store.export().unwrap(), before, "no partial merge applied");
    }
}
