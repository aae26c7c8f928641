// Tap tempo - infers a BPM from the rhythm of user taps
// Keeps the last few tap timestamps and averages the gaps between them.

use std::time::Duration;

use crate::engine::tempo::Tempo;

/// Taps retained for averaging; older ones are dropped
const MAX_TAPS: usize = 4;

/// A gap longer than this discards the history: the user stopped tapping
/// and is starting a new measurement, not continuing the old one
const RESET_GAP: Duration = Duration::from_millis(2000);

/// Tap-tempo inferencer.
///
/// Timestamps come from the caller's clock reading, so the inactivity
/// timeout and the interval math are deterministic under test. `poll` must be
/// called periodically to expire stale history; every tap re-arms the
/// timeout by virtue of becoming the new "last tap".
#[derive(Debug, Default)]
pub struct TapTempo {
    taps: Vec<Duration>,
}

impl TapTempo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tap at `now`. From the second retained tap onward,
    /// returns the estimated tempo: `round(60000 / mean_gap_ms)` clamped
    /// into range. A single isolated tap infers nothing.
    pub fn tap(&mut self, now: Duration) -> Option<Tempo> {
        if let Some(&last) = self.taps.last() {
            if now.saturating_sub(last) > RESET_GAP {
                self.taps.clear();
            }
        }

        self.taps.push(now);
        if self.taps.len() > MAX_TAPS {
            self.taps.remove(0);
        }

        if self.taps.len() < 2 {
            return None;
        }

        let gaps_ms: Vec<f64> = self
            .taps
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).as_secs_f64() * 1000.0)
            .collect();
        let mean_ms = gaps_ms.iter().sum::<f64>() / gaps_ms.len() as f64;

        // Two taps in the same clock instant read as an infinite tempo;
        // the cast saturates and the clamp brings it back into range
        let bpm = (60_000.0 / mean_ms).round() as i64;
        Some(Tempo::clamped(bpm))
    }

    /// Expire the history after 2 s without a tap
    pub fn poll(&mut self, now: Duration) {
        if let Some(&last) = self.taps.last() {
            if now.saturating_sub(last) > RESET_GAP {
                self.taps.clear();
            }
        }
    }

    pub fn is_collecting(&self) -> bool {
        !self.taps.is_empty()
    }

    pub fn tap_count(&self) -> usize {
        self.taps.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_even_taps_infer_bpm() {
        let mut tap = TapTempo::new();

        // Gaps of 500 ms each: 120 BPM
        assert_eq!(tap.tap(ms(0)), None);
        assert_eq!(tap.tap(ms(500)), Some(Tempo::new(120).unwrap()));
        assert_eq!(tap.tap(ms(1000)), Some(Tempo::new(120).unwrap()));
        assert_eq!(tap.tap(ms(1500)), Some(Tempo::new(120).unwrap()));
    }

    #[test]
    fn test_single_tap_infers_nothing() {
        let mut tap = TapTempo::new();
        assert_eq!(tap.tap(ms(100)), None);
        assert_eq!(tap.tap_count(), 1);
    }

    #[test]
    fn test_gap_over_two_seconds_resets_history() {
        let mut tap = TapTempo::new();

        tap.tap(ms(0));
        tap.tap(ms(500));

        // 3 s of silence: no averaging across the gap
        assert_eq!(tap.tap(ms(3500)), None);
        assert_eq!(tap.tap_count(), 1);

        // A fresh pair after the reset measures only itself
        assert_eq!(tap.tap(ms(4000)), Some(Tempo::new(120).unwrap()));
    }

    #[test]
    fn test_only_last_four_taps_are_kept() {
        let mut tap = TapTempo::new();

        // Four slow taps (1000 ms gaps, 60 BPM), then speed up
        for t in [0u64, 1000, 2000, 3000] {
            tap.tap(ms(t));
        }
        assert_eq!(tap.tap_count(), MAX_TAPS);

        // Next taps at 500 ms gaps; the window slides, so the estimate
        // converges on the new speed instead of averaging all history
        tap.tap(ms(3500));
        tap.tap(ms(4000));
        let estimate = tap.tap(ms(4500)).unwrap();
        assert_eq!(estimate.bpm(), 120);
    }

    #[test]
    fn test_estimate_is_clamped() {
        let mut tap = TapTempo::new();

        // 100 ms gaps read as 600 BPM, clamped to the maximum
        tap.tap(ms(0));
        assert_eq!(tap.tap(ms(100)).unwrap().bpm(), Tempo::MAX);

        // 1950 ms gaps (just under the reset) read as ~31 BPM
        let mut slow = TapTempo::new();
        slow.tap(ms(0));
        assert_eq!(slow.tap(ms(1950)).unwrap().bpm(), 31);
    }

    #[test]
    fn test_poll_expires_idle_history() {
        let mut tap = TapTempo::new();

        tap.tap(ms(0));
        tap.tap(ms(400));
        assert!(tap.is_collecting());

        tap.poll(ms(2300));
        assert!(tap.is_collecting(), "timeout re-armed by the second tap");

        tap.poll(ms(2500));
        assert!(!tap.is_collecting(), "2 s after the last tap the history is gone");
    }
}
