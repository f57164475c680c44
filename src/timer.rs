//! Fixed-period timers polled from the frame loop

use std::time::{Duration, Instant};

/// Recurring timer. A late poll fires once and the next period counts from
/// that poll; missed ticks are not replayed.
#[derive(Debug, Clone)]
pub struct Interval {
    period: Duration,
    last: Instant,
}

impl Interval {
    pub fn new(period: Duration, now: Instant) -> Self {
        Self { period, last: now }
    }

    pub fn from_secs(secs: u64, now: Instant) -> Self {
        Self::new(Duration::from_secs(secs), now)
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Whether the period has elapsed; if so the timer restarts at `now`
    pub fn due(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last) < self.period {
            return false;
        }
        self.last = now;
        true
    }

    /// Time left until the next tick
    pub fn remaining(&self, now: Instant) -> Duration {
        self.period
            .saturating_sub(now.saturating_duration_since(self.last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_per_period() {
        let start = Instant::now();
        let mut timer = Interval::from_secs(10, start);

        assert!(!timer.due(start + Duration::from_secs(9)));
        assert!(timer.due(start + Duration::from_secs(10)));
        assert!(!timer.due(start + Duration::from_secs(15)));
        assert!(timer.due(start + Duration::from_secs(20)));
    }

    #[test]
    fn test_late_poll_does_not_replay() {
        let start = Instant::now();
        let mut timer = Interval::from_secs(1, start);

        assert!(timer.due(start + Duration::from_secs(5)));
        assert!(!timer.due(start + Duration::from_millis(5500)));
        assert_eq!(timer.remaining(start + Duration::from_millis(5500)), Duration::from_millis(500));
    }
}
