//! # Poll Loop
//!
//! Cooperative fixed-interval timer for the host event loop.
//!
//! ## Design
//!
//! The host calls [`PollLoop::should_fire`] from its own loop. Nothing here
//! runs on another thread, so a cycle in progress is never interrupted and
//! a stop always lands before the next firing. When the host falls behind,
//! the missed firings collapse into one.

use std::time::{Duration, Instant};

use meshrelay_shared::POLL_INTERVAL_MS;

/// Firing statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PollStats {
    /// Firings reported to the host.
    pub fired: u64,
    /// Firings skipped because the host was late.
    pub coalesced: u64,
    /// Start/stop transitions.
    pub toggles: u64,
}

/// Toggleable periodic trigger.
#[derive(Debug, Clone)]
pub struct PollLoop {
    /// Interval between firings.
    interval: Duration,
    /// Whether streaming is on.
    running: bool,
    /// Next deadline, meaningful only while running.
    next_due: Instant,
    /// Statistics.
    stats: PollStats,
}

impl PollLoop {
    /// Creates a stopped loop with the given interval.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            running: false,
            next_due: Instant::now(),
            stats: PollStats::default(),
        }
    }

    /// Creates a stopped loop firing `rate_hz` times per second
    /// (`1000 / rate_hz` ms, truncated).
    #[must_use]
    pub fn from_rate(rate_hz: u32) -> Self {
        Self::new(Duration::from_millis(1000 / u64::from(rate_hz.max(1))))
    }

    /// Starts if stopped, stops if running. Returns the new running state.
    pub fn toggle(&mut self) -> bool {
        if self.running {
            self.stop();
        } else {
            self.start();
        }
        self.running
    }

    /// Starts streaming; the first firing is one interval from now.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.next_due = Instant::now() + self.interval;
        self.stats.toggles += 1;
        tracing::info!("streaming started ({} ms interval)", self.interval.as_millis());
    }

    /// Stops streaming. No firing is reported after this returns.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.stats.toggles += 1;
        tracing::info!("streaming stopped");
    }

    /// Whether a cycle is due now.
    #[must_use]
    pub fn should_fire(&mut self) -> bool {
        self.should_fire_at(Instant::now())
    }

    /// Whether a cycle is due at `now`. At most one `true` per deadline;
    /// deadlines already passed are skipped and counted as coalesced.
    #[must_use]
    pub fn should_fire_at(&mut self, now: Instant) -> bool {
        if !self.running || now < self.next_due {
            return false;
        }

        let late = now.duration_since(self.next_due);
        let missed = late.as_nanos() / self.interval.as_nanos();
        let missed = u32::try_from(missed).unwrap_or(u32::MAX - 1);

        self.next_due += self.interval * (missed + 1);
        self.stats.coalesced += u64::from(missed);
        self.stats.fired += 1;
        true
    }

    /// Time left until the next firing; `None` while stopped.
    #[must_use]
    pub fn time_until_next(&self) -> Option<Duration> {
        self.running
            .then(|| self.next_due.saturating_duration_since(Instant::now()))
    }

    /// Whether streaming is on.
    #[inline]
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Interval between firings.
    #[inline]
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Firing statistics.
    #[must_use]
    pub const fn stats(&self) -> PollStats {
        self.stats
    }
}

impl Default for PollLoop {
    fn default() -> Self {
        Self::new(Duration::from_millis(POLL_INTERVAL_MS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_15hz_and_stopped() {
        let poll = PollLoop::default();
        assert_eq!(poll.interval(), Duration::from_millis(66));
        assert!(!poll.is_running());
        assert_eq!(poll.time_until_next(), None);
        assert_eq!(PollLoop::from_rate(15).interval(), poll.interval());
    }

    #[test]
    fn test_toggle_flips_state() {
        let mut poll = PollLoop::default();
        assert!(poll.toggle());
        assert!(poll.is_running());
        assert!(!poll.toggle());
        assert!(!poll.is_running());
        assert_eq!(poll.stats().toggles, 2);
    }

    #[test]
    fn test_fires_once_per_interval() {
        let mut poll = PollLoop::new(Duration::from_millis(10));
        poll.start();
        let t0 = poll.next_due;

        assert!(!poll.should_fire_at(t0 - Duration::from_millis(1)));
        assert!(poll.should_fire_at(t0));
        assert!(!poll.should_fire_at(t0 + Duration::from_millis(5)));
        assert!(poll.should_fire_at(t0 + Duration::from_millis(10)));
        assert_eq!(poll.stats().fired, 2);
        assert_eq!(poll.stats().coalesced, 0);
    }

    #[test]
    fn test_late_firings_coalesce() {
        let mut poll = PollLoop::new(Duration::from_millis(10));
        poll.start();
        let t0 = poll.next_due;

        // Host stalled for 3.5 intervals
        assert!(poll.should_fire_at(t0 + Duration::from_millis(35)));
        assert!(!poll.should_fire_at(t0 + Duration::from_millis(35)));
        assert_eq!(poll.stats().fired, 1);
        assert_eq!(poll.stats().coalesced, 3);

        // Phase is kept: next deadline is t0 + 40ms
        assert!(!poll.should_fire_at(t0 + Duration::from_millis(39)));
        assert!(poll.should_fire_at(t0 + Duration::from_millis(40)));
    }

    #[test]
    fn test_stop_suppresses_pending_firing() {
        let mut poll = PollLoop::new(Duration::from_millis(10));
        poll.start();
        let due = poll.next_due + Duration::from_millis(50);
        poll.stop();
        assert!(!poll.should_fire_at(due));
        assert_eq!(poll.stats().fired, 0);
    }

    #[test]
    fn test_time_until_next_bounded_by_interval() {
        let mut poll = PollLoop::new(Duration::from_millis(50));
        poll.start();
        let wait = poll.time_until_next().unwrap();
        assert!(wait <= Duration::from_millis(50));
    }

    #[test]
    fn test_real_clock_fires() {
        let mut poll = PollLoop::new(Duration::from_millis(2));
        poll.start();
        std::thread::sleep(Duration::from_millis(5));
        assert!(poll.should_fire());
    }
}
