//! Minimum spacing between supplier queries
//!
//! The supplier asks for a pause between requests. [`Throttle::wait`] is
//! called before every query and sleeps just long enough that consecutive
//! query starts are at least the configured interval apart. Time comes from a
//! [`Clock`] so the contract can be checked without real sleeping.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Source of time for the throttle
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Clock that only moves when told to; `sleep` advances it instantly.
///
/// Clones share the same time, so a test can hand one copy to the throttle
/// and read the other.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }

    /// Time elapsed since the clock was created
    pub fn elapsed(&self) -> Duration {
        self.offset.get()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.offset.get()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

/// Enforces a minimum interval between consecutive calls to [`Throttle::wait`]
#[derive(Debug)]
pub struct Throttle<C: Clock = SystemClock> {
    clock: C,
    interval: Duration,
    last: Option<Instant>,
    waited: Duration,
}

impl Throttle<SystemClock> {
    pub fn new(interval: Duration) -> Self {
        Self::with_clock(interval, SystemClock)
    }
}

impl<C: Clock> Throttle<C> {
    pub fn with_clock(interval: Duration, clock: C) -> Self {
        Self {
            clock,
            interval,
            last: None,
            waited: Duration::ZERO,
        }
    }

    /// Block until the interval since the previous call has passed.
    ///
    /// The first call never blocks.
    pub fn wait(&mut self) {
        if let Some(last) = self.last {
            let elapsed = self.clock.now().saturating_duration_since(last);
            if elapsed < self.interval {
                let remaining = self.interval - elapsed;
                self.clock.sleep(remaining);
                self.waited += remaining;
            }
        }
        self.last = Some(self.clock.now());
    }

    /// Total time spent sleeping so far
    pub fn total_waited(&self) -> Duration {
        self.waited
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_wait_is_free() {
        let clock = ManualClock::new();
        let mut throttle = Throttle::with_clock(Duration::from_secs(1), clock.clone());
        throttle.wait();
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_consecutive_waits_are_spaced() {
        let clock = ManualClock::new();
        let mut throttle = Throttle::with_clock(Duration::from_secs(1), clock.clone());

        let mut starts = Vec::new();
        for _ in 0..4 {
            throttle.wait();
            starts.push(clock.elapsed());
        }

        assert_eq!(starts.last().copied().unwrap() - starts[0], Duration::from_secs(3));
        for pair in starts.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_secs(1));
        }
        assert_eq!(throttle.total_waited(), Duration::from_secs(3));
    }

    #[test]
    fn test_time_already_spent_counts() {
        let clock = ManualClock::new();
        let mut throttle = Throttle::with_clock(Duration::from_millis(1000), clock.clone());

        throttle.wait();
        clock.advance(Duration::from_millis(700));
        throttle.wait();
        assert_eq!(clock.elapsed(), Duration::from_millis(1000));

        clock.advance(Duration::from_secs(5));
        throttle.wait();
        assert_eq!(clock.elapsed(), Duration::from_secs(6));
        assert_eq!(throttle.total_waited(), Duration::from_millis(300));
    }

    #[test]
    fn test_zero_interval_never_sleeps() {
        let clock = ManualClock::new();
        let mut throttle = Throttle::with_clock(Duration::ZERO, clock.clone());
        for _ in 0..10 {
            throttle.wait();
        }
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }
}
