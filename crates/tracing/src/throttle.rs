//! Rate limiting for log lines that can fire on every event.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

const NEVER: u64 = u64::MAX;

/// Lets a log line through at most once per interval and counts what it held back.
///
/// Each instance tracks its own window, so one slow subscriber does not silence the warnings of
/// another component.
#[derive(Debug)]
pub struct LogThrottle {
    origin: Instant,
    interval_ms: u64,
    last: AtomicU64,
    suppressed: AtomicU64,
}

impl LogThrottle {
    /// Creates a throttle that opens at most once per `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            origin: Instant::now(),
            interval_ms: interval.as_millis() as u64,
            last: AtomicU64::new(NEVER),
            suppressed: AtomicU64::new(0),
        }
    }

    /// Returns `Some(n)` if the caller may log now, where `n` is the number of calls held back
    /// since the previous permit. Returns `None` otherwise.
    pub fn permit(&self) -> Option<u64> {
        let now = self.origin.elapsed().as_millis() as u64;
        let last = self.last.load(Ordering::Relaxed);
        let due = last == NEVER || now.saturating_sub(last) >= self.interval_ms;

        if due && self.last.compare_exchange(last, now, Ordering::Relaxed, Ordering::Relaxed).is_ok()
        {
            Some(self.suppressed.swap(0, Ordering::Relaxed))
        } else {
            self.suppressed.fetch_add(1, Ordering::Relaxed);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_call_is_permitted() {
        let throttle = LogThrottle::new(Duration::from_secs(60));
        assert_eq!(throttle.permit(), Some(0));
        assert_eq!(throttle.permit(), None);
        assert_eq!(throttle.permit(), None);
    }

    #[test]
    fn reports_held_back_calls_when_reopened() {
        let throttle = LogThrottle::new(Duration::from_millis(10));
        assert_eq!(throttle.permit(), Some(0));
        assert_eq!(throttle.permit(), None);
        assert_eq!(throttle.permit(), None);

        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(throttle.permit(), Some(2));
    }

    #[test]
    fn zero_interval_never_holds_back() {
        let throttle = LogThrottle::new(Duration::ZERO);
        for _ in 0..3 {
            assert_eq!(throttle.permit(), Some(0));
        }
    }
}
