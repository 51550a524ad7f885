use chrono::{DateTime, Duration, Utc};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Time source for the session; monotonic milliseconds plus wall-clock time.
pub trait Clock {
    fn now_ms(&self) -> u64;
    fn now_utc(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone)]
pub struct SystemClock {
    started: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now_ms: Rc<Cell<u64>>,
    epoch: DateTime<Utc>,
}

impl ManualClock {
    pub fn new(epoch: DateTime<Utc>) -> Self {
        Self {
            now_ms: Rc::new(Cell::new(0)),
            epoch,
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now_ms.set(self.now_ms.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }

    fn now_utc(&self) -> DateTime<Utc> {
        self.epoch + Duration::milliseconds(self.now_ms.get() as i64)
    }
}

/// One cancellable delayed task, bound to a key.
///
/// Scheduling again replaces the pending task and restarts the delay. The task
/// fires once `delay_ms` has passed since the last `schedule`.
#[derive(Debug, Clone)]
pub struct Debouncer<K> {
    delay_ms: u64,
    pending: Option<(K, u64)>,
}

impl<K: PartialEq> Debouncer<K> {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    pub fn schedule(&mut self, key: K, now_ms: u64) {
        self.pending = Some((key, now_ms));
    }

    /// Drop the pending task, returning its key.
    pub fn cancel(&mut self) -> Option<K> {
        self.pending.take().map(|(key, _)| key)
    }

    /// Drop the pending task only if it is bound to `key`.
    pub fn cancel_for(&mut self, key: &K) -> bool {
        if self.pending.as_ref().is_some_and(|(k, _)| k == key) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    /// The pending key once its delay has elapsed; it is removed.
    pub fn take_due(&mut self, now_ms: u64) -> Option<K> {
        let queued_at = self.pending.as_ref()?.1;
        if now_ms.saturating_sub(queued_at) >= self.delay_ms {
            self.cancel()
        } else {
            None
        }
    }

    pub fn pending(&self) -> Option<&K> {
        self.pending.as_ref().map(|(key, _)| key)
    }

    pub fn deadline(&self) -> Option<u64> {
        self.pending
            .as_ref()
            .map(|(_, queued_at)| queued_at + self.delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_only_after_the_delay() {
        let mut d = Debouncer::new(100);
        d.schedule("a", 0);
        assert_eq!(d.take_due(99), None);
        assert_eq!(d.take_due(100), Some("a"));
        assert_eq!(d.take_due(500), None);
    }

    #[test]
    fn rescheduling_restarts_the_delay() {
        let mut d = Debouncer::new(100);
        d.schedule("a", 0);
        d.schedule("a", 80);
        assert_eq!(d.take_due(120), None);
        assert_eq!(d.deadline(), Some(180));
        assert_eq!(d.take_due(180), Some("a"));
    }

    #[test]
    fn cancel_for_only_matches_its_key() {
        let mut d = Debouncer::new(100);
        d.schedule("a", 0);
        assert!(!d.cancel_for(&"b"));
        assert_eq!(d.pending(), Some(&"a"));
        assert!(d.cancel_for(&"a"));
        assert_eq!(d.pending(), None);
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(Utc::now());
        let other = clock.clone();
        clock.advance(250);
        assert_eq!(other.now_ms(), 250);
        assert_eq!(other.now_utc() - clock.epoch, Duration::milliseconds(250));
    }
}
