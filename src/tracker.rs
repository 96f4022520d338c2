//! Debounced change tracking for one editable surface.
//!
//! The tracker never talks to the outside world. Each operation returns at
//! most one [`Flush`] and the owner delivers it. Time is supplied by the
//! caller as monotonic milliseconds, so the pending flush is plain data
//! that gets replaced on every input instead of a live timer.

/// Default idle interval before a coalesced flush.
pub const DEFAULT_DEBOUNCE_MS: u64 = 800;

/// Why a flush happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushReason {
    /// The debounce interval elapsed with no further input.
    Debounce,
    /// The surface lost focus.
    Blur,
    /// The surface is being torn down (best-effort delivery).
    Detach,
}

/// A value that must be handed to the collaborator exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flush {
    pub value: String,
    pub reason: FlushReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingFlush {
    value: String,
    due_at_ms: u64,
}

/// Dirty/clean state plus the single pending flush of one region.
#[derive(Debug, Clone)]
pub struct ChangeTracker {
    debounce_ms: u64,
    last_synced: String,
    dirty: bool,
    pending: Option<PendingFlush>,
}

impl ChangeTracker {
    /// Start clean at `initial`.
    ///
    /// A zero interval is bumped to 1ms so a flush never fires within the
    /// input call that scheduled it.
    pub fn new(initial: impl Into<String>, debounce_ms: u64) -> Self {
        Self {
            debounce_ms: debounce_ms.max(1),
            last_synced: initial.into(),
            dirty: false,
            pending: None,
        }
    }

    pub const fn debounce_ms(&self) -> u64 {
        self.debounce_ms
    }

    /// The last value handed to a flush (or the initial content).
    pub fn last_synced(&self) -> &str {
        &self.last_synced
    }

    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending flush becomes due, if any.
    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.as_ref().map(|p| p.due_at_ms)
    }

    /// Record a new surface value.
    ///
    /// Any earlier pending flush is cancelled. A value equal to the last
    /// synced one leaves the tracker clean with nothing scheduled.
    pub fn on_input(&mut self, value: impl Into<String>, now_ms: u64) {
        let value = value.into();
        self.dirty = value != self.last_synced;
        self.pending = self.dirty.then(|| PendingFlush {
            value,
            due_at_ms: now_ms.saturating_add(self.debounce_ms),
        });
        tracing::trace!(
            dirty = self.dirty,
            due_at_ms = ?self.next_deadline(),
            "input recorded"
        );
    }

    /// Fire the pending flush once its interval has elapsed.
    pub fn poll(&mut self, now_ms: u64) -> Option<Flush> {
        let due_at_ms = self.pending.as_ref()?.due_at_ms;
        if now_ms < due_at_ms {
            return None;
        }
        let pending = self.pending.take()?;
        if !self.dirty {
            return None;
        }
        self.flush(pending.value, FlushReason::Debounce)
    }

    /// Focus left the surface: flush now if `current` is unsynced.
    pub fn on_blur(&mut self, current: &str) -> Option<Flush> {
        self.settle(current, FlushReason::Blur)
    }

    /// The surface is going away: flush now if `current` is unsynced.
    ///
    /// The returned flush is best-effort; the caller must not wait for or
    /// assume delivery.
    pub fn on_detach(&mut self, current: &str) -> Option<Flush> {
        self.settle(current, FlushReason::Detach)
    }

    /// Drop the pending flush without delivering it.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    fn settle(&mut self, current: &str, reason: FlushReason) -> Option<Flush> {
        self.pending = None;
        self.dirty = current != self.last_synced;
        if !self.dirty {
            return None;
        }
        self.flush(current.to_string(), reason)
    }

    fn flush(&mut self, value: String, reason: FlushReason) -> Option<Flush> {
        if value == self.last_synced {
            self.dirty = false;
            return None;
        }
        self.last_synced.clone_from(&value);
        self.dirty = false;
        self.pending = None;
        Some(Flush { value, reason })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flushed(flush: Option<Flush>) -> (String, FlushReason) {
        let flush = flush.expect("expected a flush");
        (flush.value, flush.reason)
    }

    #[test]
    fn test_new_tracker_is_clean() {
        let tracker = ChangeTracker::new("hello", 800);
        assert!(!tracker.is_dirty());
        assert!(!tracker.is_pending());
        assert_eq!(tracker.last_synced(), "hello");
    }

    #[test]
    fn test_input_schedules_flush_after_interval() {
        let mut tracker = ChangeTracker::new("", 800);
        tracker.on_input("a", 100);
        assert_eq!(tracker.next_deadline(), Some(900));
        assert_eq!(tracker.poll(899), None);
        assert_eq!(
            flushed(tracker.poll(900)),
            ("a".to_string(), FlushReason::Debounce)
        );
        assert!(!tracker.is_dirty());
        assert_eq!(tracker.last_synced(), "a");
    }

    #[test]
    fn test_rapid_inputs_coalesce_into_last_value() {
        let mut tracker = ChangeTracker::new("", 800);
        tracker.on_input("h", 0);
        tracker.on_input("he", 300);
        tracker.on_input("hel", 700);
        assert_eq!(tracker.poll(1000), None, "first deadline was replaced");
        assert_eq!(
            flushed(tracker.poll(1500)),
            ("hel".to_string(), FlushReason::Debounce)
        );
        assert_eq!(tracker.poll(10_000), None);
    }

    #[test]
    fn test_input_back_to_synced_value_cancels_flush() {
        let mut tracker = ChangeTracker::new("draft", 800);
        tracker.on_input("drafts", 0);
        tracker.on_input("draft", 100);
        assert!(!tracker.is_dirty());
        assert!(!tracker.is_pending());
        assert_eq!(tracker.poll(5000), None);
    }

    #[test]
    fn test_blur_flushes_immediately_and_cancels_timer() {
        let mut tracker = ChangeTracker::new("", 800);
        tracker.on_input("note", 0);
        assert_eq!(
            flushed(tracker.on_blur("note")),
            ("note".to_string(), FlushReason::Blur)
        );
        assert!(!tracker.is_pending());
        assert_eq!(tracker.poll(800), None, "no duplicate after blur");
    }

    #[test]
    fn test_blur_when_clean_is_noop() {
        let mut tracker = ChangeTracker::new("same", 800);
        assert_eq!(tracker.on_blur("same"), None);
    }

    #[test]
    fn test_detach_flushes_unsynced_value() {
        let mut tracker = ChangeTracker::new("a", 800);
        tracker.on_input("ab", 0);
        assert_eq!(
            flushed(tracker.on_detach("ab")),
            ("ab".to_string(), FlushReason::Detach)
        );
        assert_eq!(tracker.on_detach("ab"), None);
    }

    #[test]
    fn test_cancel_keeps_dirty_flag() {
        let mut tracker = ChangeTracker::new("", 800);
        tracker.on_input("x", 0);
        tracker.cancel();
        assert!(tracker.is_dirty());
        assert_eq!(tracker.poll(5000), None);
        assert!(tracker.on_blur("x").is_some(), "blur still rescues the edit");
    }

    #[test]
    fn test_zero_debounce_is_clamped() {
        let mut tracker = ChangeTracker::new("", 0);
        tracker.on_input("x", 10);
        assert_eq!(tracker.poll(10), None);
        assert!(tracker.poll(11).is_some());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn inputs_closer_than_interval_flush_once_with_last_value(
                debounce in 1..2000u64,
                values in proptest::collection::vec("[a-z]{1,6}", 1..20),
                gaps in proptest::collection::vec(0..2000u64, 20),
            ) {
                let mut tracker = ChangeTracker::new("", debounce);
                let mut now = 0u64;
                let mut flushes = Vec::new();
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        now += gaps[i] % debounce;
                    }
                    if let Some(f) = tracker.poll(now) {
                        flushes.push(f);
                    }
                    tracker.on_input(value.clone(), now);
                }
                if let Some(f) = tracker.poll(now + debounce) {
                    flushes.push(f);
                }
                prop_assert!(flushes.len() <= 1);
                if let Some(f) = flushes.first() {
                    prop_assert_eq!(&f.value, values.last().unwrap());
                }
                let last = values.last().unwrap();
                prop_assert_eq!(flushes.len(), usize::from(!last.is_empty()));
            }

            #[test]
            fn no_flush_ever_repeats_last_synced_value(
                ops in proptest::collection::vec((0..3u8, "[ab]{0,3}", 0..1000u64), 1..60),
            ) {
                let mut tracker = ChangeTracker::new("", 200);
                let mut now = 0u64;
                let mut current = String::new();
                for (kind, value, gap) in ops {
                    now += gap;
                    let before = tracker.last_synced().to_string();
                    let flush = match kind {
                        0 => {
                            current = value;
                            tracker.on_input(current.clone(), now);
                            None
                        }
                        1 => tracker.poll(now),
                        _ => tracker.on_blur(&current),
                    };
                    if let Some(f) = flush {
                        prop_assert_ne!(f.value, before);
                    }
                    prop_assert!(tracker.is_dirty() || !tracker.is_pending());
                }
            }

            #[test]
            fn blur_leaves_nothing_pending(
                values in proptest::collection::vec("[a-c]{0,4}", 1..10),
            ) {
                let mut tracker = ChangeTracker::new("", 500);
                for (i, v) in values.iter().enumerate() {
                    tracker.on_input(v.clone(), i as u64 * 10);
                }
                let last = values.last().unwrap();
                let flush = tracker.on_blur(last);
                prop_assert_eq!(flush.is_some(), !last.is_empty());
                prop_assert!(!tracker.is_pending());
                prop_assert_eq!(tracker.poll(u64::MAX), None);
            }
        }
    }
}
