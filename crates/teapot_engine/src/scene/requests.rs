//! Cross-thread request handoff
//!
//! UI callbacks may run on a different thread from the render loop. They never
//! touch renderer state directly; instead they write into a shared
//! [`FrameRequests`] block, and the engine drains it exactly once at the start
//! of each frame. A burst of requests between two frames collapses into the
//! latest value.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use super::CyclicSelector;

/// Pending selection of an index into a fixed-length table
///
/// The requested index and its pending bit share one word (`index << 1 | 1`),
/// so marking and consuming a request are each a single atomic step and a
/// request is handed to exactly one `take`.
#[derive(Debug)]
pub struct PendingSelection {
    state: AtomicUsize,
    count: usize,
}

const PENDING: usize = 1;

impl PendingSelection {
    /// Slot over `count` entries, starting at `initial`
    pub fn new(count: usize, initial: usize) -> Self {
        let count = count.max(1);
        Self {
            state: AtomicUsize::new((initial % count) << 1),
            count,
        }
    }

    /// Advance the requested index cyclically and mark it pending; returns the new index
    pub fn cycle(&self) -> usize {
        let count = self.count;
        let advance = |state: usize| (CyclicSelector::next_index(state >> 1, count) << 1) | PENDING;
        let previous = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |state| Some(advance(state)))
            .unwrap_or_else(|state| state);
        advance(previous) >> 1
    }

    /// Request a specific index (wrapped into range)
    pub fn request(&self, index: usize) {
        self.state.store(((index % self.count) << 1) | PENDING, Ordering::Release);
    }

    /// Most recently requested index, pending or not
    pub fn requested(&self) -> usize {
        self.state.load(Ordering::Acquire) >> 1
    }

    /// Whether a request is waiting
    pub fn is_pending(&self) -> bool {
        self.state.load(Ordering::Acquire) & PENDING != 0
    }

    /// Consume the pending request, if any
    pub fn take(&self) -> Option<usize> {
        let previous = self.state.fetch_and(!PENDING, Ordering::AcqRel);
        (previous & PENDING != 0).then_some(previous >> 1)
    }
}

/// Pending roughness value
///
/// The value bits and the pending flag share one `AtomicU64` (`bits << 1 | 1`).
#[derive(Debug, Default)]
pub struct PendingRoughness {
    state: AtomicU64,
}

impl PendingRoughness {
    /// Request a roughness, clamped to 0..=1
    pub fn request(&self, roughness: f32) {
        let value = if roughness.is_nan() { 0.0 } else { roughness.clamp(0.0, 1.0) };
        self.state.store((u64::from(value.to_bits()) << 1) | 1, Ordering::Release);
    }

    /// Request a roughness from a 0..=100 slider position
    pub fn request_slider(&self, position: u32) {
        self.request(position.min(100) as f32 / 100.0);
    }

    /// Consume the pending value, if any
    pub fn take(&self) -> Option<f32> {
        let previous = self.state.fetch_and(!1, Ordering::AcqRel);
        (previous & 1 != 0).then(|| f32::from_bits((previous >> 1) as u32))
    }
}

/// Everything the UI may ask of the render loop
#[derive(Debug)]
pub struct FrameRequests {
    /// Material selection
    pub material: PendingSelection,
    /// Stage selection
    pub stage: PendingSelection,
    /// Teapot roughness
    pub roughness: PendingRoughness,
    reload: AtomicBool,
}

impl FrameRequests {
    /// Request block for tables of the given sizes, both starting at index 0
    pub fn new(material_count: usize, stage_count: usize) -> Self {
        Self {
            material: PendingSelection::new(material_count, 0),
            stage: PendingSelection::new(stage_count, 0),
            roughness: PendingRoughness::default(),
            reload: AtomicBool::new(false),
        }
    }

    /// Ask for a full Unload/Init resource rebuild
    pub fn request_reload(&self) {
        self.reload.store(true, Ordering::Release);
    }

    /// Consume the reload request
    pub fn take_reload(&self) -> bool {
        self.reload.swap(false, Ordering::AcqRel)
    }
}

/// Cloneable handle given to UI callbacks
pub type RequestHandle = Arc<FrameRequests>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_cycle_marks_pending_and_wraps() {
        let slot = PendingSelection::new(3, 0);
        assert_eq!(slot.take(), None);
        assert_eq!(slot.cycle(), 1);
        assert_eq!(slot.cycle(), 2);
        assert_eq!(slot.cycle(), 0);
        assert_eq!(slot.take(), Some(0));
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn test_requests_collapse_to_latest() {
        let slot = PendingSelection::new(4, 0);
        slot.request(2);
        slot.request(5);
        assert_eq!(slot.take(), Some(1));
    }

    #[test]
    fn test_cycles_from_many_threads_are_not_lost() {
        let requests: RequestHandle = Arc::new(FrameRequests::new(3, 4));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let requests = Arc::clone(&requests);
                thread::spawn(move || {
                    for _ in 0..100 {
                        requests.stage.cycle();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("thread");
        }
        assert_eq!(requests.stage.take(), Some(800 % 4));
    }

    #[test]
    fn test_taken_request_is_not_applied_again() {
        let slot = PendingSelection::new(3, 0);
        assert_eq!(slot.cycle(), 1);
        assert!(slot.is_pending());
        assert_eq!(slot.take(), Some(1));
        assert!(!slot.is_pending());
        assert_eq!(slot.requested(), 1);
        assert_eq!(slot.take(), None);

        assert_eq!(slot.cycle(), 2);
        assert_eq!(slot.take(), Some(2));
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn test_concurrent_drain_applies_each_request_at_most_once() {
        const CYCLES: usize = 2000;
        let requests: RequestHandle = Arc::new(FrameRequests::new(3, 4));
        let producer = {
            let requests = Arc::clone(&requests);
            thread::spawn(move || {
                for _ in 0..CYCLES {
                    requests.stage.cycle();
                }
            })
        };

        let mut applied = Vec::new();
        while !producer.is_finished() {
            applied.extend(requests.stage.take());
        }
        producer.join().expect("producer");
        applied.extend(requests.stage.take());

        assert!(applied.len() <= CYCLES);
        assert_eq!(applied.last(), Some(&(CYCLES % 4)));
        assert_eq!(requests.stage.take(), None);
    }

    #[test]
    fn test_roughness_and_reload() {
        let requests = FrameRequests::new(3, 4);
        requests.roughness.request(1.7);
        assert_eq!(requests.roughness.take(), Some(1.0));
        assert_eq!(requests.roughness.take(), None);
        requests.roughness.request_slider(25);
        assert_eq!(requests.roughness.take(), Some(0.25));

        assert!(!requests.take_reload());
        requests.request_reload();
        assert!(requests.take_reload());
        assert!(!requests.take_reload());
    }
}
