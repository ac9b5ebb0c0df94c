//! Single-slot mailbox between the frame producer and the detection task.
//!
//! The producer offers every frame; a frame is admitted only when nothing is
//! in flight, otherwise it is dropped on the spot. Frames are never queued.
//! The detection side holds the admitted frame through an [`InFlight`]
//! guard, and the slot is cleared when that guard drops, whatever the
//! detection outcome was.

use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::Notify;

use crate::metrics;

/// Result of offering a frame to the gate.
#[derive(Debug)]
pub enum Admission<T> {
    /// The frame now occupies the mailbox.
    Accepted,
    /// Another frame was in flight; the offered frame is handed back.
    Dropped(T),
}

impl<T> Admission<T> {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Admission::Accepted)
    }
}

/// Admission counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GateStats {
    pub offered: u64,
    pub accepted: u64,
    pub dropped: u64,
}

/// Mailbox contents. `claimed` is set once a consumer holds the item.
#[derive(Debug)]
struct Slot<T> {
    item: Option<T>,
    claimed: bool,
}

/// Drop-on-busy single-slot mailbox.
///
/// An admitted item is handed to exactly one consumer; other callers of
/// [`FrameGate::next`] keep waiting until a new item is admitted.
#[derive(Debug)]
pub struct FrameGate<T> {
    slot: Mutex<Slot<T>>,
    ready: Notify,
    offered: AtomicU64,
    dropped: AtomicU64,
}

impl<T: Clone> FrameGate<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                item: None,
                claimed: false,
            }),
            ready: Notify::new(),
            offered: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Offer an item. Never blocks on detection.
    pub fn offer(&self, item: T) -> Admission<T> {
        self.offered.fetch_add(1, Ordering::Relaxed);
        let admission = {
            let mut slot = self.lock();
            if slot.item.is_some() {
                Admission::Dropped(item)
            } else {
                slot.item = Some(item);
                Admission::Accepted
            }
        };
        match admission {
            Admission::Accepted => {
                metrics::record_frame_offered(true);
                self.ready.notify_one();
            }
            Admission::Dropped(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                metrics::record_frame_offered(false);
            }
        }
        admission
    }

    /// True while an item occupies the mailbox.
    pub fn is_pending(&self) -> bool {
        self.lock().item.is_some()
    }

    /// True while a consumer holds the admitted item.
    pub fn is_claimed(&self) -> bool {
        self.lock().claimed
    }

    /// Copy of the item in the mailbox, if any.
    pub fn peek(&self) -> Option<T> {
        self.lock().item.clone()
    }

    /// Wait for the next admitted item.
    ///
    /// The item stays in the mailbox, blocking further admissions, until the
    /// returned guard is dropped.
    pub async fn next(&self) -> InFlight<'_, T> {
        loop {
            if let Some(guard) = self.try_next() {
                return guard;
            }
            self.ready.notified().await;
        }
    }

    /// Claim the admitted item without waiting.
    ///
    /// Returns `None` when the mailbox is empty or its item is already
    /// claimed by another consumer.
    pub fn try_next(&self) -> Option<InFlight<'_, T>> {
        let mut slot = self.lock();
        if slot.claimed {
            return None;
        }
        let item = slot.item.clone()?;
        slot.claimed = true;
        Some(InFlight { gate: self, item })
    }

    /// Empty the mailbox and release any claim.
    pub fn clear(&self) {
        let mut slot = self.lock();
        slot.item = None;
        slot.claimed = false;
    }

    pub fn stats(&self) -> GateStats {
        let offered = self.offered.load(Ordering::Relaxed);
        let dropped = self.dropped.load(Ordering::Relaxed);
        GateStats {
            offered,
            accepted: offered.saturating_sub(dropped),
            dropped,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> Default for FrameGate<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// An admitted item being processed. Clears the mailbox on drop.
#[derive(Debug)]
pub struct InFlight<'a, T: Clone> {
    gate: &'a FrameGate<T>,
    item: T,
}

impl<T: Clone> Deref for InFlight<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.item
    }
}

impl<T: Clone> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        self.gate.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_second_offer_is_dropped() {
        let gate = FrameGate::new();
        assert!(gate.offer(1).is_accepted());
        match gate.offer(2) {
            Admission::Dropped(item) => assert_eq!(item, 2),
            Admission::Accepted => panic!("second frame should be dropped"),
        }
        assert_eq!(gate.peek(), Some(1));
        assert_eq!(
            gate.stats(),
            GateStats {
                offered: 2,
                accepted: 1,
                dropped: 1
            }
        );
    }

    #[test]
    fn test_guard_clears_on_drop() {
        let gate = FrameGate::new();
        gate.offer("a");
        {
            let in_flight = gate.try_next().unwrap();
            assert_eq!(*in_flight, "a");
            assert!(gate.is_pending());
            assert!(!gate.offer("b").is_accepted());
        }
        assert!(!gate.is_pending());
        assert!(gate.offer("c").is_accepted());
        assert_eq!(gate.peek(), Some("c"));
    }

    #[test]
    fn test_guard_clears_on_panic() {
        let gate = Arc::new(FrameGate::new());
        gate.offer(5u32);
        let worker = Arc::clone(&gate);
        let result = std::thread::spawn(move || {
            let _in_flight = worker.try_next().unwrap();
            panic!("detector blew up");
        })
        .join();
        assert!(result.is_err());
        assert!(!gate.is_pending());
        assert!(gate.offer(6).is_accepted());
    }

    #[test]
    fn test_item_is_handed_to_one_consumer() {
        let gate = FrameGate::new();
        gate.offer(7u32);
        let first = gate.try_next().unwrap();
        assert!(gate.is_claimed());
        assert!(gate.try_next().is_none());
        assert_eq!(gate.peek(), Some(7));
        drop(first);

        assert!(!gate.is_claimed());
        assert!(gate.try_next().is_none());
        gate.offer(8);
        assert_eq!(*gate.try_next().unwrap(), 8);
    }

    #[tokio::test]
    async fn test_second_consumer_waits_for_new_item() {
        let gate = Arc::new(FrameGate::new());
        gate.offer(1u32);
        let first = gate.next().await;

        let consumer = Arc::clone(&gate);
        let second = tokio::spawn(async move {
            let in_flight = consumer.next().await;
            *in_flight
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!second.is_finished());

        drop(first);
        gate.offer(2);
        let value = tokio::time::timeout(Duration::from_secs(1), second)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(value, 2);
    }

    #[test]
    fn test_try_next_on_empty_gate() {
        let gate: FrameGate<u8> = FrameGate::default();
        assert!(gate.try_next().is_none());
        assert!(!gate.is_pending());
    }

    #[tokio::test]
    async fn test_next_waits_for_offer() {
        let gate = Arc::new(FrameGate::new());
        let consumer = Arc::clone(&gate);
        let handle = tokio::spawn(async move {
            let in_flight = consumer.next().await;
            *in_flight
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!handle.is_finished());
        gate.offer(42u64);

        let value = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(value, 42);
        assert!(!gate.is_pending());
    }

    #[tokio::test]
    async fn test_drop_while_in_flight_then_accept() {
        let gate = Arc::new(FrameGate::new());
        gate.offer(1u32);
        let in_flight = gate.next().await;
        assert!(!gate.offer(2).is_accepted());
        assert!(!gate.offer(3).is_accepted());
        assert_eq!(gate.peek(), Some(1));
        drop(in_flight);

        assert!(gate.offer(4).is_accepted());
        assert_eq!(*gate.next().await, 4);
        assert_eq!(gate.stats().dropped, 2);
    }
}
