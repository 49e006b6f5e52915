// src/acquisition/mailbox.rs
//! Latest-value mailbox shared between a bus callback and a polling reader
//!
//! The writer always wins: publishing over an unconsumed sample replaces it
//! and counts an overwrite. The reader either peeks at the latest value or
//! consumes the pending one, optionally blocking until it arrives.

use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Mailbox counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MailboxStats {
    pub received: u64,
    pub consumed: u64,
    /// Samples replaced before the reader consumed them
    pub overwritten: u64,
}

#[derive(Debug)]
struct Slot<T> {
    latest: Option<T>,
    fresh: bool,
    stats: MailboxStats,
}

/// Single-slot mailbox guarded by a mutex and condition variable
#[derive(Debug)]
pub struct SampleMailbox<T> {
    slot: Mutex<Slot<T>>,
    arrived: Condvar,
}

impl<T: Clone> SampleMailbox<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                latest: None,
                fresh: false,
                stats: MailboxStats::default(),
            }),
            arrived: Condvar::new(),
        }
    }

    /// Store a new sample and wake waiting readers
    pub fn publish(&self, sample: T) {
        let mut slot = self.slot.lock();
        if slot.fresh {
            slot.stats.overwritten += 1;
        }
        slot.latest = Some(sample);
        slot.fresh = true;
        slot.stats.received += 1;
        drop(slot);
        self.arrived.notify_all();
    }

    /// Most recent sample, consumed or not
    pub fn latest(&self) -> Option<T> {
        self.slot.lock().latest.clone()
    }

    /// Whether an unconsumed sample is pending
    pub fn has_new(&self) -> bool {
        self.slot.lock().fresh
    }

    /// Consume the pending sample without blocking
    pub fn take_new(&self) -> Option<T> {
        let mut slot = self.slot.lock();
        Self::consume(&mut slot)
    }

    /// Block until a pending sample can be consumed or `timeout` elapses
    pub fn wait_new(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now().checked_add(timeout);
        let mut slot = self.slot.lock();
        while !slot.fresh {
            match deadline {
                Some(deadline) => {
                    if self.arrived.wait_until(&mut slot, deadline).timed_out() {
                        break;
                    }
                }
                None => self.arrived.wait(&mut slot),
            }
        }
        Self::consume(&mut slot)
    }

    /// Drop the unconsumed flag; the latest value stays readable
    pub fn discard_pending(&self) {
        self.slot.lock().fresh = false;
    }

    pub fn stats(&self) -> MailboxStats {
        self.slot.lock().stats
    }

    fn consume(slot: &mut Slot<T>) -> Option<T> {
        if !slot.fresh {
            return None;
        }
        slot.fresh = false;
        slot.stats.consumed += 1;
        slot.latest.clone()
    }
}

impl<T: Clone> Default for SampleMailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}
