// Copyright 2026 the DPP Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reference-counted ring clock shared by the channels of one block.
//!
//! The first reference turns the gate on; dropping the last turns it off.
//! References are RAII handles, so a channel that is torn down without an
//! explicit disable still releases its share.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use dpp_core::id::BlockId;

/// Platform clock gate for one block.
pub trait ClockGate: Send {
    /// Ungates the clock.
    fn enable(&mut self);

    /// Gates the clock.
    fn disable(&mut self);
}

struct Inner {
    refs: u32,
    gate: Box<dyn ClockGate>,
}

/// Shared ring clock of one block.
#[derive(Clone)]
pub struct RingClock {
    block: BlockId,
    inner: Arc<Mutex<Inner>>,
}

impl fmt::Debug for RingClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingClock")
            .field("block", &self.block)
            .field("refs", &self.refcount())
            .finish_non_exhaustive()
    }
}

impl RingClock {
    /// Wraps `gate`, initially gated with no references.
    #[must_use]
    pub fn new(block: BlockId, gate: Box<dyn ClockGate>) -> Self {
        Self {
            block,
            inner: Arc::new(Mutex::new(Inner { refs: 0, gate })),
        }
    }

    /// Block this clock belongs to.
    #[must_use]
    pub const fn block(&self) -> BlockId {
        self.block
    }

    /// Takes a reference, ungating the clock on the first one.
    #[must_use = "dropping the reference releases the clock"]
    pub fn acquire(&self) -> RingClockRef {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.refs += 1;
        if inner.refs == 1 {
            inner.gate.enable();
        }
        RingClockRef {
            clock: self.clone(),
        }
    }

    /// Current number of references.
    #[must_use]
    pub fn refcount(&self) -> u32 {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .refs
    }

    fn release(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.refs = inner.refs.saturating_sub(1);
        if inner.refs == 0 {
            inner.gate.disable();
        }
    }
}

/// One channel's share of a [`RingClock`].
#[derive(Debug)]
pub struct RingClockRef {
    clock: RingClock,
}

impl RingClockRef {
    /// Clock this reference keeps running.
    #[must_use]
    pub const fn clock(&self) -> &RingClock {
        &self.clock
    }
}

impl Drop for RingClockRef {
    fn drop(&mut self) {
        self.clock.release();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    /// Gate that records its state and transition count.
    #[derive(Clone, Default)]
    pub(crate) struct RecordingGate {
        pub(crate) on: Arc<AtomicBool>,
        pub(crate) transitions: Arc<AtomicU32>,
    }

    impl ClockGate for RecordingGate {
        fn enable(&mut self) {
            self.on.store(true, Ordering::SeqCst);
            self.transitions.fetch_add(1, Ordering::SeqCst);
        }

        fn disable(&mut self) {
            self.on.store(false, Ordering::SeqCst);
            self.transitions.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn first_reference_enables_last_disables() {
        let gate = RecordingGate::default();
        let clock = RingClock::new(BlockId(0), Box::new(gate.clone()));
        assert!(!gate.on.load(Ordering::SeqCst), "starts gated");

        let a = clock.acquire();
        let b = clock.acquire();
        assert_eq!(clock.refcount(), 2);
        assert!(gate.on.load(Ordering::SeqCst), "ungated while referenced");

        drop(a);
        assert_eq!(clock.refcount(), 1);
        assert!(gate.on.load(Ordering::SeqCst), "still ungated");

        drop(b);
        assert_eq!(clock.refcount(), 0);
        assert!(!gate.on.load(Ordering::SeqCst), "gated after last release");
        assert_eq!(gate.transitions.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn references_shared_across_threads() {
        let gate = RecordingGate::default();
        let clock = RingClock::new(BlockId(1), Box::new(gate.clone()));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let clock = clock.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        drop(clock.acquire());
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(clock.refcount(), 0);
        assert!(!gate.on.load(Ordering::SeqCst), "gated at rest");
    }
}
