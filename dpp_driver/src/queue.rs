// Copyright 2026 the DPP Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounded hand-off from interrupt context.

use std::collections::VecDeque;

use dpp_core::event::HardwareEvent;

/// Default number of events held before the oldest are dropped.
pub const DEFAULT_CAPACITY: usize = 64;

/// Bounded FIFO of hardware events.
///
/// Once full, a push evicts the oldest non-fatal event. Fatal events carry a
/// register dump and are only evicted when the queue holds nothing else.
#[derive(Debug, Clone)]
pub(crate) struct EventQueue {
    items: VecDeque<HardwareEvent>,
    capacity: usize,
    dropped_count: u64,
}

impl EventQueue {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
            dropped_count: 0,
        }
    }

    pub(crate) fn push(&mut self, event: HardwareEvent) {
        if self.items.len() == self.capacity {
            let victim = self
                .items
                .iter()
                .position(|e| !e.kind.is_fatal())
                .unwrap_or(0);
            let _ = self.items.remove(victim);
            self.dropped_count += 1;
        }
        self.items.push_back(event);
    }

    pub(crate) fn pop(&mut self) -> Option<HardwareEvent> {
        self.items.pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn dropped_count(&self) -> u64 {
        self.dropped_count
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}
