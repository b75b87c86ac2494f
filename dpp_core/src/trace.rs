// Copyright 2026 the DPP Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the plane pipeline.
//!
//! [`TraceSink`] has one method per event kind; all default to no-ops, so a
//! sink implements only what it cares about.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.

use crate::event::{HardwareEvent, PowerState};
use crate::id::{BlockId, ChannelId};
use crate::validate::Rejection;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// Emitted after every validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CheckEvent {
    /// Channel that was checked.
    pub channel: ChannelId,
    /// Outcome.
    pub result: Result<(), Rejection>,
}

/// Emitted when a channel changes power state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StateChangeEvent {
    /// Channel that changed.
    pub channel: ChannelId,
    /// Previous state.
    pub from: PowerState,
    /// New state.
    pub to: PowerState,
}

/// Emitted when the protection toggle is attempted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProtectionEvent {
    /// Channel whose protection changed.
    pub channel: ChannelId,
    /// Requested protection.
    pub enable: bool,
    /// Whether the secure monitor accepted the change.
    pub accepted: bool,
}

/// Emitted after registers were programmed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ApplyEvent {
    /// Channel that was programmed.
    pub channel: ChannelId,
    /// Bit mask of the register groups rewritten, one bit per group index.
    pub groups: u32,
    /// Protection state after the apply.
    pub protected: bool,
}

/// Emitted when a block's ring-clock reference count changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockEvent {
    /// Block owning the clock.
    pub block: BlockId,
    /// Reference count after the change.
    pub refs: u32,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the pipeline.
///
/// All methods have default no-op implementations.
pub trait TraceSink {
    /// Called after a configuration was checked.
    fn on_check(&mut self, e: &CheckEvent) {
        _ = e;
    }

    /// Called when a channel turns on or off.
    fn on_state_change(&mut self, e: &StateChangeEvent) {
        _ = e;
    }

    /// Called when protection is toggled.
    fn on_protection(&mut self, e: &ProtectionEvent) {
        _ = e;
    }

    /// Called after registers were programmed.
    fn on_apply(&mut self, e: &ApplyEvent) {
        _ = e;
    }

    /// Called when a ring-clock reference is taken or released.
    fn on_clock(&mut self, e: &ClockEvent) {
        _ = e;
    }

    /// Called for every drained hardware event.
    fn on_hardware_event(&mut self, e: &HardwareEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

macro_rules! dispatch {
    ($(#[$doc:meta])* $name:ident => $method:ident($ty:ty)) => {
        $(#[$doc])*
        #[inline]
        pub fn $name(&mut self, e: &$ty) {
            #[cfg(feature = "trace")]
            if let Some(s) = &mut self.sink {
                s.$method(e);
            }
            #[cfg(not(feature = "trace"))]
            {
                _ = e;
            }
        }
    };
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    dispatch!(
        /// Emits a [`CheckEvent`].
        check => on_check(CheckEvent)
    );
    dispatch!(
        /// Emits a [`StateChangeEvent`].
        state_change => on_state_change(StateChangeEvent)
    );
    dispatch!(
        /// Emits a [`ProtectionEvent`].
        protection => on_protection(ProtectionEvent)
    );
    dispatch!(
        /// Emits an [`ApplyEvent`].
        apply => on_apply(ApplyEvent)
    );
    dispatch!(
        /// Emits a [`ClockEvent`].
        clock => on_clock(ClockEvent)
    );
    dispatch!(
        /// Forwards a [`HardwareEvent`].
        hardware_event => on_hardware_event(HardwareEvent)
    );
}
