// Copyright 2026 the DPP Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hardware-signaled events and channel power states.
//!
//! The interrupt handler turns status bits into [`HardwareEvent`]s; a consumer
//! outside interrupt context drains them and forwards them to a
//! [`TraceSink`](crate::trace::TraceSink). None of these events change a
//! channel's [`PowerState`].

use alloc::vec::Vec;
use core::fmt;

use crate::id::ChannelId;

/// Channel lifecycle state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PowerState {
    /// Clock reference released, registers untouched.
    #[default]
    Off,
    /// Clock held, registers programmed.
    On,
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Off => "OFF",
            Self::On => "ON",
        })
    }
}

/// Register snapshot taken when a fatal error fires.
///
/// Each list holds `(offset, value)` pairs in ascending offset order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegisterDump {
    /// Input DMA registers of the channel.
    pub dma: Vec<(u32, u32)>,
    /// Pre-processor registers of the channel.
    pub dpp: Vec<(u32, u32)>,
}

fn find(regs: &[(u32, u32)], offset: u32) -> Option<u32> {
    regs.binary_search_by_key(&offset, |&(o, _)| o)
        .ok()
        .map(|i| regs[i].1)
}

impl RegisterDump {
    /// Captured DMA register at `offset`.
    #[must_use]
    pub fn dma(&self, offset: u32) -> Option<u32> {
        find(&self.dma, offset)
    }

    /// Captured pre-processor register at `offset`.
    #[must_use]
    pub fn dpp(&self, offset: u32) -> Option<u32> {
        find(&self.dpp, offset)
    }
}

/// Non-fatal DMA fault reported alongside other status bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DmaFault {
    /// Address outside the bus aperture.
    AxiAddress,
    /// AFBC decoder conflict.
    AfbcConflict,
    /// Rotation buffer conflict.
    VrConflict,
    /// SBWC decoding error.
    Sbwc,
}

/// What the hardware reported.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventKind {
    /// The channel finished a frame.
    FrameDone,
    /// The DMA started recovery; `count` recoveries since the last frame.
    RecoveryTriggered {
        /// Consecutive recoveries.
        count: u32,
    },
    /// The hardware refused its own configuration.
    ConfigError {
        /// Raw DMA configuration error state.
        dma_state: u32,
        /// Raw pre-processor configuration error state.
        dpp_state: u32,
        /// Names of the set error-state bits.
        causes: Vec<&'static str>,
    },
    /// Read transaction error on the bus.
    ReadSlaveError(RegisterDump),
    /// Write transaction error on the bus (writeback channels).
    WriteSlaveError(RegisterDump),
    /// The DMA stopped making progress.
    Deadlock(RegisterDump),
    /// A DMA fault that does not stop the channel.
    Dma(DmaFault),
}

impl EventKind {
    /// Whether the event needs supervisory intervention.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ReadSlaveError(_) | Self::WriteSlaveError(_) | Self::Deadlock(_)
        )
    }

    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::FrameDone => "frame-done",
            Self::RecoveryTriggered { .. } => "recovery",
            Self::ConfigError { .. } => "config-error",
            Self::ReadSlaveError(_) => "read-slave-error",
            Self::WriteSlaveError(_) => "write-slave-error",
            Self::Deadlock(_) => "deadlock",
            Self::Dma(_) => "dma-fault",
        }
    }

    /// The register dump attached to fatal events.
    #[must_use]
    pub fn dump(&self) -> Option<&RegisterDump> {
        match self {
            Self::ReadSlaveError(d) | Self::WriteSlaveError(d) | Self::Deadlock(d) => Some(d),
            _ => None,
        }
    }
}

/// An event attributed to one channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HardwareEvent {
    /// Channel that raised the interrupt.
    pub channel: ChannelId,
    /// What happened.
    pub kind: EventKind,
}
