// Copyright 2026 the DPP Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hardware side of the display pre-processor plane pipeline.
//!
//! `dpp_driver` takes the checked configurations produced by [`dpp_core`] and
//! writes them to the input DMA and pre-processor registers of each channel.
//!
//! - [`Subsystem`]: registry of channels and blocks; `bind`, `check`,
//!   `apply`, `disable`, and block reset.
//! - [`channel`]: the `OFF`/`ON` state machine of one channel.
//! - [`clock`]: reference-counted ring clock shared by a block's channels.
//! - [`protection`]: content-protection toggle through the secure monitor.
//! - [`program`] and [`regs`]: register sequences and the register map.
//! - [`dirty`]: register groups and their invalidation.
//! - [`irq`]: interrupt handler and the event pump that drains it.
//! - [`config`]: board description parsed from JSON.
//! - [`io`]: register access trait and an in-memory register file.

pub mod channel;
pub mod clock;
pub mod config;
pub mod dirty;
pub mod io;
pub mod irq;
pub mod program;
pub mod protection;
mod queue;
pub mod regs;
mod subsystem;

pub use queue::DEFAULT_CAPACITY as DEFAULT_EVENT_CAPACITY;
pub use subsystem::{AttachError, ChannelError, PlaneCommit, Platform, Subsystem};
