// Copyright 2026 the DPP Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-channel state machine.
//!
//! A channel is `OFF` until its first apply, which takes a ring-clock
//! reference, brings the registers to safe defaults and enables interrupts.
//! Later applies rewrite only the dirty register groups. Disable reverses
//! the power-on and forgets the applied configuration.

use std::sync::Arc;

use dpp_core::caps::Capabilities;
use dpp_core::event::PowerState;
use dpp_core::flat::FlatConfig;
use dpp_core::id::{BlockId, ChannelId, DecoderId};
use dpp_core::request::{CompositionRequest, OutputMode};
use dpp_core::restriction::Restriction;
use dpp_core::trace::{ApplyEvent, ClockEvent, ProtectionEvent, StateChangeEvent, Tracer};
use dpp_core::translate::flatten;
use dpp_core::validate::{Rejection, ValidatedConfig, validate};

use crate::clock::{RingClock, RingClockRef};
use crate::dirty::Groups;
use crate::irq::IrqShared;
use crate::program::{self, ChannelRegisters};
use crate::protection::{self, SecureMonitor};
use crate::regs::HwLimits;

/// Static description of a channel, fixed at attach.
#[derive(Clone, Debug)]
pub struct ChannelDesc {
    /// Arena slot.
    pub id: ChannelId,
    /// Physical block the channel lives on.
    pub block: BlockId,
    /// Supported features.
    pub caps: Capabilities,
    /// Numeric limits.
    pub restriction: Restriction,
    /// Whether the channel writes to memory instead of reading.
    pub writeback: bool,
}

/// Observable state of a channel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChannelState {
    /// Power state.
    pub power: PowerState,
    /// Configuration last written to the registers.
    pub applied: Option<FlatConfig>,
    /// Protection state last accepted by the secure monitor.
    pub protected: bool,
    /// Output the channel is bound to.
    pub decoder: Option<DecoderId>,
    /// Register groups waiting to be rewritten.
    pub pending: Groups,
}

#[derive(Debug)]
pub(crate) struct Channel {
    pub(crate) desc: ChannelDesc,
    pub(crate) regs: ChannelRegisters,
    pub(crate) state: ChannelState,
    pub(crate) irq: Arc<IrqShared>,
    clock: Option<RingClockRef>,
}

impl Channel {
    pub(crate) fn new(desc: ChannelDesc, regs: ChannelRegisters) -> Self {
        Self {
            desc,
            regs,
            state: ChannelState::default(),
            irq: Arc::new(IrqShared::default()),
            clock: None,
        }
    }

    pub(crate) fn id(&self) -> ChannelId {
        self.desc.id
    }

    /// Flattens and validates `req` against this channel's limits.
    pub(crate) fn check(
        &self,
        req: &CompositionRequest,
        mode: OutputMode,
    ) -> Result<ValidatedConfig, Rejection> {
        validate(
            flatten(req, mode),
            &self.desc.restriction,
            self.desc.caps,
            &HwLimits,
        )
    }

    /// `OFF -> ON`: clock reference, safe defaults, interrupts on.
    pub(crate) fn power_on(&mut self, clock: &RingClock, tracer: &mut Tracer<'_>) {
        if self.state.power == PowerState::On {
            return;
        }
        self.clock = Some(clock.acquire());
        tracer.clock(&ClockEvent {
            block: clock.block(),
            refs: clock.refcount(),
        });
        program::init(&self.regs);
        self.irq.set_on(true);
        self.state.pending = Groups::all();
        self.state.power = PowerState::On;
        tracer.state_change(&StateChangeEvent {
            channel: self.id(),
            from: PowerState::Off,
            to: PowerState::On,
        });
    }

    pub(crate) fn sync_protection(
        &mut self,
        monitor: &mut dyn SecureMonitor,
        wanted: bool,
        tracer: &mut Tracer<'_>,
    ) {
        let id = self.id();
        if let Some(accepted) =
            protection::sync(monitor, id, &mut self.state.protected, wanted)
        {
            tracer.protection(&ProtectionEvent {
                channel: id,
                enable: wanted,
                accepted,
            });
        }
    }

    /// Writes the pending groups of `cfg` and records it as applied.
    pub(crate) fn program(&mut self, cfg: FlatConfig, tracer: &mut Tracer<'_>) {
        let groups = self.state.pending;
        program::configure(&self.regs, &cfg, groups);
        self.state.pending = Groups::empty();
        self.state.applied = Some(cfg);
        tracer.apply(&ApplyEvent {
            channel: self.id(),
            groups: u32::from(groups.bits()),
            protected: self.state.protected,
        });
    }

    /// `ON -> OFF`. Returns `false` when the channel was already off.
    pub(crate) fn power_off(
        &mut self,
        monitor: &mut dyn SecureMonitor,
        tracer: &mut Tracer<'_>,
    ) -> bool {
        if self.state.power == PowerState::Off {
            return false;
        }
        self.irq.set_on(false);
        program::deinit(&self.regs);
        self.sync_protection(monitor, false, tracer);
        if let Some(r) = self.clock.take() {
            let clock = r.clock().clone();
            drop(r);
            tracer.clock(&ClockEvent {
                block: clock.block(),
                refs: clock.refcount(),
            });
        }
        self.state.decoder = None;
        self.state.applied = None;
        self.state.pending = Groups::empty();
        self.state.power = PowerState::Off;
        tracer.state_change(&StateChangeEvent {
            channel: self.id(),
            from: PowerState::On,
            to: PowerState::Off,
        });
        true
    }
}
