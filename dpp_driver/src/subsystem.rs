// Copyright 2026 the DPP Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The display subsystem registry.
//!
//! [`Subsystem`] owns every channel (in an arena indexed by [`ChannelId`]),
//! the ring clock of every block, the secure monitor, and the register-group
//! dirty tracker. All configuration calls take `&mut self`; the interrupt
//! path only reaches shared state through [`IrqHandler`] and [`EventPump`].

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use dpp_core::event::PowerState;
use dpp_core::id::{BlockId, ChannelId, DecoderId};
use dpp_core::request::{CompositionRequest, OutputMode};
use dpp_core::restriction::RestrictionError;
use dpp_core::trace::{CheckEvent, Tracer};
use dpp_core::validate::{Rejection, ValidatedConfig};

use crate::channel::{Channel, ChannelDesc, ChannelState};
use crate::clock::{ClockGate, RingClock};
use crate::config::BoardConfig;
use crate::dirty;
use crate::irq::{self, EventPump, IrqHandler, IrqStats, SharedQueue};
use crate::program::ChannelRegisters;
use crate::protection::SecureMonitor;
use crate::queue::EventQueue;

/// Dirty-tracker keys at or above this value name blocks, not channels.
const BLOCK_KEY_BASE: u32 = 1 << 31;

const fn block_key(block: BlockId) -> u32 {
    BLOCK_KEY_BASE | block.0
}

/// Why a channel or block could not be attached.
#[derive(Debug, thiserror::Error)]
pub enum AttachError {
    /// The board description is not valid JSON or has the wrong shape.
    #[error("malformed board description: {0}")]
    Parse(#[from] serde_json::Error),
    /// An attribute string names no known capability.
    #[error("{channel}: unknown attribute {name:?}")]
    UnknownAttribute {
        /// Channel being attached.
        channel: ChannelId,
        /// Offending attribute.
        name: String,
    },
    /// The channel refers to a block that was never added.
    #[error("{channel}: unknown block {block:?}")]
    UnknownBlock {
        /// Channel being attached.
        channel: ChannelId,
        /// Missing block.
        block: BlockId,
    },
    /// The channel slot is already taken.
    #[error("{0} attached twice")]
    DuplicateChannel(ChannelId),
    /// The block was already added.
    #[error("{0:?} added twice")]
    DuplicateBlock(BlockId),
    /// The channel id cannot be linked to its block's dirty state.
    #[error("{channel}: cannot link to block {block:?}")]
    Dependency {
        /// Channel being attached.
        channel: ChannelId,
        /// Block it was being linked to.
        block: BlockId,
    },
    /// The channel's restriction is inconsistent.
    #[error("{channel}: invalid restriction")]
    Restriction {
        /// Channel being attached.
        channel: ChannelId,
        /// What is wrong with it.
        #[source]
        source: RestrictionError,
    },
}

/// Why a channel operation failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    /// No channel is attached at this id.
    #[error("no channel {0}")]
    UnknownChannel(ChannelId),
    /// The configuration was rejected; nothing was written.
    #[error(transparent)]
    Rejected(#[from] Rejection),
}

/// A configuration that passed `check` on a specific channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaneCommit {
    channel: ChannelId,
    config: ValidatedConfig,
}

impl PlaneCommit {
    /// Channel the configuration was checked against.
    #[must_use]
    pub const fn channel(&self) -> ChannelId {
        self.channel
    }

    /// The checked configuration.
    #[must_use]
    pub const fn config(&self) -> &ValidatedConfig {
        &self.config
    }
}

/// Provides hardware resources when building from a [`BoardConfig`].
pub trait Platform {
    /// Clock gate for `block`.
    fn clock_gate(&mut self, block: BlockId) -> Box<dyn ClockGate>;

    /// Register accessors for `channel`.
    fn registers(&mut self, channel: ChannelId) -> ChannelRegisters;
}

/// Registry of channels and blocks.
pub struct Subsystem {
    channels: Vec<Option<Channel>>,
    blocks: BTreeMap<BlockId, RingClock>,
    dirty: DirtyTracker<u32>,
    monitor: Box<dyn SecureMonitor>,
    queue: SharedQueue,
}

impl core::fmt::Debug for Subsystem {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Subsystem")
            .field("channels", &self.channels.iter().flatten().count())
            .field("blocks", &self.blocks.len())
            .finish_non_exhaustive()
    }
}

impl Subsystem {
    /// Creates an empty subsystem.
    #[must_use]
    pub fn new(monitor: Box<dyn SecureMonitor>) -> Self {
        Self::with_queue_capacity(monitor, crate::queue::DEFAULT_CAPACITY)
    }

    /// Creates an empty subsystem whose event queue holds `capacity` events.
    #[must_use]
    pub fn with_queue_capacity(monitor: Box<dyn SecureMonitor>, capacity: usize) -> Self {
        Self {
            channels: Vec::new(),
            blocks: BTreeMap::new(),
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            monitor,
            queue: Arc::new(Mutex::new(EventQueue::with_capacity(capacity))),
        }
    }

    /// Builds a subsystem from a board description.
    ///
    /// Any attach error aborts the whole build.
    pub fn from_config(
        board: &BoardConfig,
        platform: &mut dyn Platform,
        monitor: Box<dyn SecureMonitor>,
    ) -> Result<Self, AttachError> {
        let mut sys = Self::new(monitor);
        for b in &board.blocks {
            let id = BlockId(b.id);
            sys.add_block(id, platform.clock_gate(id))?;
        }
        for spec in &board.channels {
            let desc = spec.to_desc()?;
            let regs = platform.registers(desc.id);
            sys.attach(desc, regs)?;
        }
        Ok(sys)
    }

    /// Registers a block and its clock gate.
    pub fn add_block(&mut self, id: BlockId, gate: Box<dyn ClockGate>) -> Result<(), AttachError> {
        if self.blocks.contains_key(&id) {
            return Err(AttachError::DuplicateBlock(id));
        }
        self.blocks.insert(id, RingClock::new(id, gate));
        Ok(())
    }

    /// Attaches a channel to an existing block.
    pub fn attach(
        &mut self,
        desc: ChannelDesc,
        regs: ChannelRegisters,
    ) -> Result<ChannelId, AttachError> {
        let id = desc.id;
        if !self.blocks.contains_key(&desc.block) {
            return Err(AttachError::UnknownBlock {
                channel: id,
                block: desc.block,
            });
        }
        let link_error = AttachError::Dependency {
            channel: id,
            block: desc.block,
        };
        if id.0 >= BLOCK_KEY_BASE {
            return Err(link_error);
        }
        let idx = id.index();
        if self.channels.get(idx).is_some_and(Option::is_some) {
            return Err(AttachError::DuplicateChannel(id));
        }
        let bk = block_key(desc.block);
        for (ch, _) in dirty::TABLE {
            if self.dirty.add_dependency(id.0, bk, ch).is_err() {
                return Err(link_error);
            }
        }
        if self.channels.len() <= idx {
            self.channels.resize_with(idx + 1, || None);
        }
        self.channels[idx] = Some(Channel::new(desc, regs));
        Ok(id)
    }

    /// Binds a channel to the output it will feed.
    pub fn bind(&mut self, channel: ChannelId, decoder: DecoderId) -> Result<(), ChannelError> {
        self.channel_mut(channel)?.state.decoder = Some(decoder);
        Ok(())
    }

    /// Validates `req` for `channel` without touching hardware.
    pub fn check(
        &self,
        channel: ChannelId,
        req: &CompositionRequest,
        mode: OutputMode,
        tracer: &mut Tracer<'_>,
    ) -> Result<PlaneCommit, ChannelError> {
        let ch = self.channel(channel)?;
        let result = ch.check(req, mode);
        tracer.check(&CheckEvent {
            channel,
            result: result.map(|_| ()),
        });
        Ok(PlaneCommit {
            channel,
            config: result?,
        })
    }

    /// Programs a checked configuration, powering the channel on if needed.
    pub fn apply(&mut self, commit: PlaneCommit, tracer: &mut Tracer<'_>) -> Result<(), ChannelError> {
        let id = commit.channel;
        let cfg = commit.config.into_inner();
        let block = self.channel(id)?.desc.block;

        {
            let Self {
                channels, blocks, ..
            } = self;
            let ch = channels
                .get_mut(id.index())
                .and_then(Option::as_mut)
                .ok_or(ChannelError::UnknownChannel(id))?;
            if ch.state.power == PowerState::Off {
                if let Some(clock) = blocks.get(&block) {
                    ch.power_on(clock, tracer);
                }
            }
        }

        let changed = dirty::changed(self.channel(id)?.state.applied.as_ref(), &cfg);
        for (ch, group) in dirty::TABLE {
            if changed.contains(group) {
                self.dirty.mark(id.0, ch);
            }
        }
        self.collect_dirty();

        let Self {
            channels, monitor, ..
        } = self;
        let ch = channels
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(ChannelError::UnknownChannel(id))?;
        ch.sync_protection(monitor.as_mut(), cfg.protected, tracer);
        ch.program(cfg, tracer);
        Ok(())
    }

    /// Powers a channel off. Does nothing if it already is.
    pub fn disable(&mut self, channel: ChannelId, tracer: &mut Tracer<'_>) -> Result<(), ChannelError> {
        let Self {
            channels, monitor, ..
        } = self;
        let ch = channels
            .get_mut(channel.index())
            .and_then(Option::as_mut)
            .ok_or(ChannelError::UnknownChannel(channel))?;
        ch.power_off(monitor.as_mut(), tracer);
        Ok(())
    }

    /// Powers off every channel bound to `decoder`, as when its output is
    /// torn down. Returns the channels that were turned off.
    pub fn teardown_output(&mut self, decoder: DecoderId, tracer: &mut Tracer<'_>) -> Vec<ChannelId> {
        let mut off = Vec::new();
        let Self {
            channels, monitor, ..
        } = self;
        for ch in channels.iter_mut().flatten() {
            if ch.state.decoder == Some(decoder) && ch.power_off(monitor.as_mut(), tracer) {
                off.push(ch.id());
            }
        }
        off
    }

    /// Forces every channel on `block` to rewrite all register groups on its
    /// next apply.
    pub fn reset_block(&mut self, block: BlockId) {
        let bk = block_key(block);
        for (ch, _) in dirty::TABLE {
            self.dirty.mark_with(bk, ch, &EagerPolicy);
        }
    }

    /// Current state of `channel`.
    #[must_use]
    pub fn state(&self, channel: ChannelId) -> Option<&ChannelState> {
        self.channel(channel).ok().map(|c| &c.state)
    }

    /// Reference count of `block`'s ring clock.
    #[must_use]
    pub fn clock_refcount(&self, block: BlockId) -> Option<u32> {
        self.blocks.get(&block).map(RingClock::refcount)
    }

    /// Interrupt handler for `channel`, to be registered with the platform.
    #[must_use]
    pub fn irq_handler(&self, channel: ChannelId) -> Option<IrqHandler> {
        let ch = self.channel(channel).ok()?;
        Some(IrqHandler::new(
            channel,
            ch.regs.clone(),
            ch.desc.writeback,
            ch.irq.clone(),
            self.queue.clone(),
        ))
    }

    /// Interrupt counters of `channel`.
    #[must_use]
    pub fn irq_stats(&self, channel: ChannelId) -> Option<IrqStats> {
        self.channel(channel).ok().map(|c| irq::stats(&c.irq))
    }

    /// Consumer handle for the interrupt event queue.
    #[must_use]
    pub fn event_pump(&self) -> EventPump {
        EventPump::new(self.queue.clone())
    }

    /// Attached channel ids in ascending order.
    pub fn channels(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.channels.iter().flatten().map(Channel::id)
    }

    fn channel(&self, id: ChannelId) -> Result<&Channel, ChannelError> {
        self.channels
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(ChannelError::UnknownChannel(id))
    }

    fn channel_mut(&mut self, id: ChannelId) -> Result<&mut Channel, ChannelError> {
        self.channels
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(ChannelError::UnknownChannel(id))
    }

    /// Drains every dirty group into the pending set of its channels.
    fn collect_dirty(&mut self) {
        for (ch, group) in dirty::TABLE {
            let keys: Vec<u32> = self
                .dirty
                .drain(ch)
                .affected()
                .deterministic()
                .run()
                .collect();
            for key in keys {
                if key >= BLOCK_KEY_BASE {
                    continue;
                }
                let slot = self.channels.get_mut(key as usize).and_then(Option::as_mut);
                if let Some(c) = slot {
                    if c.state.power == PowerState::On {
                        c.state.pending.insert(group);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::tests::restriction;
    use crate::clock::tests::RecordingGate;
    use crate::dirty::Groups;
    use crate::io::MemoryRegisters;
    use crate::protection::NoSecureMonitor;
    use dpp_core::caps::Capabilities;
    use dpp_core::format::{FourCc, lookup};
    use dpp_core::modifier::Modifier;
    use dpp_core::request::{Buffers, DisplayRect, Framebuffer};
    use kurbo::Rect;

    const MODE: OutputMode = OutputMode {
        hdisplay: 1920,
        vdisplay: 1080,
    };

    fn regs() -> ChannelRegisters {
        ChannelRegisters {
            dma: Arc::new(MemoryRegisters::new()),
            dpp: Arc::new(MemoryRegisters::new()),
        }
    }

    fn desc(id: u32, block: u32) -> ChannelDesc {
        ChannelDesc {
            id: ChannelId(id),
            block: BlockId(block),
            caps: Capabilities::all(),
            restriction: restriction(),
            writeback: false,
        }
    }

    fn subsystem() -> Subsystem {
        let mut sys = Subsystem::new(Box::new(NoSecureMonitor));
        sys.add_block(BlockId(0), Box::new(RecordingGate::default()))
            .unwrap();
        sys.attach(desc(0, 0), regs()).unwrap();
        sys.attach(desc(1, 0), regs()).unwrap();
        sys
    }

    fn request(base: u64) -> CompositionRequest {
        let fb = Framebuffer {
            width: 640,
            height: 480,
            format: lookup(FourCc::new(*b"XR24"), None).unwrap(),
            modifier: Modifier::LINEAR,
            buffers: Buffers::Contiguous(base),
        };
        CompositionRequest::new(
            fb,
            Rect::new(0.0, 0.0, 640.0, 480.0),
            DisplayRect::new(0, 0, 640, 480),
        )
    }

    fn apply(sys: &mut Subsystem, ch: u32, base: u64) {
        let mut t = Tracer::none();
        let commit = sys.check(ChannelId(ch), &request(base), MODE, &mut t).unwrap();
        sys.apply(commit, &mut t).unwrap();
    }

    #[test]
    fn attach_rejects_unknown_block_and_duplicates() {
        let mut sys = subsystem();
        assert!(matches!(
            sys.attach(desc(2, 7), regs()),
            Err(AttachError::UnknownBlock { .. })
        ));
        assert!(matches!(
            sys.attach(desc(1, 0), regs()),
            Err(AttachError::DuplicateChannel(ChannelId(1)))
        ));
        assert!(matches!(
            sys.add_block(BlockId(0), Box::new(RecordingGate::default())),
            Err(AttachError::DuplicateBlock(BlockId(0)))
        ));
        assert_eq!(sys.channels().collect::<Vec<_>>(), [ChannelId(0), ChannelId(1)]);
    }

    #[test]
    fn attach_rejects_ids_in_the_block_key_range() {
        let mut sys = subsystem();
        let err = sys.attach(desc(BLOCK_KEY_BASE, 0), regs()).unwrap_err();
        assert!(matches!(
            err,
            AttachError::Dependency {
                channel: ChannelId(BLOCK_KEY_BASE),
                block: BlockId(0),
            }
        ));
        assert_eq!(sys.channels().count(), 2, "nothing attached");
    }

    #[test]
    fn unknown_channel_is_an_error() {
        let mut sys = subsystem();
        assert_eq!(
            sys.bind(ChannelId(9), DecoderId(0)),
            Err(ChannelError::UnknownChannel(ChannelId(9)))
        );
        assert!(sys.state(ChannelId(9)).is_none(), "no state");
    }

    #[test]
    fn bind_records_decoder() {
        let mut sys = subsystem();
        sys.bind(ChannelId(0), DecoderId(4)).unwrap();
        assert_eq!(sys.state(ChannelId(0)).unwrap().decoder, Some(DecoderId(4)));
    }

    #[test]
    fn rejected_check_leaves_channel_off() {
        let sys = subsystem();
        let mut req = request(0x1000);
        req.dst = DisplayRect::new(0, 0, 8, 8);
        let err = sys
            .check(ChannelId(0), &req, MODE, &mut Tracer::none())
            .unwrap_err();
        assert!(matches!(err, ChannelError::Rejected(_)), "got {err:?}");
        assert_eq!(sys.state(ChannelId(0)).unwrap().power, PowerState::Off);
        assert_eq!(sys.clock_refcount(BlockId(0)), Some(0));
    }

    #[test]
    fn repeat_apply_with_same_config_is_clean() {
        let mut sys = subsystem();
        apply(&mut sys, 0, 0x1000);
        apply(&mut sys, 0, 0x1000);
        let state = sys.state(ChannelId(0)).unwrap();
        assert_eq!(state.power, PowerState::On);
        assert!(state.pending.is_empty(), "nothing pending");
    }

    #[test]
    fn reset_block_dirties_every_channel_on_it() {
        let mut sys = subsystem();
        apply(&mut sys, 0, 0x1000);
        apply(&mut sys, 1, 0x2000);
        sys.reset_block(BlockId(0));
        // Applying channel 0 collects the reset for channel 1 too.
        apply(&mut sys, 0, 0x1000);
        assert_eq!(sys.state(ChannelId(1)).unwrap().pending, Groups::all());
        assert!(sys.state(ChannelId(0)).unwrap().pending.is_empty(), "reprogrammed");
    }

    #[test]
    fn teardown_output_disables_bound_channels() {
        let mut sys = subsystem();
        let mut t = Tracer::none();
        sys.bind(ChannelId(0), DecoderId(1)).unwrap();
        sys.bind(ChannelId(1), DecoderId(2)).unwrap();
        apply(&mut sys, 0, 0x1000);
        apply(&mut sys, 1, 0x2000);
        assert_eq!(sys.teardown_output(DecoderId(1), &mut t), [ChannelId(0)]);
        assert_eq!(sys.state(ChannelId(0)).unwrap().power, PowerState::Off);
        assert_eq!(sys.state(ChannelId(1)).unwrap().power, PowerState::On);
        assert_eq!(sys.clock_refcount(BlockId(0)), Some(1));
    }
}
