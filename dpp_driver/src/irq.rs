// Copyright 2026 the DPP Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interrupt handling.
//!
//! [`IrqHandler::handle`] runs in interrupt context: it reads and acknowledges
//! the status registers, updates atomic counters and queues
//! [`HardwareEvent`]s. It never touches the configuration path's state.
//! [`EventPump::drain`] runs later on an ordinary thread and forwards the
//! queued events to a [`TraceSink`](dpp_core::trace::TraceSink).

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use dpp_core::event::{DmaFault, EventKind, HardwareEvent};
use dpp_core::id::ChannelId;
use dpp_core::trace::Tracer;

use crate::program::{self, ChannelRegisters};
use crate::queue::EventQueue;
use crate::regs::{self, dpp, idma};

/// Counters shared between a channel and its handler.
#[derive(Debug, Default)]
pub(crate) struct IrqShared {
    on: AtomicBool,
    frames: AtomicU64,
    recoveries: AtomicU32,
    config_errors: AtomicU64,
    fatal: AtomicU64,
}

impl IrqShared {
    pub(crate) fn set_on(&self, on: bool) {
        self.on.store(on, Ordering::Release);
    }
}

/// Snapshot of a channel's interrupt counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IrqStats {
    /// Frames completed.
    pub frames: u64,
    /// Recoveries since the last completed frame.
    pub recoveries: u32,
    /// Configuration errors raised by the hardware.
    pub config_errors: u64,
    /// Bus errors and deadlocks.
    pub fatal: u64,
}

pub(crate) type SharedQueue = Arc<Mutex<EventQueue>>;

const DMA_FAULTS: [(u32, DmaFault); 4] = [
    (idma::IRQ_AXI_ADDR_ERR, DmaFault::AxiAddress),
    (idma::IRQ_AFBC_CONFLICT, DmaFault::AfbcConflict),
    (idma::IRQ_VR_CONFLICT, DmaFault::VrConflict),
    (idma::IRQ_SBWC_ERR, DmaFault::Sbwc),
];

/// Interrupt entry point for one channel.
#[derive(Clone, Debug)]
pub struct IrqHandler {
    channel: ChannelId,
    regs: ChannelRegisters,
    writeback: bool,
    shared: Arc<IrqShared>,
    queue: SharedQueue,
}

impl IrqHandler {
    pub(crate) fn new(
        channel: ChannelId,
        regs: ChannelRegisters,
        writeback: bool,
        shared: Arc<IrqShared>,
        queue: SharedQueue,
    ) -> Self {
        Self {
            channel,
            regs,
            writeback,
            shared,
            queue,
        }
    }

    /// Channel this handler serves.
    #[must_use]
    pub const fn channel(&self) -> ChannelId {
        self.channel
    }

    /// Services pending status bits.
    ///
    /// Returns whether the interrupt belonged to this channel. Interrupts
    /// arriving while the channel is off are left untouched.
    pub fn handle(&self) -> bool {
        if !self.shared.on.load(Ordering::Acquire) {
            return false;
        }
        let dma_status = self.regs.dma.read(idma::IRQ) & idma::ALL_IRQ_CLEAR;
        let dpp_status = self.regs.dpp.read(dpp::IRQ) & dpp::ALL_IRQ_CLEAR;
        if dma_status == 0 && dpp_status == 0 {
            return false;
        }

        let mut events = Vec::new();
        for (bit, fault) in DMA_FAULTS {
            if dma_status & bit != 0 {
                events.push(EventKind::Dma(fault));
            }
        }
        if (dma_status & idma::IRQ_CONFIG_ERROR) | (dpp_status & dpp::IRQ_CONFIG_ERROR) != 0 {
            let dma_state = self.regs.dma.read(idma::CFG_ERR_STATE);
            let dpp_state = self.regs.dpp.read(dpp::CFG_ERR_STATE);
            self.shared.config_errors.fetch_add(1, Ordering::Relaxed);
            events.push(EventKind::ConfigError {
                dma_state,
                dpp_state,
                causes: regs::config_error_causes(dma_state, dpp_state),
            });
        }
        if dma_status & idma::IRQ_RECOVERY_TRG != 0 {
            let count = self.shared.recoveries.fetch_add(1, Ordering::Relaxed) + 1;
            events.push(EventKind::RecoveryTriggered { count });
        }
        if dma_status & (idma::IRQ_READ_SLAVE_ERROR | idma::IRQ_DEADLOCK) != 0 {
            let dump = program::dump(&self.regs);
            if dma_status & idma::IRQ_READ_SLAVE_ERROR != 0 {
                events.push(if self.writeback {
                    EventKind::WriteSlaveError(dump.clone())
                } else {
                    EventKind::ReadSlaveError(dump.clone())
                });
                self.shared.fatal.fetch_add(1, Ordering::Relaxed);
            }
            if dma_status & idma::IRQ_DEADLOCK != 0 {
                events.push(EventKind::Deadlock(dump));
                self.shared.fatal.fetch_add(1, Ordering::Relaxed);
            }
        }
        if (dma_status & idma::IRQ_FRAMEDONE) | (dpp_status & dpp::IRQ_FRAMEDONE) != 0 {
            self.shared.recoveries.store(0, Ordering::Relaxed);
            self.shared.frames.fetch_add(1, Ordering::Relaxed);
            events.push(EventKind::FrameDone);
        }

        if dma_status != 0 {
            self.regs.dma.clear(idma::IRQ, dma_status, idma::ALL_IRQ_CLEAR);
        }
        if dpp_status != 0 {
            self.regs.dpp.clear(dpp::IRQ, dpp_status, dpp::ALL_IRQ_CLEAR);
        }

        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        for kind in events {
            queue.push(HardwareEvent {
                channel: self.channel,
                kind,
            });
        }
        true
    }

    /// Current counter values.
    #[must_use]
    pub fn stats(&self) -> IrqStats {
        stats(&self.shared)
    }
}

pub(crate) fn stats(shared: &IrqShared) -> IrqStats {
    IrqStats {
        frames: shared.frames.load(Ordering::Relaxed),
        recoveries: shared.recoveries.load(Ordering::Relaxed),
        config_errors: shared.config_errors.load(Ordering::Relaxed),
        fatal: shared.fatal.load(Ordering::Relaxed),
    }
}

/// Consumer side of the interrupt event queue.
#[derive(Clone, Debug)]
pub struct EventPump {
    queue: SharedQueue,
}

impl EventPump {
    pub(crate) fn new(queue: SharedQueue) -> Self {
        Self { queue }
    }

    /// Forwards every queued event to `tracer`, oldest first.
    ///
    /// Returns the number of events forwarded.
    pub fn drain(&self, tracer: &mut Tracer<'_>) -> usize {
        let mut n = 0;
        // The queue lock is not held across dispatch.
        while let Some(event) = self.pop() {
            tracer.hardware_event(&event);
            n += 1;
        }
        n
    }

    /// Events waiting to be drained.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Events evicted because the queue was full.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .dropped_count()
    }

    fn pop(&self) -> Option<HardwareEvent> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{MemoryRegisters, RegisterIo};
    use dpp_core::trace::TraceSink;

    struct Fixture {
        dma: Arc<MemoryRegisters>,
        dpp: Arc<MemoryRegisters>,
        handler: IrqHandler,
        pump: EventPump,
    }

    fn fixture(writeback: bool) -> Fixture {
        let dma = Arc::new(MemoryRegisters::new());
        let dpp = Arc::new(MemoryRegisters::new());
        let regs = ChannelRegisters {
            dma: dma.clone(),
            dpp: dpp.clone(),
        };
        let shared = Arc::new(IrqShared::default());
        shared.set_on(true);
        let queue = SharedQueue::default();
        Fixture {
            dma,
            dpp,
            handler: IrqHandler::new(ChannelId(3), regs, writeback, shared, queue.clone()),
            pump: EventPump::new(queue),
        }
    }

    #[derive(Default)]
    struct Collect(Vec<HardwareEvent>);

    impl TraceSink for Collect {
        fn on_hardware_event(&mut self, e: &HardwareEvent) {
            self.0.push(e.clone());
        }
    }

    fn drain(pump: &EventPump) -> Vec<EventKind> {
        let mut sink = Collect::default();
        pump.drain(&mut Tracer::new(&mut sink));
        sink.0.into_iter().map(|e| e.kind).collect()
    }

    #[test]
    fn off_channel_ignores_interrupts() {
        let f = fixture(false);
        f.handler.shared.set_on(false);
        f.dma.poke(idma::IRQ, idma::IRQ_FRAMEDONE);
        assert!(!f.handler.handle(), "not handled while off");
        assert_eq!(f.dma.read(idma::IRQ), idma::IRQ_FRAMEDONE, "status untouched");
        assert_eq!(f.pump.pending(), 0);
    }

    #[test]
    fn frame_done_resets_recovery_count() {
        let f = fixture(false);
        f.dma.poke(idma::IRQ, idma::IRQ_RECOVERY_TRG | idma::IRQ_ENABLE);
        assert!(f.handler.handle(), "handled");
        f.dma.poke(idma::IRQ, idma::IRQ_RECOVERY_TRG | idma::IRQ_ENABLE);
        f.handler.handle();
        assert_eq!(f.handler.stats().recoveries, 2);

        f.dpp.poke(dpp::IRQ, dpp::IRQ_FRAMEDONE);
        f.handler.handle();
        assert_eq!(f.handler.stats().recoveries, 0);
        assert_eq!(f.handler.stats().frames, 1);
        assert_eq!(
            drain(&f.pump),
            [
                EventKind::RecoveryTriggered { count: 1 },
                EventKind::RecoveryTriggered { count: 2 },
                EventKind::FrameDone,
            ]
        );
    }

    #[test]
    fn status_is_acknowledged_and_enable_kept() {
        let f = fixture(false);
        f.dma.poke(idma::IRQ, idma::IRQ_FRAMEDONE | idma::IRQ_ENABLE);
        f.handler.handle();
        assert_eq!(f.dma.read(idma::IRQ), idma::IRQ_ENABLE);
        assert!(!f.handler.handle(), "nothing left to handle");
    }

    #[test]
    fn acknowledge_keeps_enable_on_write_one_to_clear_hardware() {
        use crate::io::tests::W1cRegisters;

        let dma_regs = Arc::new(W1cRegisters::default());
        let dpp_regs = Arc::new(W1cRegisters::default());
        let regs = ChannelRegisters {
            dma: dma_regs.clone(),
            dpp: dpp_regs.clone(),
        };
        let shared = Arc::new(IrqShared::default());
        shared.set_on(true);
        let handler = IrqHandler::new(ChannelId(0), regs, false, shared, SharedQueue::default());

        dma_regs.raise(idma::IRQ, idma::IRQ_FRAMEDONE | idma::IRQ_ENABLE);
        dpp_regs.raise(dpp::IRQ, dpp::IRQ_FRAMEDONE | dpp::IRQ_ENABLE);
        assert!(handler.handle(), "handled");
        assert_eq!(dma_regs.read(idma::IRQ), idma::IRQ_ENABLE);
        assert_eq!(dpp_regs.read(dpp::IRQ), dpp::IRQ_ENABLE);

        dma_regs.raise(idma::IRQ, idma::IRQ_FRAMEDONE | idma::IRQ_ENABLE);
        assert!(handler.handle(), "still enabled after the first acknowledge");
        assert_eq!(handler.stats().frames, 2);
    }

    #[test]
    fn read_slave_error_carries_dump() {
        let f = fixture(false);
        f.dma.poke(idma::IN_CON, 0x1234);
        f.dma.poke(idma::IRQ, idma::IRQ_READ_SLAVE_ERROR);
        f.handler.handle();
        let events = drain(&f.pump);
        assert_eq!(events.len(), 1);
        assert!(events[0].is_fatal(), "fatal");
        let dump = events[0].dump().unwrap();
        assert_eq!(dump.dma(idma::IN_CON), Some(0x1234));
        assert_eq!(dump.dma(idma::IRQ), Some(idma::IRQ_READ_SLAVE_ERROR));
        assert_eq!(f.handler.stats().fatal, 1);
    }

    #[test]
    fn writeback_channels_report_write_errors() {
        let f = fixture(true);
        f.dma.poke(idma::IRQ, idma::IRQ_READ_SLAVE_ERROR);
        f.handler.handle();
        assert!(matches!(drain(&f.pump)[0], EventKind::WriteSlaveError(_)));
    }

    #[test]
    fn config_error_decodes_causes() {
        let f = fixture(false);
        f.dma.poke(idma::CFG_ERR_STATE, 1 << 2);
        f.dpp.poke(dpp::CFG_ERR_STATE, 1 << 1);
        f.dpp.poke(dpp::IRQ, dpp::IRQ_CONFIG_ERROR);
        f.handler.handle();
        assert_eq!(
            drain(&f.pump),
            [EventKind::ConfigError {
                dma_state: 1 << 2,
                dpp_state: 1 << 1,
                causes: vec!["img_width", "max_size"],
            }]
        );
        assert_eq!(f.handler.stats().config_errors, 1);
    }

    #[test]
    fn dma_faults_are_not_fatal() {
        let f = fixture(false);
        f.dma
            .poke(idma::IRQ, idma::IRQ_AFBC_CONFLICT | idma::IRQ_SBWC_ERR);
        f.handler.handle();
        assert_eq!(
            drain(&f.pump),
            [
                EventKind::Dma(DmaFault::AfbcConflict),
                EventKind::Dma(DmaFault::Sbwc),
            ]
        );
        assert_eq!(f.handler.stats().fatal, 0);
    }

    #[test]
    fn handler_runs_beside_the_pump() {
        let f = fixture(false);
        let handler = f.handler.clone();
        let dma = f.dma.clone();
        let t = std::thread::spawn(move || {
            for _ in 0..50 {
                dma.poke(idma::IRQ, idma::IRQ_FRAMEDONE);
                handler.handle();
            }
        });
        t.join().unwrap();
        assert_eq!(drain(&f.pump).len(), 50);
        assert_eq!(f.handler.stats().frames, 50);
    }
}
