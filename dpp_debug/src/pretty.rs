// Copyright 2026 the DPP Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use dpp_core::event::{EventKind, HardwareEvent, RegisterDump};
use dpp_core::trace::{
    ApplyEvent, CheckEvent, ClockEvent, ProtectionEvent, StateChangeEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the destination.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn dump(&mut self, d: &RegisterDump) {
        for (block, regs) in [("dma", &d.dma), ("dpp", &d.dpp)] {
            for &(off, val) in regs {
                let _ = writeln!(self.writer, "    {block}[{off:#06x}] = {val:#010x}");
            }
        }
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_check(&mut self, e: &CheckEvent) {
        let _ = match &e.result {
            Ok(()) => writeln!(self.writer, "[check] {} ok", e.channel),
            Err(r) => writeln!(self.writer, "[check] {} rejected: {r}", e.channel),
        };
    }

    fn on_state_change(&mut self, e: &StateChangeEvent) {
        let _ = writeln!(self.writer, "[state] {} {} -> {}", e.channel, e.from, e.to);
    }

    fn on_protection(&mut self, e: &ProtectionEvent) {
        let _ = writeln!(
            self.writer,
            "[protection] {} {} {}",
            e.channel,
            if e.enable { "enable" } else { "disable" },
            if e.accepted { "accepted" } else { "refused" },
        );
    }

    fn on_apply(&mut self, e: &ApplyEvent) {
        let _ = writeln!(
            self.writer,
            "[apply] {} groups={:#04x} protected={}",
            e.channel, e.groups, e.protected,
        );
    }

    fn on_clock(&mut self, e: &ClockEvent) {
        let _ = writeln!(self.writer, "[clock] block={} refs={}", e.block.0, e.refs);
    }

    fn on_hardware_event(&mut self, e: &HardwareEvent) {
        let name = e.kind.name();
        let _ = match &e.kind {
            EventKind::RecoveryTriggered { count } => {
                writeln!(self.writer, "[hw] {} {name} count={count}", e.channel)
            }
            EventKind::ConfigError {
                dma_state,
                dpp_state,
                causes,
            } => writeln!(
                self.writer,
                "[hw] {} {name} dma={dma_state:#x} dpp={dpp_state:#x} causes={}",
                e.channel,
                causes.join(","),
            ),
            EventKind::Dma(fault) => writeln!(self.writer, "[hw] {} {name} {fault:?}", e.channel),
            EventKind::ReadSlaveError(d) | EventKind::WriteSlaveError(d) | EventKind::Deadlock(d) => {
                let r = writeln!(self.writer, "[hw] {} {name} (fatal)", e.channel);
                self.dump(d);
                r
            }
            EventKind::FrameDone => writeln!(self.writer, "[hw] {} {name}", e.channel),
        };
    }
}
