// Copyright 2026 the DPP Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as little-endian records, each stamped with the nanoseconds
//! elapsed since the recorder was created. [`decode`] reads them back as an
//! iterator of [`Record`].
//!
//! Rejections are stored by kind only, and configuration-error causes are not
//! stored; both are recovered from the raw states where needed.

use std::time::Instant;

use dpp_core::event::{DmaFault, EventKind, HardwareEvent, PowerState, RegisterDump};
use dpp_core::id::{BlockId, ChannelId};
use dpp_core::trace::{
    ApplyEvent, CheckEvent, ClockEvent, ProtectionEvent, StateChangeEvent, TraceSink,
};
use dpp_core::validate::Rejection;

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_CHECK: u8 = 1;
const TAG_STATE_CHANGE: u8 = 2;
const TAG_PROTECTION: u8 = 3;
const TAG_APPLY: u8 = 4;
const TAG_CLOCK: u8 = 5;
const TAG_HARDWARE: u8 = 6;

const HW_FRAME_DONE: u8 = 0;
const HW_RECOVERY: u8 = 1;
const HW_CONFIG_ERROR: u8 = 2;
const HW_READ_SLAVE: u8 = 3;
const HW_WRITE_SLAVE: u8 = 4;
const HW_DEADLOCK: u8 = 5;
const HW_DMA: u8 = 6;

/// Rejection kinds, indexed by their recorded code.
const REJECTIONS: [&str; 9] = [
    "scale-out-of-range",
    "scaling-unsupported",
    "misaligned",
    "dimension-out-of-range",
    "unsupported-compression",
    "unsupported-rotation",
    "unsupported-format",
    "structural",
    "block-unsupported",
];

/// Short kebab-case name of a rejection kind.
#[must_use]
pub fn rejection_kind(r: &Rejection) -> &'static str {
    REJECTIONS[usize::from(rejection_code(r))]
}

fn rejection_code(r: &Rejection) -> u8 {
    match r {
        Rejection::ScaleOutOfRange { .. } => 0,
        Rejection::ScalingUnsupported => 1,
        Rejection::Misaligned { .. } => 2,
        Rejection::DimensionOutOfRange { .. } => 3,
        Rejection::UnsupportedCompression(_) => 4,
        Rejection::UnsupportedRotation(_) => 5,
        Rejection::UnsupportedFormat(_) => 6,
        Rejection::Structural(_) => 7,
        Rejection::BlockUnsupported => 8,
    }
}

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug)]
pub struct RecorderSink {
    buf: Vec<u8>,
    origin: Instant,
}

impl Default for RecorderSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RecorderSink {
    /// Creates an empty recorder; timestamps count from now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            origin: Instant::now(),
        }
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn begin(&mut self, tag: u8) {
        let ns = u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX);
        self.write_u8(tag);
        self.write_u64(ns);
    }

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_bool(&mut self, v: bool) {
        self.buf.push(u8::from(v));
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_power(&mut self, p: PowerState) {
        self.write_u8(match p {
            PowerState::Off => 0,
            PowerState::On => 1,
        });
    }

    fn write_regs(&mut self, regs: &[(u32, u32)]) {
        let n = u32::try_from(regs.len()).unwrap_or(u32::MAX);
        self.write_u32(n);
        for &(off, val) in regs.iter().take(n as usize) {
            self.write_u32(off);
            self.write_u32(val);
        }
    }

    fn write_dump(&mut self, d: &RegisterDump) {
        self.write_regs(&d.dma);
        self.write_regs(&d.dpp);
    }
}

impl TraceSink for RecorderSink {
    fn on_check(&mut self, e: &CheckEvent) {
        self.begin(TAG_CHECK);
        self.write_u32(e.channel.0);
        match &e.result {
            Ok(()) => self.write_u8(0xff),
            Err(r) => self.write_u8(rejection_code(r)),
        }
    }

    fn on_state_change(&mut self, e: &StateChangeEvent) {
        self.begin(TAG_STATE_CHANGE);
        self.write_u32(e.channel.0);
        self.write_power(e.from);
        self.write_power(e.to);
    }

    fn on_protection(&mut self, e: &ProtectionEvent) {
        self.begin(TAG_PROTECTION);
        self.write_u32(e.channel.0);
        self.write_bool(e.enable);
        self.write_bool(e.accepted);
    }

    fn on_apply(&mut self, e: &ApplyEvent) {
        self.begin(TAG_APPLY);
        self.write_u32(e.channel.0);
        self.write_u32(e.groups);
        self.write_bool(e.protected);
    }

    fn on_clock(&mut self, e: &ClockEvent) {
        self.begin(TAG_CLOCK);
        self.write_u32(e.block.0);
        self.write_u32(e.refs);
    }

    fn on_hardware_event(&mut self, e: &HardwareEvent) {
        self.begin(TAG_HARDWARE);
        self.write_u32(e.channel.0);
        match &e.kind {
            EventKind::FrameDone => self.write_u8(HW_FRAME_DONE),
            EventKind::RecoveryTriggered { count } => {
                self.write_u8(HW_RECOVERY);
                self.write_u32(*count);
            }
            EventKind::ConfigError {
                dma_state,
                dpp_state,
                ..
            } => {
                self.write_u8(HW_CONFIG_ERROR);
                self.write_u32(*dma_state);
                self.write_u32(*dpp_state);
            }
            EventKind::ReadSlaveError(d) => {
                self.write_u8(HW_READ_SLAVE);
                self.write_dump(d);
            }
            EventKind::WriteSlaveError(d) => {
                self.write_u8(HW_WRITE_SLAVE);
                self.write_dump(d);
            }
            EventKind::Deadlock(d) => {
                self.write_u8(HW_DEADLOCK);
                self.write_dump(d);
            }
            EventKind::Dma(fault) => {
                self.write_u8(HW_DMA);
                self.write_u8(match fault {
                    DmaFault::AxiAddress => 0,
                    DmaFault::AfbcConflict => 1,
                    DmaFault::VrConflict => 2,
                    DmaFault::Sbwc => 3,
                });
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// A [`CheckEvent`]; `rejection` is the [`rejection_kind`] on failure.
    Check {
        /// Channel that was checked.
        channel: ChannelId,
        /// Kind of rejection, `None` when the check passed.
        rejection: Option<&'static str>,
    },
    /// A [`StateChangeEvent`].
    StateChange(StateChangeEvent),
    /// A [`ProtectionEvent`].
    Protection(ProtectionEvent),
    /// An [`ApplyEvent`].
    Apply(ApplyEvent),
    /// A [`ClockEvent`].
    Clock(ClockEvent),
    /// A [`HardwareEvent`]; configuration-error causes are empty.
    Hardware(HardwareEvent),
}

/// One decoded record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    /// Nanoseconds since the recorder was created.
    pub at_ns: u64,
    /// The event.
    pub event: RecordedEvent,
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`Record`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded records.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_bool(&mut self) -> Option<bool> {
        Some(self.read_u8()? != 0)
    }

    fn read_u32(&mut self) -> Option<u32> {
        if self.remaining() < 4 {
            return None;
        }
        let v = u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().ok()?);
        self.pos += 4;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_power(&mut self) -> Option<PowerState> {
        Some(match self.read_u8()? {
            0 => PowerState::Off,
            _ => PowerState::On,
        })
    }

    fn read_regs(&mut self) -> Option<Vec<(u32, u32)>> {
        let n = usize::try_from(self.read_u32()?).ok()?;
        if self.remaining() < n.checked_mul(8)? {
            return None;
        }
        let mut regs = Vec::with_capacity(n);
        for _ in 0..n {
            regs.push((self.read_u32()?, self.read_u32()?));
        }
        Some(regs)
    }

    fn read_dump(&mut self) -> Option<RegisterDump> {
        Some(RegisterDump {
            dma: self.read_regs()?,
            dpp: self.read_regs()?,
        })
    }

    fn decode_check(&mut self) -> Option<RecordedEvent> {
        let channel = ChannelId(self.read_u32()?);
        let code = self.read_u8()?;
        Some(RecordedEvent::Check {
            channel,
            rejection: REJECTIONS.get(usize::from(code)).copied(),
        })
    }

    fn decode_state_change(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::StateChange(StateChangeEvent {
            channel: ChannelId(self.read_u32()?),
            from: self.read_power()?,
            to: self.read_power()?,
        }))
    }

    fn decode_protection(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Protection(ProtectionEvent {
            channel: ChannelId(self.read_u32()?),
            enable: self.read_bool()?,
            accepted: self.read_bool()?,
        }))
    }

    fn decode_apply(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Apply(ApplyEvent {
            channel: ChannelId(self.read_u32()?),
            groups: self.read_u32()?,
            protected: self.read_bool()?,
        }))
    }

    fn decode_clock(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Clock(ClockEvent {
            block: BlockId(self.read_u32()?),
            refs: self.read_u32()?,
        }))
    }

    fn decode_hardware(&mut self) -> Option<RecordedEvent> {
        let channel = ChannelId(self.read_u32()?);
        let kind = match self.read_u8()? {
            HW_FRAME_DONE => EventKind::FrameDone,
            HW_RECOVERY => EventKind::RecoveryTriggered {
                count: self.read_u32()?,
            },
            HW_CONFIG_ERROR => EventKind::ConfigError {
                dma_state: self.read_u32()?,
                dpp_state: self.read_u32()?,
                causes: Vec::new(),
            },
            HW_READ_SLAVE => EventKind::ReadSlaveError(self.read_dump()?),
            HW_WRITE_SLAVE => EventKind::WriteSlaveError(self.read_dump()?),
            HW_DEADLOCK => EventKind::Deadlock(self.read_dump()?),
            HW_DMA => EventKind::Dma(match self.read_u8()? {
                0 => DmaFault::AxiAddress,
                1 => DmaFault::AfbcConflict,
                2 => DmaFault::VrConflict,
                _ => DmaFault::Sbwc,
            }),
            _ => return None,
        };
        Some(RecordedEvent::Hardware(HardwareEvent { channel, kind }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = Record;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        let at_ns = self.read_u64()?;
        let event = match tag {
            TAG_CHECK => self.decode_check(),
            TAG_STATE_CHANGE => self.decode_state_change(),
            TAG_PROTECTION => self.decode_protection(),
            TAG_APPLY => self.decode_apply(),
            TAG_CLOCK => self.decode_clock(),
            TAG_HARDWARE => self.decode_hardware(),
            _ => None, // unknown tag → stop iteration
        }?;
        Some(Record { at_ns, event })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
