// Copyright 2026 the DPP Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Register access.
//!
//! [`RegisterIo`] takes `&self` like memory-mapped I/O does, so one block's
//! accessor can be shared between the configuration path and the interrupt
//! handler.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// 32-bit register accessor for one hardware block.
pub trait RegisterIo: Send + Sync {
    /// Reads the register at `offset`.
    fn read(&self, offset: u32) -> u32;

    /// Writes `value` to the register at `offset`.
    fn write(&self, offset: u32, value: u32);

    /// Replaces the bits selected by `mask` with those of `value`.
    fn update(&self, offset: u32, value: u32, mask: u32) {
        let old = self.read(offset);
        self.write(offset, (old & !mask) | (value & mask));
    }

    /// Acknowledges the status `bits` of a register whose `status` field is
    /// write-one-to-clear.
    ///
    /// Bits outside `status` are written back unchanged; other pending status
    /// bits are written as zero and stay pending.
    fn clear(&self, offset: u32, bits: u32, status: u32) {
        let old = self.read(offset);
        self.write(offset, (old & !status) | (bits & status));
    }
}

/// Register file backed by a map, for tests and offline replay.
///
/// Unwritten registers read as zero.
#[derive(Debug, Default)]
pub struct MemoryRegisters {
    regs: Mutex<BTreeMap<u32, u32>>,
    writes: AtomicU64,
}

impl MemoryRegisters {
    /// Creates an empty register file.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of writes since creation.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// All written registers in offset order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(u32, u32)> {
        let regs = self.regs.lock().unwrap_or_else(PoisonError::into_inner);
        regs.iter().map(|(&o, &v)| (o, v)).collect()
    }

    /// Sets a register without counting it as a driver write.
    ///
    /// Models the hardware raising status bits.
    pub fn poke(&self, offset: u32, value: u32) {
        let mut regs = self.regs.lock().unwrap_or_else(PoisonError::into_inner);
        regs.insert(offset, value);
    }
}

impl RegisterIo for MemoryRegisters {
    fn read(&self, offset: u32) -> u32 {
        let regs = self.regs.lock().unwrap_or_else(PoisonError::into_inner);
        regs.get(&offset).copied().unwrap_or(0)
    }

    fn write(&self, offset: u32, value: u32) {
        let mut regs = self.regs.lock().unwrap_or_else(PoisonError::into_inner);
        regs.insert(offset, value);
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    fn clear(&self, offset: u32, bits: u32, status: u32) {
        let mut regs = self.regs.lock().unwrap_or_else(PoisonError::into_inner);
        let v = regs.entry(offset).or_insert(0);
        *v &= !(bits & status);
        self.writes.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    const STATUS: u32 = 0xffff_0000;

    /// Register file whose upper half is write-one-to-clear, using the
    /// default [`RegisterIo::clear`].
    #[derive(Debug, Default)]
    pub(crate) struct W1cRegisters(MemoryRegisters);

    impl W1cRegisters {
        pub(crate) fn raise(&self, offset: u32, value: u32) {
            self.0.poke(offset, value);
        }
    }

    impl RegisterIo for W1cRegisters {
        fn read(&self, offset: u32) -> u32 {
            self.0.read(offset)
        }

        fn write(&self, offset: u32, value: u32) {
            let pending = self.0.read(offset) & STATUS & !value;
            self.0.write(offset, (value & !STATUS) | pending);
        }
    }

    #[test]
    fn unwritten_reads_zero() {
        let regs = MemoryRegisters::new();
        assert_eq!(regs.read(0x40), 0);
        assert_eq!(regs.write_count(), 0);
    }

    #[test]
    fn update_preserves_unmasked_bits() {
        let regs = MemoryRegisters::new();
        regs.write(0x8, 0xff00_00ff);
        regs.update(0x8, 0x0000_1234, 0x0000_ffff);
        assert_eq!(regs.read(0x8), 0xff00_1234);
        assert_eq!(regs.write_count(), 2);
    }

    #[test]
    fn clear_drops_only_acknowledged_bits() {
        let regs = MemoryRegisters::new();
        regs.poke(0x4, (1 << 16) | (1 << 17) | 1);
        regs.clear(0x4, 1 << 16, STATUS);
        assert_eq!(regs.read(0x4), (1 << 17) | 1);
    }

    #[test]
    fn default_clear_keeps_control_bits() {
        let regs = W1cRegisters::default();
        regs.raise(0x4, (1 << 16) | (1 << 17) | (0b110 << 1) | 1);
        regs.clear(0x4, 1 << 16, STATUS);
        assert_eq!(regs.read(0x4), (1 << 17) | (0b110 << 1) | 1);
        regs.clear(0x4, 1 << 17, STATUS);
        assert_eq!(regs.read(0x4), (0b110 << 1) | 1);
    }

    #[test]
    fn poke_is_not_a_driver_write() {
        let regs = MemoryRegisters::new();
        regs.poke(0x4, 1 << 16);
        assert_eq!(regs.read(0x4), 1 << 16);
        assert_eq!(regs.write_count(), 0);
        assert_eq!(regs.snapshot(), [(0x4, 1 << 16)]);
    }
}
