// Copyright 2026 the DPP Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Register programming sequences.
//!
//! Every function here only writes registers; sequencing against power state,
//! protection and the ring clock is the caller's job.

use std::sync::Arc;

use dpp_core::event::RegisterDump;
use dpp_core::flat::FlatConfig;
use dpp_core::modifier::{Compression, SajcBlock};
use dpp_core::request::{ALPHA_OPAQUE, BlendMode, ColorRange, ColorStandard};

use crate::dirty::Groups;
use crate::io::RegisterIo;
use crate::regs::{self, dpp, idma};

/// Deadlock timer, in core clock cycles.
pub const DEADLOCK_CYCLES: u32 = 0x7fff_ffff;

/// Recoveries the DMA attempts before giving up.
pub const RECOVERY_RETRIES: u32 = 0x8;

/// Register accessors of one channel.
#[derive(Clone)]
pub struct ChannelRegisters {
    /// Input DMA block.
    pub dma: Arc<dyn RegisterIo>,
    /// Pre-processor block.
    pub dpp: Arc<dyn RegisterIo>,
}

impl core::fmt::Debug for ChannelRegisters {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChannelRegisters").finish_non_exhaustive()
    }
}

/// Registers captured by [`dump`].
const DMA_DUMP: [u32; 12] = [
    idma::ENABLE,
    idma::IRQ,
    idma::IN_CON,
    idma::SRC_SIZE,
    idma::SRC_OFFSET,
    idma::IMG_SIZE,
    idma::BASE_ADDR[0],
    idma::BASE_ADDR[1],
    idma::BASE_ADDR[2],
    idma::BASE_ADDR[3],
    idma::SBWC_PARAM,
    idma::CFG_ERR_STATE,
];

const DPP_DUMP: [u32; 8] = [
    dpp::ENABLE,
    dpp::IRQ,
    dpp::IN_CON,
    dpp::IMG_SIZE,
    dpp::SCALED_IMG_SIZE,
    dpp::MAIN_H_RATIO,
    dpp::MAIN_V_RATIO,
    dpp::CFG_ERR_STATE,
];

/// Brings a channel's blocks out of reset with interrupts enabled.
pub fn init(regs: &ChannelRegisters) {
    let d = &*regs.dma;
    d.write(idma::IRQ, idma::ALL_IRQ_CLEAR | idma::IRQ_ENABLE);
    d.write(idma::DYNAMIC_GATING_EN, 0);
    d.write(
        idma::RECOVERY_CTRL,
        idma::recovery_num(RECOVERY_RETRIES) | idma::RECOVERY_EN,
    );
    d.write(
        idma::DEADLOCK_EN,
        idma::deadlock_timer(DEADLOCK_CYCLES) | idma::DEADLOCK_NUM_EN,
    );
    d.update(idma::ENABLE, idma::ALL_CLOCK_GATE_EN, idma::ALL_CLOCK_GATE_EN);

    let p = &*regs.dpp;
    p.write(dpp::IRQ, dpp::ALL_IRQ_CLEAR | dpp::IRQ_ENABLE);
    p.write(dpp::DYNAMIC_GATING_EN, 0);
    p.write(
        dpp::ENABLE,
        dpp::QCHANNEL_EN
            | dpp::SFR_CLOCK_GATE_EN
            | dpp::SRAM_CLOCK_GATE_EN
            | dpp::INT_CLOCK_GATE_EN
            | dpp::PSLVERR_EN,
    );
}

/// Masks and clears interrupts, then resets both blocks.
pub fn deinit(regs: &ChannelRegisters) {
    regs.dma
        .write(idma::IRQ, idma::ALL_IRQ_MASK | idma::ALL_IRQ_CLEAR);
    regs.dpp
        .write(dpp::IRQ, dpp::ALL_IRQ_MASK | dpp::ALL_IRQ_CLEAR);
    regs.dma.write(idma::ENABLE, idma::SRESET);
    regs.dpp.write(dpp::ENABLE, dpp::SRSET);
}

/// Writes the registers in `groups` from `cfg` and latches them.
///
/// `cfg` must have passed [`HwLimits`](crate::regs::HwLimits).
pub fn configure(regs: &ChannelRegisters, cfg: &FlatConfig, groups: Groups) {
    if groups.is_empty() {
        return;
    }
    if groups.contains(Groups::GEOMETRY) {
        geometry(regs, cfg);
    }
    if groups.contains(Groups::FORMAT) {
        format(regs, cfg);
    }
    if groups.contains(Groups::ADDRESS) {
        for (reg, addr) in idma::BASE_ADDR.into_iter().zip(cfg.addr) {
            regs.dma.write(reg, lo32(addr));
        }
    }
    if groups.contains(Groups::SCALER) {
        regs.dpp.write(dpp::MAIN_H_RATIO, cfg.h_ratio & 0xff_ffff);
        regs.dpp.write(dpp::MAIN_V_RATIO, cfg.v_ratio & 0xff_ffff);
    }
    if groups.contains(Groups::COLOR) {
        regs.dpp
            .update(dpp::IN_CON, csc(cfg), dpp::IN_CON_CSC_MASK);
    }
    regs.dma
        .update(idma::ENABLE, idma::SFR_UPDATE_FORCE, idma::SFR_UPDATE_FORCE);
    regs.dpp
        .update(dpp::ENABLE, dpp::SFR_UPDATE_FORCE, dpp::SFR_UPDATE_FORCE);
}

/// Snapshot of the registers worth inspecting after a fatal error.
#[must_use]
pub fn dump(regs: &ChannelRegisters) -> RegisterDump {
    RegisterDump {
        dma: DMA_DUMP.iter().map(|&o| (o, regs.dma.read(o))).collect(),
        dpp: DPP_DUMP.iter().map(|&o| (o, regs.dpp.read(o))).collect(),
    }
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

fn geometry(regs: &ChannelRegisters, cfg: &FlatConfig) {
    let s = &cfg.src;
    let d = &*regs.dma;
    d.write(idma::SRC_SIZE, regs::size(s.f_w, s.f_h, 0xffff));
    d.write(idma::SRC_OFFSET, regs::size(s.x, s.y, 0x3fff));
    d.write(idma::IMG_SIZE, regs::size(s.w, s.h, 0x3fff));
    match cfg.block {
        Some(b) => {
            d.write(idma::BLOCK_OFFSET, regs::size(b.x, b.y, 0x3fff));
            d.write(idma::BLOCK_SIZE, regs::size(b.w, b.h, 0x3fff));
        }
        None => {
            d.write(idma::BLOCK_OFFSET, 0);
            d.write(idma::BLOCK_SIZE, 0);
        }
    }

    let (w, h) = cfg.oriented_src_size();
    regs.dpp.write(dpp::IMG_SIZE, regs::size(w, h, 0x1fff));
    regs.dpp
        .write(dpp::SCALED_IMG_SIZE, regs::size(cfg.dst.w, cfg.dst.h, 0x3fff));
}

fn format(regs: &ChannelRegisters, cfg: &FlatConfig) {
    let f = cfg.format;
    let mut in_con = idma::in_con_format(f.dma_code.map_or(0, u32::from))
        | idma::in_con_rotation(regs::rotation_code(cfg))
        | idma::in_con_pixel_alpha(u32::from(cfg.alpha >> 8));
    let mut sbwc = 0;
    match cfg.compression {
        Compression::None => {}
        Compression::Afbc => in_con |= idma::IN_CON_AFBC_EN,
        Compression::Sajc(blk) => {
            in_con |= idma::IN_CON_SAJC_EN;
            sbwc = idma::sbwc_param(0, sajc_code(blk));
        }
        Compression::SbwcLossless => {
            in_con |= idma::IN_CON_SBWC_EN;
            sbwc = idma::SBWC_CRC_EN;
        }
        Compression::SbwcLossy(blk) => {
            in_con |= idma::IN_CON_SBWC_EN | idma::IN_CON_SBWC_LOSSY;
            sbwc = idma::sbwc_param(blk.byte_num(), 0);
        }
    }
    if cfg.block.is_some() {
        in_con |= idma::IN_CON_BLOCK_EN;
    }
    regs.dma.write(idma::IN_CON, in_con);
    regs.dma.write(idma::SBWC_PARAM, sbwc);

    let mut dpp_con = dpp::in_con_format(f.dpp_code.map_or(0, u32::from));
    if cfg.alpha != ALPHA_OPAQUE {
        dpp_con |= dpp::IN_CON_ALPHA_SEL;
    }
    if cfg.blend == BlendMode::Premultiplied && f.has_alpha() {
        dpp_con |= dpp::IN_CON_PREMULTIPLY_EN;
    }
    regs.dpp
        .update(dpp::IN_CON, dpp_con, dpp::IN_CON_FORMAT_MASK);
}

const fn sajc_code(blk: SajcBlock) -> u32 {
    match blk {
        SajcBlock::W16H16 => 0,
        SajcBlock::W32H8 => 1,
        SajcBlock::W64H4 => 2,
    }
}

fn csc(cfg: &FlatConfig) -> u32 {
    if !cfg.format.color.is_yuv() {
        return 0;
    }
    let standard = match cfg.color.standard {
        ColorStandard::Bt601 => 0,
        ColorStandard::Bt709 => 1,
        ColorStandard::Bt2020 => 2,
        ColorStandard::DciP3 => 3,
    };
    let range = match cfg.color.range {
        ColorRange::Limited => 0,
        ColorRange::Full => dpp::IN_CON_CSC_RANGE_FULL,
    };
    dpp::in_con_csc_type(standard) | range
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "structural limits keep addresses within 32 bits"
)]
const fn lo32(addr: u64) -> u32 {
    addr as u32
}
