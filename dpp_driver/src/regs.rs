// Copyright 2026 the DPP Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Register map for the input DMA and pre-processor blocks.
//!
//! Only the registers the programmer touches are described. Offsets are
//! relative to each block's base.

use dpp_core::flat::FlatConfig;
use dpp_core::format::ColorModel;
use dpp_core::validate::{StructuralCheck, StructuralFault};

/// Input DMA registers.
pub mod idma {
    /// Enable and operation status.
    pub const ENABLE: u32 = 0x0;
    /// Interrupt status, mask, and enable.
    pub const IRQ: u32 = 0x4;
    /// Input control: format, rotation, compression.
    pub const IN_CON: u32 = 0x8;
    /// Framebuffer size.
    pub const SRC_SIZE: u32 = 0x10;
    /// Crop offset.
    pub const SRC_OFFSET: u32 = 0x14;
    /// Crop size.
    pub const IMG_SIZE: u32 = 0x18;
    /// Block skip offset.
    pub const BLOCK_OFFSET: u32 = 0x20;
    /// Block skip size.
    pub const BLOCK_SIZE: u32 = 0x24;
    /// Base addresses in slot order Y8, C8, Y2, C2.
    pub const BASE_ADDR: [u32; 4] = [0x40, 0x44, 0x48, 0x4c];
    /// SBWC parameters.
    pub const SBWC_PARAM: u32 = 0x64;
    /// Recovery control.
    pub const RECOVERY_CTRL: u32 = 0x70;
    /// Deadlock detection.
    pub const DEADLOCK_EN: u32 = 0x100;
    /// Dynamic clock gating.
    pub const DYNAMIC_GATING_EN: u32 = 0x140;
    /// Configuration error state.
    pub const CFG_ERR_STATE: u32 = 0xb30;

    /// Software reset.
    pub const SRESET: u32 = 1 << 24;
    /// Forces shadow register update.
    pub const SFR_UPDATE_FORCE: u32 = 1 << 4;
    /// Clock gating enables for SFR, SRAM and internal logic.
    pub const ALL_CLOCK_GATE_EN: u32 = 0x7 << 8;

    /// Address outside the bus aperture.
    pub const IRQ_AXI_ADDR_ERR: u32 = 1 << 26;
    /// AFBC conflict.
    pub const IRQ_AFBC_CONFLICT: u32 = 1 << 25;
    /// Rotation buffer conflict.
    pub const IRQ_VR_CONFLICT: u32 = 1 << 24;
    /// SBWC decoding error.
    pub const IRQ_SBWC_ERR: u32 = 1 << 23;
    /// Recovery started.
    pub const IRQ_RECOVERY_TRG: u32 = 1 << 22;
    /// Configuration error.
    pub const IRQ_CONFIG_ERROR: u32 = 1 << 21;
    /// Local hardware reset finished.
    pub const IRQ_LOCAL_HW_RESET_DONE: u32 = 1 << 20;
    /// Read-slave (or write-slave) error.
    pub const IRQ_READ_SLAVE_ERROR: u32 = 1 << 19;
    /// Deadlock detected.
    pub const IRQ_DEADLOCK: u32 = 1 << 17;
    /// Frame finished.
    pub const IRQ_FRAMEDONE: u32 = 1 << 16;
    /// Every status bit.
    pub const ALL_IRQ_CLEAR: u32 = 0x7fb << 16;
    /// Every mask bit.
    pub const ALL_IRQ_MASK: u32 = 0x7fb << 1;
    /// Global interrupt enable.
    pub const IRQ_ENABLE: u32 = 1 << 0;

    /// Lossy SBWC.
    pub const IN_CON_SBWC_LOSSY: u32 = 1 << 14;
    /// SAJC decoding.
    pub const IN_CON_SAJC_EN: u32 = 1 << 3;
    /// SBWC decoding.
    pub const IN_CON_SBWC_EN: u32 = 1 << 2;
    /// AFBC decoding.
    pub const IN_CON_AFBC_EN: u32 = 1 << 1;
    /// Block skipping.
    pub const IN_CON_BLOCK_EN: u32 = 1 << 0;

    /// Format code field.
    #[must_use]
    pub const fn in_con_format(code: u32) -> u32 {
        (code & 0x3f) << 8
    }

    /// Rotation field: bit 0 x-flip, bit 1 y-flip, bit 2 rotate-90.
    #[must_use]
    pub const fn in_con_rotation(code: u32) -> u32 {
        (code & 0x7) << 4
    }

    /// Plane alpha field.
    #[must_use]
    pub const fn in_con_pixel_alpha(alpha: u32) -> u32 {
        (alpha & 0xff) << 24
    }

    /// SBWC CRC check enable.
    pub const SBWC_CRC_EN: u32 = 1 << 16;

    /// SBWC lossy byte budget for chroma and luma plus block sizes.
    #[must_use]
    pub const fn sbwc_param(byte_num: u32, blk_size: u32) -> u32 {
        ((byte_num & 0x7) << 8) | ((byte_num & 0x7) << 4) | ((blk_size & 0x3) << 2) | (blk_size & 0x3)
    }

    /// Recovery enable.
    pub const RECOVERY_EN: u32 = 1 << 0;

    /// Recovery retry count field.
    #[must_use]
    pub const fn recovery_num(n: u32) -> u32 {
        (n & 0x7fff_ffff) << 1
    }

    /// Deadlock detection enable.
    pub const DEADLOCK_NUM_EN: u32 = 1 << 0;

    /// Deadlock timer field, in cycles.
    #[must_use]
    pub const fn deadlock_timer(cycles: u32) -> u32 {
        (cycles & 0x7fff_ffff) << 1
    }

    /// Configuration error state bit names, highest bit first.
    pub const CFG_ERR_BITS: [(u32, &str); 21] = [
        (21, "rotation"),
        (20, "img_height_rotation"),
        (18, "afbc"),
        (17, "sbwc"),
        (16, "block"),
        (15, "format"),
        (14, "stride3"),
        (13, "stride2"),
        (12, "stride1"),
        (11, "stride0"),
        (10, "chroma_stride"),
        (9, "base_addr_c2"),
        (8, "base_addr_y2"),
        (7, "base_addr_c8"),
        (6, "base_addr_y8"),
        (5, "src_offset_y"),
        (4, "src_offset_x"),
        (3, "img_height"),
        (2, "img_width"),
        (1, "src_height"),
        (0, "src_width"),
    ];
}

/// Pre-processor registers.
pub mod dpp {
    /// Enable, clock gating, and software reset.
    pub const ENABLE: u32 = 0x0;
    /// Interrupt status, mask, and enable.
    pub const IRQ: u32 = 0x4;
    /// Input control: format, alpha, color conversion.
    pub const IN_CON: u32 = 0x8;
    /// Image size entering the scaler.
    pub const IMG_SIZE: u32 = 0x18;
    /// Image size leaving the scaler.
    pub const SCALED_IMG_SIZE: u32 = 0x2c;
    /// Horizontal scale ratio.
    pub const MAIN_H_RATIO: u32 = 0x44;
    /// Vertical scale ratio.
    pub const MAIN_V_RATIO: u32 = 0x48;
    /// Dynamic clock gating.
    pub const DYNAMIC_GATING_EN: u32 = 0xa54;
    /// Configuration error state.
    pub const CFG_ERR_STATE: u32 = 0xd08;

    /// Software reset.
    pub const SRSET: u32 = 1 << 24;
    /// SFR clock gating.
    pub const SFR_CLOCK_GATE_EN: u32 = 1 << 10;
    /// SRAM clock gating.
    pub const SRAM_CLOCK_GATE_EN: u32 = 1 << 9;
    /// Internal clock gating.
    pub const INT_CLOCK_GATE_EN: u32 = 1 << 8;
    /// Error response on bad register access.
    pub const PSLVERR_EN: u32 = 1 << 5;
    /// Forces shadow register update.
    pub const SFR_UPDATE_FORCE: u32 = 1 << 4;
    /// Q-channel power handshake.
    pub const QCHANNEL_EN: u32 = 1 << 3;
    /// Operation in progress.
    pub const OP_STATUS: u32 = 1 << 2;

    /// Configuration error.
    pub const IRQ_CONFIG_ERROR: u32 = 1 << 21;
    /// Frame finished.
    pub const IRQ_FRAMEDONE: u32 = 1 << 16;
    /// Every status bit.
    pub const ALL_IRQ_CLEAR: u32 = 0x21 << 16;
    /// Every mask bit.
    pub const ALL_IRQ_MASK: u32 = 0x21 << 1;
    /// Global interrupt enable.
    pub const IRQ_ENABLE: u32 = 1 << 0;

    /// Color conversion fields.
    pub const IN_CON_CSC_MASK: u32 = 0xf << 16;
    /// Alpha and format fields.
    pub const IN_CON_FORMAT_MASK: u32 = (1 << 6) | (1 << 3) | 0x7;
    /// Premultiplied alpha.
    pub const IN_CON_PREMULTIPLY_EN: u32 = 1 << 6;
    /// Use plane alpha instead of pixel alpha.
    pub const IN_CON_ALPHA_SEL: u32 = 1 << 3;

    /// Color standard field.
    #[must_use]
    pub const fn in_con_csc_type(standard: u32) -> u32 {
        (standard & 0x3) << 18
    }

    /// Full-range conversion.
    pub const IN_CON_CSC_RANGE_FULL: u32 = 1 << 17;

    /// Format code field.
    #[must_use]
    pub const fn in_con_format(code: u32) -> u32 {
        code & 0x7
    }

    /// Configuration error state bit names.
    pub const CFG_ERR_BITS: [(u32, &str); 5] = [
        (4, "scl_pos"),
        (3, "scale_ratio"),
        (2, "odd_size"),
        (1, "max_size"),
        (0, "min_size"),
    ];
}

/// Packs a width and height into one `(h << 16) | w` register.
#[must_use]
pub const fn size(w: u32, h: u32, mask: u32) -> u32 {
    ((h & mask) << 16) | (w & mask)
}

/// Hardware rotation field code.
#[must_use]
pub const fn rotation_code(cfg: &FlatConfig) -> u32 {
    let r = cfg.rotation;
    (r.x_flip as u32) | ((r.y_flip as u32) << 1) | ((r.rot90 as u32) << 2)
}

/// Names of the bits set in the two configuration error states.
#[must_use]
pub fn config_error_causes(dma_state: u32, dpp_state: u32) -> Vec<&'static str> {
    let dma = idma::CFG_ERR_BITS
        .iter()
        .filter(|&&(bit, _)| dma_state & (1 << bit) != 0);
    let dpp = dpp::CFG_ERR_BITS
        .iter()
        .filter(|&&(bit, _)| dpp_state & (1 << bit) != 0);
    dma.chain(dpp).map(|&(_, name)| name).collect()
}

// ---------------------------------------------------------------------------
// Structural limits
// ---------------------------------------------------------------------------

const SRC_SIZE_MAX: u32 = 0xffff;
const IMG_FIELD_MAX: u32 = 0x3fff;
const DPP_IMG_MAX: u32 = 0x1fff;
const RATIO_MAX: u32 = 0xff_ffff;

/// Register field widths and encodings the generic validator cannot see.
#[derive(Clone, Copy, Debug, Default)]
pub struct HwLimits;

fn fits(what: &'static str, value: u32, max: u32) -> Result<(), StructuralFault> {
    if value <= max {
        Ok(())
    } else {
        Err(StructuralFault {
            what,
            value: u64::from(value),
        })
    }
}

impl StructuralCheck for HwLimits {
    fn check(&self, cfg: &FlatConfig) -> Result<(), StructuralFault> {
        if cfg.format.dma_code.is_none() || cfg.format.dpp_code.is_none() {
            return Err(StructuralFault {
                what: "format has no hardware code",
                value: u64::from(cfg.format.fourcc.0),
            });
        }
        if cfg.compression.is_sbwc() && cfg.format.color != ColorModel::Yuv420 {
            return Err(StructuralFault {
                what: "SBWC needs a 4:2:0 format",
                value: u64::from(cfg.format.fourcc.0),
            });
        }

        let src = &cfg.src;
        fits("source frame width", src.f_w, SRC_SIZE_MAX)?;
        fits("source frame height", src.f_h, SRC_SIZE_MAX)?;
        fits("source x", src.x, IMG_FIELD_MAX)?;
        fits("source y", src.y, IMG_FIELD_MAX)?;
        fits("source width", src.w, IMG_FIELD_MAX)?;
        fits("source height", src.h, IMG_FIELD_MAX)?;
        fits("source right edge", src.x.saturating_add(src.w), src.f_w)?;
        fits("source bottom edge", src.y.saturating_add(src.h), src.f_h)?;

        let (w, h) = cfg.oriented_src_size();
        fits("scaler input width", w, DPP_IMG_MAX)?;
        fits("scaler input height", h, DPP_IMG_MAX)?;
        fits("scaler output width", cfg.dst.w, IMG_FIELD_MAX)?;
        fits("scaler output height", cfg.dst.h, IMG_FIELD_MAX)?;
        fits("horizontal ratio", cfg.h_ratio, RATIO_MAX)?;
        fits("vertical ratio", cfg.v_ratio, RATIO_MAX)?;

        if let Some(blk) = &cfg.block {
            fits("block right edge", blk.x.saturating_add(blk.w), src.w)?;
            fits("block bottom edge", blk.y.saturating_add(blk.h), src.h)?;
        }

        for addr in cfg.addr {
            if addr > u64::from(u32::MAX) {
                return Err(StructuralFault {
                    what: "base address above 32 bits",
                    value: addr,
                });
            }
        }
        Ok(())
    }
}
