// Copyright 2026 the DPP Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Configuration validation.
//!
//! Checks run in a fixed order and the first failure is reported:
//!
//! 1. scale ratio bounds, then the SCALE capability
//! 2. alignment (source geometry scaled by the format's `align_factor`)
//! 3. dimension ranges (rotated source height maximum under a quarter turn)
//! 4. capability cross-check (compression, rotation, color conversion)
//! 5. register-layer structural check, through [`StructuralCheck`]
//!
//! A config that passes every step is wrapped in a [`ValidatedConfig`], the
//! only form the register programmer accepts.

use core::fmt;

use crate::caps::Capabilities;
use crate::flat::{FlatConfig, SCALE_ONE};
use crate::modifier::{Compression, CompressionKind};
use crate::restriction::{Range, Restriction};
use crate::rotation::HwRotation;

/// Scaling direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Width.
    Horizontal,
    /// Height.
    Vertical,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
        })
    }
}

/// A checked configuration field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[expect(missing_docs, reason = "variants are named after their fields")]
pub enum Field {
    SrcX,
    SrcY,
    SrcW,
    SrcH,
    SrcFullW,
    SrcFullH,
    DstX,
    DstY,
    DstW,
    DstH,
    DstFullW,
    DstFullH,
    BlockX,
    BlockY,
    BlockW,
    BlockH,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SrcX => "src.x",
            Self::SrcY => "src.y",
            Self::SrcW => "src.w",
            Self::SrcH => "src.h",
            Self::SrcFullW => "src.f_w",
            Self::SrcFullH => "src.f_h",
            Self::DstX => "dst.x",
            Self::DstY => "dst.y",
            Self::DstW => "dst.w",
            Self::DstH => "dst.h",
            Self::DstFullW => "dst.f_w",
            Self::DstFullH => "dst.f_h",
            Self::BlockX => "block.x",
            Self::BlockY => "block.y",
            Self::BlockW => "block.w",
            Self::BlockH => "block.h",
        })
    }
}

/// A register-layer constraint the generic checks do not know about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[error("{what} ({value:#x})")]
pub struct StructuralFault {
    /// What the hardware cannot express.
    pub what: &'static str,
    /// The offending value.
    pub value: u64,
}

/// Why a configuration was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum Rejection {
    /// A scale ratio lies outside the channel's bounds.
    #[error("{axis} scale ratio {ratio:#x} outside [{min:#x}, {max:#x}]")]
    ScaleOutOfRange {
        /// Offending direction.
        axis: Axis,
        /// Requested ratio.
        ratio: u32,
        /// Smallest accepted ratio.
        min: u32,
        /// Largest accepted ratio.
        max: u32,
    },
    /// Scaling was requested on a channel without a scaler.
    #[error("scaling requested but the channel has no scaler")]
    ScalingUnsupported,
    /// A block rectangle was requested on a channel without block support.
    #[error("block rectangle requested but the channel has no block unit")]
    BlockUnsupported,
    /// A position or size is not suitably aligned.
    #[error("{field} = {value} is not aligned to {align}")]
    Misaligned {
        /// Offending field.
        field: Field,
        /// Requested value.
        value: u32,
        /// Required alignment.
        align: u32,
    },
    /// A size lies outside its bounds.
    #[error("{field} = {value} outside [{min}, {max}]")]
    DimensionOutOfRange {
        /// Offending field.
        field: Field,
        /// Requested value.
        value: u32,
        /// Smallest accepted value.
        min: u32,
        /// Largest accepted value.
        max: u32,
    },
    /// The channel cannot decode this compression.
    #[error("{0} compression is not supported")]
    UnsupportedCompression(CompressionKind),
    /// The channel cannot rotate or flip as requested.
    #[error("rotation {0:?} is not supported")]
    UnsupportedRotation(HwRotation),
    /// The format cannot be used in this configuration.
    #[error("format {0} is not supported here")]
    UnsupportedFormat(&'static str),
    /// The register layer cannot express the configuration.
    #[error("structural check failed: {0}")]
    Structural(#[from] StructuralFault),
}

/// Register-layer validation hook.
pub trait StructuralCheck {
    /// Returns the first constraint `cfg` violates.
    fn check(&self, cfg: &FlatConfig) -> Result<(), StructuralFault>;
}

/// Accepts everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoStructuralCheck;

impl StructuralCheck for NoStructuralCheck {
    fn check(&self, cfg: &FlatConfig) -> Result<(), StructuralFault> {
        _ = cfg;
        Ok(())
    }
}

/// A configuration that passed every check.
///
/// Only [`validate`] constructs this.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ValidatedConfig {
    config: FlatConfig,
}

impl ValidatedConfig {
    /// The checked configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &FlatConfig {
        &self.config
    }

    /// Unwraps the checked configuration.
    #[must_use]
    pub const fn into_inner(self) -> FlatConfig {
        self.config
    }
}

/// Runs steps 1 through 4.
pub fn check(cfg: &FlatConfig, r: &Restriction, caps: Capabilities) -> Result<(), Rejection> {
    check_scale(cfg, r, caps)?;
    check_alignment(cfg, r)?;
    check_range(cfg, r)?;
    check_capabilities(cfg, caps)
}

/// Runs every step, delegating the last one to `structural`.
pub fn check_with(
    cfg: &FlatConfig,
    r: &Restriction,
    caps: Capabilities,
    structural: &dyn StructuralCheck,
) -> Result<(), Rejection> {
    check(cfg, r, caps)?;
    structural.check(cfg)?;
    Ok(())
}

/// Runs every step and wraps the config on success.
pub fn validate(
    cfg: FlatConfig,
    r: &Restriction,
    caps: Capabilities,
    structural: &dyn StructuralCheck,
) -> Result<ValidatedConfig, Rejection> {
    check_with(&cfg, r, caps, structural)?;
    Ok(ValidatedConfig { config: cfg })
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

fn check_scale(cfg: &FlatConfig, r: &Restriction, caps: Capabilities) -> Result<(), Rejection> {
    let limits = r.limits();
    let min = SCALE_ONE / limits.scale_up;
    let max = u32::try_from(u64::from(SCALE_ONE) * u64::from(limits.scale_down)).unwrap_or(u32::MAX);
    for (axis, ratio) in [
        (Axis::Horizontal, cfg.h_ratio),
        (Axis::Vertical, cfg.v_ratio),
    ] {
        if ratio < min || ratio > max {
            return Err(Rejection::ScaleOutOfRange {
                axis,
                ratio,
                min,
                max,
            });
        }
    }
    if cfg.is_scale && !caps.contains(Capabilities::SCALE) {
        return Err(Rejection::ScalingUnsupported);
    }
    Ok(())
}

fn aligned(field: Field, value: u32, align: u32) -> Result<(), Rejection> {
    // A zero alignment only arises from a multiplied align overflowing.
    if align != 0 && value % align == 0 {
        Ok(())
    } else {
        Err(Rejection::Misaligned {
            field,
            value,
            align,
        })
    }
}

fn check_alignment(cfg: &FlatConfig, r: &Restriction) -> Result<(), Rejection> {
    let l = r.limits();
    let mul = u32::from(cfg.format.align_factor.max(1));
    let src = &cfg.src;
    aligned(Field::SrcX, src.x, l.src_x_align.wrapping_mul(mul))?;
    aligned(Field::SrcY, src.y, l.src_y_align.wrapping_mul(mul))?;
    aligned(Field::SrcW, src.w, l.src_w.align.wrapping_mul(mul))?;
    aligned(Field::SrcH, src.h, l.src_h.align.wrapping_mul(mul))?;
    aligned(Field::SrcFullW, src.f_w, l.src_f_w.align.wrapping_mul(mul))?;
    aligned(Field::SrcFullH, src.f_h, l.src_f_h.align.wrapping_mul(mul))?;

    let dst = &cfg.dst;
    aligned(Field::DstX, dst.x, l.dst_x_align)?;
    aligned(Field::DstY, dst.y, l.dst_y_align)?;
    aligned(Field::DstW, dst.w, l.dst_w.align)?;
    aligned(Field::DstH, dst.h, l.dst_h.align)?;
    aligned(Field::DstFullW, dst.f_w, l.dst_f_w.align)?;
    aligned(Field::DstFullH, dst.f_h, l.dst_f_h.align)?;

    if let Some(blk) = &cfg.block {
        aligned(Field::BlockX, blk.x, l.blk_x_align)?;
        aligned(Field::BlockY, blk.y, l.blk_y_align)?;
        aligned(Field::BlockW, blk.w, l.blk_w.align)?;
        aligned(Field::BlockH, blk.h, l.blk_h.align)?;
    }
    Ok(())
}

fn in_range(field: Field, value: u32, range: Range) -> Result<(), Rejection> {
    if range.contains(value) {
        Ok(())
    } else {
        Err(Rejection::DimensionOutOfRange {
            field,
            value,
            min: range.min,
            max: range.max,
        })
    }
}

fn check_range(cfg: &FlatConfig, r: &Restriction) -> Result<(), Rejection> {
    let l = r.limits();
    in_range(Field::SrcFullW, cfg.src.f_w, l.src_f_w)?;
    in_range(Field::SrcFullH, cfg.src.f_h, l.src_f_h)?;
    in_range(Field::SrcW, cfg.src.w, l.src_w)?;
    in_range(Field::SrcH, cfg.src.h, r.src_h_range(cfg.rotation.rot90))?;
    in_range(Field::DstFullW, cfg.dst.f_w, l.dst_f_w)?;
    in_range(Field::DstFullH, cfg.dst.f_h, l.dst_f_h)?;
    in_range(Field::DstW, cfg.dst.w, l.dst_w)?;
    in_range(Field::DstH, cfg.dst.h, l.dst_h)?;
    if let Some(blk) = &cfg.block {
        in_range(Field::BlockW, blk.w, l.blk_w)?;
        in_range(Field::BlockH, blk.h, l.blk_h)?;
    }
    Ok(())
}

fn check_capabilities(cfg: &FlatConfig, caps: Capabilities) -> Result<(), Rejection> {
    let format = cfg.format;
    match cfg.compression {
        Compression::None => {}
        Compression::Afbc => {
            if !caps.contains(Capabilities::AFBC) {
                return Err(Rejection::UnsupportedCompression(CompressionKind::Afbc));
            }
            if !format.afbc {
                return Err(Rejection::UnsupportedFormat(format.name));
            }
        }
        Compression::Sajc(_) => {
            if !caps.contains(Capabilities::SAJC) {
                return Err(Rejection::UnsupportedCompression(CompressionKind::Sajc));
            }
        }
        Compression::SbwcLossless | Compression::SbwcLossy(_) => {
            if !caps.contains(Capabilities::SBWC) {
                return Err(Rejection::UnsupportedCompression(CompressionKind::Sbwc));
            }
            if !format.sbwc {
                return Err(Rejection::UnsupportedFormat(format.name));
            }
        }
    }

    let rot = cfg.rotation;
    if !rot.is_identity() {
        let needed_rot = rot.rot90 && !caps.contains(Capabilities::ROT);
        let needed_flip = rot.flips() && !caps.contains(Capabilities::FLIP);
        if needed_rot || needed_flip || !format.rotatable {
            return Err(Rejection::UnsupportedRotation(rot));
        }
    }

    if format.color.is_yuv() && !caps.contains(Capabilities::CSC) {
        return Err(Rejection::UnsupportedFormat(format.name));
    }

    if cfg.block.is_some() && !caps.contains(Capabilities::BLOCK) {
        return Err(Rejection::BlockUnsupported);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{FourCc, lookup};
    use crate::modifier::{Modifier, SajcBlock};
    use crate::request::{Buffers, CompositionRequest, DisplayRect, Framebuffer, OutputMode};
    use crate::restriction::tests::sample_desc;
    use crate::rotation::{Angle, Rotation};
    use crate::translate::flatten;
    use kurbo::Rect;

    const ALL: Capabilities = Capabilities::all();
    const MODE: OutputMode = OutputMode {
        hdisplay: 1920,
        vdisplay: 1080,
    };

    fn config(code: &[u8; 4], src: (u32, u32), dst: (u32, u32)) -> FlatConfig {
        let fb = Framebuffer {
            width: src.0,
            height: src.1,
            format: lookup(FourCc::new(*code), None).unwrap(),
            modifier: Modifier::LINEAR,
            buffers: Buffers::Contiguous(0x8000_0000),
        };
        let req = CompositionRequest::new(
            fb,
            Rect::new(0.0, 0.0, f64::from(src.0), f64::from(src.1)),
            DisplayRect::new(0, 0, dst.0, dst.1),
        );
        flatten(&req, MODE)
    }

    fn restriction() -> Restriction {
        Restriction::new(sample_desc()).unwrap()
    }

    #[test]
    fn one_to_one_passes_without_scaler() {
        let cfg = config(b"AR24", (1280, 720), (1280, 720));
        let no_scale = ALL.difference(Capabilities::SCALE);
        assert_eq!(check(&cfg, &restriction(), ALL), Ok(()));
        assert_eq!(check(&cfg, &restriction(), no_scale), Ok(()));
    }

    #[test]
    fn downscale_beyond_limit_is_out_of_range() {
        // sample_desc allows 2x down; 4x is too much.
        let cfg = config(b"AR24", (1920, 1080), (480, 270));
        assert!(matches!(
            check(&cfg, &restriction(), ALL),
            Err(Rejection::ScaleOutOfRange {
                axis: Axis::Horizontal,
                ..
            })
        ));
    }

    #[test]
    fn upscale_beyond_limit_is_out_of_range() {
        let mut desc = sample_desc();
        desc.scale_up = 2;
        let r = Restriction::new(desc).unwrap();
        let cfg = config(b"AR24", (100, 100), (400, 400));
        assert!(matches!(
            check(&cfg, &r, ALL),
            Err(Rejection::ScaleOutOfRange { min, .. }) if min == SCALE_ONE / 2
        ));
    }

    #[test]
    fn scaling_needs_scaler() {
        let cfg = config(b"AR24", (1920, 1080), (960, 540));
        assert_eq!(
            check(&cfg, &restriction(), Capabilities::IDMA),
            Err(Rejection::ScalingUnsupported)
        );
    }

    #[test]
    fn yuv_source_alignment_is_doubled() {
        let mut desc = sample_desc();
        desc.src_x_align = 2;
        let r = Restriction::new(desc).unwrap();
        let mut cfg = config(b"NV12", (640, 480), (320, 240));
        cfg.src.x = 2;
        cfg.is_scale = false;
        cfg.h_ratio = SCALE_ONE;
        cfg.v_ratio = SCALE_ONE;
        assert_eq!(
            check(&cfg, &r, ALL),
            Err(Rejection::Misaligned {
                field: Field::SrcX,
                value: 2,
                align: 4
            })
        );
        let mut rgb = config(b"AR24", (640, 480), (640, 480));
        rgb.src.x = 2;
        assert_eq!(check(&rgb, &r, ALL), Ok(()));
    }

    #[test]
    fn destination_alignment_is_not_multiplied() {
        let mut desc = sample_desc();
        desc.dst_x_align = 2;
        let r = Restriction::new(desc).unwrap();
        let mut cfg = config(b"NV12", (640, 480), (640, 480));
        cfg.dst.x = 2;
        assert_eq!(check(&cfg, &r, ALL), Ok(()));
        cfg.dst.x = 3;
        assert!(matches!(
            check(&cfg, &r, ALL),
            Err(Rejection::Misaligned {
                field: Field::DstX,
                ..
            })
        ));
    }

    #[test]
    fn rotated_height_uses_rotated_max() {
        let mut cfg = config(b"AR24", (1080, 2400), (1080, 2400));
        assert_eq!(check(&cfg, &restriction(), ALL), Ok(()));
        cfg.rotation = Rotation::rotate(Angle::Deg90).simplify();
        cfg.dst.w = 2400;
        cfg.dst.h = 1080;
        assert_eq!(
            check(&cfg, &restriction(), ALL),
            Err(Rejection::DimensionOutOfRange {
                field: Field::SrcH,
                value: 2400,
                min: 16,
                max: 2160
            })
        );
    }

    #[test]
    fn too_small_destination_is_out_of_range() {
        let cfg = config(b"AR24", (8, 8), (8, 8));
        assert!(matches!(
            check(&cfg, &restriction(), ALL),
            Err(Rejection::DimensionOutOfRange {
                field: Field::SrcFullW,
                ..
            })
        ));
    }

    #[test]
    fn sbwc_needs_capability() {
        let mut cfg = config(b"NV12", (640, 480), (640, 480));
        cfg.compression = Modifier::sbwc_lossless().compression();
        let caps = Capabilities::IDMA | Capabilities::CSC;
        assert_eq!(
            check(&cfg, &restriction(), caps),
            Err(Rejection::UnsupportedCompression(CompressionKind::Sbwc))
        );
        assert_eq!(check(&cfg, &restriction(), caps | Capabilities::SBWC), Ok(()));
    }

    #[test]
    fn sbwc_on_rgb_is_unsupported_format() {
        let mut cfg = config(b"AR24", (640, 480), (640, 480));
        cfg.compression = Compression::SbwcLossless;
        assert_eq!(
            check(&cfg, &restriction(), ALL),
            Err(Rejection::UnsupportedFormat("ARGB8888"))
        );
    }

    #[test]
    fn flip_needs_flip_capability() {
        let mut cfg = config(b"AR24", (640, 480), (640, 480));
        cfg.rotation = Rotation::rotate(Angle::Deg180).simplify();
        let caps = Capabilities::IDMA | Capabilities::ROT;
        assert!(matches!(
            check(&cfg, &restriction(), caps),
            Err(Rejection::UnsupportedRotation(_))
        ));
        assert_eq!(check(&cfg, &restriction(), caps | Capabilities::FLIP), Ok(()));
    }

    #[test]
    fn yuv_needs_color_conversion() {
        let cfg = config(b"NV12", (640, 480), (640, 480));
        assert_eq!(
            check(&cfg, &restriction(), Capabilities::IDMA),
            Err(Rejection::UnsupportedFormat("NV12"))
        );
    }

    #[test]
    fn sajc_needs_capability() {
        let mut cfg = config(b"AR24", (640, 480), (640, 480));
        cfg.compression = Compression::Sajc(SajcBlock::W32H8);
        let caps = Capabilities::IDMA | Capabilities::DPP;
        assert_eq!(
            check(&cfg, &restriction(), caps),
            Err(Rejection::UnsupportedCompression(CompressionKind::Sajc))
        );
        assert_eq!(check(&cfg, &restriction(), caps | Capabilities::SAJC), Ok(()));
    }

    #[test]
    fn block_rect_needs_block_capability() {
        let mut cfg = config(b"AR24", (640, 480), (640, 480));
        cfg.block = Some(DisplayRect::new(16, 16, 64, 64));
        let no_block = ALL.difference(Capabilities::BLOCK);
        assert_eq!(
            check(&cfg, &restriction(), no_block),
            Err(Rejection::BlockUnsupported)
        );
        assert_eq!(check(&cfg, &restriction(), ALL), Ok(()));

        cfg.block = None;
        assert_eq!(check(&cfg, &restriction(), no_block), Ok(()));
    }

    #[test]
    fn structural_step_runs_last() {
        struct RefuseAll;
        impl StructuralCheck for RefuseAll {
            fn check(&self, _: &FlatConfig) -> Result<(), StructuralFault> {
                Err(StructuralFault {
                    what: "refused",
                    value: 0,
                })
            }
        }
        let cfg = config(b"AR24", (640, 480), (640, 480));
        assert!(matches!(
            check_with(&cfg, &restriction(), ALL, &RefuseAll),
            Err(Rejection::Structural(_))
        ));
        // Earlier steps still win.
        let scaled = config(b"AR24", (640, 480), (100, 100));
        assert!(matches!(
            check_with(&scaled, &restriction(), ALL, &RefuseAll),
            Err(Rejection::ScaleOutOfRange { .. })
        ));
    }

    #[test]
    fn validate_wraps_config() {
        let cfg = config(b"AR24", (640, 480), (640, 480));
        let ok = validate(cfg, &restriction(), ALL, &NoStructuralCheck).unwrap();
        assert_eq!(ok.config(), &cfg);
    }

    #[test]
    fn flatten_then_check_is_repeatable() {
        let a = config(b"NV12", (1920, 1080), (1920, 1080));
        let b = config(b"NV12", (1920, 1080), (1920, 1080));
        assert_eq!(a, b);
        assert_eq!(check(&a, &restriction(), ALL), check(&b, &restriction(), ALL));
    }
}
