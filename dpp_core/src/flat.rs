// Copyright 2026 the DPP Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flattened, ready-to-program channel configuration.

use crate::format::PixelFormat;
use crate::modifier::Compression;
use crate::request::{BlendMode, ColorSpace, DisplayRect};
use crate::rotation::HwRotation;

/// Scale ratio meaning 1:1 (20-bit fixed point).
pub const SCALE_ONE: u32 = 1 << 20;

/// A rectangle inside a frame of known size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Frame {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width.
    pub w: u32,
    /// Height.
    pub h: u32,
    /// Full frame width.
    pub f_w: u32,
    /// Full frame height.
    pub f_h: u32,
}

/// Everything the register programmer needs for one frame.
///
/// Two requests that flatten to equal configs program identical registers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FlatConfig {
    /// Source crop within the framebuffer.
    pub src: Frame,
    /// Destination within the output.
    pub dst: Frame,
    /// Pixel format.
    pub format: &'static PixelFormat,
    /// Compression decoded from the modifier.
    pub compression: Compression,
    /// Orientation in the hardware basis.
    pub rotation: HwRotation,
    /// Base address per register slot (Y8, C8, Y2, C2); unused slots are 0.
    pub addr: [u64; 4],
    /// Horizontal scale ratio, source over destination.
    pub h_ratio: u32,
    /// Vertical scale ratio, source over destination.
    pub v_ratio: u32,
    /// Whether either ratio differs from [`SCALE_ONE`].
    pub is_scale: bool,
    /// Inner region the hardware may skip.
    pub block: Option<DisplayRect>,
    /// Sample interpretation.
    pub color: ColorSpace,
    /// Plane alpha.
    pub alpha: u16,
    /// Blend mode.
    pub blend: BlendMode,
    /// Whether the buffer is in protected memory.
    pub protected: bool,
}

impl FlatConfig {
    /// Source width and height as the scaler sees them, swapped under a
    /// quarter turn.
    #[must_use]
    pub const fn oriented_src_size(&self) -> (u32, u32) {
        if self.rotation.rot90 {
            (self.src.h, self.src.w)
        } else {
            (self.src.w, self.src.h)
        }
    }
}
