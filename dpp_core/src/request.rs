// Copyright 2026 the DPP Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame composition requests.
//!
//! A [`CompositionRequest`] is what the compositor hands the channel for one
//! plane of one frame. It is consumed by [`flatten`](crate::translate::flatten)
//! and discarded.

use kurbo::Rect;

use crate::format::PixelFormat;
use crate::modifier::Modifier;
use crate::rotation::Rotation;

/// Where the framebuffer's bytes live.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Buffers {
    /// All planes packed into one allocation starting at this address.
    Contiguous(u64),
    /// One address per plane, listed in the order the planes are laid out
    /// (see [`PlaneSizes::memory_order`](crate::format::PlaneSizes::memory_order)).
    PerPlane([u64; 4]),
}

/// A scanout buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Framebuffer {
    /// Buffer width in pixels.
    pub width: u32,
    /// Buffer height in pixels.
    pub height: u32,
    /// Pixel format.
    pub format: &'static PixelFormat,
    /// Layout modifier (compression, protection).
    pub modifier: Modifier,
    /// Plane addresses.
    pub buffers: Buffers,
}

/// An integer rectangle on the output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DisplayRect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width.
    pub w: u32,
    /// Height.
    pub h: u32,
}

impl DisplayRect {
    /// Creates a rectangle.
    #[must_use]
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
}

/// Color primaries and matrix.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ColorStandard {
    /// ITU-R BT.601.
    #[default]
    Bt601,
    /// ITU-R BT.709.
    Bt709,
    /// ITU-R BT.2020.
    Bt2020,
    /// DCI-P3.
    DciP3,
}

/// Quantization range of the samples.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ColorRange {
    /// Studio swing.
    #[default]
    Limited,
    /// Full swing.
    Full,
}

/// Transfer function.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Transfer {
    /// sRGB / gamma 2.2.
    #[default]
    Srgb,
    /// Linear light.
    Linear,
    /// SMPTE ST 2084.
    Pq,
    /// Hybrid log-gamma.
    Hlg,
}

/// Full description of how sample values map to color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ColorSpace {
    /// Primaries and conversion matrix.
    pub standard: ColorStandard,
    /// Sample range.
    pub range: ColorRange,
    /// Transfer function.
    pub transfer: Transfer,
}

/// How plane alpha combines with what lies below.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Pixel alpha ignored.
    None,
    /// Pixels are premultiplied by alpha.
    #[default]
    Premultiplied,
    /// Pixels are not premultiplied.
    Coverage,
}

/// Opaque plane alpha.
pub const ALPHA_OPAQUE: u16 = 0xffff;

/// One plane's worth of work for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompositionRequest {
    /// Buffer to scan out.
    pub fb: Framebuffer,
    /// Source crop in buffer pixels, possibly sub-pixel.
    pub src: Rect,
    /// Destination on the output.
    pub dst: DisplayRect,
    /// Requested orientation.
    pub rotation: Rotation,
    /// Sample interpretation.
    pub color: ColorSpace,
    /// Plane alpha, [`ALPHA_OPAQUE`] for opaque.
    pub alpha: u16,
    /// Blend mode.
    pub blend: BlendMode,
    /// Inner region the hardware may skip fetching.
    pub block: Option<DisplayRect>,
}

impl CompositionRequest {
    /// An unrotated, opaque request showing `src` of `fb` at `dst`.
    #[must_use]
    pub fn new(fb: Framebuffer, src: Rect, dst: DisplayRect) -> Self {
        Self {
            fb,
            src,
            dst,
            rotation: Rotation::IDENTITY,
            color: ColorSpace::default(),
            alpha: ALPHA_OPAQUE,
            blend: BlendMode::default(),
            block: None,
        }
    }
}

/// Active display mode of the output the channel feeds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct OutputMode {
    /// Active width.
    pub hdisplay: u32,
    /// Active height.
    pub vdisplay: u32,
}
