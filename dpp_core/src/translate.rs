// Copyright 2026 the DPP Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composition request to [`FlatConfig`] translation.
//!
//! Translation never fails; whether the result is programmable is decided by
//! [`validate`](crate::validate).

use crate::flat::{FlatConfig, Frame, SCALE_ONE};
use crate::modifier::Compression;
use crate::request::{Buffers, CompositionRequest, Framebuffer, OutputMode};

/// Flattens `req` for an output running `mode`.
///
/// The source rectangle is truncated to whole pixels. The destination frame
/// is the output's active area.
#[must_use]
pub fn flatten(req: &CompositionRequest, mode: OutputMode) -> FlatConfig {
    let fb = &req.fb;
    let src = Frame {
        x: truncate(req.src.x0),
        y: truncate(req.src.y0),
        w: truncate(req.src.width()),
        h: truncate(req.src.height()),
        f_w: fb.width,
        f_h: fb.height,
    };
    let dst = Frame {
        x: req.dst.x,
        y: req.dst.y,
        w: req.dst.w,
        h: req.dst.h,
        f_w: mode.hdisplay,
        f_h: mode.vdisplay,
    };
    let rotation = req.rotation.simplify();
    let compression = fb.modifier.compression();

    let (src_w, src_h) = if rotation.rot90 {
        (src.h, src.w)
    } else {
        (src.w, src.h)
    };
    let h_ratio = scale_ratio(src_w, dst.w);
    let v_ratio = scale_ratio(src_h, dst.h);

    FlatConfig {
        src,
        dst,
        format: fb.format,
        compression,
        rotation,
        addr: plane_addresses(fb, compression),
        h_ratio,
        v_ratio,
        is_scale: h_ratio != SCALE_ONE || v_ratio != SCALE_ONE,
        block: req.block,
        color: req.color,
        alpha: req.alpha,
        blend: req.blend,
        protected: fb.modifier.is_protected(),
    }
}

/// Source-over-destination ratio in 20-bit fixed point.
///
/// Saturates at `u32::MAX`, including for an empty destination.
#[must_use]
pub fn scale_ratio(src: u32, dst: u32) -> u32 {
    if dst == 0 {
        return u32::MAX;
    }
    u32::try_from((u64::from(src) << 20) / u64::from(dst)).unwrap_or(u32::MAX)
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "float-to-int casts saturate; negative and NaN become 0"
)]
fn truncate(v: f64) -> u32 {
    v as u32
}

/// Resolves per-slot base addresses for the buffer's layout.
///
/// Addresses saturate at `u64::MAX`; the register layer rejects them.
fn plane_addresses(fb: &Framebuffer, compression: Compression) -> [u64; 4] {
    let sizes = fb.format.plane_sizes(fb.width, fb.height, compression);
    let mut addr = [0; 4];
    match fb.buffers {
        Buffers::Contiguous(base) => {
            let offsets = sizes.offsets();
            for &slot in sizes.memory_order() {
                let slot = usize::from(slot);
                addr[slot] = base.saturating_add(offsets[slot]);
            }
        }
        Buffers::PerPlane(planes) => {
            for (&slot, &base) in sizes.memory_order().iter().zip(planes.iter()) {
                addr[usize::from(slot)] = base;
            }
        }
    }
    addr
}
