// Copyright 2026 the DPP Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Register-group dirty tracking.
//!
//! Each channel's registers are split into groups that are rewritten
//! independently. Dirtiness is tracked with [`understory_dirty`], one dirty
//! channel per group:
//!
//! - A configuration change marks the affected groups on the channel's key
//!   with the default policy, so only that channel is reprogrammed.
//! - A block reset marks every group on the block's key with
//!   [`EagerPolicy`](understory_dirty::EagerPolicy). Channel keys depend on
//!   their block key, so every channel on the block picks up a full rewrite.
//!
//! Draining happens on apply; drained keys are folded into each channel's
//! pending [`Groups`] until that channel is next programmed.

use dpp_core::flat::FlatConfig;
use understory_dirty::Channel;

/// Crop, frame, and scaler sizes.
pub const GEOMETRY: Channel = Channel::new(0);

/// Input control: format, rotation, compression, alpha.
pub const FORMAT: Channel = Channel::new(1);

/// Plane base addresses.
pub const ADDRESS: Channel = Channel::new(2);

/// Scale ratios.
pub const SCALER: Channel = Channel::new(3);

/// Color-space conversion.
pub const COLOR: Channel = Channel::new(4);

bitflags::bitflags! {
    /// Set of register groups.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Groups: u8 {
        /// [`GEOMETRY`] group.
        const GEOMETRY = 1 << 0;
        /// [`FORMAT`] group.
        const FORMAT = 1 << 1;
        /// [`ADDRESS`] group.
        const ADDRESS = 1 << 2;
        /// [`SCALER`] group.
        const SCALER = 1 << 3;
        /// [`COLOR`] group.
        const COLOR = 1 << 4;
    }
}

/// Dirty channel and group bit for every group.
pub(crate) const TABLE: [(Channel, Groups); 5] = [
    (GEOMETRY, Groups::GEOMETRY),
    (FORMAT, Groups::FORMAT),
    (ADDRESS, Groups::ADDRESS),
    (SCALER, Groups::SCALER),
    (COLOR, Groups::COLOR),
];

/// Groups whose registers differ between `old` and `new`.
///
/// With no previous configuration every group is dirty.
#[must_use]
pub fn changed(old: Option<&FlatConfig>, new: &FlatConfig) -> Groups {
    let Some(old) = old else {
        return Groups::all();
    };
    let mut g = Groups::empty();
    if old.src != new.src
        || old.dst != new.dst
        || old.block != new.block
        || old.rotation.rot90 != new.rotation.rot90
    {
        g.insert(Groups::GEOMETRY);
    }
    if !core::ptr::eq(old.format, new.format)
        || old.compression != new.compression
        || old.rotation != new.rotation
        || old.block.is_some() != new.block.is_some()
        || old.alpha != new.alpha
        || old.blend != new.blend
    {
        g.insert(Groups::FORMAT);
    }
    if old.addr != new.addr {
        g.insert(Groups::ADDRESS);
    }
    if old.h_ratio != new.h_ratio || old.v_ratio != new.v_ratio {
        g.insert(Groups::SCALER);
    }
    // CSC bits depend on the color model as well as the color space.
    if old.color != new.color || old.format.color != new.format.color {
        g.insert(Groups::COLOR);
    }
    g
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpp_core::format::{FourCc, lookup};
    use dpp_core::modifier::Modifier;
    use dpp_core::request::{Buffers, CompositionRequest, DisplayRect, Framebuffer, OutputMode};
    use dpp_core::translate::flatten;
    use kurbo::Rect;

    fn config(base: u64) -> FlatConfig {
        let fb = Framebuffer {
            width: 256,
            height: 256,
            format: lookup(FourCc::new(*b"XR24"), None).unwrap(),
            modifier: Modifier::LINEAR,
            buffers: Buffers::Contiguous(base),
        };
        let req = CompositionRequest::new(
            fb,
            Rect::new(0.0, 0.0, 256.0, 256.0),
            DisplayRect::new(0, 0, 256, 256),
        );
        flatten(
            &req,
            OutputMode {
                hdisplay: 1080,
                vdisplay: 2400,
            },
        )
    }

    #[test]
    fn first_config_dirties_everything() {
        assert_eq!(changed(None, &config(0x1000)), Groups::all());
    }

    #[test]
    fn identical_config_dirties_nothing() {
        let c = config(0x1000);
        assert!(changed(Some(&c), &c).is_empty());
    }

    #[test]
    fn page_flip_only_touches_addresses() {
        assert_eq!(
            changed(Some(&config(0x1000)), &config(0x2000)),
            Groups::ADDRESS
        );
    }

    #[test]
    fn moving_destination_touches_geometry_and_scaler() {
        let old = config(0x1000);
        let mut new = old;
        new.dst.w = 128;
        new.h_ratio = 2 << 20;
        let g = changed(Some(&old), &new);
        assert!(g.contains(Groups::GEOMETRY | Groups::SCALER));
        assert!(!g.contains(Groups::FORMAT));
    }

    #[test]
    fn yuv_to_rgb_switch_touches_color() {
        let rgb = config(0x1000);
        let mut yuv = rgb;
        yuv.format = lookup(FourCc::new(*b"NV12"), None).unwrap();
        let g = changed(Some(&yuv), &rgb);
        assert!(g.contains(Groups::FORMAT | Groups::COLOR), "got {g:?}");
        let g = changed(Some(&rgb), &yuv);
        assert!(g.contains(Groups::COLOR), "got {g:?}");
    }

    #[test]
    fn same_color_model_keeps_color_clean() {
        let xr24 = config(0x1000);
        let mut ar24 = xr24;
        ar24.format = lookup(FourCc::new(*b"AR24"), None).unwrap();
        let g = changed(Some(&xr24), &ar24);
        assert!(g.contains(Groups::FORMAT), "format changed");
        assert!(!g.contains(Groups::COLOR), "got {g:?}");
    }
}
