// Copyright 2026 the DPP Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Board description.
//!
//! Mirrors the device-tree properties of the display subsystem: which blocks
//! exist, which channels sit on each block, their attribute strings, and
//! their restriction numbers. Parsed once, before any channel is attached.

use serde::Deserialize;

use dpp_core::caps::Capabilities;
use dpp_core::id::{BlockId, ChannelId};
use dpp_core::restriction::{Range, Restriction, RestrictionDesc};

use crate::channel::ChannelDesc;
use crate::subsystem::AttachError;

/// `[min, max, align]` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RangeSpec(pub u32, pub u32, pub u32);

impl From<RangeSpec> for Range {
    fn from(r: RangeSpec) -> Self {
        Self::new(r.0, r.1, r.2)
    }
}

/// Restriction numbers of one channel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RestrictionSpec {
    /// Source frame width.
    pub src_f_w: RangeSpec,
    /// Source frame height.
    pub src_f_h: RangeSpec,
    /// Source crop width.
    pub src_w: RangeSpec,
    /// Source crop height.
    pub src_h: RangeSpec,
    /// Source crop x alignment.
    pub src_x_align: u32,
    /// Source crop y alignment.
    pub src_y_align: u32,
    /// Destination frame width.
    pub dst_f_w: RangeSpec,
    /// Destination frame height.
    pub dst_f_h: RangeSpec,
    /// Destination width.
    pub dst_w: RangeSpec,
    /// Destination height.
    pub dst_h: RangeSpec,
    /// Destination x alignment.
    pub dst_x_align: u32,
    /// Destination y alignment.
    pub dst_y_align: u32,
    /// Block width.
    pub blk_w: RangeSpec,
    /// Block height.
    pub blk_h: RangeSpec,
    /// Block x alignment.
    pub blk_x_align: u32,
    /// Block y alignment.
    pub blk_y_align: u32,
    /// Source height limit under a quarter turn.
    pub src_h_rot_max: u32,
    /// Largest downscale factor.
    pub scale_down: u32,
    /// Largest upscale factor.
    pub scale_up: u32,
}

impl From<&RestrictionSpec> for RestrictionDesc {
    fn from(s: &RestrictionSpec) -> Self {
        Self {
            src_f_w: s.src_f_w.into(),
            src_f_h: s.src_f_h.into(),
            src_w: s.src_w.into(),
            src_h: s.src_h.into(),
            src_x_align: s.src_x_align,
            src_y_align: s.src_y_align,
            dst_f_w: s.dst_f_w.into(),
            dst_f_h: s.dst_f_h.into(),
            dst_w: s.dst_w.into(),
            dst_h: s.dst_h.into(),
            dst_x_align: s.dst_x_align,
            dst_y_align: s.dst_y_align,
            blk_w: s.blk_w.into(),
            blk_h: s.blk_h.into(),
            blk_x_align: s.blk_x_align,
            blk_y_align: s.blk_y_align,
            src_h_rot_max: s.src_h_rot_max,
            scale_down: s.scale_down,
            scale_up: s.scale_up,
        }
    }
}

/// A physical block and its shared ring clock.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BlockSpec {
    /// Block index.
    pub id: u32,
}

/// One channel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChannelSpec {
    /// Channel index.
    pub id: u32,
    /// Block the channel lives on.
    pub block: u32,
    /// Capability names (`"rot"`, `"afbc"`, ...).
    pub attributes: Vec<String>,
    /// Whether the channel is a writeback channel.
    #[serde(default)]
    pub writeback: bool,
    /// Numeric limits.
    pub restriction: RestrictionSpec,
}

impl ChannelSpec {
    /// Resolves attribute names and validates the restriction.
    pub fn to_desc(&self) -> Result<ChannelDesc, AttachError> {
        let id = ChannelId(self.id);
        let mut caps = Capabilities::empty();
        for name in &self.attributes {
            caps |= Capabilities::from_attribute(name).ok_or_else(|| AttachError::UnknownAttribute {
                channel: id,
                name: name.clone(),
            })?;
        }
        let restriction = Restriction::new((&self.restriction).into())
            .map_err(|source| AttachError::Restriction { channel: id, source })?;
        Ok(ChannelDesc {
            id,
            block: BlockId(self.block),
            caps,
            restriction,
            writeback: self.writeback,
        })
    }
}

/// Whole-board description.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BoardConfig {
    /// Physical blocks.
    pub blocks: Vec<BlockSpec>,
    /// Channels, in any order.
    pub channels: Vec<ChannelSpec>,
}

impl BoardConfig {
    /// Parses a board description from JSON.
    pub fn from_json(text: &str) -> Result<Self, AttachError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const BOARD: &str = r#"{
        "blocks": [{ "id": 0 }, { "id": 1 }],
        "channels": [
            {
                "id": 0,
                "block": 0,
                "attributes": ["idma", "dpp", "flip", "csc", "scale", "afbc"],
                "restriction": {
                    "src_f_w": [64, 8192, 1], "src_f_h": [16, 8192, 1],
                    "src_w": [64, 4096, 1], "src_h": [16, 4096, 1],
                    "src_x_align": 1, "src_y_align": 1,
                    "dst_f_w": [16, 8192, 1], "dst_f_h": [16, 8192, 1],
                    "dst_w": [16, 4096, 1], "dst_h": [16, 4096, 1],
                    "dst_x_align": 1, "dst_y_align": 1,
                    "blk_w": [4, 4096, 1], "blk_h": [1, 4096, 1],
                    "blk_x_align": 1, "blk_y_align": 1,
                    "src_h_rot_max": 2160,
                    "scale_down": 2, "scale_up": 8
                }
            },
            {
                "id": 1,
                "block": 0,
                "attributes": ["idma", "dpp", "flip", "rot", "csc", "scale", "sbwc"],
                "restriction": {
                    "src_f_w": [64, 8192, 1], "src_f_h": [16, 8192, 1],
                    "src_w": [64, 4096, 1], "src_h": [16, 4096, 1],
                    "src_x_align": 1, "src_y_align": 1,
                    "dst_f_w": [16, 8192, 1], "dst_f_h": [16, 8192, 1],
                    "dst_w": [16, 4096, 1], "dst_h": [16, 4096, 1],
                    "dst_x_align": 1, "dst_y_align": 1,
                    "blk_w": [4, 4096, 1], "blk_h": [1, 4096, 1],
                    "blk_x_align": 1, "blk_y_align": 1,
                    "src_h_rot_max": 2160,
                    "scale_down": 2, "scale_up": 8
                }
            },
            {
                "id": 2,
                "block": 1,
                "attributes": ["idma", "dpp"],
                "writeback": true,
                "restriction": {
                    "src_f_w": [64, 8192, 1], "src_f_h": [16, 8192, 1],
                    "src_w": [64, 4096, 1], "src_h": [16, 4096, 1],
                    "src_x_align": 1, "src_y_align": 1,
                    "dst_f_w": [16, 8192, 1], "dst_f_h": [16, 8192, 1],
                    "dst_w": [16, 4096, 1], "dst_h": [16, 4096, 1],
                    "dst_x_align": 1, "dst_y_align": 1,
                    "blk_w": [4, 4096, 1], "blk_h": [1, 4096, 1],
                    "blk_x_align": 1, "blk_y_align": 1,
                    "src_h_rot_max": 2160,
                    "scale_down": 1, "scale_up": 1
                }
            }
        ]
    }"#;

    #[test]
    fn board_parses() {
        let board = BoardConfig::from_json(BOARD).unwrap();
        assert_eq!(board.blocks.len(), 2);
        assert_eq!(board.channels.len(), 3);
        assert!(board.channels[2].writeback, "writeback flag read");
        assert!(!board.channels[0].writeback, "writeback defaults off");
        assert_eq!(board.channels[0].restriction.src_w, RangeSpec(64, 4096, 1));
    }

    #[test]
    fn attributes_become_capabilities() {
        let board = BoardConfig::from_json(BOARD).unwrap();
        let desc = board.channels[1].to_desc().unwrap();
        assert!(desc.caps.contains(Capabilities::ROT | Capabilities::SBWC));
        assert!(!desc.caps.contains(Capabilities::AFBC), "afbc not listed");
        assert_eq!(desc.block, BlockId(0));
    }

    #[test]
    fn unknown_attribute_fails_attach() {
        let mut board = BoardConfig::from_json(BOARD).unwrap();
        board.channels[0].attributes.push("hdr10".into());
        let err = board.channels[0].to_desc().unwrap_err();
        assert!(
            matches!(err, AttachError::UnknownAttribute { ref name, .. } if name == "hdr10"),
            "got {err:?}"
        );
    }

    #[test]
    fn inverted_range_fails_attach() {
        let mut board = BoardConfig::from_json(BOARD).unwrap();
        board.channels[0].restriction.dst_w = RangeSpec(4096, 16, 1);
        let err = board.channels[0].to_desc().unwrap_err();
        assert!(
            matches!(err, AttachError::Restriction { channel: ChannelId(0), .. }),
            "got {err:?}"
        );
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = BoardConfig::from_json(r#"{ "blocks": 3 }"#).unwrap_err();
        assert!(matches!(err, AttachError::Parse(_)), "got {err:?}");
    }
}
