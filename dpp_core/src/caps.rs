// Copyright 2026 the DPP Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Channel capability flags.

bitflags::bitflags! {
    /// What a channel's hardware can do.
    ///
    /// Parsed from the channel's attribute list at attach time.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u32 {
        /// Input DMA present.
        const IDMA = 1 << 0;
        /// Pre-processor present.
        const DPP = 1 << 1;
        /// Output (writeback) DMA present.
        const ODMA = 1 << 2;
        /// Horizontal and vertical flips.
        const FLIP = 1 << 3;
        /// 90° rotation.
        const ROT = 1 << 4;
        /// YUV to RGB color-space conversion.
        const CSC = 1 << 5;
        /// Up- and downscaling.
        const SCALE = 1 << 6;
        /// ARM frame buffer compression.
        const AFBC = 1 << 7;
        /// Samsung bandwidth compression.
        const SBWC = 1 << 8;
        /// Samsung tiled compression.
        const SAJC = 1 << 9;
        /// Block (inner crop) skipping.
        const BLOCK = 1 << 10;
    }
}

impl Capabilities {
    /// Looks up a flag by its board attribute name (`"rot"`, `"sbwc"`, ...).
    ///
    /// Attribute names are the flag names in lower case.
    #[must_use]
    pub fn from_attribute(name: &str) -> Option<Self> {
        Self::all()
            .iter_names()
            .find(|(flag, _)| flag.eq_ignore_ascii_case(name))
            .map(|(_, caps)| caps)
    }
}
