// Copyright 2026 the DPP Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Channel, block, and decoder identification.
//!
//! [`ChannelId`] indexes the channel arena owned by the display subsystem,
//! [`BlockId`] names the physical block a group of channels shares, and
//! [`DecoderId`] identifies the output (decoder) a channel feeds. The host
//! assigns decoder ids; the core treats them as opaque.

use core::fmt;

/// Index of one DPP channel in the subsystem arena.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ChannelId(pub u32);

impl ChannelId {
    /// Returns the arena slot for this id.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChannelId({})", self.0)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dpp{}", self.0)
    }
}

/// Identifies a physical display-processing block shared by several channels.
///
/// Channels on the same block share one ring clock.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BlockId(pub u32);

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockId({})", self.0)
    }
}

/// Identifies the decoder (output pipeline) a channel is bound to.
///
/// An unbound channel carries `None` rather than a sentinel value.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DecoderId(pub u32);

impl fmt::Debug for DecoderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DecoderId({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    #[test]
    fn channel_display_uses_hardware_name() {
        assert_eq!(format!("{}", ChannelId(3)), "dpp3");
        assert_eq!(format!("{:?}", ChannelId(3)), "ChannelId(3)");
    }

    #[test]
    fn channel_index_matches_raw_value() {
        assert_eq!(ChannelId(7).index(), 7);
    }
}
