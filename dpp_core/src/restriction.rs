// Copyright 2026 the DPP Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-channel numeric limits.
//!
//! A [`Restriction`] can only be built through [`Restriction::new`], which
//! checks that every [`Range`] is self-consistent. Channels receive their
//! restriction once at attach time and never mutate it.

use alloc::collections::BTreeMap;
use core::fmt;

use crate::id::ChannelId;

/// Inclusive bounds plus a required alignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Range {
    /// Smallest accepted value.
    pub min: u32,
    /// Largest accepted value.
    pub max: u32,
    /// Values must be a multiple of this.
    pub align: u32,
}

impl Range {
    /// Creates a range.
    #[must_use]
    pub const fn new(min: u32, max: u32, align: u32) -> Self {
        Self { min, max, align }
    }

    /// Whether `v` lies in `[min, max]`.
    #[inline]
    #[must_use]
    pub const fn contains(&self, v: u32) -> bool {
        v >= self.min && v <= self.max
    }

    fn validate(&self, field: &'static str) -> Result<(), RestrictionError> {
        if self.min > self.max {
            return Err(RestrictionError::MinAboveMax {
                field,
                min: self.min,
                max: self.max,
            });
        }
        check_align(field, self.align)
    }
}

fn check_align(field: &'static str, align: u32) -> Result<(), RestrictionError> {
    if align.is_power_of_two() {
        Ok(())
    } else {
        Err(RestrictionError::BadAlignment { field, align })
    }
}

/// Raw restriction values as read from the board description.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RestrictionDesc {
    /// Source framebuffer width.
    pub src_f_w: Range,
    /// Source framebuffer height.
    pub src_f_h: Range,
    /// Source crop width.
    pub src_w: Range,
    /// Source crop height.
    pub src_h: Range,
    /// Source crop x alignment.
    pub src_x_align: u32,
    /// Source crop y alignment.
    pub src_y_align: u32,
    /// Destination frame width.
    pub dst_f_w: Range,
    /// Destination frame height.
    pub dst_f_h: Range,
    /// Destination width.
    pub dst_w: Range,
    /// Destination height.
    pub dst_h: Range,
    /// Destination x alignment.
    pub dst_x_align: u32,
    /// Destination y alignment.
    pub dst_y_align: u32,
    /// Block (inner crop) width.
    pub blk_w: Range,
    /// Block height.
    pub blk_h: Range,
    /// Block x alignment.
    pub blk_x_align: u32,
    /// Block y alignment.
    pub blk_y_align: u32,
    /// Largest source height accepted while rotated by 90°.
    pub src_h_rot_max: u32,
    /// Largest downscale factor.
    pub scale_down: u32,
    /// Largest upscale factor.
    pub scale_up: u32,
}

/// A validated set of channel limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Restriction {
    desc: RestrictionDesc,
}

impl Restriction {
    /// Validates `desc`.
    ///
    /// Every range must have `min <= max` and a power-of-two alignment, both
    /// scale factors must be at least 1, and the rotated height maximum must
    /// admit the unrotated minimum.
    pub fn new(desc: RestrictionDesc) -> Result<Self, RestrictionError> {
        let ranges = [
            ("src_f_w", &desc.src_f_w),
            ("src_f_h", &desc.src_f_h),
            ("src_w", &desc.src_w),
            ("src_h", &desc.src_h),
            ("dst_f_w", &desc.dst_f_w),
            ("dst_f_h", &desc.dst_f_h),
            ("dst_w", &desc.dst_w),
            ("dst_h", &desc.dst_h),
            ("blk_w", &desc.blk_w),
            ("blk_h", &desc.blk_h),
        ];
        for (field, range) in ranges {
            range.validate(field)?;
        }
        let aligns = [
            ("src_x_align", desc.src_x_align),
            ("src_y_align", desc.src_y_align),
            ("dst_x_align", desc.dst_x_align),
            ("dst_y_align", desc.dst_y_align),
            ("blk_x_align", desc.blk_x_align),
            ("blk_y_align", desc.blk_y_align),
        ];
        for (field, align) in aligns {
            check_align(field, align)?;
        }
        if desc.scale_down == 0 {
            return Err(RestrictionError::BadScale {
                field: "scale_down",
                value: 0,
            });
        }
        if desc.scale_up == 0 {
            return Err(RestrictionError::BadScale {
                field: "scale_up",
                value: 0,
            });
        }
        if desc.src_h_rot_max < desc.src_h.min {
            return Err(RestrictionError::MinAboveMax {
                field: "src_h_rot_max",
                min: desc.src_h.min,
                max: desc.src_h_rot_max,
            });
        }
        Ok(Self { desc })
    }

    /// The validated limits.
    #[inline]
    #[must_use]
    pub const fn limits(&self) -> &RestrictionDesc {
        &self.desc
    }

    /// Source height range, using the rotated maximum when `rotated`.
    #[must_use]
    pub const fn src_h_range(&self, rotated: bool) -> Range {
        let mut r = self.desc.src_h;
        if rotated {
            r.max = self.desc.src_h_rot_max;
        }
        r
    }
}

/// Why a restriction description was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RestrictionError {
    /// A range's minimum exceeds its maximum.
    #[error("{field}: min {min} exceeds max {max}")]
    MinAboveMax {
        /// Offending field.
        field: &'static str,
        /// Configured minimum.
        min: u32,
        /// Configured maximum.
        max: u32,
    },
    /// An alignment is zero or not a power of two.
    #[error("{field}: alignment {align} is not a power of two")]
    BadAlignment {
        /// Offending field.
        field: &'static str,
        /// Configured alignment.
        align: u32,
    },
    /// A scale factor is zero.
    #[error("{field}: scale factor {value} must be at least 1")]
    BadScale {
        /// Offending field.
        field: &'static str,
        /// Configured factor.
        value: u32,
    },
}

/// Restrictions for every attached channel.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RestrictionTable {
    entries: BTreeMap<ChannelId, Restriction>,
}

impl RestrictionTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the restriction for `channel`, replacing any previous entry.
    pub fn insert(&mut self, channel: ChannelId, restriction: Restriction) {
        self.entries.insert(channel, restriction);
    }

    /// Returns the restriction attached to `channel`.
    #[must_use]
    pub fn for_channel(&self, channel: ChannelId) -> Option<&Restriction> {
        self.entries.get(&channel)
    }

    /// Number of channels with a restriction.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for RestrictionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Limits loose enough for 1080p and 4K work on every axis.
    pub(crate) fn sample_desc() -> RestrictionDesc {
        let wide = Range::new(16, 8192, 1);
        RestrictionDesc {
            src_f_w: Range::new(16, 8192, 1),
            src_f_h: Range::new(16, 8192, 1),
            src_w: Range::new(16, 4096, 1),
            src_h: Range::new(16, 4096, 1),
            src_x_align: 1,
            src_y_align: 1,
            dst_f_w: wide,
            dst_f_h: wide,
            dst_w: Range::new(16, 4096, 1),
            dst_h: Range::new(16, 4096, 1),
            dst_x_align: 1,
            dst_y_align: 1,
            blk_w: Range::new(4, 4096, 1),
            blk_h: Range::new(1, 4096, 1),
            blk_x_align: 1,
            blk_y_align: 1,
            src_h_rot_max: 2160,
            scale_down: 2,
            scale_up: 8,
        }
    }

    #[test]
    fn accepts_consistent_limits() {
        let r = Restriction::new(sample_desc()).unwrap();
        assert_eq!(r.limits().scale_up, 8);
    }

    #[test]
    fn rejects_inverted_range() {
        let mut d = sample_desc();
        d.dst_w = Range::new(100, 10, 1);
        assert_eq!(
            Restriction::new(d),
            Err(RestrictionError::MinAboveMax {
                field: "dst_w",
                min: 100,
                max: 10
            })
        );
    }

    #[test]
    fn rejects_non_power_of_two_alignment() {
        let mut d = sample_desc();
        d.src_w.align = 3;
        assert!(matches!(
            Restriction::new(d),
            Err(RestrictionError::BadAlignment { field: "src_w", align: 3 })
        ));
        let mut d = sample_desc();
        d.blk_y_align = 0;
        assert!(matches!(
            Restriction::new(d),
            Err(RestrictionError::BadAlignment { field: "blk_y_align", .. })
        ));
    }

    #[test]
    fn rejects_zero_scale() {
        let mut d = sample_desc();
        d.scale_down = 0;
        assert!(matches!(
            Restriction::new(d),
            Err(RestrictionError::BadScale { field: "scale_down", .. })
        ));
    }

    #[test]
    fn rotated_height_uses_rot_max() {
        let r = Restriction::new(sample_desc()).unwrap();
        assert_eq!(r.src_h_range(false).max, 4096);
        assert_eq!(r.src_h_range(true).max, 2160);
        assert_eq!(r.src_h_range(true).min, 16);
    }

    #[test]
    fn table_lookup_by_channel() {
        let mut table = RestrictionTable::new();
        table.insert(ChannelId(2), Restriction::new(sample_desc()).unwrap());
        assert!(table.for_channel(ChannelId(2)).is_some());
        assert!(table.for_channel(ChannelId(0)).is_none());
        assert_eq!(table.len(), 1);
    }
}
