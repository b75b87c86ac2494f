// Copyright 2026 the DPP Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Static pixel-format catalog.
//!
//! Every format the channel can scan out is described once in [`CATALOG`].
//! Entries carry the hardware format codes for the input DMA and the
//! pre-processor, the alignment multiplier applied to source geometry, and the
//! per-format capability flags the validator cross-checks.
//!
//! Plane sizes are computed by enum dispatch over [`PlaneLayout`]; the
//! compressed layouts ([`Compression`]) override the linear strategy.
//!
//! Planes are numbered by register slot, which for the 8+2 layouts differs
//! from the order the planes appear in a contiguous buffer:
//!
//! ```text
//!   slot:    0        1        2        3
//!   linear:  Y8/RGB   C8       Y2       C2
//!   SBWC:    Y body   C body   Y header C header
//!   SAJC:    body     -        header   -
//! ```

use core::fmt;

use crate::modifier::Compression;

/// A DRM-style four character format code.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FourCc(pub u32);

impl FourCc {
    /// Builds a code from its four ASCII bytes, e.g. `FourCc::new(*b"NV12")`.
    #[must_use]
    pub const fn new(code: [u8; 4]) -> Self {
        Self(u32::from_le_bytes(code))
    }

    /// Returns the four code bytes.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
}

impl fmt::Debug for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCc({self})")
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.to_bytes() {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

/// Color model and chroma subsampling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorModel {
    /// Packed RGB, no subsampling.
    Rgb,
    /// YUV with chroma halved in both directions.
    Yuv420,
    /// YUV with chroma halved horizontally.
    Yuv422,
}

impl ColorModel {
    /// Whether the format needs color-space conversion before blending.
    #[must_use]
    pub const fn is_yuv(self) -> bool {
        !matches!(self, Self::Rgb)
    }

    /// Divisor applied to the luma height to get chroma rows.
    const fn chroma_v_sub(self) -> u64 {
        match self {
            Self::Yuv420 => 2,
            Self::Rgb | Self::Yuv422 => 1,
        }
    }
}

/// Plane size strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlaneLayout {
    /// One interleaved plane.
    Packed,
    /// Luma plane plus interleaved chroma plane.
    SemiPlanar,
    /// Semi-planar with the 10-bit samples split into 8-bit and 2-bit planes.
    ///
    /// A contiguous buffer holds Y8, Y2, C8, C2 in that order.
    SemiPlanar8p2,
    /// Separate Y, U, and V planes.
    Planar,
}

/// Immutable description of one pixel format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelFormat {
    /// Human-readable name.
    pub name: &'static str,
    /// Wire identifier.
    pub fourcc: FourCc,
    /// Bits per component; disambiguates formats sharing a fourcc.
    pub bpc: u8,
    /// Number of planes in register slot order.
    pub num_planes: u8,
    /// Bits per luma pixel contributed by each plane, in register slot order.
    pub bpp: [u8; 4],
    /// Size strategy.
    pub layout: PlaneLayout,
    /// Color model.
    pub color: ColorModel,
    /// Alpha component length in bits.
    pub alpha_bits: u8,
    /// Input DMA format code, if the DMA can fetch this format.
    pub dma_code: Option<u8>,
    /// Pre-processor format code.
    pub dpp_code: Option<u8>,
    /// Multiplier applied to source alignment restrictions.
    pub align_factor: u8,
    /// Whether the channel may rotate or flip this format.
    pub rotatable: bool,
    /// Whether AFBC framebuffers may use this format.
    pub afbc: bool,
    /// Whether SBWC framebuffers may use this format.
    pub sbwc: bool,
}

impl PixelFormat {
    /// Whether the format carries an alpha channel.
    #[must_use]
    pub const fn has_alpha(&self) -> bool {
        self.alpha_bits > 0
    }

    /// Whether this is a 10-bit format.
    #[must_use]
    pub const fn is_10bit(&self) -> bool {
        self.bpc > 8
    }

    /// Total bits per luma pixel across all planes.
    #[must_use]
    pub const fn total_bpp(&self) -> u32 {
        self.bpp[0] as u32 + self.bpp[1] as u32 + self.bpp[2] as u32 + self.bpp[3] as u32
    }

    /// Computes per-slot plane sizes for a `width` × `height` buffer.
    ///
    /// Sizes saturate at `u64::MAX` instead of overflowing.
    #[must_use]
    pub fn plane_sizes(&self, width: u32, height: u32, compression: Compression) -> PlaneSizes {
        let w = u64::from(width);
        let h = u64::from(height);
        match compression {
            Compression::None => self.linear_sizes(w, h),
            Compression::Afbc => afbc_sizes(w, h, u64::from(self.total_bpp())),
            Compression::Sajc(block) => {
                let (bw, bh) = block.dimensions();
                sajc_sizes(w, h, u64::from(bw), u64::from(bh), u64::from(self.total_bpp()))
            }
            Compression::SbwcLossless => sbwc_sizes(w, h, self.is_10bit(), self.color, None),
            Compression::SbwcLossy(block) => {
                sbwc_sizes(w, h, self.is_10bit(), self.color, Some(block.byte_num()))
            }
        }
    }

    fn linear_sizes(&self, w: u64, h: u64) -> PlaneSizes {
        let sub = self.color.chroma_v_sub();
        let area = w.saturating_mul(h);
        match self.layout {
            PlaneLayout::Packed => {
                let bits = area.saturating_mul(u64::from(self.bpp[0]));
                PlaneSizes::new([bits.div_ceil(8), 0, 0, 0], &[0])
            }
            PlaneLayout::SemiPlanar => {
                let sample = if self.is_10bit() { 2 } else { 1 };
                let luma = area.saturating_mul(sample);
                let chroma = align(w, 2)
                    .saturating_mul(sample)
                    .saturating_mul(h.div_ceil(sub));
                PlaneSizes::new([luma, chroma, 0, 0], &[0, 1])
            }
            PlaneLayout::SemiPlanar8p2 => {
                let ah = align(h, 16);
                let y8 = align(w, 16).saturating_mul(ah);
                let y2 = align(w / 4, 16).saturating_mul(ah);
                PlaneSizes::new(
                    [
                        y8.saturating_add(256),
                        (y8 / sub).saturating_add(256),
                        y2.saturating_add(64),
                        (y2 / sub).saturating_add(64),
                    ],
                    &[0, 2, 1, 3],
                )
            }
            PlaneLayout::Planar => {
                let chroma = w.div_ceil(2).saturating_mul(h.div_ceil(sub));
                PlaneSizes::new([area, chroma, chroma, 0], &[0, 1, 2])
            }
        }
    }
}

const fn align(v: u64, a: u64) -> u64 {
    v.div_ceil(a).saturating_mul(a)
}

fn afbc_sizes(w: u64, h: u64, bpp: u64) -> PlaneSizes {
    let blocks = w.div_ceil(16).saturating_mul(h.div_ceil(16));
    let header = align(blocks.saturating_mul(16), 1024);
    let body = blocks.saturating_mul(16 * 16).saturating_mul(bpp) / 8;
    PlaneSizes::new([header.saturating_add(body), 0, 0, 0], &[0])
}

fn sajc_sizes(w: u64, h: u64, bw: u64, bh: u64, bpp: u64) -> PlaneSizes {
    let blocks = w.div_ceil(bw).saturating_mul(h.div_ceil(bh));
    let header = align(blocks.saturating_mul(16), 256);
    let body = blocks.saturating_mul(bw * bh).saturating_mul(bpp) / 8;
    PlaneSizes::new([body, 0, header, 0], &[2, 0])
}

fn sbwc_sizes(
    w: u64,
    h: u64,
    ten_bit: bool,
    color: ColorModel,
    lossy_bytes: Option<u32>,
) -> PlaneSizes {
    let ah = align(h, 16);
    let c_rows = ah / color.chroma_v_sub();
    let blocks_w = w.div_ceil(32);
    let (y_body, c_body, y_header, c_header) = match lossy_bytes {
        None => {
            let stride = blocks_w.saturating_mul(if ten_bit { 160 } else { 128 });
            let header_stride = align(w.div_ceil(64), 16);
            (
                stride.saturating_mul(ah.div_ceil(4)).saturating_add(64),
                stride.saturating_mul(c_rows.div_ceil(4)).saturating_add(64),
                align(header_stride.saturating_mul(ah.div_ceil(4)).saturating_add(256), 32),
                align(header_stride.saturating_mul(c_rows.div_ceil(4)).saturating_add(128), 32),
            )
        }
        Some(byte_num) => {
            // Lossy blocks have a fixed 32-byte-unit budget and no header.
            let stride = blocks_w.saturating_mul(32 * u64::from(byte_num));
            (
                stride.saturating_mul(ah.div_ceil(4)),
                stride.saturating_mul(c_rows.div_ceil(4)),
                0,
                0,
            )
        }
    };
    PlaneSizes::new([y_body, c_body, y_header, c_header], &[0, 2, 1, 3])
}

/// Per-slot plane sizes plus the order the slots occupy in memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaneSizes {
    bytes: [u64; 4],
    order: [u8; 4],
    count: u8,
}

impl PlaneSizes {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "at most four slots"
    )]
    fn new(bytes: [u64; 4], order: &[u8]) -> Self {
        let mut o = [0; 4];
        o[..order.len()].copy_from_slice(order);
        Self {
            bytes,
            order: o,
            count: order.len() as u8,
        }
    }

    /// Size in bytes of register slot `slot` (0 for unused slots).
    #[must_use]
    pub fn slot(&self, slot: usize) -> u64 {
        self.bytes.get(slot).copied().unwrap_or(0)
    }

    /// Slots in the order they are laid out in a contiguous buffer.
    #[must_use]
    pub fn memory_order(&self) -> &[u8] {
        &self.order[..usize::from(self.count)]
    }

    /// Sum of all plane sizes.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.bytes.iter().fold(0, |acc, &b| acc.saturating_add(b))
    }

    /// Byte offset of each slot from the start of a contiguous buffer.
    ///
    /// Unused slots report offset 0. Offsets saturate at `u64::MAX`.
    #[must_use]
    pub fn offsets(&self) -> [u64; 4] {
        let mut out = [0; 4];
        let mut at: u64 = 0;
        for &slot in self.memory_order() {
            out[usize::from(slot)] = at;
            at = at.saturating_add(self.bytes[usize::from(slot)]);
        }
        out
    }
}

/// Lookup failure: the fourcc is not in the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown pixel format {0}")]
pub struct UnknownFormat(pub FourCc);

/// Looks up a format by fourcc.
///
/// When several entries share the fourcc, the one whose bits-per-component
/// equals `bpc_hint` wins. Without a hint, or when nothing matches it, the
/// first entry with the fourcc is returned.
pub fn lookup(fourcc: FourCc, bpc_hint: Option<u8>) -> Result<&'static PixelFormat, UnknownFormat> {
    let mut first = None;
    for fmt in CATALOG.iter().filter(|f| f.fourcc == fourcc) {
        if bpc_hint.is_some_and(|bpc| bpc == fmt.bpc) {
            return Ok(fmt);
        }
        first.get_or_insert(fmt);
    }
    first.ok_or(UnknownFormat(fourcc))
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

const fn rgb(
    name: &'static str,
    code: &[u8; 4],
    bpc: u8,
    bpp: u8,
    alpha_bits: u8,
    dma: u8,
    dpp: u8,
) -> PixelFormat {
    PixelFormat {
        name,
        fourcc: FourCc::new(*code),
        bpc,
        num_planes: 1,
        bpp: [bpp, 0, 0, 0],
        layout: PlaneLayout::Packed,
        color: ColorModel::Rgb,
        alpha_bits,
        dma_code: Some(dma),
        dpp_code: Some(dpp),
        align_factor: 1,
        rotatable: true,
        afbc: true,
        sbwc: false,
    }
}

const fn yuv(
    name: &'static str,
    code: &[u8; 4],
    bpc: u8,
    bpp: [u8; 4],
    layout: PlaneLayout,
    color: ColorModel,
    dma: Option<u8>,
    dpp: Option<u8>,
) -> PixelFormat {
    let num_planes = match layout {
        PlaneLayout::Packed => 1,
        PlaneLayout::SemiPlanar => 2,
        PlaneLayout::Planar => 3,
        PlaneLayout::SemiPlanar8p2 => 4,
    };
    let is_420 = matches!(color, ColorModel::Yuv420);
    PixelFormat {
        name,
        fourcc: FourCc::new(*code),
        bpc,
        num_planes,
        bpp,
        layout,
        color,
        alpha_bits: 0,
        dma_code: dma,
        dpp_code: dpp,
        align_factor: 2,
        rotatable: is_420,
        afbc: false,
        sbwc: is_420 && matches!(layout, PlaneLayout::SemiPlanar),
    }
}

const NV12_8P2_BPP: [u8; 4] = [8, 4, 2, 1];
const NV16_8P2_BPP: [u8; 4] = [8, 8, 2, 2];

/// Every format known to the channel.
#[rustfmt::skip]
pub static CATALOG: [PixelFormat; 26] = [
    rgb("ARGB8888", b"AR24", 8, 32, 8, 0, 0),
    rgb("ABGR8888", b"AB24", 8, 32, 8, 1, 0),
    rgb("RGBA8888", b"RA24", 8, 32, 8, 2, 0),
    rgb("BGRA8888", b"BA24", 8, 32, 8, 3, 0),
    rgb("XRGB8888", b"XR24", 8, 32, 0, 4, 0),
    rgb("XBGR8888", b"XB24", 8, 32, 0, 5, 0),
    rgb("RGBX8888", b"RX24", 8, 32, 0, 6, 0),
    rgb("BGRX8888", b"BX24", 8, 32, 0, 7, 0),
    rgb("RGB565", b"RG16", 8, 16, 0, 8, 0),
    rgb("BGR565", b"BG16", 8, 16, 0, 9, 0),
    rgb("ARGB2101010", b"AR30", 10, 32, 2, 16, 1),
    rgb("ABGR2101010", b"AB30", 10, 32, 2, 17, 1),
    rgb("RGBA1010102", b"RA30", 10, 32, 2, 18, 1),
    rgb("BGRA1010102", b"BA30", 10, 32, 2, 19, 1),
    yuv("NV12", b"NV12", 8, [8, 4, 0, 0], PlaneLayout::SemiPlanar, ColorModel::Yuv420, Some(24), Some(2)),
    yuv("NV21", b"NV21", 8, [8, 4, 0, 0], PlaneLayout::SemiPlanar, ColorModel::Yuv420, Some(25), Some(2)),
    yuv("NV12_8P2", b"NV12", 10, NV12_8P2_BPP, PlaneLayout::SemiPlanar8p2, ColorModel::Yuv420, Some(26), Some(4)),
    yuv("NV21_8P2", b"NV21", 10, NV12_8P2_BPP, PlaneLayout::SemiPlanar8p2, ColorModel::Yuv420, Some(27), Some(4)),
    yuv("P010", b"P010", 10, [16, 8, 0, 0], PlaneLayout::SemiPlanar, ColorModel::Yuv420, Some(29), Some(3)),
    yuv("NV16", b"NV16", 8, [8, 8, 0, 0], PlaneLayout::SemiPlanar, ColorModel::Yuv422, Some(57), Some(5)),
    yuv("NV61", b"NV61", 8, [8, 8, 0, 0], PlaneLayout::SemiPlanar, ColorModel::Yuv422, Some(56), Some(5)),
    yuv("NV16_8P2", b"NV16", 10, NV16_8P2_BPP, PlaneLayout::SemiPlanar8p2, ColorModel::Yuv422, Some(59), Some(7)),
    yuv("NV61_8P2", b"NV61", 10, NV16_8P2_BPP, PlaneLayout::SemiPlanar8p2, ColorModel::Yuv422, Some(58), Some(7)),
    yuv("P210", b"P210", 10, [16, 16, 0, 0], PlaneLayout::SemiPlanar, ColorModel::Yuv422, Some(61), Some(6)),
    yuv("YUV420", b"YU12", 8, [8, 2, 2, 0], PlaneLayout::Planar, ColorModel::Yuv420, None, None),
    yuv("YVU420", b"YV12", 8, [8, 2, 2, 0], PlaneLayout::Planar, ColorModel::Yuv420, None, None),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::{LossyBlock, SajcBlock};

    fn fmt(code: &[u8; 4]) -> &'static PixelFormat {
        lookup(FourCc::new(*code), None).unwrap()
    }

    #[test]
    fn fourcc_displays_as_ascii() {
        assert_eq!(alloc::format!("{}", FourCc::new(*b"NV12")), "NV12");
    }

    #[test]
    fn lookup_without_hint_returns_first_entry() {
        let f = fmt(b"NV12");
        assert_eq!(f.name, "NV12");
        assert_eq!(f.bpc, 8);
    }

    #[test]
    fn lookup_hint_selects_depth_variant() {
        let f = lookup(FourCc::new(*b"NV12"), Some(10)).unwrap();
        assert_eq!(f.name, "NV12_8P2");
        assert_eq!(f.layout, PlaneLayout::SemiPlanar8p2);
    }

    #[test]
    fn lookup_unmatched_hint_falls_back_to_first() {
        let f = lookup(FourCc::new(*b"AR24"), Some(12)).unwrap();
        assert_eq!(f.name, "ARGB8888");
    }

    #[test]
    fn lookup_unknown_fourcc_fails() {
        let code = FourCc::new(*b"ZZZZ");
        assert_eq!(lookup(code, None), Err(UnknownFormat(code)));
    }

    #[test]
    fn yuv_formats_double_alignment() {
        assert_eq!(fmt(b"NV12").align_factor, 2);
        assert_eq!(fmt(b"AR24").align_factor, 1);
    }

    #[test]
    fn packed_size_is_width_height_bytes() {
        let s = fmt(b"AR24").plane_sizes(1920, 1080, Compression::None);
        assert_eq!(s.slot(0), 1920 * 1080 * 4);
        assert_eq!(s.memory_order(), &[0]);
    }

    #[test]
    fn nv12_chroma_rounds_odd_height_up() {
        let s = fmt(b"NV12").plane_sizes(64, 33, Compression::None);
        assert_eq!(s.slot(0), 64 * 33);
        assert_eq!(s.slot(1), 64 * 17);
        assert_eq!(s.offsets(), [0, 64 * 33, 0, 0]);
    }

    #[test]
    fn split_planes_interleave_in_memory() {
        let f = lookup(FourCc::new(*b"NV12"), Some(10)).unwrap();
        let s = f.plane_sizes(64, 64, Compression::None);
        let y8 = 64 * 64 + 256;
        let y2 = 16 * 64 + 64;
        let c8 = 64 * 32 + 256;
        assert_eq!(s.slot(0), y8);
        assert_eq!(s.slot(2), y2);
        // Memory order Y8, Y2, C8, C2.
        assert_eq!(s.offsets(), [0, y8 + y2, y8, y8 + y2 + c8]);
    }

    #[test]
    fn sbwc_headers_follow_payloads() {
        let s = fmt(b"NV12").plane_sizes(128, 64, Compression::SbwcLossless);
        let off = s.offsets();
        assert_eq!(off[0], 0);
        assert_eq!(off[2], s.slot(0));
        assert_eq!(off[1], s.slot(0) + s.slot(2));
        assert_eq!(off[3], off[1] + s.slot(1));
        // 8-bit stride: 128 bytes per 32-pixel column, 16 rows of 4 lines.
        assert_eq!(s.slot(0), 4 * 128 * 16 + 64);
    }

    #[test]
    fn sbwc_lossy_has_no_header() {
        let s = fmt(b"NV12").plane_sizes(64, 16, Compression::SbwcLossy(LossyBlock::Bytes64));
        assert_eq!(s.slot(2), 0);
        assert_eq!(s.slot(0), 2 * 64 * 4);
    }

    #[test]
    fn sajc_header_precedes_payload() {
        let s = fmt(b"AR24").plane_sizes(64, 64, Compression::Sajc(SajcBlock::W16H16));
        let off = s.offsets();
        assert_eq!(off[2], 0);
        assert_eq!(off[0], 256);
        assert_eq!(s.slot(0), 64 * 64 * 4);
    }

    #[test]
    fn afbc_is_a_single_slot() {
        let s = fmt(b"AR24").plane_sizes(32, 32, Compression::Afbc);
        assert_eq!(s.memory_order(), &[0]);
        assert_eq!(s.slot(0), 1024 + 32 * 32 * 4);
    }

    #[test]
    fn oversized_buffers_saturate() {
        let s = fmt(b"AR24").plane_sizes(u32::MAX, u32::MAX, Compression::None);
        assert_eq!(s.slot(0), u64::MAX.div_ceil(8));
        let s = fmt(b"AR24").plane_sizes(u32::MAX, u32::MAX, Compression::Afbc);
        assert!(s.total() > u64::from(u32::MAX), "afbc size is not wrapped");
        let s = fmt(b"NV12").plane_sizes(u32::MAX, u32::MAX, Compression::None);
        let luma = u64::from(u32::MAX) * u64::from(u32::MAX);
        assert_eq!(s.offsets()[1], luma);
        assert_eq!(s.total(), u64::MAX);
    }

    #[test]
    fn planar_yuv_has_no_dma_code() {
        let f = fmt(b"YU12");
        assert_eq!(f.num_planes, 3);
        assert!(f.dma_code.is_none());
    }

    #[test]
    fn catalog_plane_counts_match_layout() {
        for f in &CATALOG {
            let used = f.bpp.iter().filter(|&&b| b > 0).count();
            assert_eq!(used, usize::from(f.num_planes), "{}", f.name);
        }
    }
}
