// Copyright 2026 the DPP Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Framebuffer modifiers and the compression schemes they select.
//!
//! A [`Modifier`] is the 64-bit layout tag attached to a framebuffer. The top
//! byte names the vendor; the remaining bits are vendor-defined. Bit 51 is the
//! protection flag and is independent of the vendor field.
//!
//! ```text
//!   63      56 55  52 51                                  0
//!  ┌─────────┬──────┬──┬──────────────────────────────────┐
//!  │ vendor  │ type │P │ vendor payload                   │
//!  └─────────┴──────┴──┴──────────────────────────────────┘
//! ```
//!
//! Samsung payload bits:
//!
//! - bit 4: SBWC identifier, bit 12: lossy, bits 5..=7: lossy block size
//! - bit 8: SAJC identifier, bits 9..=11: SAJC block shape

use core::fmt;

/// Vendor code for ARM modifiers (AFBC).
pub const VENDOR_ARM: u8 = 0x08;
/// Vendor code for Samsung modifiers (SBWC, SAJC).
pub const VENDOR_SAMSUNG: u8 = 0x04;

const PROTECTION_BIT: u64 = 1 << 51;
const TYPE_SHIFT: u32 = 52;
const TYPE_MASK: u64 = 0xf;

const SBWC_IDENTIFIER: u64 = 1 << 4;
const SBWC_LOSSY: u64 = 1 << 12;
const SBWC_BLOCK_SHIFT: u32 = 5;
const SBWC_BLOCK_MASK: u64 = 0x7;

const SAJC_IDENTIFIER: u64 = 1 << 8;
const SAJC_BLOCK_SHIFT: u32 = 9;
const SAJC_BLOCK_MASK: u64 = 0x7;

/// Byte budget per 32×4 block for lossy SBWC.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LossyBlock {
    /// 64 bytes per block (50 % of the 10-bit lossless budget).
    Bytes64,
    /// 96 bytes per block.
    Bytes96,
    /// 128 bytes per block.
    Bytes128,
}

impl LossyBlock {
    /// Hardware byte-number field value (`IDMA_LUM_LOSSY_BYTENUM`).
    #[must_use]
    pub const fn byte_num(self) -> u32 {
        match self {
            Self::Bytes64 => 2,
            Self::Bytes96 => 3,
            Self::Bytes128 => 4,
        }
    }

    const fn from_bits(bits: u64) -> Option<Self> {
        match bits {
            1 => Some(Self::Bytes64),
            2 => Some(Self::Bytes96),
            3 => Some(Self::Bytes128),
            _ => None,
        }
    }

    const fn to_bits(self) -> u64 {
        match self {
            Self::Bytes64 => 1,
            Self::Bytes96 => 2,
            Self::Bytes128 => 3,
        }
    }
}

/// Tile shape for SAJC compression.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SajcBlock {
    /// 16×16 pixel tiles.
    W16H16,
    /// 32×8 pixel tiles.
    W32H8,
    /// 64×4 pixel tiles.
    W64H4,
}

impl SajcBlock {
    /// Tile width and height in pixels.
    #[must_use]
    pub const fn dimensions(self) -> (u32, u32) {
        match self {
            Self::W16H16 => (16, 16),
            Self::W32H8 => (32, 8),
            Self::W64H4 => (64, 4),
        }
    }

    const fn from_bits(bits: u64) -> Option<Self> {
        match bits {
            0 => Some(Self::W16H16),
            1 => Some(Self::W32H8),
            2 => Some(Self::W64H4),
            _ => None,
        }
    }

    const fn to_bits(self) -> u64 {
        match self {
            Self::W16H16 => 0,
            Self::W32H8 => 1,
            Self::W64H4 => 2,
        }
    }
}

/// Compression applied to a framebuffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Compression {
    /// Uncompressed linear layout.
    #[default]
    None,
    /// ARM frame buffer compression (16×16 superblocks).
    Afbc,
    /// Samsung tiled compression with a caller-selected tile shape.
    Sajc(SajcBlock),
    /// Samsung bandwidth compression, lossless.
    SbwcLossless,
    /// Samsung bandwidth compression, lossy with a fixed block budget.
    SbwcLossy(LossyBlock),
}

/// Compression family without its parameters, for error reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompressionKind {
    /// ARM frame buffer compression.
    Afbc,
    /// Samsung tiled compression.
    Sajc,
    /// Samsung bandwidth compression (lossless or lossy).
    Sbwc,
}

impl fmt::Display for CompressionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Afbc => "AFBC",
            Self::Sajc => "SAJC",
            Self::Sbwc => "SBWC",
        })
    }
}

impl Compression {
    /// Returns the compression family, or `None` for linear buffers.
    #[must_use]
    pub const fn kind(self) -> Option<CompressionKind> {
        match self {
            Self::None => None,
            Self::Afbc => Some(CompressionKind::Afbc),
            Self::Sajc(_) => Some(CompressionKind::Sajc),
            Self::SbwcLossless | Self::SbwcLossy(_) => Some(CompressionKind::Sbwc),
        }
    }

    /// Whether this is one of the SBWC variants.
    #[must_use]
    pub const fn is_sbwc(self) -> bool {
        matches!(self, Self::SbwcLossless | Self::SbwcLossy(_))
    }
}

/// A 64-bit framebuffer layout modifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifier(pub u64);

impl Modifier {
    /// Linear, unprotected.
    pub const LINEAR: Self = Self(0);

    const fn vendor_code(vendor: u8, payload: u64) -> Self {
        Self(((vendor as u64) << 56) | payload)
    }

    /// AFBC modifier with the given ARM flag bits.
    #[must_use]
    pub const fn afbc(flags: u64) -> Self {
        Self::vendor_code(VENDOR_ARM, flags & ((1 << TYPE_SHIFT) - 1) & !PROTECTION_BIT)
    }

    /// SAJC modifier with the given tile shape.
    #[must_use]
    pub const fn sajc(block: SajcBlock) -> Self {
        Self::vendor_code(
            VENDOR_SAMSUNG,
            SAJC_IDENTIFIER | (block.to_bits() << SAJC_BLOCK_SHIFT),
        )
    }

    /// Lossless SBWC modifier.
    #[must_use]
    pub const fn sbwc_lossless() -> Self {
        Self::vendor_code(VENDOR_SAMSUNG, SBWC_IDENTIFIER)
    }

    /// Lossy SBWC modifier with the given block budget.
    #[must_use]
    pub const fn sbwc_lossy(block: LossyBlock) -> Self {
        Self::vendor_code(
            VENDOR_SAMSUNG,
            SBWC_IDENTIFIER | SBWC_LOSSY | (block.to_bits() << SBWC_BLOCK_SHIFT),
        )
    }

    /// Returns this modifier with the protection bit set.
    #[must_use]
    pub const fn protected(self) -> Self {
        Self(self.0 | PROTECTION_BIT)
    }

    /// Vendor byte.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "the vendor field is exactly the top byte"
    )]
    pub const fn vendor(self) -> u8 {
        (self.0 >> 56) as u8
    }

    /// Whether the buffer lives in protected memory.
    #[must_use]
    pub const fn is_protected(self) -> bool {
        self.0 & PROTECTION_BIT != 0
    }

    /// Decodes the compression scheme this modifier selects.
    ///
    /// Unknown vendors and malformed Samsung payloads decode as
    /// [`Compression::None`]; the framebuffer is then treated as linear.
    #[must_use]
    pub const fn compression(self) -> Compression {
        let ty = (self.0 >> TYPE_SHIFT) & TYPE_MASK;
        match self.vendor() {
            VENDOR_ARM if ty == 0 => Compression::Afbc,
            VENDOR_SAMSUNG => {
                if self.0 & SBWC_IDENTIFIER != 0 {
                    if self.0 & SBWC_LOSSY != 0 {
                        match LossyBlock::from_bits((self.0 >> SBWC_BLOCK_SHIFT) & SBWC_BLOCK_MASK)
                        {
                            Some(block) => Compression::SbwcLossy(block),
                            None => Compression::None,
                        }
                    } else {
                        Compression::SbwcLossless
                    }
                } else if self.0 & SAJC_IDENTIFIER != 0 {
                    match SajcBlock::from_bits((self.0 >> SAJC_BLOCK_SHIFT) & SAJC_BLOCK_MASK) {
                        Some(block) => Compression::Sajc(block),
                        None => Compression::None,
                    }
                } else {
                    Compression::None
                }
            }
            _ => Compression::None,
        }
    }
}

impl fmt::Debug for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Modifier({:#018x})", self.0)
    }
}
