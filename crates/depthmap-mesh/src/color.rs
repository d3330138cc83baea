//! Compact per-vertex color codes.
//!
//! The depth map stores one opaque `u32` code per vertex. How colors are packed
//! belongs to whoever persists the mesh, so the encoding sits behind
//! [`ColorCodec`].

use crate::VertexColor;

/// Maps sampled RGB colors to compact codes and back.
pub trait ColorCodec {
    /// Encode a sampled color.
    fn encode(&self, color: VertexColor) -> u32;

    /// Decode a stored code.
    fn decode(&self, code: u32) -> VertexColor;
}

/// Packs colors as `0x00RRGGBB`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackedRgb;

impl ColorCodec for PackedRgb {
    #[inline]
    fn encode(&self, color: VertexColor) -> u32 {
        (u32::from(color.r) << 16) | (u32::from(color.g) << 8) | u32::from(color.b)
    }

    #[inline]
    fn decode(&self, code: u32) -> VertexColor {
        VertexColor::new((code >> 16) as u8, (code >> 8) as u8, code as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_layout() {
        assert_eq!(PackedRgb.encode(VertexColor::new(0x12, 0x34, 0x56)), 0x0012_3456);
        assert_eq!(PackedRgb.decode(0x00ab_cdef), VertexColor::new(0xab, 0xcd, 0xef));
    }

    #[test]
    fn test_decode_ignores_high_byte() {
        assert_eq!(PackedRgb.decode(0xff00_00ff), VertexColor::new(0, 0, 0xff));
    }
}
