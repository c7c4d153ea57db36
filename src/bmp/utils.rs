//! BMP bitfield helpers.
//!
//! Forked from zune-bmp 0.5.2 by Caleb Etemesi (MIT/Apache-2.0/Zlib).

/// Bitfield shift/scale table for converting N-bit values to 8-bit.
pub(crate) const MUL_TABLE: [u32; 9] = [
    0,    // 0 bits
    0xff, // 1 bit:  0b11111111
    0x55, // 2 bits: 0b01010101
    0x49, // 3 bits: 0b01001001
    0x11, // 4 bits: 0b00010001
    0x21, // 5 bits: 0b00100001
    0x41, // 6 bits: 0b01000001
    0x81, // 7 bits: 0b10000001
    0x01, // 8 bits: 0b00000001
];

pub(crate) const SHIFT_TABLE: [i32; 9] = [0, 0, 0, 1, 0, 2, 4, 6, 0];

/// Extract and scale a bitfield value to 8-bit range.
pub(crate) fn shift_signed(mut v: u32, shift: i32, bits: u32) -> u32 {
    if shift < 0 {
        v <<= -shift;
    } else {
        v >>= shift;
    }
    let bits = bits.min(8);
    v >>= 8 - bits;
    (v.wrapping_mul(MUL_TABLE[bits as usize])) >> SHIFT_TABLE[bits as usize]
}

/// Channel masks for 16/32-bit pixels (`BI_BITFIELDS`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitMasks {
    pub red: u32,
    pub green: u32,
    pub blue: u32,
    pub alpha: u32,
}

impl BitMasks {
    /// The implicit layout of 16-bit `BI_RGB` data: X1R5G5B5.
    pub const RGB555: Self = Self {
        red: 0x7C00,
        green: 0x03E0,
        blue: 0x001F,
        alpha: 0,
    };

    /// Unpack a stored pixel value to RGBA8. No alpha mask means opaque.
    pub(crate) fn unpack(&self, v: u32) -> [u8; 4] {
        let alpha = if self.alpha == 0 {
            255
        } else {
            extract(v, self.alpha)
        };
        [
            extract(v, self.red),
            extract(v, self.green),
            extract(v, self.blue),
            alpha,
        ]
    }

    /// Pack an RGBA8 pixel into a stored value.
    pub(crate) fn pack(&self, px: &[u8]) -> u32 {
        place(px[0], self.red)
            | place(px[1], self.green)
            | place(px[2], self.blue)
            | place(px[3], self.alpha)
    }
}

fn extract(v: u32, mask: u32) -> u8 {
    if mask == 0 {
        return 0;
    }
    let shift = (32 - mask.leading_zeros()) as i32 - 8;
    shift_signed(v & mask, shift, mask.count_ones()) as u8
}

fn place(c: u8, mask: u32) -> u32 {
    if mask == 0 {
        return 0;
    }
    let bits = mask.count_ones();
    let lsb = mask.trailing_zeros();
    let v = if bits >= 8 {
        u32::from(c) << (lsb + bits - 8)
    } else {
        (u32::from(c) >> (8 - bits)) << lsb
    };
    v & mask
}
