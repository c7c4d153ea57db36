//! Sub-byte sample expansion shared by the BMP and PNG unpackers.
//!
//! Forked from zune-bmp 0.5.2 by Caleb Etemesi (MIT/Apache-2.0/Zlib).

/// Expand packed 1/2/4-bit samples (MSB first) to one byte each.
///
/// When `scale_samples` is false, output values are raw palette indices.
/// When true, values are scaled to 0–255. Depth 8 is copied through.
pub(crate) fn expand_bits_to_byte(depth: u8, scale_samples: bool, input: &[u8], out: &mut [u8]) {
    let scale: u8 = if scale_samples {
        match depth {
            1 => 0xFF,
            2 => 0x55,
            4 => 0x11,
            _ => 1,
        }
    } else {
        1
    };

    match depth {
        1 | 2 | 4 => {
            let per_byte = usize::from(8 / depth);
            let mask = (1u8 << depth) - 1;
            for (out_vals, in_val) in out.chunks_mut(per_byte).zip(input) {
                for (pos, out_val) in out_vals.iter_mut().enumerate() {
                    let shift = 8 - usize::from(depth) * (pos + 1);
                    *out_val = scale.wrapping_mul((in_val >> shift) & mask);
                }
            }
        }
        _ => {
            let n = out.len().min(input.len());
            out[..n].copy_from_slice(&input[..n]);
        }
    }
}

/// Pack one sub-byte sample into `row` at sample position `index`, MSB first.
pub(crate) fn put_bits(row: &mut [u8], index: usize, depth: u8, value: u8) {
    let bit = index * usize::from(depth);
    let shift = 8 - usize::from(depth) - bit % 8;
    let mask = ((1u16 << depth) - 1) as u8;
    if let Some(byte) = row.get_mut(bit / 8) {
        *byte = (*byte & !(mask << shift)) | ((value & mask) << shift);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_one_bit_indices() {
        let mut out = [9u8; 10];
        expand_bits_to_byte(1, false, &[0b1010_0001, 0b1100_0000], &mut out);
        assert_eq!(out, [1, 0, 1, 0, 0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn expand_two_bit_scaled() {
        let mut out = [0u8; 4];
        expand_bits_to_byte(2, true, &[0b00_01_10_11], &mut out);
        assert_eq!(out, [0, 0x55, 0xAA, 0xFF]);
    }

    #[test]
    fn expand_four_bit_odd_width() {
        let mut out = [0u8; 3];
        expand_bits_to_byte(4, false, &[0x3C, 0xA0], &mut out);
        assert_eq!(out, [3, 12, 10]);
    }

    #[test]
    fn put_bits_inverts_expand() {
        let mut row = [0u8; 2];
        for (i, v) in [3u8, 0, 1, 2, 3].iter().enumerate() {
            put_bits(&mut row, i, 2, *v);
        }
        let mut out = [0u8; 5];
        expand_bits_to_byte(2, false, &row, &mut out);
        assert_eq!(out, [3, 0, 1, 2, 3]);
    }
}
