//! RLE8 decompression.
//!
//! Output uses the uncompressed stored layout (bottom-up rows of
//! `row_len` bytes, padding zeroed) so the 8-bit strategy can unpack it
//! like any other pixel array. The scan is strictly sequential.
//!
//! The output grows as runs land; the full `row_len * height` size comes
//! from the header and is only reserved once the stream is exhausted.

use std::iter::repeat_n;

use log::trace;

use crate::bytes::ByteReader;
use crate::error::RasterError;

const ESCAPE: u8 = 0;
const END_OF_LINE: u8 = 0;
const END_OF_BITMAP: u8 = 1;
const DELTA: u8 = 2;

/// Decompress an RLE8 stream into `row_len * height` bytes.
///
/// Stops at the end-of-bitmap marker or when the input runs out, whichever
/// comes first; rows never reached stay zero.
pub(crate) fn decompress_rle8(
    input: &[u8],
    row_len: usize,
    height: usize,
) -> Result<Vec<u8>, RasterError> {
    let total = row_len
        .checked_mul(height)
        .ok_or_else(|| RasterError::InvalidData("RLE8 output size overflows".into()))?;
    let mut out = Vec::new();
    let mut reader = ByteReader::new(input);
    let mut row = 0usize;
    let mut col = 0usize;

    while reader.remaining() >= 2 {
        let count = reader.read_u8()?;
        let value = reader.read_u8()?;

        if count != ESCAPE {
            let start = write_offset(row, col, row_len, usize::from(count), total)?;
            zero_extend(&mut out, start + usize::from(count))?;
            out[start..start + usize::from(count)].fill(value);
            col += usize::from(count);
            continue;
        }

        match value {
            END_OF_LINE => {
                row += 1;
                col = 0;
            }
            END_OF_BITMAP => {
                trace!("RLE8 end of bitmap at input offset {}", reader.position());
                zero_extend(&mut out, total)?;
                return Ok(out);
            }
            DELTA => {
                let dx = reader.read_u8()?;
                let dy = reader.read_u8()?;
                col += usize::from(dx);
                row += usize::from(dy);
            }
            literal => {
                let n = usize::from(literal);
                let bytes = reader.take(n)?;
                let start = write_offset(row, col, row_len, n, total)?;
                zero_extend(&mut out, start + n)?;
                out[start..start + n].copy_from_slice(bytes);
                col += n;
                // literal runs are padded to a 16-bit boundary
                let pad = (2 - n % 2) % 2;
                reader.skip(pad.min(reader.remaining()))?;
            }
        }
    }

    zero_extend(&mut out, total)?;
    Ok(out)
}

/// Grow `out` with zeros to at least `len` bytes.
fn zero_extend(out: &mut Vec<u8>, len: usize) -> Result<(), RasterError> {
    if let Some(extra) = len.checked_sub(out.len()).filter(|&n| n > 0) {
        out.try_reserve(extra).map_err(|e| {
            RasterError::LimitExceeded(format!("RLE8 output of {len} bytes: {e}"))
        })?;
        out.resize(len, 0);
    }
    Ok(())
}

fn write_offset(
    row: usize,
    col: usize,
    row_len: usize,
    n: usize,
    total: usize,
) -> Result<usize, RasterError> {
    row.checked_mul(row_len)
        .and_then(|r| r.checked_add(col))
        .filter(|start| start.checked_add(n).is_some_and(|end| end <= total))
        .ok_or_else(|| {
            RasterError::InvalidData(format!(
                "RLE8 run of {n} at row {row}, column {col} overflows the image"
            ))
        })
}

/// Compress one stored 8-bit pixel array back to RLE8 (encoded runs only,
/// literal runs for non-repeating stretches of 3 or more).
pub(crate) fn compress_rle8(raw: &[u8], width: usize, row_len: usize, height: usize) -> Vec<u8> {
    let mut out = Vec::new();
    for stored in raw.chunks_exact(row_len).take(height) {
        let pixels = &stored[..width.min(stored.len())];
        let mut i = 0;
        while i < pixels.len() {
            let run = pixels[i..]
                .iter()
                .take(255)
                .take_while(|&&b| b == pixels[i])
                .count();
            if run >= 2 {
                out.extend_from_slice(&[run as u8, pixels[i]]);
                i += run;
                continue;
            }
            // gather a literal stretch until the next repeat
            let mut end = i + 1;
            while end < pixels.len()
                && end - i < 255
                && !(end + 1 < pixels.len() && pixels[end] == pixels[end + 1])
            {
                end += 1;
            }
            let literal = &pixels[i..end];
            if literal.len() >= 3 {
                out.extend_from_slice(&[ESCAPE, literal.len() as u8]);
                out.extend_from_slice(literal);
                out.extend(repeat_n(0u8, literal.len() % 2));
            } else {
                for &b in literal {
                    out.extend_from_slice(&[1, b]);
                }
            }
            i = end;
        }
        out.extend_from_slice(&[ESCAPE, END_OF_LINE]);
    }
    out.extend_from_slice(&[ESCAPE, END_OF_BITMAP]);
    out
}
