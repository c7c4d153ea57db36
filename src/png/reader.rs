//! Per-color-type scanline readers.
//!
//! A reader turns one unfiltered scanline into canonical RGBA8 pixels.
//! 16-bit samples keep their high byte; sub-byte grayscale is scaled to
//! the full 0–255 range, sub-byte indices are used as-is.

use crate::bits::expand_bits_to_byte;
use crate::error::RasterError;
use crate::pixel::PixelBuffer;
use crate::rows::for_each_row;

use super::header::{ColorType, PngHeader};

/// Alpha used for palette entries with no tRNS value.
const OPAQUE: u8 = 255;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColorReader<'a> {
    Grayscale {
        bit_depth: u8,
        /// tRNS sample value rendered fully transparent.
        key: Option<u16>,
    },
    GrayscaleAlpha {
        bit_depth: u8,
    },
    TrueColor {
        bit_depth: u8,
        key: Option<[u16; 3]>,
    },
    TrueColorAlpha {
        bit_depth: u8,
    },
    Indexed {
        bit_depth: u8,
        palette: &'a [[u8; 3]],
        /// May be shorter than the palette.
        alpha: &'a [u8],
    },
}

impl<'a> ColorReader<'a> {
    /// Select the reader for `header`, interpreting a tRNS payload if present.
    pub fn for_header(
        header: &PngHeader,
        palette: &'a [[u8; 3]],
        transparency: Option<&'a [u8]>,
    ) -> Result<Self, RasterError> {
        let bit_depth = header.bit_depth;
        let be16 = |b: &[u8], i: usize| u16::from_be_bytes([b[2 * i], b[2 * i + 1]]);
        Ok(match header.color_type {
            ColorType::Grayscale => Self::Grayscale {
                bit_depth,
                key: transparency.filter(|t| t.len() >= 2).map(|t| be16(t, 0)),
            },
            ColorType::GrayscaleAlpha => Self::GrayscaleAlpha { bit_depth },
            ColorType::TrueColor => Self::TrueColor {
                bit_depth,
                key: transparency
                    .filter(|t| t.len() >= 6)
                    .map(|t| [be16(t, 0), be16(t, 1), be16(t, 2)]),
            },
            ColorType::TrueColorAlpha => Self::TrueColorAlpha { bit_depth },
            ColorType::Indexed => {
                if palette.is_empty() {
                    return Err(RasterError::MissingChunk("PLTE"));
                }
                Self::Indexed {
                    bit_depth,
                    palette,
                    alpha: transparency.unwrap_or(&[]),
                }
            }
        })
    }

    /// Write `out.len() / 4` pixels decoded from `scanline` into `out`.
    pub fn read_row(&self, scanline: &[u8], out: &mut [u8]) {
        let width = out.len() / 4;
        match *self {
            Self::Grayscale { bit_depth: 16, key } => {
                for (px, s) in out.chunks_exact_mut(4).zip(scanline.chunks_exact(2)) {
                    let v = u16::from_be_bytes([s[0], s[1]]);
                    px.copy_from_slice(&[s[0], s[0], s[0], key_alpha(key == Some(v))]);
                }
            }
            Self::Grayscale { bit_depth, key } => {
                // the color key compares raw samples, output uses scaled ones
                let mut raw = vec![0u8; width];
                let mut gray = vec![0u8; width];
                expand_bits_to_byte(bit_depth, false, scanline, &mut raw);
                expand_bits_to_byte(bit_depth, true, scanline, &mut gray);
                for (px, (&s, &g)) in out.chunks_exact_mut(4).zip(raw.iter().zip(&gray)) {
                    px.copy_from_slice(&[g, g, g, key_alpha(key == Some(u16::from(s)))]);
                }
            }
            Self::GrayscaleAlpha { bit_depth } => {
                let size = usize::from(bit_depth / 8) * 2;
                let hi = size / 2;
                for (px, s) in out.chunks_exact_mut(4).zip(scanline.chunks_exact(size)) {
                    px.copy_from_slice(&[s[0], s[0], s[0], s[hi]]);
                }
            }
            Self::TrueColor { bit_depth, key } => {
                let sample = usize::from(bit_depth / 8);
                for (px, s) in out.chunks_exact_mut(4).zip(scanline.chunks_exact(sample * 3)) {
                    let value = |c: usize| match sample {
                        2 => u16::from_be_bytes([s[2 * c], s[2 * c + 1]]),
                        _ => u16::from(s[c]),
                    };
                    let keyed = key == Some([value(0), value(1), value(2)]);
                    px.copy_from_slice(&[s[0], s[sample], s[2 * sample], key_alpha(keyed)]);
                }
            }
            Self::TrueColorAlpha { bit_depth } => {
                let sample = usize::from(bit_depth / 8);
                for (px, s) in out.chunks_exact_mut(4).zip(scanline.chunks_exact(sample * 4)) {
                    px.copy_from_slice(&[s[0], s[sample], s[2 * sample], s[3 * sample]]);
                }
            }
            Self::Indexed {
                bit_depth,
                palette,
                alpha,
            } => {
                let mut indices = vec![0u8; width];
                expand_bits_to_byte(bit_depth, false, scanline, &mut indices);
                for (px, &i) in out.chunks_exact_mut(4).zip(&indices) {
                    let i = usize::from(i);
                    let [r, g, b] = palette.get(i).copied().unwrap_or([0, 0, 0]);
                    px.copy_from_slice(&[r, g, b, alpha.get(i).copied().unwrap_or(OPAQUE)]);
                }
            }
        }
    }

    /// Decode `scanline` into row `y` of `pixels`.
    pub fn read_scanline(
        &self,
        scanline: &[u8],
        y: u32,
        pixels: &mut PixelBuffer,
    ) -> Result<(), RasterError> {
        let stride = pixels.stride();
        let start = y as usize * stride;
        let row = pixels
            .pixels_mut()
            .get_mut(start..start + stride)
            .ok_or_else(|| RasterError::InvalidData(format!("row {y} is outside the image")))?;
        self.read_row(scanline, row);
        Ok(())
    }

    /// Decode every row of unfiltered data into `pixels`.
    pub(crate) fn read_image(
        &self,
        unfiltered: &[u8],
        scanline_len: usize,
        pixels: &mut PixelBuffer,
    ) {
        let stride = pixels.stride();
        for_each_row(pixels.pixels_mut(), stride, |y, row| {
            let start = y * scanline_len;
            if let Some(scanline) = unfiltered.get(start..start + scanline_len) {
                self.read_row(scanline, row);
            }
        });
    }
}

fn key_alpha(keyed: bool) -> u8 {
    if keyed { 0 } else { OPAQUE }
}
