//! Per-bit-depth pixel format strategies.
//!
//! Each strategy is a stateless mapping between the stored pixel array
//! (bottom-up, rows padded to 4 bytes) and canonical top-down RGBA8.
//! Rows are independent in both directions and are fanned out with
//! [`for_each_row`].

use std::collections::HashMap;

use log::warn;

use super::header::{BmpHeader, Compression};
use super::rle::decompress_rle8;
use super::utils::BitMasks;
use crate::bits::{expand_bits_to_byte, put_bits};
use crate::error::RasterError;
use crate::limits::zeroed_buffer;
use crate::pixel::Color;
use crate::rows::for_each_row;

/// Returned for palette indices past the end of the color table.
const MISSING_PALETTE_ENTRY: Color = Color::rgb(0, 0, 0);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Indexed1,
    Indexed4,
    Indexed8,
    Rgb16,
    Rgb24,
    Rgb32,
}

/// Bit depth → strategy. Immutable; shared by every decode.
const FORMAT_TABLE: [(u16, PixelFormat); 6] = [
    (1, PixelFormat::Indexed1),
    (4, PixelFormat::Indexed4),
    (8, PixelFormat::Indexed8),
    (16, PixelFormat::Rgb16),
    (24, PixelFormat::Rgb24),
    (32, PixelFormat::Rgb32),
];

impl PixelFormat {
    pub fn for_bit_depth(bits_per_pixel: u16) -> Option<Self> {
        FORMAT_TABLE
            .iter()
            .find(|(bits, _)| *bits == bits_per_pixel)
            .map(|(_, format)| *format)
    }

    pub const fn bits_per_pixel(self) -> u16 {
        match self {
            Self::Indexed1 => 1,
            Self::Indexed4 => 4,
            Self::Indexed8 => 8,
            Self::Rgb16 => 16,
            Self::Rgb24 => 24,
            Self::Rgb32 => 32,
        }
    }

    pub const fn is_indexed(self) -> bool {
        matches!(self, Self::Indexed1 | Self::Indexed4 | Self::Indexed8)
    }

    /// Pull the stored pixel array out of `pixel_data` (bytes from the pixel offset on).
    ///
    /// Uncompressed data yields at least `row_byte_len * height` bytes, widened
    /// to the declared image size when that is larger and present. RLE8 data is
    /// decompressed into the same padded row layout.
    pub fn read(self, header: &BmpHeader, pixel_data: &[u8]) -> Result<Vec<u8>, RasterError> {
        let needed = header.raw_size()?;
        match header.compression {
            Compression::Rgb | Compression::Bitfields => {
                if pixel_data.len() < needed {
                    return Err(RasterError::UnexpectedEof);
                }
                let declared = header.image_size as usize;
                let take = if declared > needed {
                    if declared > pixel_data.len() {
                        warn!(
                            "BMP declares {declared} bytes of pixel data but only {} remain",
                            pixel_data.len()
                        );
                    }
                    declared.min(pixel_data.len())
                } else {
                    needed
                };
                Ok(pixel_data[..take].to_vec())
            }
            Compression::Rle8 => {
                if self != Self::Indexed8 {
                    return Err(RasterError::UnsupportedVariant(format!(
                        "RLE8 compression with {} bpp",
                        header.bits_per_pixel
                    )));
                }
                let compressed = match header.image_size as usize {
                    0 => pixel_data,
                    n => &pixel_data[..n.min(pixel_data.len())],
                };
                decompress_rle8(compressed, header.row_byte_len(), header.height as usize)
            }
            Compression::Rle4 => Err(RasterError::UnsupportedVariant(
                "RLE4 compression is not supported".into(),
            )),
        }
    }

    /// Unpack stored rows into canonical top-down RGBA8 bytes.
    pub fn decode(
        self,
        header: &BmpHeader,
        raw: &[u8],
        palette: &[Color],
    ) -> Result<Vec<u8>, RasterError> {
        let width = header.width as usize;
        let row_len = header.row_byte_len();
        let needed = header.raw_size()?;
        if raw.len() < needed {
            return Err(RasterError::UnexpectedEof);
        }
        let out_len = width
            .checked_mul(header.height as usize)
            .and_then(|p| p.checked_mul(4))
            .ok_or(RasterError::DimensionsTooLarge {
                width: header.width,
                height: header.height,
            })?;
        let masks = self.masks(header);

        let mut out = zeroed_buffer(out_len)?;
        for_each_row(&mut out, width * 4, |y, dst| {
            let start = header.stored_row(y) * row_len;
            let src = &raw[start..start + row_len];
            self.decode_row(src, dst, width, palette, masks);
        });
        Ok(out)
    }

    /// Pack canonical RGBA8 bytes into stored rows, padding included.
    pub fn encode(
        self,
        header: &BmpHeader,
        canonical: &[u8],
        palette: &[Color],
    ) -> Result<Vec<u8>, RasterError> {
        let width = header.width as usize;
        let stride = width * 4;
        let expected = stride * header.height as usize;
        if canonical.len() < expected {
            return Err(RasterError::BufferTooSmall {
                needed: expected,
                actual: canonical.len(),
            });
        }
        let row_len = header.row_byte_len();
        let masks = self.masks(header);
        let lookup = PaletteLookup::new(palette);

        // stored_row is its own inverse, so the same mapping restores storage order.
        let mut raw = zeroed_buffer(header.raw_size()?)?;
        for_each_row(&mut raw, row_len, |stored, dst| {
            let y = header.stored_row(stored);
            let src = &canonical[y * stride..(y + 1) * stride];
            self.encode_row(src, dst, &lookup, masks);
        });
        Ok(raw)
    }

    fn masks(self, header: &BmpHeader) -> Option<BitMasks> {
        match (self, header.masks) {
            (Self::Rgb16, None) => Some(BitMasks::RGB555),
            (Self::Rgb16 | Self::Rgb32, masks) => masks,
            _ => None,
        }
    }

    fn decode_row(
        self,
        src: &[u8],
        dst: &mut [u8],
        width: usize,
        palette: &[Color],
        masks: Option<BitMasks>,
    ) {
        match self {
            Self::Indexed1 | Self::Indexed4 | Self::Indexed8 => {
                let mut indices = vec![0u8; width];
                expand_bits_to_byte(self.bits_per_pixel() as u8, false, src, &mut indices);
                for (px, &idx) in dst.chunks_exact_mut(4).zip(&indices) {
                    let color = palette
                        .get(usize::from(idx))
                        .copied()
                        .unwrap_or(MISSING_PALETTE_ENTRY);
                    px.copy_from_slice(&color.to_array());
                }
            }
            Self::Rgb16 => {
                let masks = masks.unwrap_or(BitMasks::RGB555);
                for (px, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(2)) {
                    let v = u32::from(u16::from_le_bytes([s[0], s[1]]));
                    px.copy_from_slice(&masks.unpack(v));
                }
            }
            Self::Rgb24 => {
                for (px, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(3)) {
                    px.copy_from_slice(&[s[2], s[1], s[0], 255]);
                }
            }
            Self::Rgb32 => match masks {
                Some(masks) => {
                    for (px, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
                        let v = u32::from_le_bytes([s[0], s[1], s[2], s[3]]);
                        px.copy_from_slice(&masks.unpack(v));
                    }
                }
                None => {
                    for (px, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
                        px.copy_from_slice(&[s[2], s[1], s[0], s[3]]);
                    }
                }
            },
        }
    }

    fn encode_row(
        self,
        src: &[u8],
        dst: &mut [u8],
        lookup: &PaletteLookup<'_>,
        masks: Option<BitMasks>,
    ) {
        match self {
            Self::Indexed1 | Self::Indexed4 => {
                let depth = self.bits_per_pixel() as u8;
                for (x, px) in src.chunks_exact(4).enumerate() {
                    put_bits(dst, x, depth, lookup.index_of(px));
                }
            }
            Self::Indexed8 => {
                for (d, px) in dst.iter_mut().zip(src.chunks_exact(4)) {
                    *d = lookup.index_of(px);
                }
            }
            Self::Rgb16 => {
                let masks = masks.unwrap_or(BitMasks::RGB555);
                for (d, px) in dst.chunks_exact_mut(2).zip(src.chunks_exact(4)) {
                    d.copy_from_slice(&(masks.pack(px) as u16).to_le_bytes());
                }
            }
            Self::Rgb24 => {
                for (d, px) in dst.chunks_exact_mut(3).zip(src.chunks_exact(4)) {
                    d.copy_from_slice(&[px[2], px[1], px[0]]);
                }
            }
            Self::Rgb32 => match masks {
                Some(masks) => {
                    for (d, px) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
                        d.copy_from_slice(&masks.pack(px).to_le_bytes());
                    }
                }
                None => {
                    for (d, px) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
                        d.copy_from_slice(&[px[2], px[1], px[0], px[3]]);
                    }
                }
            },
        }
    }
}

/// RGB → palette index, falling back to the nearest entry.
struct PaletteLookup<'a> {
    palette: &'a [Color],
    exact: HashMap<[u8; 3], u8>,
}

impl<'a> PaletteLookup<'a> {
    fn new(palette: &'a [Color]) -> Self {
        let mut exact = HashMap::with_capacity(palette.len());
        for (i, c) in palette.iter().enumerate().take(256) {
            exact.entry([c.r, c.g, c.b]).or_insert(i as u8);
        }
        Self { palette, exact }
    }

    fn index_of(&self, px: &[u8]) -> u8 {
        if let Some(&i) = self.exact.get(&[px[0], px[1], px[2]]) {
            return i;
        }
        let distance = |c: &Color| {
            let dr = i32::from(c.r) - i32::from(px[0]);
            let dg = i32::from(c.g) - i32::from(px[1]);
            let db = i32::from(c.b) - i32::from(px[2]);
            dr * dr + dg * dg + db * db
        };
        self.palette
            .iter()
            .take(256)
            .enumerate()
            .min_by_key(|(_, c)| distance(c))
            .map_or(0, |(i, _)| i as u8)
    }
}
