//! BMP encoder: 1/4/8-bit indexed (optionally RLE8), 16/24/32-bit direct.

use std::collections::HashSet;

use enough::Stop;
use log::debug;

use super::format::PixelFormat;
use super::header::{BmpHeader, Compression, write_palette};
use super::rle::compress_rle8;
use crate::error::RasterError;
use crate::pixel::{Color, PixelBuffer};

/// How pixels are stored in an encoded BMP.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BmpEncoding {
    /// 24-bit for opaque images, 32-bit when any pixel has alpha < 255.
    #[default]
    Auto,
    /// Uncompressed at a fixed depth (1, 4, 8, 16, 24 or 32).
    BitDepth(u16),
    /// 8-bit indexed, RLE8 compressed.
    Rle8,
}

pub(crate) fn encode_bmp(
    pixels: &PixelBuffer,
    encoding: BmpEncoding,
    stop: &dyn Stop,
) -> Result<Vec<u8>, RasterError> {
    let (bits, rle) = match encoding {
        BmpEncoding::Auto if pixels.is_opaque() => (24, false),
        BmpEncoding::Auto => (32, false),
        BmpEncoding::BitDepth(bits) => (bits, false),
        BmpEncoding::Rle8 => (8, true),
    };
    let format = PixelFormat::for_bit_depth(bits).ok_or_else(|| {
        RasterError::UnsupportedVariant(format!("cannot encode {bits}-bit BMP"))
    })?;

    let palette = if format.is_indexed() {
        build_palette(pixels, 1 << bits)?
    } else {
        Vec::new()
    };
    let mut header = BmpHeader::for_image(pixels.width(), pixels.height(), bits, palette.len())?;

    stop.check()?;
    let mut raw = format.encode(&header, pixels.pixels(), &palette)?;
    stop.check()?;

    if rle {
        raw = compress_rle8(
            &raw,
            header.width as usize,
            header.row_byte_len(),
            header.height as usize,
        );
        header.compression = Compression::Rle8;
        header.set_compressed_size(raw.len())?;
    }

    debug!(
        "encoding {}x{} BMP at {bits} bpp ({:?}), {} palette entries",
        header.width,
        header.height,
        header.compression,
        palette.len()
    );

    let mut out = Vec::with_capacity(header.file_size as usize);
    header.write(&mut out);
    write_palette(&mut out, &palette);
    out.extend_from_slice(&raw);
    Ok(out)
}

/// Distinct RGB colors in first-appearance order. Alpha is dropped.
fn build_palette(pixels: &PixelBuffer, max: usize) -> Result<Vec<Color>, RasterError> {
    let mut seen = HashSet::new();
    let mut palette = Vec::new();
    for c in pixels.colors() {
        if !seen.insert([c.r, c.g, c.b]) {
            continue;
        }
        if palette.len() == max {
            return Err(RasterError::UnsupportedVariant(format!(
                "image has more than {max} colors, too many for an indexed BMP"
            )));
        }
        palette.push(Color::rgb(c.r, c.g, c.b));
    }
    Ok(palette)
}
