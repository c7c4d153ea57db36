//! PNG encoder: 8-bit RGB or RGBA, zlib-compressed, optional tEXt.

use std::io::Write;

use enough::Stop;
use flate2::Compression;
use flate2::write::ZlibEncoder;
use log::debug;

use super::chunk::write_chunk;
use super::decode::TextProperty;
use super::filter::{FilterStrategy, filter_image};
use super::header::{ColorType, PngHeader};
use crate::error::RasterError;
use crate::info::PNG_SIGNATURE;
use crate::pixel::PixelBuffer;

/// Maximum payload of one IDAT chunk.
const IDAT_CHUNK_SIZE: usize = 8192;

/// zlib effort.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PngCompression {
    Fast,
    #[default]
    Default,
    Best,
    /// 0 (store) to 9; higher values are clamped.
    Level(u32),
}

impl PngCompression {
    fn to_flate2(self) -> Compression {
        match self {
            Self::Fast => Compression::fast(),
            Self::Default => Compression::default(),
            Self::Best => Compression::best(),
            Self::Level(level) => Compression::new(level.min(9)),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PngOptions {
    pub compression: PngCompression,
    pub filter: FilterStrategy,
    pub text: Vec<TextProperty>,
}

pub(crate) fn encode_png(
    pixels: &PixelBuffer,
    options: &PngOptions,
    stop: &dyn Stop,
) -> Result<Vec<u8>, RasterError> {
    let color_type = if pixels.is_opaque() {
        ColorType::TrueColor
    } else {
        ColorType::TrueColorAlpha
    };
    let header = PngHeader::new(pixels.width(), pixels.height(), 8, color_type);
    for prop in &options.text {
        validate_text(prop)?;
    }

    let raw = match color_type {
        ColorType::TrueColor => pixels
            .pixels()
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect(),
        _ => pixels.pixels().to_vec(),
    };
    stop.check()?;
    let filtered = filter_image(
        &raw,
        header.scanline_len(),
        header.filter_step(),
        options.filter,
    );
    stop.check()?;

    let mut encoder = ZlibEncoder::new(Vec::new(), options.compression.to_flate2());
    encoder.write_all(&filtered)?;
    let compressed = encoder.finish()?;
    debug!(
        "encoding {}x{} PNG as {color_type:?}: {} filtered bytes deflated to {}",
        header.width,
        header.height,
        filtered.len(),
        compressed.len()
    );

    let mut out = Vec::with_capacity(compressed.len() + 128);
    out.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut out, b"IHDR", &header.to_bytes());
    for prop in &options.text {
        let mut data: Vec<u8> = prop.keyword.chars().map(|c| c as u8).collect();
        data.push(0);
        data.extend(prop.text.chars().map(|c| c as u8));
        write_chunk(&mut out, b"tEXt", &data);
    }
    for part in compressed.chunks(IDAT_CHUNK_SIZE) {
        write_chunk(&mut out, b"IDAT", part);
    }
    write_chunk(&mut out, b"IEND", &[]);
    Ok(out)
}

fn validate_text(prop: &TextProperty) -> Result<(), RasterError> {
    let latin1 = |s: &str| s.chars().all(|c| u32::from(c) <= 0xFF);
    let keyword_len = prop.keyword.chars().count();
    if !(1..=79).contains(&keyword_len)
        || prop.keyword.contains('\0')
        || !latin1(&prop.keyword)
        || !latin1(&prop.text)
    {
        return Err(RasterError::InvalidData(format!(
            "tEXt {:?} must be a 1-79 character Latin-1 keyword with Latin-1 text",
            prop.keyword
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::png::chunk::{ChunkKind, ChunkReader};
    use crate::png::decode::PngDecoder;
    use crate::png::filter::FilterType;
    use enough::Unstoppable;

    fn noise(width: u32, height: u32, alpha: bool) -> PixelBuffer {
        let mut state = 0x1234_5678u32;
        let data = (0..width * height * 4)
            .map(|i| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                if !alpha && i % 4 == 3 { 255 } else { state as u8 }
            })
            .collect();
        PixelBuffer::from_rgba(width, height, data).unwrap()
    }

    #[test]
    fn opaque_images_are_truecolor() {
        let pixels = noise(7, 3, false);
        let out = encode_png(&pixels, &PngOptions::default(), &Unstoppable).unwrap();
        let image = PngDecoder::new(&out).decode_image(&Unstoppable).unwrap();
        assert_eq!(image.header.color_type, ColorType::TrueColor);
        assert_eq!(image.pixels, pixels);
    }

    #[test]
    fn alpha_images_are_truecolor_alpha() {
        let pixels = noise(5, 9, true);
        let options = PngOptions {
            filter: FilterStrategy::Fixed(FilterType::Paeth),
            compression: PngCompression::Best,
            ..Default::default()
        };
        let out = encode_png(&pixels, &options, &Unstoppable).unwrap();
        let image = PngDecoder::new(&out).decode_image(&Unstoppable).unwrap();
        assert_eq!(image.header.color_type, ColorType::TrueColorAlpha);
        assert_eq!(image.pixels, pixels);
    }

    #[test]
    fn large_streams_split_into_idat_chunks() {
        let pixels = noise(128, 64, true);
        let options = PngOptions {
            compression: PngCompression::Level(0),
            ..Default::default()
        };
        let out = encode_png(&pixels, &options, &Unstoppable).unwrap();
        let sizes: Vec<usize> = ChunkReader::new(&out)
            .unwrap()
            .map(Result::unwrap)
            .filter(|c| c.kind() == ChunkKind::Data)
            .map(|c| c.data.len())
            .collect();
        assert!(sizes.len() > 1);
        assert!(sizes.iter().all(|&n| n <= IDAT_CHUNK_SIZE));
        assert!(sizes[..sizes.len() - 1].iter().all(|&n| n == IDAT_CHUNK_SIZE));
    }

    #[test]
    fn text_survives_roundtrip() {
        let pixels = noise(2, 2, false);
        let options = PngOptions {
            text: vec![
                TextProperty::new("Author", "Zoë"),
                TextProperty::new("Comment", ""),
            ],
            ..Default::default()
        };
        let out = encode_png(&pixels, &options, &Unstoppable).unwrap();
        let image = PngDecoder::new(&out).decode_image(&Unstoppable).unwrap();
        assert_eq!(image.text, options.text);
    }

    #[test]
    fn rejects_bad_keywords() {
        let pixels = noise(1, 1, false);
        for prop in [
            TextProperty::new("", "x"),
            TextProperty::new("k".repeat(80), "x"),
            TextProperty::new("Title", "snowman ☃"),
        ] {
            let options = PngOptions {
                text: vec![prop],
                ..Default::default()
            };
            assert!(matches!(
                encode_png(&pixels, &options, &Unstoppable),
                Err(RasterError::InvalidData(_))
            ));
        }
    }
}
