//! Format detection and header probing without a full decode.

use crate::error::RasterError;

/// `"BM"` read as a little-endian u16.
pub const BMP_MAGIC: u16 = 0x4D42;

/// The eight bytes every PNG file starts with.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Container formats this crate knows about.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Bmp,
    Png,
}

impl ImageFormat {
    /// Detect format from magic bytes. Returns `None` if unrecognized.
    pub fn detect(data: &[u8]) -> Option<Self> {
        match data {
            _ if data.starts_with(&PNG_SIGNATURE) => Some(Self::Png),
            [a, b, ..] if u16::from_le_bytes([*a, *b]) == BMP_MAGIC => Some(Self::Bmp),
            _ => None,
        }
    }

    /// Detect format from a file extension, without the dot (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        [Self::Bmp, Self::Png]
            .into_iter()
            .find(|f| f.extensions().iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Bmp => "image/bmp",
            Self::Png => "image/png",
        }
    }

    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Bmp => &["bmp", "dib"],
            Self::Png => &["png"],
        }
    }
}

/// Header-level facts about an encoded image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageInfo {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    /// Bits per stored pixel (BMP), or bit depth × channels (PNG).
    pub bits_per_pixel: u16,
}

impl ImageInfo {
    /// Parse only the header of `data`.
    pub fn from_bytes(data: &[u8]) -> Result<Self, RasterError> {
        match ImageFormat::detect(data) {
            #[cfg(feature = "bmp")]
            Some(ImageFormat::Bmp) => {
                let header = crate::bmp::BmpHeader::parse(data)?;
                Ok(Self {
                    format: ImageFormat::Bmp,
                    width: header.width,
                    height: header.height,
                    bits_per_pixel: header.bits_per_pixel,
                })
            }
            #[cfg(feature = "png")]
            Some(ImageFormat::Png) => {
                let first = crate::png::ChunkReader::new(data)?
                    .next()
                    .ok_or(RasterError::MissingChunk("IHDR"))??;
                if first.kind() != crate::png::ChunkKind::Header {
                    return Err(RasterError::MissingChunk("IHDR"));
                }
                let header = crate::png::PngHeader::parse(first.data)?;
                Ok(Self {
                    format: ImageFormat::Png,
                    width: header.width,
                    height: header.height,
                    bits_per_pixel: header.bits_per_pixel() as u16,
                })
            }
            _ => Err(RasterError::UnrecognizedFormat),
        }
    }
}
