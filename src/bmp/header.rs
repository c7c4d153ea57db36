//! BMP file header, info header and color table.

use log::{debug, warn};

use super::utils::BitMasks;
use crate::bytes::ByteReader;
use crate::error::RasterError;
use crate::info::BMP_MAGIC;
use crate::pixel::Color;

pub(crate) const FILE_HEADER_SIZE: u32 = 14;
pub(crate) const INFO_HEADER_SIZE: u32 = 40;
const CORE_HEADER_SIZE: u32 = 12;

/// Pixel data compression declared in the info header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compression {
    Rgb,
    Rle8,
    Rle4,
    Bitfields,
}

impl Compression {
    fn from_u32(num: u32) -> Option<Self> {
        match num {
            0 => Some(Self::Rgb),
            1 => Some(Self::Rle8),
            2 => Some(Self::Rle4),
            3 | 6 => Some(Self::Bitfields), // 6 = BI_ALPHABITFIELDS
            _ => None,
        }
    }

    fn to_u32(self) -> u32 {
        match self {
            Self::Rgb => 0,
            Self::Rle8 => 1,
            Self::Rle4 => 2,
            Self::Bitfields => 3,
        }
    }
}

/// Parsed BMP headers. Immutable once parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BmpHeader {
    pub file_size: u32,
    /// Offset of the first pixel byte from the start of the file.
    pub pixel_offset: u32,
    pub info_size: u32,
    pub width: u32,
    pub height: u32,
    /// Negative stored height: first stored row is the top row.
    pub top_down: bool,
    pub planes: u16,
    pub bits_per_pixel: u16,
    pub compression: Compression,
    /// Declared pixel data size; may be zero for uncompressed files.
    pub image_size: u32,
    pub x_pixels_per_meter: i32,
    pub y_pixels_per_meter: i32,
    pub colors_used: u32,
    pub colors_important: u32,
    /// Present only for `BI_BITFIELDS`.
    pub masks: Option<BitMasks>,
}

impl BmpHeader {
    /// Header for a freshly encoded bottom-up `BITMAPINFOHEADER` file.
    pub fn for_image(
        width: u32,
        height: u32,
        bits_per_pixel: u16,
        palette_len: usize,
    ) -> Result<Self, RasterError> {
        let mut header = Self {
            file_size: 0,
            pixel_offset: 0,
            info_size: INFO_HEADER_SIZE,
            width,
            height,
            top_down: false,
            planes: 1,
            bits_per_pixel,
            compression: Compression::Rgb,
            image_size: 0,
            x_pixels_per_meter: 2835, // 72 DPI
            y_pixels_per_meter: 2835,
            colors_used: palette_len as u32,
            colors_important: 0,
            masks: None,
        };
        let too_large = RasterError::DimensionsTooLarge { width, height };
        let image_size = u32::try_from(header.raw_size()?).map_err(|_| too_large)?;
        let pixel_offset = header.palette_offset() + palette_len as u32 * 4;
        header.image_size = image_size;
        header.pixel_offset = pixel_offset;
        header.file_size = pixel_offset
            .checked_add(image_size)
            .ok_or(RasterError::DimensionsTooLarge { width, height })?;
        Ok(header)
    }

    /// Record a compressed pixel array of `len` bytes, updating the
    /// declared image size and the file size.
    pub fn set_compressed_size(&mut self, len: usize) -> Result<(), RasterError> {
        let too_large = || RasterError::DimensionsTooLarge {
            width: self.width,
            height: self.height,
        };
        let image_size = u32::try_from(len).map_err(|_| too_large())?;
        let file_size = self.pixel_offset.checked_add(image_size).ok_or_else(too_large)?;
        self.image_size = image_size;
        self.file_size = file_size;
        Ok(())
    }

    /// Parse the file header and info header (plus external bitfield masks).
    pub fn parse(data: &[u8]) -> Result<Self, RasterError> {
        let mut r = ByteReader::new(data);

        if r.read_u16_le()? != BMP_MAGIC {
            return Err(RasterError::UnrecognizedFormat);
        }
        let file_size = r.read_u32_le()?;
        r.skip(4)?; // reserved
        let pixel_offset = r.read_u32_le()?;
        let info_size = r.read_u32_le()?;

        let (width, height, planes, bits_per_pixel, compression_code);
        let (mut image_size, mut x_ppm, mut y_ppm, mut colors_used, mut colors_important) =
            (0, 0, 0, 0, 0);
        let mut embedded_masks = [0u32; 4];

        match info_size {
            CORE_HEADER_SIZE => {
                // OS/2 BITMAPCOREHEADER
                width = i32::from(r.read_u16_le()?);
                height = i32::from(r.read_u16_le()?);
                planes = r.read_u16_le()?;
                bits_per_pixel = r.read_u16_le()?;
                compression_code = 0;
            }
            40 | 52 | 56 | 108 | 124 => {
                width = r.read_i32_le()?;
                height = r.read_i32_le()?;
                planes = r.read_u16_le()?;
                bits_per_pixel = r.read_u16_le()?;
                compression_code = r.read_u32_le()?;
                image_size = r.read_u32_le()?;
                x_ppm = r.read_i32_le()?;
                y_ppm = r.read_i32_le()?;
                colors_used = r.read_u32_le()?;
                colors_important = r.read_u32_le()?;
                if info_size >= 52 {
                    embedded_masks[0] = r.read_u32_le()?;
                    embedded_masks[1] = r.read_u32_le()?;
                    embedded_masks[2] = r.read_u32_le()?;
                }
                if info_size >= 56 {
                    embedded_masks[3] = r.read_u32_le()?;
                }
            }
            _ => {
                return Err(RasterError::InvalidHeader(format!(
                    "unknown BMP info header size: {info_size}"
                )));
            }
        }

        let compression = Compression::from_u32(compression_code).ok_or_else(|| {
            RasterError::UnsupportedVariant(format!(
                "unsupported BMP compression scheme {compression_code}"
            ))
        })?;

        if width <= 0 {
            return Err(RasterError::InvalidHeader(format!(
                "BMP width must be positive, got {width}"
            )));
        }
        if height == 0 {
            return Err(RasterError::InvalidHeader("BMP height is zero".into()));
        }

        let masks = if compression == Compression::Bitfields {
            if info_size == INFO_HEADER_SIZE {
                // Masks follow the 40-byte header directly.
                r.set_position((FILE_HEADER_SIZE + INFO_HEADER_SIZE) as usize)?;
                embedded_masks[0] = r.read_u32_le()?;
                embedded_masks[1] = r.read_u32_le()?;
                embedded_masks[2] = r.read_u32_le()?;
                if compression_code == 6 {
                    embedded_masks[3] = r.read_u32_le()?;
                }
            }
            Some(BitMasks {
                red: embedded_masks[0],
                green: embedded_masks[1],
                blue: embedded_masks[2],
                alpha: embedded_masks[3],
            })
        } else {
            None
        };

        let header = Self {
            file_size,
            pixel_offset,
            info_size,
            width: width as u32,
            height: height.unsigned_abs(),
            top_down: height < 0,
            planes,
            bits_per_pixel,
            compression,
            image_size,
            x_pixels_per_meter: x_ppm,
            y_pixels_per_meter: y_ppm,
            colors_used,
            colors_important,
            masks,
        };

        debug!(
            "BMP {}x{} {} bpp {:?}, info header {} bytes, pixels at {}",
            header.width,
            header.height,
            header.bits_per_pixel,
            header.compression,
            header.info_size,
            header.pixel_offset
        );
        if header.compression == Compression::Rgb
            && header.image_size != 0
            && header.raw_size().is_ok_and(|n| n != header.image_size as usize)
        {
            warn!(
                "BMP declared image size {} differs from computed row layout",
                header.image_size
            );
        }

        Ok(header)
    }

    /// Bytes in one stored row, padded to a 4-byte boundary.
    pub fn row_byte_len(&self) -> usize {
        (self.width as usize * usize::from(self.bits_per_pixel)).div_ceil(32) * 4
    }

    /// Size of the uncompressed pixel array.
    pub fn raw_size(&self) -> Result<usize, RasterError> {
        self.row_byte_len()
            .checked_mul(self.height as usize)
            .ok_or(RasterError::DimensionsTooLarge {
                width: self.width,
                height: self.height,
            })
    }

    /// Stored row index holding canonical (top-down) row `y`.
    pub fn stored_row(&self, y: usize) -> usize {
        let h = self.height as usize;
        if self.top_down {
            y.min(h.saturating_sub(1))
        } else {
            h.saturating_sub(1).saturating_sub(y)
        }
    }

    fn external_mask_bytes(&self) -> u32 {
        if self.info_size == INFO_HEADER_SIZE && self.compression == Compression::Bitfields {
            if self.masks.is_some_and(|m| m.alpha != 0) { 16 } else { 12 }
        } else {
            0
        }
    }

    /// Offset of the color table from the start of the file.
    pub fn palette_offset(&self) -> u32 {
        FILE_HEADER_SIZE + self.info_size + self.external_mask_bytes()
    }

    fn palette_entry_size(&self) -> usize {
        if self.info_size == CORE_HEADER_SIZE { 3 } else { 4 }
    }

    /// Number of color table entries implied by the header (0 above 8 bpp).
    pub fn palette_len(&self) -> usize {
        if self.bits_per_pixel > 8 {
            return 0;
        }
        let max = 1usize << self.bits_per_pixel;
        match self.colors_used as usize {
            0 => max,
            n if n > max => max,
            n => n,
        }
    }

    /// Read the color table. Entries missing from a short file are dropped;
    /// lookups past the end fall back to opaque black.
    pub fn read_palette(&self, data: &[u8]) -> Result<Vec<Color>, RasterError> {
        let count = self.palette_len();
        if count == 0 {
            return Ok(Vec::new());
        }
        let entry = self.palette_entry_size();
        let start = self.palette_offset() as usize;
        let end = if self.pixel_offset as usize > start {
            (self.pixel_offset as usize).min(data.len())
        } else {
            data.len()
        };
        let table = data.get(start..end).ok_or(RasterError::UnexpectedEof)?;
        let available = table.len() / entry;
        if available < count {
            warn!("BMP color table truncated: {available} of {count} entries present");
        }
        Ok(table
            .chunks_exact(entry)
            .take(count)
            .map(|e| Color::rgb(e[2], e[1], e[0]))
            .collect())
    }

    /// Emit file header + `BITMAPINFOHEADER` (+ masks for bitfields).
    pub fn write(&self, out: &mut Vec<u8>) {
        // File header (14 bytes)
        out.extend_from_slice(&BMP_MAGIC.to_le_bytes());
        out.extend_from_slice(&self.file_size.to_le_bytes());
        out.extend_from_slice(&[0u8; 4]); // reserved
        out.extend_from_slice(&self.pixel_offset.to_le_bytes());

        // DIB header (BITMAPINFOHEADER, 40 bytes)
        let height = if self.top_down {
            -(self.height as i32)
        } else {
            self.height as i32
        };
        out.extend_from_slice(&INFO_HEADER_SIZE.to_le_bytes());
        out.extend_from_slice(&(self.width as i32).to_le_bytes());
        out.extend_from_slice(&height.to_le_bytes());
        out.extend_from_slice(&self.planes.to_le_bytes());
        out.extend_from_slice(&self.bits_per_pixel.to_le_bytes());
        out.extend_from_slice(&self.compression.to_u32().to_le_bytes());
        out.extend_from_slice(&self.image_size.to_le_bytes());
        out.extend_from_slice(&self.x_pixels_per_meter.to_le_bytes());
        out.extend_from_slice(&self.y_pixels_per_meter.to_le_bytes());
        out.extend_from_slice(&self.colors_used.to_le_bytes());
        out.extend_from_slice(&self.colors_important.to_le_bytes());

        if let Some(masks) = self.masks.filter(|_| self.compression == Compression::Bitfields) {
            out.extend_from_slice(&masks.red.to_le_bytes());
            out.extend_from_slice(&masks.green.to_le_bytes());
            out.extend_from_slice(&masks.blue.to_le_bytes());
            if masks.alpha != 0 {
                out.extend_from_slice(&masks.alpha.to_le_bytes());
            }
        }
    }
}

/// Emit a color table as (B, G, R, reserved) quads.
pub fn write_palette(out: &mut Vec<u8>, palette: &[Color]) {
    for c in palette {
        out.extend_from_slice(&[c.b, c.g, c.r, 0]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_alignment() {
        let h = BmpHeader::for_image(44, 40, 24, 0).unwrap();
        assert_eq!(h.row_byte_len(), 132);
        assert_eq!(h.raw_size().unwrap(), 5280);
        assert_eq!(BmpHeader::for_image(3, 1, 1, 2).unwrap().row_byte_len(), 4);
        assert_eq!(BmpHeader::for_image(33, 1, 1, 2).unwrap().row_byte_len(), 8);
        assert_eq!(BmpHeader::for_image(9, 1, 4, 16).unwrap().row_byte_len(), 8);
    }

    #[test]
    fn write_then_parse() {
        let header = BmpHeader::for_image(5, 3, 8, 7).unwrap();
        let mut out = Vec::new();
        header.write(&mut out);
        assert_eq!(out.len(), 54);
        assert_eq!(header.pixel_offset, 54 + 7 * 4);
        assert_eq!(BmpHeader::parse(&out).unwrap(), header);
    }

    #[test]
    fn compressed_size_is_checked() {
        let mut header = BmpHeader::for_image(5, 3, 8, 7).unwrap();
        header.set_compressed_size(40).unwrap();
        assert_eq!((header.image_size, header.file_size), (40, 54 + 28 + 40));

        let before = header.clone();
        assert!(matches!(
            header.set_compressed_size(u32::MAX as usize + 1),
            Err(RasterError::DimensionsTooLarge { .. })
        ));
        assert!(matches!(
            header.set_compressed_size(u32::MAX as usize),
            Err(RasterError::DimensionsTooLarge { .. })
        ));
        assert_eq!(header, before);
    }

    #[test]
    fn stored_rows_flip_bottom_up() {
        let mut header = BmpHeader::for_image(2, 4, 24, 0).unwrap();
        assert_eq!(header.stored_row(0), 3);
        assert_eq!(header.stored_row(3), 0);
        header.top_down = true;
        assert_eq!(header.stored_row(0), 0);
    }

    #[test]
    fn rejects_bad_magic_and_sizes() {
        let mut out = Vec::new();
        BmpHeader::for_image(1, 1, 24, 0).unwrap().write(&mut out);
        let mut bad = out.clone();
        bad[0] = b'X';
        assert!(matches!(
            BmpHeader::parse(&bad),
            Err(RasterError::UnrecognizedFormat)
        ));
        let mut bad = out.clone();
        bad[14] = 41;
        assert!(matches!(
            BmpHeader::parse(&bad),
            Err(RasterError::InvalidHeader(_))
        ));
        assert!(matches!(
            BmpHeader::parse(&out[..20]),
            Err(RasterError::UnexpectedEof)
        ));
    }

    #[test]
    fn palette_len_respects_colors_used() {
        let mut h = BmpHeader::for_image(1, 1, 4, 0).unwrap();
        assert_eq!(h.palette_len(), 16);
        h.colors_used = 3;
        assert_eq!(h.palette_len(), 3);
        h.colors_used = 300;
        assert_eq!(h.palette_len(), 16);
    }
}
