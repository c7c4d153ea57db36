//! IHDR: dimensions, bit depth, color type, interlace method.

use log::debug;

use crate::bytes::ByteReader;
use crate::error::RasterError;

pub const IHDR_LEN: usize = 13;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorType {
    Grayscale,
    TrueColor,
    Indexed,
    GrayscaleAlpha,
    TrueColorAlpha,
}

impl ColorType {
    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Grayscale),
            2 => Some(Self::TrueColor),
            3 => Some(Self::Indexed),
            4 => Some(Self::GrayscaleAlpha),
            6 => Some(Self::TrueColorAlpha),
            _ => None,
        }
    }

    pub const fn to_u8(self) -> u8 {
        match self {
            Self::Grayscale => 0,
            Self::TrueColor => 2,
            Self::Indexed => 3,
            Self::GrayscaleAlpha => 4,
            Self::TrueColorAlpha => 6,
        }
    }

    pub const fn channels(self) -> u8 {
        match self {
            Self::Grayscale | Self::Indexed => 1,
            Self::GrayscaleAlpha => 2,
            Self::TrueColor => 3,
            Self::TrueColorAlpha => 4,
        }
    }

    /// Bit depths the format allows for this color type.
    pub const fn allowed_depths(self) -> &'static [u8] {
        match self {
            Self::Grayscale => &[1, 2, 4, 8, 16],
            Self::Indexed => &[1, 2, 4, 8],
            Self::TrueColor | Self::GrayscaleAlpha | Self::TrueColorAlpha => &[8, 16],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterlaceMethod {
    None,
    Adam7,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PngHeader {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: ColorType,
    pub interlace: InterlaceMethod,
}

impl PngHeader {
    pub fn new(width: u32, height: u32, bit_depth: u8, color_type: ColorType) -> Self {
        Self {
            width,
            height,
            bit_depth,
            color_type,
            interlace: InterlaceMethod::None,
        }
    }

    /// Parse and validate the 13-byte IHDR payload.
    pub fn parse(data: &[u8]) -> Result<Self, RasterError> {
        if data.len() != IHDR_LEN {
            return Err(RasterError::InvalidHeader(format!(
                "IHDR must be {IHDR_LEN} bytes, got {}",
                data.len()
            )));
        }
        let mut r = ByteReader::new(data);
        let width = r.read_u32_be()?;
        let height = r.read_u32_be()?;
        let bit_depth = r.read_u8()?;
        let color_code = r.read_u8()?;
        let compression = r.read_u8()?;
        let filter = r.read_u8()?;
        let interlace = r.read_u8()?;

        // The format caps dimensions at 2^31 - 1.
        if width == 0 || height == 0 || width > i32::MAX as u32 || height > i32::MAX as u32 {
            return Err(RasterError::InvalidHeader(format!(
                "invalid dimensions {width}x{height}"
            )));
        }
        let color_type = ColorType::from_u8(color_code).ok_or_else(|| {
            RasterError::InvalidHeader(format!("unknown color type {color_code}"))
        })?;
        if !color_type.allowed_depths().contains(&bit_depth) {
            return Err(RasterError::InvalidHeader(format!(
                "bit depth {bit_depth} is not valid for {color_type:?}"
            )));
        }
        if compression != 0 {
            return Err(RasterError::InvalidHeader(format!(
                "unknown compression method {compression}"
            )));
        }
        if filter != 0 {
            return Err(RasterError::InvalidHeader(format!(
                "unknown filter method {filter}"
            )));
        }
        let interlace = match interlace {
            0 => InterlaceMethod::None,
            1 => InterlaceMethod::Adam7,
            n => {
                return Err(RasterError::InvalidHeader(format!(
                    "unknown interlace method {n}"
                )));
            }
        };

        let header = Self {
            width,
            height,
            bit_depth,
            color_type,
            interlace,
        };
        debug!(
            "PNG {width}x{height} {color_type:?} depth {bit_depth} interlace {interlace:?}"
        );
        Ok(header)
    }

    pub fn to_bytes(&self) -> [u8; IHDR_LEN] {
        let mut out = [0u8; IHDR_LEN];
        out[0..4].copy_from_slice(&self.width.to_be_bytes());
        out[4..8].copy_from_slice(&self.height.to_be_bytes());
        out[8] = self.bit_depth;
        out[9] = self.color_type.to_u8();
        // compression and filter method are always 0
        out[12] = match self.interlace {
            InterlaceMethod::None => 0,
            InterlaceMethod::Adam7 => 1,
        };
        out
    }

    pub fn bits_per_pixel(&self) -> usize {
        usize::from(self.bit_depth) * usize::from(self.color_type.channels())
    }

    /// Bytes per scanline, excluding the filter-type byte.
    pub fn scanline_len(&self) -> usize {
        (self.width as usize * self.bits_per_pixel()).div_ceil(8)
    }

    /// Distance in bytes to the corresponding byte of the previous pixel.
    pub fn filter_step(&self) -> usize {
        (self.bits_per_pixel() / 8).max(1)
    }

    /// Size of the inflated image data: each row carries a filter-type byte.
    pub fn filtered_size(&self) -> Result<usize, RasterError> {
        (self.scanline_len() + 1)
            .checked_mul(self.height as usize)
            .ok_or(RasterError::DimensionsTooLarge {
                width: self.width,
                height: self.height,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ihdr(width: u32, height: u32, depth: u8, color: u8, interlace: u8) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(&width.to_be_bytes());
        v.extend_from_slice(&height.to_be_bytes());
        v.extend_from_slice(&[depth, color, 0, 0, interlace]);
        v
    }

    #[test]
    fn parse_and_write_back() {
        let data = ihdr(640, 480, 8, 6, 0);
        let header = PngHeader::parse(&data).unwrap();
        assert_eq!(header.width, 640);
        assert_eq!(header.height, 480);
        assert_eq!(header.color_type, ColorType::TrueColorAlpha);
        assert_eq!(header.interlace, InterlaceMethod::None);
        assert_eq!(header.to_bytes().as_slice(), data.as_slice());
    }

    #[test]
    fn scanline_geometry() {
        let h = PngHeader::new(10, 1, 1, ColorType::Grayscale);
        assert_eq!(h.scanline_len(), 2);
        assert_eq!(h.filter_step(), 1);
        let h = PngHeader::new(10, 1, 16, ColorType::TrueColor);
        assert_eq!(h.scanline_len(), 60);
        assert_eq!(h.filter_step(), 6);
        let h = PngHeader::new(3, 2, 4, ColorType::Indexed);
        assert_eq!(h.scanline_len(), 2);
        assert_eq!(h.filtered_size().unwrap(), 6);
    }

    #[test]
    fn rejects_bad_depth_for_color_type() {
        for (depth, color) in [(16, 3), (4, 2), (1, 6), (3, 0), (8, 5)] {
            assert!(
                matches!(
                    PngHeader::parse(&ihdr(1, 1, depth, color, 0)),
                    Err(RasterError::InvalidHeader(_))
                ),
                "depth {depth} color {color}"
            );
        }
    }

    #[test]
    fn rejects_zero_dimensions_and_bad_methods() {
        assert!(PngHeader::parse(&ihdr(0, 1, 8, 0, 0)).is_err());
        assert!(PngHeader::parse(&ihdr(1, 0, 8, 0, 0)).is_err());
        assert!(PngHeader::parse(&ihdr(1, 1, 8, 0, 2)).is_err());
        let mut data = ihdr(1, 1, 8, 0, 0);
        data[10] = 1;
        assert!(PngHeader::parse(&data).is_err());
        assert!(PngHeader::parse(&data[..12]).is_err());
    }

    #[test]
    fn adam7_is_parsed() {
        let header = PngHeader::parse(&ihdr(2, 2, 8, 0, 1)).unwrap();
        assert_eq!(header.interlace, InterlaceMethod::Adam7);
    }
}
