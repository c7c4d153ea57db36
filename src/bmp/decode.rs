//! BMP decode pipeline: headers → color table → pixel array → canonical buffer.

use enough::Stop;

use super::format::PixelFormat;
use super::header::BmpHeader;
use crate::error::RasterError;
use crate::limits::{Limits, check_limits};
use crate::pixel::PixelBuffer;

pub(crate) fn decode_bmp(
    data: &[u8],
    limits: Option<&Limits>,
    stop: &dyn Stop,
) -> Result<PixelBuffer, RasterError> {
    let header = BmpHeader::parse(data)?;
    check_limits(limits, header.width, header.height)?;
    if let Some(limits) = limits {
        limits.check_memory(header.raw_size()?)?;
    }

    let format = PixelFormat::for_bit_depth(header.bits_per_pixel).ok_or_else(|| {
        RasterError::UnsupportedVariant(format!(
            "BMP bit depth {} unsupported",
            header.bits_per_pixel
        ))
    })?;

    let palette = header.read_palette(data)?;
    let pixel_data = data
        .get(header.pixel_offset as usize..)
        .ok_or(RasterError::UnexpectedEof)?;

    stop.check()?;
    let raw = format.read(&header, pixel_data)?;
    stop.check()?;
    let canonical = format.decode(&header, &raw, &palette)?;

    PixelBuffer::from_rgba(header.width, header.height, canonical)
}
