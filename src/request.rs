//! Request builders: the configuration surface for one decode or encode.

use enough::Stop;

use crate::error::RasterError;
use crate::info::ImageFormat;
use crate::limits::Limits;
use crate::pixel::PixelBuffer;

#[cfg(feature = "bmp")]
use crate::bmp::BmpEncoding;
#[cfg(feature = "png")]
use crate::png::{FilterStrategy, PngCompression, PngOptions, TextProperty};

/// Decode request: detects BMP or PNG from the data and produces RGBA8.
#[derive(Clone, Copy, Debug)]
pub struct DecodeRequest<'a> {
    data: &'a [u8],
    limits: Option<&'a Limits>,
    verify_crc: bool,
}

impl<'a> DecodeRequest<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            limits: None,
            verify_crc: true,
        }
    }

    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// PNG only: reject chunks whose CRC32 does not match (default `true`).
    pub fn verify_crc(mut self, verify: bool) -> Self {
        self.verify_crc = verify;
        self
    }

    pub fn decode(self, stop: impl Stop) -> Result<PixelBuffer, RasterError> {
        match ImageFormat::detect(self.data) {
            #[cfg(feature = "bmp")]
            Some(ImageFormat::Bmp) => crate::bmp::decode_bmp(self.data, self.limits, &stop),
            #[cfg(feature = "png")]
            Some(ImageFormat::Png) => {
                let mut decoder =
                    crate::png::PngDecoder::new(self.data).verify_crc(self.verify_crc);
                if let Some(limits) = self.limits {
                    decoder = decoder.with_limits(limits);
                }
                decoder.decode(&stop)
            }
            _ => Err(RasterError::UnrecognizedFormat),
        }
    }
}

#[derive(Clone, Debug)]
enum Target {
    #[cfg(feature = "bmp")]
    Bmp(BmpEncoding),
    #[cfg(feature = "png")]
    Png(PngOptions),
}

/// Encode request for one output format.
///
/// PNG settings (`compression`, `filter`, `text`) are ignored for BMP output.
#[derive(Clone, Debug)]
pub struct EncodeRequest {
    target: Target,
}

impl EncodeRequest {
    /// BMP at 24 bits when opaque, 32 bits otherwise.
    #[cfg(feature = "bmp")]
    pub fn bmp() -> Self {
        Self {
            target: Target::Bmp(BmpEncoding::Auto),
        }
    }

    /// Uncompressed BMP at 1, 4, 8, 16, 24 or 32 bits per pixel.
    ///
    /// Indexed depths fail at encode time if the image has more distinct
    /// colors than the palette can hold.
    #[cfg(feature = "bmp")]
    pub fn bmp_with_bit_depth(bits_per_pixel: u16) -> Self {
        Self {
            target: Target::Bmp(BmpEncoding::BitDepth(bits_per_pixel)),
        }
    }

    /// 8-bit indexed BMP with RLE8 compression.
    #[cfg(feature = "bmp")]
    pub fn bmp_rle8() -> Self {
        Self {
            target: Target::Bmp(BmpEncoding::Rle8),
        }
    }

    #[cfg(feature = "png")]
    pub fn png() -> Self {
        Self {
            target: Target::Png(PngOptions::default()),
        }
    }

    #[cfg(feature = "png")]
    pub fn compression(mut self, compression: PngCompression) -> Self {
        if let Target::Png(options) = &mut self.target {
            options.compression = compression;
        }
        self
    }

    #[cfg(feature = "png")]
    pub fn filter(mut self, filter: FilterStrategy) -> Self {
        if let Target::Png(options) = &mut self.target {
            options.filter = filter;
        }
        self
    }

    /// Add a `tEXt` property. Keyword and text must be Latin-1.
    #[cfg(feature = "png")]
    pub fn text(mut self, keyword: impl Into<String>, text: impl Into<String>) -> Self {
        if let Target::Png(options) = &mut self.target {
            options.text.push(TextProperty::new(keyword, text));
        }
        self
    }

    pub fn format(&self) -> ImageFormat {
        match self.target {
            #[cfg(feature = "bmp")]
            Target::Bmp(_) => ImageFormat::Bmp,
            #[cfg(feature = "png")]
            Target::Png(_) => ImageFormat::Png,
        }
    }

    pub fn encode(&self, pixels: &PixelBuffer, stop: impl Stop) -> Result<Vec<u8>, RasterError> {
        match &self.target {
            #[cfg(feature = "bmp")]
            Target::Bmp(encoding) => crate::bmp::encode_bmp(pixels, *encoding, &stop),
            #[cfg(feature = "png")]
            Target::Png(options) => crate::png::encode_png(pixels, options, &stop),
        }
    }
}
