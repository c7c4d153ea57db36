//! Uniform codec contract and the signature/extension dispatcher.

use std::ffi::OsStr;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use enough::Unstoppable;
use log::debug;

use crate::error::RasterError;
use crate::info::ImageFormat;
use crate::limits::Limits;
use crate::pixel::PixelBuffer;

/// A seekable byte source, for position-preserving signature checks.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek + ?Sized> ReadSeek for T {}

/// One container format's capability answers and entry points.
///
/// Implementations are stateless and shared through [`codecs`].
pub trait ImageCodec: Send + Sync {
    fn format(&self) -> ImageFormat;

    /// Bytes needed by [`can_decode_header`](Self::can_decode_header).
    fn signature_len(&self) -> usize;

    /// Whether the file name's extension belongs to this format.
    fn can_decode(&self, file_name: &str) -> bool {
        has_extension(file_name, self.format().extensions())
    }

    /// Whether `header` starts with this format's signature.
    fn can_decode_header(&self, header: &[u8]) -> bool {
        ImageFormat::detect(header) == Some(self.format())
    }

    /// Peek at the signature, then seek back to where the stream was.
    fn can_decode_stream(&self, stream: &mut dyn ReadSeek) -> Result<bool, RasterError> {
        let start = stream.stream_position()?;
        let mut header = Vec::with_capacity(self.signature_len());
        let read = (&mut *stream)
            .take(self.signature_len() as u64)
            .read_to_end(&mut header);
        stream.seek(SeekFrom::Start(start))?;
        read?;
        Ok(self.can_decode_header(&header))
    }

    fn can_encode(&self, file_name: &str) -> bool {
        self.can_decode(file_name)
    }

    /// Read the whole stream and decode it, with no limits applied.
    fn decode(&self, stream: &mut dyn Read) -> Result<PixelBuffer, RasterError> {
        self.decode_with_limits(stream, &Limits::default())
    }

    /// Read the whole stream and decode it, rejecting images over `limits`.
    fn decode_with_limits(
        &self,
        stream: &mut dyn Read,
        limits: &Limits,
    ) -> Result<PixelBuffer, RasterError>;

    /// Encode with this format's default settings and write the result.
    fn encode(&self, writer: &mut dyn Write, pixels: &PixelBuffer) -> Result<(), RasterError>;
}

fn has_extension(file_name: &str, extensions: &[&str]) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

fn read_all(stream: &mut dyn Read) -> Result<Vec<u8>, RasterError> {
    let mut data = Vec::new();
    stream.read_to_end(&mut data)?;
    Ok(data)
}

#[cfg(feature = "bmp")]
#[derive(Clone, Copy, Debug, Default)]
pub struct BmpCodec;

#[cfg(feature = "bmp")]
impl ImageCodec for BmpCodec {
    fn format(&self) -> ImageFormat {
        ImageFormat::Bmp
    }

    fn signature_len(&self) -> usize {
        2
    }

    fn decode_with_limits(
        &self,
        stream: &mut dyn Read,
        limits: &Limits,
    ) -> Result<PixelBuffer, RasterError> {
        crate::bmp::decode_bmp(&read_all(stream)?, Some(limits), &Unstoppable)
    }

    fn encode(&self, writer: &mut dyn Write, pixels: &PixelBuffer) -> Result<(), RasterError> {
        let data = crate::bmp::encode_bmp(pixels, crate::bmp::BmpEncoding::Auto, &Unstoppable)?;
        writer.write_all(&data)?;
        Ok(())
    }
}

#[cfg(feature = "png")]
#[derive(Clone, Copy, Debug, Default)]
pub struct PngCodec;

#[cfg(feature = "png")]
impl ImageCodec for PngCodec {
    fn format(&self) -> ImageFormat {
        ImageFormat::Png
    }

    fn signature_len(&self) -> usize {
        crate::png::PNG_SIGNATURE.len()
    }

    fn decode_with_limits(
        &self,
        stream: &mut dyn Read,
        limits: &Limits,
    ) -> Result<PixelBuffer, RasterError> {
        let data = read_all(stream)?;
        crate::png::PngDecoder::new(&data)
            .with_limits(limits)
            .decode(&Unstoppable)
    }

    fn encode(&self, writer: &mut dyn Write, pixels: &PixelBuffer) -> Result<(), RasterError> {
        let data =
            crate::png::encode_png(pixels, &crate::png::PngOptions::default(), &Unstoppable)?;
        writer.write_all(&data)?;
        Ok(())
    }
}

static CODECS: &[&dyn ImageCodec] = &[
    #[cfg(feature = "bmp")]
    &BmpCodec,
    #[cfg(feature = "png")]
    &PngCodec,
];

/// Every compiled-in codec, in probe order.
pub fn codecs() -> &'static [&'static dyn ImageCodec] {
    CODECS
}

pub fn decoder_for_file_name(file_name: &str) -> Option<&'static dyn ImageCodec> {
    CODECS.iter().copied().find(|c| c.can_decode(file_name))
}

pub fn decoder_for_header(header: &[u8]) -> Option<&'static dyn ImageCodec> {
    CODECS.iter().copied().find(|c| c.can_decode_header(header))
}

pub fn encoder_for_file_name(file_name: &str) -> Option<&'static dyn ImageCodec> {
    CODECS.iter().copied().find(|c| c.can_encode(file_name))
}

/// Read `stream` to the end, pick a codec by signature and decode.
pub fn decode(stream: &mut dyn Read) -> Result<PixelBuffer, RasterError> {
    decode_with_limits(stream, &Limits::default())
}

/// [`decode`] with resource limits.
pub fn decode_with_limits(
    stream: &mut dyn Read,
    limits: &Limits,
) -> Result<PixelBuffer, RasterError> {
    let data = read_all(stream)?;
    let codec = decoder_for_header(&data).ok_or(RasterError::UnrecognizedFormat)?;
    debug!("dispatching {} bytes to {:?}", data.len(), codec.format());
    codec.decode_with_limits(&mut data.as_slice(), limits)
}
