//! PNG decode pipeline: chunks → IHDR/PLTE/tRNS/IDAT → inflate → unfilter → readers.

use std::io::Read;

use enough::Stop;
use flate2::read::ZlibDecoder;
use log::{debug, trace, warn};

use super::chunk::{ChunkKind, ChunkReader};
use super::filter::unfilter_image;
use super::header::{InterlaceMethod, PngHeader};
use super::reader::ColorReader;
use crate::error::RasterError;
use crate::limits::{Limits, check_limits};
use crate::pixel::PixelBuffer;

/// A tEXt keyword/value pair. Both sides are Latin-1 in the file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextProperty {
    pub keyword: String,
    pub text: String,
}

impl TextProperty {
    pub fn new(keyword: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            text: text.into(),
        }
    }

    fn parse(data: &[u8]) -> Option<Self> {
        let nul = data.iter().position(|&b| b == 0)?;
        if nul == 0 || nul > 79 {
            return None;
        }
        Some(Self {
            keyword: latin1(&data[..nul]),
            text: latin1(&data[nul + 1..]),
        })
    }
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// A decoded PNG with the metadata the decoder keeps.
#[derive(Clone, Debug)]
pub struct PngImage {
    pub header: PngHeader,
    pub text: Vec<TextProperty>,
    pub pixels: PixelBuffer,
}

/// PNG decoder over an in-memory file.
///
/// ```no_run
/// use rastercodec::png::PngDecoder;
/// use rastercodec::Unstoppable;
///
/// let data = std::fs::read("in.png")?;
/// let image = PngDecoder::new(&data).decode_image(&Unstoppable)?;
/// for prop in &image.text {
///     println!("{}: {}", prop.keyword, prop.text);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Copy, Debug)]
pub struct PngDecoder<'a> {
    data: &'a [u8],
    limits: Option<&'a Limits>,
    verify_crc: bool,
}

impl<'a> PngDecoder<'a> {
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

    /// Check each chunk's CRC32 (on by default).
    pub fn verify_crc(mut self, verify: bool) -> Self {
        self.verify_crc = verify;
        self
    }

    pub fn decode(self, stop: &dyn Stop) -> Result<PixelBuffer, RasterError> {
        Ok(self.decode_image(stop)?.pixels)
    }

    pub fn decode_image(self, stop: &dyn Stop) -> Result<PngImage, RasterError> {
        let mut header: Option<PngHeader> = None;
        let mut palette: Vec<[u8; 3]> = Vec::new();
        let mut transparency: Option<&[u8]> = None;
        let mut text = Vec::new();
        let mut idat = Vec::new();
        let mut seen_end = false;

        for chunk in ChunkReader::new(self.data)? {
            let chunk = chunk?;
            stop.check()?;
            if self.verify_crc {
                chunk.verify_crc()?;
            }
            match chunk.kind() {
                ChunkKind::Header => {
                    if header.is_some() {
                        return Err(RasterError::InvalidHeader("duplicate IHDR chunk".into()));
                    }
                    let parsed = PngHeader::parse(chunk.data)?;
                    check_limits(self.limits, parsed.width, parsed.height)?;
                    header = Some(parsed);
                }
                ChunkKind::Palette => {
                    if chunk.data.len() % 3 != 0 || chunk.data.len() > 256 * 3 {
                        return Err(RasterError::InvalidData(format!(
                            "PLTE length {} is not 3..=768 in steps of 3",
                            chunk.data.len()
                        )));
                    }
                    palette = chunk
                        .data
                        .chunks_exact(3)
                        .map(|c| [c[0], c[1], c[2]])
                        .collect();
                }
                ChunkKind::Transparency => transparency = Some(chunk.data),
                ChunkKind::Data => {
                    if header.is_none() {
                        return Err(RasterError::MissingChunk("IHDR"));
                    }
                    idat.extend_from_slice(chunk.data);
                    if let Some(limits) = self.limits {
                        limits.check_memory(idat.len())?;
                    }
                }
                ChunkKind::Text => match TextProperty::parse(chunk.data) {
                    Some(prop) => text.push(prop),
                    None => warn!("skipping malformed tEXt chunk"),
                },
                ChunkKind::End => {
                    seen_end = true;
                    break;
                }
                ChunkKind::Ancillary => {
                    if chunk.is_critical() {
                        warn!("ignoring unknown critical chunk {}", chunk.tag_str());
                    } else {
                        trace!("ignoring chunk {}", chunk.tag_str());
                    }
                }
            }
        }

        let header = header.ok_or(RasterError::MissingChunk("IHDR"))?;
        if idat.is_empty() {
            return Err(RasterError::MissingChunk("IDAT"));
        }
        if !seen_end {
            warn!("PNG has no IEND chunk");
        }
        if header.interlace == InterlaceMethod::Adam7 {
            return Err(RasterError::UnsupportedVariant(
                "Adam7 interlaced PNG".into(),
            ));
        }
        let reader = ColorReader::for_header(&header, &palette, transparency)?;

        let filtered_size = header.filtered_size()?;
        if let Some(limits) = self.limits {
            limits.check_memory(filtered_size)?;
        }
        let filtered = inflate(&idat, filtered_size)?;
        debug!(
            "inflated {} bytes of IDAT into {} bytes",
            idat.len(),
            filtered.len()
        );
        stop.check()?;

        let scanline_len = header.scanline_len();
        let unfiltered = unfilter_image(
            &filtered,
            scanline_len,
            header.height as usize,
            header.filter_step(),
        )?;
        stop.check()?;

        let mut pixels = PixelBuffer::new(header.width, header.height)?;
        reader.read_image(&unfiltered, scanline_len, &mut pixels);

        Ok(PngImage {
            header,
            text,
            pixels,
        })
    }
}

/// Inflate the zlib stream, reading no more than `expected` bytes.
///
/// The output grows with the data actually inflated; `expected` comes from
/// IHDR and is not trusted for a reservation.
fn inflate(idat: &[u8], expected: usize) -> Result<Vec<u8>, RasterError> {
    let mut out = Vec::new();
    ZlibDecoder::new(idat)
        .take(expected as u64)
        .read_to_end(&mut out)
        .map_err(|e| RasterError::InvalidData(format!("zlib stream: {e}")))?;
    if out.len() < expected {
        return Err(RasterError::UnexpectedEof);
    }
    Ok(out)
}
