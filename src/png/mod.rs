//! PNG image format decoder and encoder.
//!
//! Decoding covers every color type at bit depths 1–16, PLTE with a
//! partial tRNS alpha table, grayscale/truecolor tRNS color keys and
//! tEXt metadata. Adam7 interlacing is recognized but not decoded.
//! Encoding writes 8-bit RGB or RGBA.

mod chunk;
mod decode;
mod encode;
mod filter;
mod header;
mod reader;

pub use crate::info::PNG_SIGNATURE;
pub use chunk::{Chunk, ChunkKind, ChunkReader, chunk_crc, write_chunk};
pub use decode::{PngDecoder, PngImage, TextProperty};
pub use encode::{PngCompression, PngOptions};
pub use filter::{FILTERS, FilterStrategy, FilterType, filter_image, unfilter_image};
pub use header::{ColorType, InterlaceMethod, PngHeader};
pub use reader::ColorReader;

pub(crate) use encode::encode_png;
