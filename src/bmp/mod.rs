//! BMP image format decoder and encoder.
//!
//! Decoding covers 1/4/8/16/24/32-bit pixel arrays, RLE8 compression,
//! `BI_BITFIELDS` masks and top-down files. Output is always canonical
//! RGBA8; 24-bit and indexed pixels come out opaque.

mod decode;
mod encode;
mod format;
mod header;
mod rle;
mod utils;

pub use crate::info::BMP_MAGIC;
pub use encode::BmpEncoding;
pub use format::PixelFormat;
pub use header::{BmpHeader, Compression, write_palette};
pub use utils::BitMasks;

pub(crate) use decode::decode_bmp;
pub(crate) use encode::encode_bmp;
