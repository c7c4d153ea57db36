//! # rastercodec
//!
//! BMP and PNG decoder and encoder built around one canonical pixel
//! buffer: every decode produces top-down RGBA8, every encode consumes it.
//!
//! ## Supported Formats
//!
//! ### BMP (`bmp` feature)
//! - Decode of 1/4/8-bit indexed, 16/24/32-bit direct color, RLE8,
//!   `BI_BITFIELDS` masks, bottom-up and top-down files
//! - Encode at any of those depths, optionally RLE8 compressed
//!
//! ### PNG (`png` feature)
//! - Decode of every color type at bit depths 1–16, palettes with partial
//!   tRNS alpha, tRNS color keys, tEXt properties, CRC32 verification
//! - Encode to 8-bit RGB or RGBA with adaptive or fixed filtering
//!
//! ## Non-Goals
//!
//! - Adam7 interlaced PNG decode (reported as [`RasterError::UnsupportedVariant`])
//! - Color management and gamma
//! - Streaming or partial decode: inputs are fully buffered
//!
//! ## Usage
//!
//! ```no_run
//! use rastercodec::{DecodeRequest, EncodeRequest, ImageInfo, Unstoppable};
//!
//! let data = std::fs::read("in.bmp")?;
//!
//! // Probe without decoding
//! let info = ImageInfo::from_bytes(&data)?;
//! println!("{}x{} {:?}", info.width, info.height, info.format);
//!
//! let pixels = DecodeRequest::new(&data).decode(Unstoppable)?;
//! let png = EncodeRequest::png()
//!     .text("Software", "rastercodec")
//!     .encode(&pixels, Unstoppable)?;
//! std::fs::write("out.png", png)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! The [`codec`] module offers the same codecs behind the [`ImageCodec`]
//! trait, selected by file name or signature.

#![forbid(unsafe_code)]

mod bits;
mod bytes;
mod error;
mod info;
mod limits;
mod pixel;
mod rows;

#[cfg(feature = "bmp")]
pub mod bmp;

#[cfg(feature = "png")]
pub mod png;

pub mod codec;

#[cfg(any(feature = "bmp", feature = "png"))]
mod request;

// Re-exports
pub use codec::{ImageCodec, ReadSeek};
pub use enough::{Stop, StopReason, Unstoppable};
pub use error::RasterError;
pub use info::{ImageFormat, ImageInfo};
pub use limits::Limits;
pub use pixel::{Color, PixelBuffer};
#[cfg(any(feature = "bmp", feature = "png"))]
pub use request::{DecodeRequest, EncodeRequest};
