use crate::error::RasterError;
use crate::limits::zeroed_buffer;

/// One RGBA8 pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color (alpha = 255).
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub(crate) fn from_slice(px: &[u8]) -> Self {
        Self::new(px[0], px[1], px[2], px[3])
    }
}

/// Canonical decoded image: tightly packed RGBA8, top row first.
///
/// `pixels().len()` is always `width * height * 4`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Allocate a transparent-black buffer.
    ///
    /// Zero dimensions are rejected rather than coerced to a 1x1 image.
    pub fn new(width: u32, height: u32) -> Result<Self, RasterError> {
        let len = canonical_len(width, height)?;
        Ok(Self {
            width,
            height,
            data: zeroed_buffer(len)?,
        })
    }

    /// Wrap existing RGBA8 bytes.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, RasterError> {
        let len = canonical_len(width, height)?;
        if data.len() != len {
            return Err(RasterError::BufferTooSmall {
                needed: len,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build from a color sequence, row-major.
    pub fn from_colors(width: u32, height: u32, colors: &[Color]) -> Result<Self, RasterError> {
        let data = colors.iter().flat_map(|c| c.to_array()).collect();
        Self::from_rgba(width, height, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA8 bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_rgba(self) -> Vec<u8> {
        self.data
    }

    /// Bytes in one canonical row.
    pub fn stride(&self) -> usize {
        self.width as usize * 4
    }

    /// Pixel at (x, y), or `None` outside the image.
    pub fn get(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let off = self.offset(x, y);
        Some(Color::from_slice(&self.data[off..off + 4]))
    }

    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        if x < self.width && y < self.height {
            let off = self.offset(x, y);
            self.data[off..off + 4].copy_from_slice(&color.to_array());
        }
    }

    /// Canonical row `y`. Panics if `y >= height`.
    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.stride();
        let start = y as usize * stride;
        &self.data[start..start + stride]
    }

    pub fn colors(&self) -> impl Iterator<Item = Color> + '_ {
        self.data.chunks_exact(4).map(Color::from_slice)
    }

    /// Whether every pixel has alpha 255.
    pub fn is_opaque(&self) -> bool {
        self.data.chunks_exact(4).all(|px| px[3] == 255)
    }

    /// Reinterpret as typed RGBA pixels.
    #[cfg(feature = "rgb")]
    pub fn as_rgba8(&self) -> &[rgb::RGBA8] {
        use rgb::FromSlice as _;
        self.data.as_rgba()
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }
}

pub(crate) fn canonical_len(width: u32, height: u32) -> Result<usize, RasterError> {
    if width == 0 || height == 0 {
        return Err(RasterError::InvalidHeader(format!(
            "image dimensions must be non-zero, got {width}x{height}"
        )));
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|p| p.checked_mul(4))
        .ok_or(RasterError::DimensionsTooLarge { width, height })
}
