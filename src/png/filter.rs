//! Scanline filters.
//!
//! Every filter predicts a byte from its left neighbour `a` (one pixel,
//! `step` bytes, back), the byte above `b`, and the byte above-left `c`.
//! Neighbours outside the image read as zero. Unfiltering depends on the
//! reconstructed previous row, so whole images are processed row by row.

use crate::error::RasterError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterType {
    None,
    Sub,
    Up,
    Average,
    Paeth,
}

/// All five filters, in tag order.
pub const FILTERS: [FilterType; 5] = [
    FilterType::None,
    FilterType::Sub,
    FilterType::Up,
    FilterType::Average,
    FilterType::Paeth,
];

/// How the encoder picks a filter for each scanline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FilterStrategy {
    /// Try all five, keep the one with the smallest sum of absolute
    /// signed residuals.
    #[default]
    Adaptive,
    /// Use one filter for every scanline.
    Fixed(FilterType),
}

impl FilterType {
    pub fn from_u8(tag: u8) -> Option<Self> {
        FILTERS.get(usize::from(tag)).copied()
    }

    pub const fn to_u8(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Sub => 1,
            Self::Up => 2,
            Self::Average => 3,
            Self::Paeth => 4,
        }
    }

    /// Reconstruct one scanline. `previous` is the already reconstructed row
    /// above; pass an empty slice for the first row.
    pub fn decode(self, scanline: &[u8], previous: &[u8], step: usize) -> Vec<u8> {
        let mut out = vec![0u8; scanline.len()];
        self.unfilter_into(scanline, previous, step, &mut out);
        out
    }

    /// Filter one raw scanline. The result starts with the filter-type byte.
    pub fn encode(self, scanline: &[u8], previous: &[u8], step: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(scanline.len() + 1);
        out.push(self.to_u8());
        self.filter_into(scanline, previous, step, &mut out);
        out
    }

    pub(crate) fn unfilter_into(
        self,
        scanline: &[u8],
        previous: &[u8],
        step: usize,
        out: &mut [u8],
    ) {
        let above = |i: usize| previous.get(i).copied().unwrap_or(0);
        let n = scanline.len().min(out.len());
        for i in 0..n {
            let a = if i >= step { out[i - step] } else { 0 };
            let b = above(i);
            let c = if i >= step { above(i - step) } else { 0 };
            out[i] = scanline[i].wrapping_add(self.predict(a, b, c));
        }
    }

    fn filter_into(self, scanline: &[u8], previous: &[u8], step: usize, out: &mut Vec<u8>) {
        let above = |i: usize| previous.get(i).copied().unwrap_or(0);
        out.extend(scanline.iter().enumerate().map(|(i, &x)| {
            let a = if i >= step { scanline[i - step] } else { 0 };
            let b = above(i);
            let c = if i >= step { above(i - step) } else { 0 };
            x.wrapping_sub(self.predict(a, b, c))
        }));
    }

    #[inline]
    fn predict(self, a: u8, b: u8, c: u8) -> u8 {
        match self {
            Self::None => 0,
            Self::Sub => a,
            Self::Up => b,
            Self::Average => ((u16::from(a) + u16::from(b)) / 2) as u8,
            Self::Paeth => paeth(a, b, c),
        }
    }
}

/// Ties resolve to left, then above, then upper-left.
#[inline]
fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = i16::from(a) + i16::from(b) - i16::from(c);
    let pa = (p - i16::from(a)).abs();
    let pb = (p - i16::from(b)).abs();
    let pc = (p - i16::from(c)).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

/// Undo filtering for a whole non-interlaced image.
///
/// `data` holds `height` rows of `1 + scanline_len` bytes. Returns the
/// unfiltered rows packed back to back.
pub fn unfilter_image(
    data: &[u8],
    scanline_len: usize,
    height: usize,
    step: usize,
) -> Result<Vec<u8>, RasterError> {
    let filtered_len = scanline_len + 1;
    let needed = filtered_len
        .checked_mul(height)
        .ok_or_else(|| RasterError::InvalidData("image data size overflows".into()))?;
    if data.len() < needed {
        return Err(RasterError::UnexpectedEof);
    }

    let mut out = vec![0u8; scanline_len * height];
    for (y, row) in data[..needed].chunks_exact(filtered_len).enumerate() {
        let filter = FilterType::from_u8(row[0]).ok_or_else(|| {
            RasterError::InvalidData(format!("unknown filter type {} on row {y}", row[0]))
        })?;
        let (done, rest) = out.split_at_mut(y * scanline_len);
        let previous = if y == 0 {
            &[][..]
        } else {
            &done[(y - 1) * scanline_len..]
        };
        filter.unfilter_into(&row[1..], previous, step, &mut rest[..scanline_len]);
    }
    Ok(out)
}

/// Filter a whole image of packed raw rows. Each output row carries its tag byte.
pub fn filter_image(
    raw: &[u8],
    scanline_len: usize,
    step: usize,
    strategy: FilterStrategy,
) -> Vec<u8> {
    if scanline_len == 0 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(raw.len() + raw.len() / scanline_len);
    let mut previous: &[u8] = &[];
    for row in raw.chunks_exact(scanline_len) {
        match strategy {
            FilterStrategy::Fixed(filter) => {
                out.push(filter.to_u8());
                filter.filter_into(row, previous, step, &mut out);
            }
            FilterStrategy::Adaptive => {
                let best = FILTERS
                    .iter()
                    .map(|f| f.encode(row, previous, step))
                    .min_by_key(|candidate| score(&candidate[1..]))
                    .unwrap_or_default();
                out.extend_from_slice(&best);
            }
        }
        previous = row;
    }
    out
}

/// Sum of residuals read as signed bytes.
fn score(filtered: &[u8]) -> u64 {
    filtered
        .iter()
        .map(|&b| u64::from((b as i8).unsigned_abs()))
        .sum()
}
