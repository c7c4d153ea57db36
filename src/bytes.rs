//! Bounds-checked cursor over a fully buffered input.
//!
//! Every read either succeeds or returns [`RasterError::UnexpectedEof`];
//! the cursor never panics on short input.

use crate::error::RasterError;

pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub(crate) fn eof(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub(crate) fn set_position(&mut self, pos: usize) -> Result<(), RasterError> {
        if pos > self.data.len() {
            return Err(RasterError::UnexpectedEof);
        }
        self.pos = pos;
        Ok(())
    }

    pub(crate) fn skip(&mut self, n: usize) -> Result<(), RasterError> {
        let new_pos = self.pos.checked_add(n).ok_or(RasterError::UnexpectedEof)?;
        self.set_position(new_pos)
    }

    /// Borrow the next `n` bytes and advance past them.
    pub(crate) fn take(&mut self, n: usize) -> Result<&'a [u8], RasterError> {
        let end = self.pos.checked_add(n).ok_or(RasterError::UnexpectedEof)?;
        let slice = self
            .data
            .get(self.pos..end)
            .ok_or(RasterError::UnexpectedEof)?;
        self.pos = end;
        Ok(slice)
    }

    pub(crate) fn read_array<const N: usize>(&mut self) -> Result<[u8; N], RasterError> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.take(N)?);
        Ok(buf)
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, RasterError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub(crate) fn read_u16_le(&mut self) -> Result<u16, RasterError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub(crate) fn read_u32_le(&mut self) -> Result<u32, RasterError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub(crate) fn read_i32_le(&mut self) -> Result<i32, RasterError> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub(crate) fn read_u32_be(&mut self) -> Result<u32, RasterError> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_mixed_endianness() {
        let data = [0x42, 0x4D, 0, 0, 0, 1, 0xff];
        let mut r = ByteReader::new(&data);
        assert_eq!(r.read_u16_le().unwrap(), 0x4D42);
        assert_eq!(r.read_u32_be().unwrap(), 1);
        assert_eq!(r.remaining(), 1);
        assert_eq!(r.read_u8().unwrap(), 0xff);
        assert!(r.eof());
    }

    #[test]
    fn short_reads_do_not_advance() {
        let data = [1, 2, 3];
        let mut r = ByteReader::new(&data);
        assert!(matches!(r.read_u32_le(), Err(RasterError::UnexpectedEof)));
        assert_eq!(r.position(), 0);
        assert!(r.skip(4).is_err());
        assert_eq!(r.take(3).unwrap(), &[1, 2, 3]);
    }
}
