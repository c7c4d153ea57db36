//! PNG chunk container: (length, type, data, CRC32) records in file order.

use log::trace;

use crate::bytes::ByteReader;
use crate::error::RasterError;
use crate::info::PNG_SIGNATURE;

/// What the decoder does with a chunk, keyed by its type tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkKind {
    Header,
    Palette,
    Transparency,
    Data,
    End,
    Text,
    /// Any other chunk; kept as a generic record, never interpreted.
    Ancillary,
}

impl ChunkKind {
    pub fn from_tag(tag: &[u8; 4]) -> Self {
        match tag {
            b"IHDR" => Self::Header,
            b"PLTE" => Self::Palette,
            b"tRNS" => Self::Transparency,
            b"IDAT" => Self::Data,
            b"IEND" => Self::End,
            b"tEXt" => Self::Text,
            _ => Self::Ancillary,
        }
    }
}

/// One chunk borrowed from the input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub tag: [u8; 4],
    pub data: &'a [u8],
    /// CRC as stored in the file.
    pub crc: u32,
}

impl Chunk<'_> {
    pub fn kind(&self) -> ChunkKind {
        ChunkKind::from_tag(&self.tag)
    }

    pub fn length(&self) -> u32 {
        self.data.len() as u32
    }

    pub fn tag_str(&self) -> String {
        String::from_utf8_lossy(&self.tag).into_owned()
    }

    /// Bit 5 of the first tag byte: lower case means safe to ignore.
    pub fn is_critical(&self) -> bool {
        self.tag[0].is_ascii_uppercase()
    }

    pub fn computed_crc(&self) -> u32 {
        chunk_crc(&self.tag, self.data)
    }

    pub fn verify_crc(&self) -> Result<(), RasterError> {
        let computed = self.computed_crc();
        if computed != self.crc {
            return Err(RasterError::BadCrc {
                chunk: self.tag_str(),
                stored: self.crc,
                computed,
            });
        }
        Ok(())
    }
}

/// CRC32 over the type tag followed by the data.
pub fn chunk_crc(tag: &[u8; 4], data: &[u8]) -> u32 {
    let mut crc = flate2::Crc::new();
    crc.update(tag);
    crc.update(data);
    crc.sum()
}

/// Iterates chunks after the signature. Stops after the first error.
pub struct ChunkReader<'a> {
    reader: ByteReader<'a>,
    failed: bool,
}

impl<'a> ChunkReader<'a> {
    /// Check the signature and position the reader on the first chunk.
    pub fn new(data: &'a [u8]) -> Result<Self, RasterError> {
        if !data.starts_with(&PNG_SIGNATURE) {
            return Err(RasterError::UnrecognizedFormat);
        }
        let mut reader = ByteReader::new(data);
        reader.skip(PNG_SIGNATURE.len())?;
        Ok(Self {
            reader,
            failed: false,
        })
    }

    fn read_chunk(&mut self) -> Result<Chunk<'a>, RasterError> {
        let length = self.reader.read_u32_be()?;
        if length > i32::MAX as u32 {
            return Err(RasterError::InvalidData(format!(
                "chunk length {length} exceeds 2^31-1"
            )));
        }
        let tag = self.reader.read_array::<4>()?;
        let data = self.reader.take(length as usize)?;
        let crc = self.reader.read_u32_be()?;
        trace!(
            "chunk {} ({length} bytes) at offset {}",
            String::from_utf8_lossy(&tag),
            self.reader.position()
        );
        Ok(Chunk { tag, data, crc })
    }
}

impl<'a> Iterator for ChunkReader<'a> {
    type Item = Result<Chunk<'a>, RasterError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.reader.eof() {
            return None;
        }
        let chunk = self.read_chunk();
        self.failed = chunk.is_err();
        Some(chunk)
    }
}

/// Append a chunk (length, type, data, CRC32) to `out`.
pub fn write_chunk(out: &mut Vec<u8>, tag: &[u8; 4], data: &[u8]) {
    out.reserve(12 + data.len());
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(tag);
    out.extend_from_slice(data);
    out.extend_from_slice(&chunk_crc(tag, data).to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iend_has_known_crc() {
        let mut out = Vec::new();
        write_chunk(&mut out, b"IEND", &[]);
        assert_eq!(out.len(), 12);
        assert_eq!(&out[0..4], &[0, 0, 0, 0]);
        assert_eq!(&out[4..8], b"IEND");
        assert_eq!(&out[8..12], &0xAE42_6082_u32.to_be_bytes());
    }

    #[test]
    fn reads_chunks_in_order() {
        let mut data = PNG_SIGNATURE.to_vec();
        write_chunk(&mut data, b"tEXt", b"a\0b");
        write_chunk(&mut data, b"zzZz", &[1, 2, 3]);
        write_chunk(&mut data, b"IEND", &[]);

        let chunks: Vec<_> = ChunkReader::new(&data)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].kind(), ChunkKind::Text);
        assert_eq!(chunks[1].kind(), ChunkKind::Ancillary);
        assert!(!chunks[1].is_critical());
        assert_eq!(chunks[1].data, &[1, 2, 3]);
        assert_eq!(chunks[2].kind(), ChunkKind::End);
        assert!(chunks.iter().all(|c| c.verify_crc().is_ok()));
    }

    #[test]
    fn detects_crc_mismatch() {
        let mut data = PNG_SIGNATURE.to_vec();
        write_chunk(&mut data, b"IDAT", &[9, 9]);
        let last = data.len() - 1;
        data[last] ^= 0xFF;
        let chunk = ChunkReader::new(&data).unwrap().next().unwrap().unwrap();
        assert!(matches!(
            chunk.verify_crc(),
            Err(RasterError::BadCrc { .. })
        ));
    }

    #[test]
    fn truncated_chunk_errors_once() {
        let mut data = PNG_SIGNATURE.to_vec();
        write_chunk(&mut data, b"IDAT", &[1, 2, 3, 4]);
        data.truncate(data.len() - 6);
        let mut reader = ChunkReader::new(&data).unwrap();
        assert!(matches!(reader.next(), Some(Err(RasterError::UnexpectedEof))));
        assert!(reader.next().is_none());
    }

    #[test]
    fn rejects_bad_signature() {
        let mut sig = PNG_SIGNATURE;
        sig[7] = 0;
        assert!(matches!(
            ChunkReader::new(&sig),
            Err(RasterError::UnrecognizedFormat)
        ));
    }
}
