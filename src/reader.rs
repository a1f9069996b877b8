//! Byte-oriented reader abstraction over the index and model streams.
//!
//! The original tool reads both files through the same `Reader` contract
//! whether the underlying stream is raw or LZW-compressed
//! (`examples/original_source/choctoobj.c` picks between `reader_raw_init`
//! and `reader_gkey_init` on the `-raw` switch). We model that as one trait
//! implemented by two concrete readers: [`RawReader`] wraps any `Read + Seek`
//! directly, [`LzwReader`] inflates the whole stream up front through
//! `weezl` and then serves it the same way.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use weezl::{decode::Decoder, BitOrder};

use crate::error::{ChocError, ChocResult};

/// Relative or absolute seek, matching the original `Reader`'s `tell`/`seek`
/// pair (`examples/original_source/parser.c` calls `reader_fseek` with both
/// `SEEK_SET` and `SEEK_CUR`).
#[derive(Clone, Copy, Debug)]
pub enum SeekPos {
    Absolute(u64),
    Relative(i64),
}

/// Produces bytes and little-endian 32-bit signed integers, with a one-byte
/// pushback buffer used to detect end-of-file without consuming it.
pub trait ByteReader {
    fn tell(&mut self) -> ChocResult<u64>;
    fn seek_to(&mut self, pos: SeekPos) -> ChocResult<()>;
    fn getc(&mut self) -> ChocResult<Option<u8>>;
    fn ungetc(&mut self, byte: u8);

    /// Peeks one byte ahead to detect EOF without disturbing the stream
    /// position, mirroring the `getc` + `ungetc` idiom `choc_to_obj` uses to
    /// decide whether another object follows the index.
    fn at_eof(&mut self) -> ChocResult<bool> {
        match self.getc()? {
            None => Ok(true),
            Some(b) => {
                self.ungetc(b);
                Ok(false)
            }
        }
    }

    fn read_i32(&mut self) -> ChocResult<i32> {
        let mut buf = [0u8; 4];
        self.read_exact_buf(&mut buf)?;
        Ok((&buf[..]).read_i32::<LittleEndian>()?)
    }

    fn read_exact_buf(&mut self, buf: &mut [u8]) -> ChocResult<()> {
        for slot in buf.iter_mut() {
            *slot = self
                .getc()?
                .ok_or_else(|| ChocError::Io(io::Error::from(io::ErrorKind::UnexpectedEof)))?;
        }
        Ok(())
    }

    fn skip(&mut self, count: i64) -> ChocResult<()> {
        self.seek_to(SeekPos::Relative(count))
    }
}

/// Wraps any seekable byte stream, serving it byte-for-byte.
pub struct RawReader<R> {
    inner: R,
    pushback: Option<u8>,
}

impl<R: Read + Seek> RawReader<R> {
    pub fn new(inner: R) -> Self {
        RawReader {
            inner,
            pushback: None,
        }
    }
}

impl<R: Read + Seek> ByteReader for RawReader<R> {
    fn tell(&mut self) -> ChocResult<u64> {
        let pos = self.inner.stream_position()?;
        Ok(if self.pushback.is_some() {
            pos.saturating_sub(1)
        } else {
            pos
        })
    }

    fn seek_to(&mut self, pos: SeekPos) -> ChocResult<()> {
        self.pushback = None;
        match pos {
            SeekPos::Absolute(p) => self.inner.seek(SeekFrom::Start(p))?,
            SeekPos::Relative(p) => self.inner.seek(SeekFrom::Current(p))?,
        };
        Ok(())
    }

    fn getc(&mut self) -> ChocResult<Option<u8>> {
        if let Some(b) = self.pushback.take() {
            return Ok(Some(b));
        }
        let mut buf = [0u8; 1];
        match self.inner.read(&mut buf)? {
            0 => Ok(None),
            _ => Ok(Some(buf[0])),
        }
    }

    fn ungetc(&mut self, byte: u8) {
        self.pushback = Some(byte);
    }
}

/// Inflates an entire GIF-variant LZW bitstream (9-bit initial code size,
/// 8-bit root alphabet, history window `2^9`) up front, then serves the
/// result exactly like a [`RawReader`].
///
/// The format this tool reads is not chunked into length-prefixed GIF
/// sub-blocks — the whole file is a single continuous LZW bitstream.
pub struct LzwReader {
    inner: RawReader<Cursor<Vec<u8>>>,
}

impl LzwReader {
    pub fn new<R: Read>(mut compressed: R) -> ChocResult<Self> {
        let mut compressed_bytes = Vec::new();
        compressed.read_to_end(&mut compressed_bytes)?;
        let decoded = Decoder::new(BitOrder::Lsb, 8)
            .decode(&compressed_bytes)
            .map_err(|e| ChocError::Format(format!("LZW decode failed: {}", e)))?;
        Ok(LzwReader {
            inner: RawReader::new(Cursor::new(decoded)),
        })
    }
}

impl ByteReader for LzwReader {
    fn tell(&mut self) -> ChocResult<u64> {
        self.inner.tell()
    }

    fn seek_to(&mut self, pos: SeekPos) -> ChocResult<()> {
        self.inner.seek_to(pos)
    }

    fn getc(&mut self) -> ChocResult<Option<u8>> {
        self.inner.getc()
    }

    fn ungetc(&mut self, byte: u8) {
        self.inner.ungetc(byte)
    }
}

/// Picks between [`RawReader`] and [`LzwReader`] at runtime (the `-raw`
/// switch), so callers need not be generic over which one they got.
pub enum FileReader<R> {
    Raw(RawReader<R>),
    Lzw(LzwReader),
}

impl<R: Read + Seek> ByteReader for FileReader<R> {
    fn tell(&mut self) -> ChocResult<u64> {
        match self {
            FileReader::Raw(r) => r.tell(),
            FileReader::Lzw(r) => r.tell(),
        }
    }

    fn seek_to(&mut self, pos: SeekPos) -> ChocResult<()> {
        match self {
            FileReader::Raw(r) => r.seek_to(pos),
            FileReader::Lzw(r) => r.seek_to(pos),
        }
    }

    fn getc(&mut self) -> ChocResult<Option<u8>> {
        match self {
            FileReader::Raw(r) => r.getc(),
            FileReader::Lzw(r) => r.getc(),
        }
    }

    fn ungetc(&mut self, byte: u8) {
        match self {
            FileReader::Raw(r) => r.ungetc(byte),
            FileReader::Lzw(r) => r.ungetc(byte),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_raw_reader_getc_ungetc() {
        let mut r = RawReader::new(Cursor::new(vec![1, 2, 3]));
        assert_eq!(r.getc().unwrap(), Some(1));
        r.ungetc(1);
        assert_eq!(r.getc().unwrap(), Some(1));
        assert_eq!(r.getc().unwrap(), Some(2));
        assert_eq!(r.getc().unwrap(), Some(3));
        assert_eq!(r.getc().unwrap(), None);
    }

    #[test]
    fn test_raw_reader_at_eof() {
        let mut r = RawReader::new(Cursor::new(vec![9]));
        assert!(!r.at_eof().unwrap());
        let _ = r.getc().unwrap();
        assert!(r.at_eof().unwrap());
    }

    #[test]
    fn test_raw_reader_read_i32_le() {
        let mut r = RawReader::new(Cursor::new(vec![0xFF, 0xFF, 0xFF, 0xFF]));
        assert_eq!(r.read_i32().unwrap(), -1);
    }

    #[test]
    fn test_raw_reader_seek_relative() {
        let mut r = RawReader::new(Cursor::new(vec![1, 2, 3, 4, 5]));
        r.seek_to(SeekPos::Relative(2)).unwrap();
        assert_eq!(r.getc().unwrap(), Some(3));
    }

    #[test]
    fn test_lzw_round_trip() {
        let data = b"the quick brown fox jumps over the lazy dog".to_vec();
        let compressed = weezl::encode::Encoder::new(BitOrder::Lsb, 8)
            .encode(&data)
            .unwrap();
        let mut r = LzwReader::new(Cursor::new(compressed)).unwrap();
        let mut out = Vec::new();
        while let Some(b) = r.getc().unwrap() {
            out.push(b);
        }
        assert_eq!(out, data);
    }
}
