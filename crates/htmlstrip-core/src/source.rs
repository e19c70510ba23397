use std::io::{self, BufRead};
use std::str;

use thiserror::Error;

/// Failures of the underlying character stream. Malformed markup is never an
/// error; only the raw input itself can fail.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("read from underlying source failed: {0}")]
    Io(#[from] io::Error),
    #[error("invalid utf-8 sequence at byte {offset}")]
    InvalidUtf8 { offset: usize },
}

/// A sequential supplier of characters. `Ok(None)` signals end of stream and
/// must remain `Ok(None)` on every later call.
pub trait CharSource {
    fn next_char(&mut self) -> Result<Option<char>, SourceError>;
}

impl<I: Iterator<Item = char>> CharSource for I {
    fn next_char(&mut self) -> Result<Option<char>, SourceError> {
        Ok(self.next())
    }
}

/// Incremental UTF-8 decoder over a buffered byte reader.
///
/// I/O errors pass through unchanged; malformed sequences report the byte
/// offset of the offending leading byte.
pub struct Utf8Source<R> {
    reader: R,
    byte_offset: usize,
}

impl<R: BufRead> Utf8Source<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            byte_offset: 0,
        }
    }

    fn read_byte(&mut self) -> Result<Option<u8>, SourceError> {
        let buf = self.reader.fill_buf()?;
        let Some(&byte) = buf.first() else {
            return Ok(None);
        };
        self.reader.consume(1);
        self.byte_offset += 1;
        Ok(Some(byte))
    }
}

impl<R: BufRead> CharSource for Utf8Source<R> {
    fn next_char(&mut self) -> Result<Option<char>, SourceError> {
        let start = self.byte_offset;
        let Some(first) = self.read_byte()? else {
            return Ok(None);
        };
        let len = match first {
            0x00..=0x7f => return Ok(Some(first as char)),
            0xc0..=0xdf => 2,
            0xe0..=0xef => 3,
            0xf0..=0xf7 => 4,
            _ => return Err(SourceError::InvalidUtf8 { offset: start }),
        };
        let mut bytes = [first, 0, 0, 0];
        for slot in bytes.iter_mut().take(len).skip(1) {
            *slot = self
                .read_byte()?
                .ok_or(SourceError::InvalidUtf8 { offset: start })?;
        }
        match str::from_utf8(&bytes[..len]) {
            Ok(text) => Ok(text.chars().next()),
            Err(_) => Err(SourceError::InvalidUtf8 { offset: start }),
        }
    }
}
