//! Sequential little-endian reader over one document.

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{MsgError, Result};

/// A fully-read document with a read cursor.
///
/// Reads past the end fail with [`MsgError::TruncatedRecord`].
#[derive(Debug, Clone)]
pub struct ByteStream {
    name: String,
    cursor: Cursor<Vec<u8>>,
}

impl ByteStream {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            cursor: Cursor::new(data),
        }
    }

    /// Path of the document this stream was opened from.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.cursor.get_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    /// Bytes left between the cursor and the end of the document.
    pub fn remaining(&self) -> usize {
        self.len().saturating_sub(self.cursor.position() as usize)
    }

    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.ensure(count)?;
        self.cursor.set_position(self.cursor.position() + count as u64);
        Ok(())
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.ensure(2)?;
        Ok(self.cursor.read_u16::<LittleEndian>()?)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(self.cursor.read_u32::<LittleEndian>()?)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.ensure(8)?;
        Ok(self.cursor.read_u64::<LittleEndian>()?)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.ensure(N)?;
        let mut buf = [0u8; N];
        self.cursor.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// The whole document, regardless of the cursor.
    pub fn into_bytes(self) -> Vec<u8> {
        self.cursor.into_inner()
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        let remaining = self.remaining();
        if remaining < needed {
            return Err(MsgError::TruncatedRecord {
                stream: self.name.clone(),
                offset: self.position(),
                remaining,
            });
        }
        Ok(())
    }
}
