//! Fixed headers at the start of every `__properties_version1.0` stream.
//!
//! ```text
//! message (root)        message (embedded)     recipient / attachment
//! ┌──────────────────┐  ┌──────────────────┐   ┌──────────────────┐
//! │ reserved   [8]   │  │ reserved   [8]   │   │ reserved   [8]   │
//! │ next_recip  u32  │  │ next_recip  u32  │   └──────────────────┘
//! │ next_attach u32  │  │ next_attach u32  │
//! │ recip_count u32  │  │ recip_count u32  │
//! │ attach_count u32 │  │ attach_count u32 │
//! │ reserved   [8]   │  └──────────────────┘
//! └──────────────────┘
//! ```
//! All counters are little-endian. Property records follow immediately.

use crate::container::ByteStream;
use crate::error::{MsgError, Result};

/// Reserved bytes that open every property stream.
pub const RESERVED_PREFIX: usize = 8;

/// Extra padding after the counters, present only in the root message.
pub const ROOT_PADDING: usize = 8;

const COUNTERS_SIZE: usize = 16;

/// Counters read from a message directory's property stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirectoryHeader {
    pub next_recipient_id: u32,
    pub next_attachment_id: u32,
    pub recipient_count: u32,
    pub attachment_count: u32,
}

impl DirectoryHeader {
    /// Total header size for a message directory.
    pub fn size(is_root: bool) -> usize {
        RESERVED_PREFIX + COUNTERS_SIZE + if is_root { ROOT_PADDING } else { 0 }
    }
}

/// Read a message header, leaving `stream` at the first property record.
pub fn read_directory_header(stream: &mut ByteStream, is_root: bool) -> Result<DirectoryHeader> {
    let needed = DirectoryHeader::size(is_root);
    ensure_header(stream, needed)?;

    stream.skip(RESERVED_PREFIX)?;
    let header = DirectoryHeader {
        next_recipient_id: stream.read_u32()?,
        next_attachment_id: stream.read_u32()?,
        recipient_count: stream.read_u32()?,
        attachment_count: stream.read_u32()?,
    };
    if is_root {
        stream.skip(ROOT_PADDING)?;
    }
    Ok(header)
}

/// Skip the 8-byte header of a recipient or attachment property stream.
pub fn skip_entity_header(stream: &mut ByteStream) -> Result<()> {
    ensure_header(stream, RESERVED_PREFIX)?;
    stream.skip(RESERVED_PREFIX)
}

fn ensure_header(stream: &ByteStream, needed: usize) -> Result<()> {
    let available = stream.remaining();
    if available < needed {
        return Err(MsgError::MalformedHeader {
            stream: stream.name().to_string(),
            needed,
            available,
        });
    }
    Ok(())
}
