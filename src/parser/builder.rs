//! Recursive message builder.
//!
//! A message directory is processed in four steps:
//!
//! 1. read the header of its `__properties_version1.0` stream (counts),
//! 2. parse each `__recip_version1.0_#XXXXXXXX` directory into a [`Recipient`],
//! 3. parse each `__attach_version1.0_#XXXXXXXX` directory into an
//!    [`Attachment`], recursing when it holds an embedded message,
//! 4. resume the main property stream after the header and walk the
//!    message's own properties.
//!
//! Recipients and attachments are read from their own streams, so step 4
//! always starts exactly where step 1 stopped. Any error aborts the whole
//! parse; no partial message is returned.
//!
//! Once the tree is complete, each message's code page is handed down to the
//! entities below it that declare none.

use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use memmap2::Mmap;
use tracing::{debug, info, trace};

use super::header;
use super::naming;
use super::walker;
use super::ParseOptions;
use crate::container::{CfbContainer, Container, Directory};
use crate::error::{MsgError, Result};
use crate::model::attachment::{Attachment, FileAttachment, MsgAttachment};
use crate::model::message::{Message, Recipient};
use crate::model::property::PropertySink;

/// Parse a `.msg` container from any seekable byte source with default options.
pub fn parse_message<R: Read + Seek>(source: R) -> Result<Message> {
    MsgParser::default().parse_reader(source)
}

/// Parse a `.msg` file from disk with default options.
pub fn parse_msg_file(path: impl AsRef<Path>) -> Result<Message> {
    MsgParser::default().parse_file(path)
}

/// `.msg` parser with configurable [`ParseOptions`].
#[derive(Debug, Clone, Default)]
pub struct MsgParser {
    options: ParseOptions,
}

impl MsgParser {
    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Memory-map `path` and parse it.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<Message> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| MsgError::open(path, e))?;
        // SAFETY: the mapping is read-only and dropped before returning.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| MsgError::io(path, e))?;
        info!(path = %path.display(), size = mmap.len(), "Parsing MSG file");
        self.parse_reader(Cursor::new(mmap))
    }

    /// Open the compound file in `source` and parse its root message.
    pub fn parse_reader<R: Read + Seek>(&self, source: R) -> Result<Message> {
        let mut container = CfbContainer::open(source)?;
        self.parse_container(&mut container)
    }

    /// Parse the root message of an already opened container.
    pub fn parse_container<C: Container + ?Sized>(&self, container: &mut C) -> Result<Message> {
        let mut message = self.build_message(container, &Directory::root(), 0)?;
        message.inherit_codepage(None);
        Ok(message)
    }

    fn build_message<C: Container + ?Sized>(
        &self,
        container: &mut C,
        dir: &Directory,
        depth: usize,
    ) -> Result<Message> {
        if depth > self.options.max_depth {
            return Err(MsgError::NestingTooDeep {
                limit: self.options.max_depth,
            });
        }
        trace!(directory = %dir, depth, "Building message");

        let mut stream = dir.open_stream(container, naming::PROPERTIES_STREAM)?;
        let header = header::read_directory_header(&mut stream, dir.is_root())?;
        debug!(
            directory = %dir,
            recipients = header.recipient_count,
            attachments = header.attachment_count,
            "Read message header"
        );

        let mut message = Message::new();

        for index in 0..header.recipient_count {
            let recipient_dir = dir.directory(container, &naming::recipient_dir(index))?;
            let recipient = self.parse_recipient(container, &recipient_dir)?;
            message.add_recipient(recipient);
        }

        for index in 0..header.attachment_count {
            let attachment_dir = dir.directory(container, &naming::attachment_dir(index))?;
            let attachment = self.parse_attachment(container, &attachment_dir, depth)?;
            message.add_attachment(attachment);
        }

        walker::walk_properties(&mut stream, dir, container, &self.options, &mut message)?;
        Ok(message)
    }

    /// Parse one recipient directory.
    pub fn parse_recipient<C: Container + ?Sized>(
        &self,
        container: &mut C,
        dir: &Directory,
    ) -> Result<Recipient> {
        let mut recipient = Recipient::new();
        self.walk_entity(container, dir, &mut recipient)?;
        Ok(recipient)
    }

    /// Parse one attachment directory of a message at nesting `depth`.
    ///
    /// A directory containing the embedded-message marker always becomes
    /// [`Attachment::Message`], whatever else it contains.
    pub fn parse_attachment<C: Container + ?Sized>(
        &self,
        container: &mut C,
        dir: &Directory,
        depth: usize,
    ) -> Result<Attachment> {
        let marker = naming::embedded_message_marker();
        if dir.has_entry(container, &marker) {
            let nested_dir = dir.directory(container, &marker)?;
            let message = self.build_message(container, &nested_dir, depth + 1)?;
            let mut attachment = MsgAttachment::new(message);
            self.walk_entity(container, dir, &mut attachment)?;
            Ok(Attachment::Message(attachment))
        } else {
            let mut attachment = FileAttachment::new();
            self.walk_entity(container, dir, &mut attachment)?;
            Ok(Attachment::File(attachment))
        }
    }

    /// Walk the property stream of a recipient or attachment directory.
    fn walk_entity<C, S>(&self, container: &mut C, dir: &Directory, sink: &mut S) -> Result<usize>
    where
        C: Container + ?Sized,
        S: PropertySink,
    {
        let mut stream = dir.open_stream(container, naming::PROPERTIES_STREAM)?;
        header::skip_entity_header(&mut stream)?;
        walker::walk_properties(&mut stream, dir, container, &self.options, sink)
    }
}
