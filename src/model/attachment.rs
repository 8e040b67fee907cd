//! Attachments: plain files or complete embedded messages.

use super::message::Message;
use super::property::{tags, PropertySink, PropertyTag, PropertyValue, Properties};

/// An attachment of a [`Message`].
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Attachment {
    /// A file: name, extension, MIME type and binary payload.
    File(FileAttachment),
    /// Another `.msg` message attached whole.
    Message(MsgAttachment),
}

impl Attachment {
    /// Properties of the attachment directory itself.
    pub fn properties(&self) -> &Properties {
        match self {
            Self::File(file) => &file.properties,
            Self::Message(msg) => &msg.properties,
        }
    }

    /// Best display name: the file name, or the nested message's subject.
    pub fn display_name(&self) -> Option<String> {
        match self {
            Self::File(file) => file.filename(),
            Self::Message(msg) => msg
                .properties
                .text(tags::DISPLAY_NAME)
                .filter(|s| !s.is_empty())
                .or_else(|| msg.message.subject()),
        }
    }
}

/// A file attachment.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct FileAttachment {
    pub properties: Properties,
}

impl PropertySink for FileAttachment {
    fn set_property(&mut self, tag: PropertyTag, value: PropertyValue) {
        self.properties.set(tag, value);
    }
}

impl FileAttachment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Long file name, falling back to the 8.3 one.
    pub fn filename(&self) -> Option<String> {
        self.properties
            .first_text(&[tags::ATTACH_LONG_FILENAME, tags::ATTACH_FILENAME])
    }

    pub fn extension(&self) -> Option<String> {
        self.properties.text(tags::ATTACH_EXTENSION)
    }

    pub fn mime_type(&self) -> Option<String> {
        self.properties.text(tags::ATTACH_MIME_TAG)
    }

    /// Content-ID for inline images referenced from the HTML body.
    pub fn content_id(&self) -> Option<String> {
        self.properties.text(tags::ATTACH_CONTENT_ID)
    }

    /// The attached file's bytes.
    pub fn data(&self) -> Option<&[u8]> {
        self.properties.binary(tags::ATTACH_DATA)
    }

    /// Size of the payload, or the declared attachment size when there is none.
    pub fn size(&self) -> u64 {
        match self.data() {
            Some(data) => data.len() as u64,
            None => self
                .properties
                .int(tags::ATTACH_SIZE)
                .map_or(0, |s| s.max(0) as u64),
        }
    }
}

/// An embedded message attachment.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct MsgAttachment {
    /// Properties of the attachment directory (display name, method, ...).
    pub properties: Properties,
    /// The nested message.
    pub message: Message,
}

impl MsgAttachment {
    pub fn new(message: Message) -> Self {
        Self {
            properties: Properties::new(),
            message,
        }
    }
}

impl PropertySink for MsgAttachment {
    fn set_property(&mut self, tag: PropertyTag, value: PropertyValue) {
        self.properties.set(tag, value);
    }
}
