//! Parsed message and recipient types.

use chrono::{DateTime, Utc};

use super::attachment::{Attachment, FileAttachment};
use super::property::{tags, PropertySink, PropertyTag, PropertyValue, Properties};

/// A decoded `.msg` message.
///
/// Owns its recipients and attachments; an embedded message attachment owns
/// its nested [`Message`] in turn. There are no back references.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Message {
    /// The message's own properties (subject, sender, body, ...).
    pub properties: Properties,
    /// Recipients in directory index order.
    pub recipients: Vec<Recipient>,
    /// Attachments in directory index order, file and message alike.
    pub attachments: Vec<Attachment>,
}

impl PropertySink for Message {
    fn set_property(&mut self, tag: PropertyTag, value: PropertyValue) {
        self.properties.set(tag, value);
    }
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_recipient(&mut self, recipient: Recipient) {
        self.recipients.push(recipient);
    }

    pub fn add_attachment(&mut self, attachment: Attachment) {
        self.attachments.push(attachment);
    }

    /// Code page used for 8-bit strings of this message.
    pub fn codepage(&self) -> u32 {
        self.properties.codepage()
    }

    pub fn subject(&self) -> Option<String> {
        self.properties.text(tags::SUBJECT)
    }

    /// Plain-text body.
    pub fn body(&self) -> Option<String> {
        self.properties.text(tags::BODY)
    }

    /// HTML body. Outlook stores it either as a string or as binary in the
    /// message code page.
    pub fn html_body(&self) -> Option<String> {
        match self.properties.get_by_id(tags::BODY_HTML)? {
            PropertyValue::Binary(bytes) => {
                Some(super::codepage::decode(self.codepage(), bytes))
            }
            other => other.to_text(self.codepage()),
        }
    }

    /// Compressed RTF body, as stored.
    pub fn rtf_compressed(&self) -> Option<&[u8]> {
        self.properties.binary(tags::RTF_COMPRESSED)
    }

    pub fn message_class(&self) -> Option<String> {
        self.properties.text(tags::MESSAGE_CLASS)
    }

    pub fn sender_name(&self) -> Option<String> {
        self.properties
            .first_text(&[tags::SENDER_NAME, tags::SENT_REPRESENTING_NAME])
    }

    /// Sender address, preferring the SMTP form.
    pub fn sender_email(&self) -> Option<String> {
        self.properties
            .first_text(&[tags::SENDER_SMTP_ADDRESS, tags::SENDER_EMAIL_ADDRESS])
    }

    pub fn display_to(&self) -> Option<String> {
        self.properties.text(tags::DISPLAY_TO)
    }

    pub fn display_cc(&self) -> Option<String> {
        self.properties.text(tags::DISPLAY_CC)
    }

    pub fn display_bcc(&self) -> Option<String> {
        self.properties.text(tags::DISPLAY_BCC)
    }

    pub fn internet_message_id(&self) -> Option<String> {
        self.properties.text(tags::INTERNET_MESSAGE_ID)
    }

    /// Raw RFC 5322 headers, when the message came in over SMTP.
    pub fn transport_headers(&self) -> Option<String> {
        self.properties.text(tags::TRANSPORT_MESSAGE_HEADERS)
    }

    pub fn submit_time(&self) -> Option<DateTime<Utc>> {
        self.properties.time(tags::CLIENT_SUBMIT_TIME)
    }

    pub fn delivery_time(&self) -> Option<DateTime<Utc>> {
        self.properties.time(tags::MESSAGE_DELIVERY_TIME)
    }

    /// Hand this message's code page down to its recipients, attachments and
    /// embedded messages that do not declare one. `parent` is the code page
    /// of the message this one is embedded in.
    pub fn inherit_codepage(&mut self, parent: Option<u32>) {
        if let Some(codepage) = parent {
            self.properties.inherit_codepage(codepage);
        }
        let codepage = self.codepage();
        for recipient in &mut self.recipients {
            recipient.properties.inherit_codepage(codepage);
        }
        for attachment in &mut self.attachments {
            match attachment {
                Attachment::File(file) => file.properties.inherit_codepage(codepage),
                Attachment::Message(embedded) => {
                    embedded.properties.inherit_codepage(codepage);
                    embedded.message.inherit_codepage(Some(codepage));
                }
            }
        }
    }

    /// Visit every file attachment, descending into embedded messages
    /// depth-first. The callback receives the nesting depth (0 = this message).
    pub fn walk_attachments(&self, visit: &mut dyn FnMut(usize, &FileAttachment)) {
        self.walk_attachments_at(0, visit);
    }

    fn walk_attachments_at(&self, depth: usize, visit: &mut dyn FnMut(usize, &FileAttachment)) {
        for attachment in &self.attachments {
            match attachment {
                Attachment::File(file) => visit(depth, file),
                Attachment::Message(embedded) => {
                    embedded.message.walk_attachments_at(depth + 1, visit)
                }
            }
        }
    }
}

/// How a recipient was addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum RecipientType {
    To,
    Cc,
    Bcc,
    Other(i32),
}

impl RecipientType {
    pub fn from_code(code: i32) -> Self {
        // The high bit flags a resent recipient
        match code & 0x0FFF_FFFF {
            1 => Self::To,
            2 => Self::Cc,
            3 => Self::Bcc,
            _ => Self::Other(code),
        }
    }
}

impl std::fmt::Display for RecipientType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::To => write!(f, "To"),
            Self::Cc => write!(f, "Cc"),
            Self::Bcc => write!(f, "Bcc"),
            Self::Other(code) => write!(f, "type {code}"),
        }
    }
}

/// One recipient: a property mapping with no children.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Recipient {
    pub properties: Properties,
}

impl PropertySink for Recipient {
    fn set_property(&mut self, tag: PropertyTag, value: PropertyValue) {
        self.properties.set(tag, value);
    }
}

impl Recipient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn display_name(&self) -> Option<String> {
        self.properties.text(tags::DISPLAY_NAME)
    }

    /// Address, preferring the SMTP form over the native (e.g. X.500) one.
    pub fn email_address(&self) -> Option<String> {
        self.properties
            .first_text(&[tags::SMTP_ADDRESS, tags::EMAIL_ADDRESS])
    }

    /// Address type, e.g. `SMTP` or `EX`.
    pub fn address_type(&self) -> Option<String> {
        self.properties.text(tags::ADDRESS_TYPE)
    }

    pub fn recipient_type(&self) -> Option<RecipientType> {
        self.properties
            .int(tags::RECIPIENT_TYPE)
            .map(RecipientType::from_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attachment::MsgAttachment;
    use crate::model::property::{FileTime, PropertyType};

    fn unicode(id: u16, s: &str) -> (PropertyTag, PropertyValue) {
        (
            PropertyTag::new(id, PropertyType::Unicode),
            PropertyValue::Unicode(s.to_string()),
        )
    }

    #[test]
    fn test_message_accessors() {
        let mut msg = Message::new();
        for (tag, value) in [
            unicode(tags::SUBJECT, "Weekend plan"),
            unicode(tags::SENDER_NAME, "spoj"),
            unicode(tags::SENDER_EMAIL_ADDRESS, "/O=EXCHANGE/CN=SPOJ"),
            unicode(tags::SENDER_SMTP_ADDRESS, "spoj@example.com"),
        ] {
            msg.set_property(tag, value);
        }
        msg.set_property(
            PropertyTag::new(tags::CLIENT_SUBMIT_TIME, PropertyType::Time),
            PropertyValue::Time(FileTime(133_488_360_000_000_000)),
        );

        assert_eq!(msg.subject().as_deref(), Some("Weekend plan"));
        assert_eq!(msg.sender_name().as_deref(), Some("spoj"));
        assert_eq!(msg.sender_email().as_deref(), Some("spoj@example.com"));
        assert_eq!(
            msg.submit_time().map(|t| t.to_rfc3339()).as_deref(),
            Some("2024-01-04T10:00:00+00:00")
        );
        assert!(msg.body().is_none());
    }

    #[test]
    fn test_html_body_from_binary() {
        let mut msg = Message::new();
        msg.set_property(
            PropertyTag::new(tags::BODY_HTML, PropertyType::Binary),
            PropertyValue::Binary(b"<p>caf\xE9</p>".to_vec()),
        );
        assert_eq!(msg.html_body().as_deref(), Some("<p>café</p>"));
    }

    #[test]
    fn test_recipient_type_codes() {
        assert_eq!(RecipientType::from_code(1), RecipientType::To);
        assert_eq!(RecipientType::from_code(2), RecipientType::Cc);
        assert_eq!(RecipientType::from_code(0x1000_0003), RecipientType::Bcc);
        assert_eq!(RecipientType::from_code(9), RecipientType::Other(9));
    }

    #[test]
    fn test_recipient_accessors() {
        let mut r = Recipient::new();
        let (tag, value) = unicode(tags::DISPLAY_NAME, "john");
        r.set_property(tag, value);
        let (tag, value) = unicode(tags::EMAIL_ADDRESS, "john@example.com");
        r.set_property(tag, value);
        r.set_property(
            PropertyTag::new(tags::RECIPIENT_TYPE, PropertyType::Integer32),
            PropertyValue::Integer32(2),
        );
        assert_eq!(r.display_name().as_deref(), Some("john"));
        assert_eq!(r.email_address().as_deref(), Some("john@example.com"));
        assert_eq!(r.recipient_type(), Some(RecipientType::Cc));
    }

    #[test]
    fn test_inherit_codepage_reaches_nested_entities() {
        let cyrillic = vec![0xCF, 0xF0, 0xE8, 0xE2, 0xE5, 0xF2];
        let name = PropertyTag::new(tags::DISPLAY_NAME, PropertyType::String8);

        let mut recipient = Recipient::new();
        recipient.set_property(name, PropertyValue::String8(cyrillic.clone()));
        let mut nested = Message::new();
        nested.set_property(
            PropertyTag::new(tags::SUBJECT, PropertyType::String8),
            PropertyValue::String8(cyrillic.clone()),
        );

        let mut msg = Message::new();
        msg.set_property(
            PropertyTag::new(tags::MESSAGE_CODEPAGE, PropertyType::Integer32),
            PropertyValue::Integer32(1251),
        );
        msg.add_recipient(recipient);
        msg.add_attachment(Attachment::Message(MsgAttachment::new(nested)));
        msg.inherit_codepage(None);

        assert_eq!(msg.recipients[0].display_name().as_deref(), Some("Привет"));
        let Attachment::Message(embedded) = &msg.attachments[0] else {
            panic!("expected embedded message");
        };
        assert_eq!(embedded.message.codepage(), 1251);
        assert_eq!(embedded.message.subject().as_deref(), Some("Привет"));
    }

    #[test]
    fn test_walk_attachments_descends() {
        let mut inner = Message::new();
        inner.add_attachment(Attachment::File(FileAttachment::new()));
        let mut outer = Message::new();
        outer.add_attachment(Attachment::File(FileAttachment::new()));
        outer.add_attachment(Attachment::Message(MsgAttachment::new(inner)));

        let mut depths = Vec::new();
        outer.walk_attachments(&mut |depth, _| depths.push(depth));
        assert_eq!(depths, vec![0, 1]);
    }
}
