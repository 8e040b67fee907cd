//! Entry names used inside a `.msg` container.
//!
//! Every storage and stream name the parser looks up is produced here, so
//! the index width and hex casing live in one place.

use crate::model::property::{tags, PropertyTag, PropertyType};

/// The property stream present in every message, recipient and attachment directory.
pub const PROPERTIES_STREAM: &str = "__properties_version1.0";

const RECIPIENT_PREFIX: &str = "__recip_version1.0_#";
const ATTACHMENT_PREFIX: &str = "__attach_version1.0_#";
const SUBSTG_PREFIX: &str = "__substg1.0_";

/// `prefix` followed by `index` as 8 upper-case hex digits.
pub fn indexed(prefix: &str, index: u32) -> String {
    format!("{prefix}{index:08X}")
}

/// Directory holding recipient `index`.
pub fn recipient_dir(index: u32) -> String {
    indexed(RECIPIENT_PREFIX, index)
}

/// Directory holding attachment `index`.
pub fn attachment_dir(index: u32) -> String {
    indexed(ATTACHMENT_PREFIX, index)
}

/// Auxiliary stream holding the payload of a variable-size property.
pub fn value_stream(tag: PropertyTag) -> String {
    format!("{SUBSTG_PREFIX}{:04X}{:04X}", tag.id, tag.ty.code())
}

/// Stream holding element `index` of a variable-size multi-value property.
pub fn multi_value_element(tag: PropertyTag, index: u32) -> String {
    format!("{}-{index:08X}", value_stream(tag))
}

/// Marker whose presence in an attachment directory means the attachment
/// is an embedded message (`PR_ATTACH_DATA_OBJ` as an object).
pub fn embedded_message_marker() -> String {
    value_stream(PropertyTag::new(tags::ATTACH_DATA, PropertyType::Object))
}
