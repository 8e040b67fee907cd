//! MAPI property tags, types and values.
//!
//! A property is identified by a [`PropertyTag`]: a 16-bit property id
//! (what the field means) plus a 16-bit [`PropertyType`] (how it is encoded).
//! Values are held in the strongly-typed [`PropertyValue`] union.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use tracing::debug;

use super::codepage;

/// Wire encoding kind of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PropertyType {
    Unspecified,
    Null,
    Integer16,
    Integer32,
    Floating32,
    Floating64,
    Currency,
    FloatingTime,
    ErrorCode,
    Boolean,
    Object,
    Integer64,
    String8,
    Unicode,
    Time,
    Guid,
    ServerId,
    Restriction,
    RuleAction,
    Binary,
    MultiInteger16,
    MultiInteger32,
    MultiFloating32,
    MultiFloating64,
    MultiCurrency,
    MultiFloatingTime,
    MultiInteger64,
    MultiString8,
    MultiUnicode,
    MultiTime,
    MultiGuid,
    MultiBinary,
    /// A type code this decoder does not understand.
    Unknown(u16),
}

impl PropertyType {
    /// Map a raw 16-bit type code.
    pub fn from_code(code: u16) -> Self {
        match code {
            0x0000 => Self::Unspecified,
            0x0001 => Self::Null,
            0x0002 => Self::Integer16,
            0x0003 => Self::Integer32,
            0x0004 => Self::Floating32,
            0x0005 => Self::Floating64,
            0x0006 => Self::Currency,
            0x0007 => Self::FloatingTime,
            0x000A => Self::ErrorCode,
            0x000B => Self::Boolean,
            0x000D => Self::Object,
            0x0014 => Self::Integer64,
            0x001E => Self::String8,
            0x001F => Self::Unicode,
            0x0040 => Self::Time,
            0x0048 => Self::Guid,
            0x00FB => Self::ServerId,
            0x00FD => Self::Restriction,
            0x00FE => Self::RuleAction,
            0x0102 => Self::Binary,
            0x1002 => Self::MultiInteger16,
            0x1003 => Self::MultiInteger32,
            0x1004 => Self::MultiFloating32,
            0x1005 => Self::MultiFloating64,
            0x1006 => Self::MultiCurrency,
            0x1007 => Self::MultiFloatingTime,
            0x1014 => Self::MultiInteger64,
            0x101E => Self::MultiString8,
            0x101F => Self::MultiUnicode,
            0x1040 => Self::MultiTime,
            0x1048 => Self::MultiGuid,
            0x1102 => Self::MultiBinary,
            other => Self::Unknown(other),
        }
    }

    /// The raw 16-bit type code.
    pub fn code(self) -> u16 {
        match self {
            Self::Unspecified => 0x0000,
            Self::Null => 0x0001,
            Self::Integer16 => 0x0002,
            Self::Integer32 => 0x0003,
            Self::Floating32 => 0x0004,
            Self::Floating64 => 0x0005,
            Self::Currency => 0x0006,
            Self::FloatingTime => 0x0007,
            Self::ErrorCode => 0x000A,
            Self::Boolean => 0x000B,
            Self::Object => 0x000D,
            Self::Integer64 => 0x0014,
            Self::String8 => 0x001E,
            Self::Unicode => 0x001F,
            Self::Time => 0x0040,
            Self::Guid => 0x0048,
            Self::ServerId => 0x00FB,
            Self::Restriction => 0x00FD,
            Self::RuleAction => 0x00FE,
            Self::Binary => 0x0102,
            Self::MultiInteger16 => 0x1002,
            Self::MultiInteger32 => 0x1003,
            Self::MultiFloating32 => 0x1004,
            Self::MultiFloating64 => 0x1005,
            Self::MultiCurrency => 0x1006,
            Self::MultiFloatingTime => 0x1007,
            Self::MultiInteger64 => 0x1014,
            Self::MultiString8 => 0x101E,
            Self::MultiUnicode => 0x101F,
            Self::MultiTime => 0x1040,
            Self::MultiGuid => 0x1048,
            Self::MultiBinary => 0x1102,
            Self::Unknown(code) => code,
        }
    }

    /// Whether the value lives in an auxiliary stream rather than the 8-byte slot.
    pub fn is_variable_size(self) -> bool {
        matches!(
            self,
            Self::String8
                | Self::Unicode
                | Self::Binary
                | Self::Guid
                | Self::ServerId
                | Self::MultiInteger16
                | Self::MultiInteger32
                | Self::MultiFloating32
                | Self::MultiFloating64
                | Self::MultiCurrency
                | Self::MultiFloatingTime
                | Self::MultiInteger64
                | Self::MultiString8
                | Self::MultiUnicode
                | Self::MultiTime
                | Self::MultiGuid
                | Self::MultiBinary
        )
    }

    /// Whether this is one of the multi-value kinds.
    pub fn is_multi_value(self) -> bool {
        self.code() & 0x1000 != 0 && !matches!(self, Self::Unknown(_))
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(code) => write!(f, "Unknown(0x{code:04X})"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Identifies one property: `(id, type)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PropertyTag {
    pub id: u16,
    pub ty: PropertyType,
}

impl PropertyTag {
    pub fn new(id: u16, ty: PropertyType) -> Self {
        Self { id, ty }
    }

    /// Split a raw 32-bit tag: high word is the id, low word the type.
    pub fn from_raw(raw: u32) -> Self {
        Self {
            id: (raw >> 16) as u16,
            ty: PropertyType::from_code((raw & 0xFFFF) as u16),
        }
    }

    pub fn to_raw(self) -> u32 {
        (u32::from(self.id) << 16) | u32::from(self.ty.code())
    }
}

impl fmt::Display for PropertyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.to_raw())
    }
}

impl serde::Serialize for PropertyTag {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A Windows `FILETIME`: 100-nanosecond ticks since 1601-01-01 UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub struct FileTime(pub u64);

/// Seconds between 1601-01-01 and 1970-01-01.
const FILETIME_UNIX_OFFSET_SECS: i64 = 11_644_473_600;

impl FileTime {
    /// Convert to a UTC timestamp. Returns `None` for values chrono cannot represent.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        let secs = (self.0 / 10_000_000) as i64 - FILETIME_UNIX_OFFSET_SECS;
        let nanos = ((self.0 % 10_000_000) * 100) as u32;
        Utc.timestamp_opt(secs, nanos).single()
    }
}

/// A decoded property value.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "type", content = "value")]
pub enum PropertyValue {
    Null,
    Integer16(i16),
    Integer32(i32),
    Floating32(f32),
    Floating64(f64),
    Currency(i64),
    FloatingTime(f64),
    ErrorCode(u32),
    Boolean(bool),
    Integer64(i64),
    Time(FileTime),
    Guid([u8; 16]),
    /// 8-bit string in the message code page, terminator stripped.
    String8(Vec<u8>),
    Unicode(String),
    Binary(Vec<u8>),
    /// Embedded object; the payload is a separate directory, not read here.
    Object {
        size: u32,
    },
    MultiInteger16(Vec<i16>),
    MultiInteger32(Vec<i32>),
    MultiFloating32(Vec<f32>),
    MultiFloating64(Vec<f64>),
    MultiCurrency(Vec<i64>),
    MultiFloatingTime(Vec<f64>),
    MultiInteger64(Vec<i64>),
    MultiTime(Vec<FileTime>),
    MultiGuid(Vec<[u8; 16]>),
    MultiString8(Vec<Vec<u8>>),
    MultiUnicode(Vec<String>),
    MultiBinary(Vec<Vec<u8>>),
    /// Type code without a decoded form (unrecognised, restriction or rule
    /// action); the raw 8-byte value slot is kept.
    Unknown {
        code: u16,
        raw: [u8; 8],
    },
}

impl PropertyValue {
    /// Empty value of a variable-size kind, used when a backing stream is missing
    /// and the parser is configured to degrade instead of failing.
    pub fn empty_of(ty: PropertyType) -> Self {
        match ty {
            PropertyType::String8 => Self::String8(Vec::new()),
            PropertyType::Unicode => Self::Unicode(String::new()),
            PropertyType::Guid => Self::Guid([0; 16]),
            PropertyType::MultiInteger16 => Self::MultiInteger16(Vec::new()),
            PropertyType::MultiInteger32 => Self::MultiInteger32(Vec::new()),
            PropertyType::MultiFloating32 => Self::MultiFloating32(Vec::new()),
            PropertyType::MultiFloating64 => Self::MultiFloating64(Vec::new()),
            PropertyType::MultiCurrency => Self::MultiCurrency(Vec::new()),
            PropertyType::MultiFloatingTime => Self::MultiFloatingTime(Vec::new()),
            PropertyType::MultiInteger64 => Self::MultiInteger64(Vec::new()),
            PropertyType::MultiTime => Self::MultiTime(Vec::new()),
            PropertyType::MultiGuid => Self::MultiGuid(Vec::new()),
            PropertyType::MultiString8 => Self::MultiString8(Vec::new()),
            PropertyType::MultiUnicode => Self::MultiUnicode(Vec::new()),
            PropertyType::MultiBinary => Self::MultiBinary(Vec::new()),
            _ => Self::Binary(Vec::new()),
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Integer16(v) => Some(i32::from(*v)),
            Self::Integer32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Binary(v) | Self::String8(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Time(t) => t.to_datetime(),
            _ => None,
        }
    }

    /// Decode a string value. 8-bit strings go through `codepage`.
    pub fn to_text(&self, codepage: u32) -> Option<String> {
        match self {
            Self::Unicode(s) => Some(s.clone()),
            Self::String8(bytes) => Some(codepage::decode(codepage, bytes)),
            _ => None,
        }
    }

    /// Short single-line rendering for terminal output.
    pub fn summary(&self, codepage: u32) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Integer16(v) => v.to_string(),
            Self::Integer32(v) => v.to_string(),
            Self::Floating32(v) => v.to_string(),
            Self::Floating64(v) | Self::FloatingTime(v) => v.to_string(),
            Self::Currency(v) => {
                let sign = if *v < 0 { "-" } else { "" };
                let abs = v.unsigned_abs();
                format!("{sign}{}.{:04}", abs / 10_000, abs % 10_000)
            }
            Self::ErrorCode(v) => format!("error 0x{v:08X}"),
            Self::Boolean(v) => v.to_string(),
            Self::Integer64(v) => v.to_string(),
            Self::Time(t) => match t.to_datetime() {
                Some(dt) => dt.to_rfc3339(),
                None => format!("filetime {}", t.0),
            },
            Self::Guid(g) => format_guid(g),
            Self::String8(_) | Self::Unicode(_) => {
                self.to_text(codepage).unwrap_or_default().replace(['\r', '\n'], " ")
            }
            Self::Binary(b) => format!("<{} bytes> {}", b.len(), hex_prefix(b, 16)),
            Self::Object { size } => format!("<object, {size} bytes>"),
            Self::MultiInteger16(v) => format!("{v:?}"),
            Self::MultiInteger32(v) => format!("{v:?}"),
            Self::MultiFloating32(v) => format!("{v:?}"),
            Self::MultiFloating64(v) | Self::MultiFloatingTime(v) => format!("{v:?}"),
            Self::MultiCurrency(v) | Self::MultiInteger64(v) => format!("{v:?}"),
            Self::MultiTime(v) => {
                let items: Vec<String> = v
                    .iter()
                    .map(|t| t.to_datetime().map(|d| d.to_rfc3339()).unwrap_or_default())
                    .collect();
                format!("{items:?}")
            }
            Self::MultiGuid(v) => {
                let items: Vec<String> = v.iter().map(format_guid).collect();
                format!("{items:?}")
            }
            Self::MultiString8(v) => {
                let items: Vec<String> = v.iter().map(|b| codepage::decode(codepage, b)).collect();
                format!("{items:?}")
            }
            Self::MultiUnicode(v) => format!("{v:?}"),
            Self::MultiBinary(v) => format!("<{} binary values>", v.len()),
            Self::Unknown { code, raw } => format!("<type 0x{code:04X}> {}", hex_prefix(raw, 8)),
        }
    }
}

/// Format a little-endian GUID in registry form.
fn format_guid(g: &[u8; 16]) -> String {
    format!(
        "{{{:02X}{:02X}{:02X}{:02X}-{:02X}{:02X}-{:02X}{:02X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}}}",
        g[3], g[2], g[1], g[0], g[5], g[4], g[7], g[6], g[8], g[9], g[10], g[11], g[12], g[13],
        g[14], g[15]
    )
}

fn hex_prefix(bytes: &[u8], max: usize) -> String {
    let mut out: String = bytes
        .iter()
        .take(max)
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ");
    if bytes.len() > max {
        out.push_str(" …");
    }
    out
}

/// Destination of decoded properties.
pub trait PropertySink {
    /// Store `value` under `tag`, replacing any earlier value for the same tag.
    fn set_property(&mut self, tag: PropertyTag, value: PropertyValue);
}

/// Property mapping of one entity. Tags are unique; a later `set` for the
/// same tag replaces the earlier value.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct Properties {
    map: BTreeMap<PropertyTag, PropertyValue>,
    /// Code page of the owning message, for entities that carry none.
    #[serde(skip)]
    inherited_codepage: Option<u32>,
}

impl PropertySink for Properties {
    fn set_property(&mut self, tag: PropertyTag, value: PropertyValue) {
        self.set(tag, value);
    }
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite (last write wins).
    pub fn set(&mut self, tag: PropertyTag, value: PropertyValue) {
        if let Some(previous) = self.map.insert(tag, value) {
            debug!(tag = %tag, previous = ?previous, "Duplicate property tag, overwriting");
        }
    }

    pub fn get(&self, tag: PropertyTag) -> Option<&PropertyValue> {
        self.map.get(&tag)
    }

    /// First value with the given property id, whatever its type.
    pub fn get_by_id(&self, id: u16) -> Option<&PropertyValue> {
        self.map
            .iter()
            .find(|(tag, _)| tag.id == id)
            .map(|(_, value)| value)
    }

    pub fn contains_id(&self, id: u16) -> bool {
        self.get_by_id(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PropertyTag, &PropertyValue)> {
        self.map.iter()
    }

    /// Code page for 8-bit strings: `PR_MESSAGE_CODEPAGE`, then `PR_INTERNET_CPID`,
    /// then the inherited code page, then Windows-1252.
    pub fn codepage(&self) -> u32 {
        [tags::MESSAGE_CODEPAGE, tags::INTERNET_CPID]
            .iter()
            .filter_map(|id| self.get_by_id(*id).and_then(PropertyValue::as_i32))
            .find(|cp| *cp > 0)
            .map(|cp| cp as u32)
            .or(self.inherited_codepage)
            .unwrap_or(codepage::DEFAULT_CODEPAGE)
    }

    /// Fall back to `codepage` when this entity declares none of its own.
    /// Recipients and attachments take their owning message's.
    pub fn inherit_codepage(&mut self, codepage: u32) {
        self.inherited_codepage = Some(codepage);
    }

    /// String value of `id`, decoding 8-bit strings with [`Properties::codepage`].
    pub fn text(&self, id: u16) -> Option<String> {
        let codepage = self.codepage();
        self.get_by_id(id).and_then(|v| v.to_text(codepage))
    }

    /// First non-empty string among `ids`.
    pub fn first_text(&self, ids: &[u16]) -> Option<String> {
        ids.iter()
            .filter_map(|id| self.text(*id))
            .find(|s| !s.is_empty())
    }

    pub fn binary(&self, id: u16) -> Option<&[u8]> {
        match self.get_by_id(id)? {
            PropertyValue::Binary(b) => Some(b),
            _ => None,
        }
    }

    pub fn int(&self, id: u16) -> Option<i32> {
        self.get_by_id(id).and_then(PropertyValue::as_i32)
    }

    pub fn time(&self, id: u16) -> Option<DateTime<Utc>> {
        self.get_by_id(id).and_then(PropertyValue::as_time)
    }
}

/// Well-known property ids.
pub mod tags {
    pub const MESSAGE_CLASS: u16 = 0x001A;
    pub const SUBJECT: u16 = 0x0037;
    pub const CLIENT_SUBMIT_TIME: u16 = 0x0039;
    pub const SENT_REPRESENTING_NAME: u16 = 0x0042;
    pub const TRANSPORT_MESSAGE_HEADERS: u16 = 0x007D;
    pub const RECIPIENT_TYPE: u16 = 0x0C15;
    pub const SENDER_NAME: u16 = 0x0C1A;
    pub const SENDER_EMAIL_ADDRESS: u16 = 0x0C1F;
    pub const DISPLAY_BCC: u16 = 0x0E02;
    pub const DISPLAY_CC: u16 = 0x0E03;
    pub const DISPLAY_TO: u16 = 0x0E04;
    pub const MESSAGE_DELIVERY_TIME: u16 = 0x0E06;
    pub const ATTACH_SIZE: u16 = 0x0E20;
    pub const BODY: u16 = 0x1000;
    pub const RTF_COMPRESSED: u16 = 0x1009;
    pub const BODY_HTML: u16 = 0x1013;
    pub const INTERNET_MESSAGE_ID: u16 = 0x1035;
    pub const DISPLAY_NAME: u16 = 0x3001;
    pub const ADDRESS_TYPE: u16 = 0x3002;
    pub const EMAIL_ADDRESS: u16 = 0x3003;
    pub const ATTACH_DATA: u16 = 0x3701;
    pub const ATTACH_EXTENSION: u16 = 0x3703;
    pub const ATTACH_FILENAME: u16 = 0x3704;
    pub const ATTACH_METHOD: u16 = 0x3705;
    pub const ATTACH_LONG_FILENAME: u16 = 0x3707;
    pub const ATTACH_MIME_TAG: u16 = 0x370E;
    pub const ATTACH_CONTENT_ID: u16 = 0x3712;
    pub const SMTP_ADDRESS: u16 = 0x39FE;
    pub const INTERNET_CPID: u16 = 0x3FDE;
    pub const MESSAGE_CODEPAGE: u16 = 0x3FFD;
    pub const SENDER_SMTP_ADDRESS: u16 = 0x5D01;
}
