//! Builds `.msg` containers in memory for tests and benchmarks.
#![allow(dead_code)]

use std::io::{Cursor, Write};

use cfb::{CompoundFile, Version};

use msgshell::model::property::{PropertyTag, PropertyType};

const RECORD_FLAGS: [u8; 4] = [0x06, 0, 0, 0];

/// Property records of one directory plus the auxiliary streams they reference.
#[derive(Debug, Clone, Default)]
pub struct Props {
    records: Vec<u8>,
    streams: Vec<(String, Vec<u8>)>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw 16-byte record.
    pub fn record(mut self, tag: PropertyTag, slot: [u8; 8]) -> Self {
        self.records.extend_from_slice(&tag.to_raw().to_le_bytes());
        self.records.extend_from_slice(&RECORD_FLAGS);
        self.records.extend_from_slice(&slot);
        self
    }

    /// Add an auxiliary stream to the directory without a record.
    pub fn stream(mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.streams.push((name.into(), data.into()));
        self
    }

    pub fn int32(self, id: u16, value: i32) -> Self {
        let mut slot = [0u8; 8];
        slot[..4].copy_from_slice(&value.to_le_bytes());
        self.record(PropertyTag::new(id, PropertyType::Integer32), slot)
    }

    pub fn boolean(self, id: u16, value: bool) -> Self {
        let mut slot = [0u8; 8];
        slot[0] = u8::from(value);
        self.record(PropertyTag::new(id, PropertyType::Boolean), slot)
    }

    pub fn time(self, id: u16, filetime: u64) -> Self {
        self.record(
            PropertyTag::new(id, PropertyType::Time),
            filetime.to_le_bytes(),
        )
    }

    /// A variable-size property whose payload is `data`.
    pub fn variable(self, id: u16, ty: PropertyType, data: &[u8]) -> Self {
        let tag = PropertyTag::new(id, ty);
        self.record(tag, size_slot(data.len()))
            .stream(substg(tag), data.to_vec())
    }

    pub fn unicode(self, id: u16, text: &str) -> Self {
        self.variable(id, PropertyType::Unicode, &utf16z(text))
    }

    pub fn string8(self, id: u16, bytes: &[u8]) -> Self {
        let mut data = bytes.to_vec();
        data.push(0);
        self.variable(id, PropertyType::String8, &data)
    }

    pub fn binary(self, id: u16, data: &[u8]) -> Self {
        self.variable(id, PropertyType::Binary, data)
    }

    pub fn multi_int32(self, id: u16, values: &[i32]) -> Self {
        let data: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.variable(id, PropertyType::MultiInteger32, &data)
    }

    pub fn multi_unicode(self, id: u16, values: &[&str]) -> Self {
        let elements: Vec<Vec<u8>> = values.iter().map(|v| utf16z(v)).collect();
        self.multi_variable(id, PropertyType::MultiUnicode, &elements, 4)
    }

    pub fn multi_binary(self, id: u16, values: &[&[u8]]) -> Self {
        let elements: Vec<Vec<u8>> = values.iter().map(|v| v.to_vec()).collect();
        self.multi_variable(id, PropertyType::MultiBinary, &elements, 8)
    }

    /// Length table with `stride`-byte entries plus one stream per element.
    fn multi_variable(
        mut self,
        id: u16,
        ty: PropertyType,
        elements: &[Vec<u8>],
        stride: usize,
    ) -> Self {
        let tag = PropertyTag::new(id, ty);
        let mut table = Vec::new();
        for element in elements {
            let mut entry = vec![0u8; stride];
            entry[..4].copy_from_slice(&(element.len() as u32).to_le_bytes());
            table.extend(entry);
        }
        for (index, element) in elements.iter().enumerate() {
            self.streams
                .push((format!("{}-{index:08X}", substg(tag)), element.clone()));
        }
        self.variable(id, ty, &table)
    }

    /// Record of a variable-size property with no backing stream.
    pub fn dangling(self, id: u16, ty: PropertyType, size: usize) -> Self {
        self.record(PropertyTag::new(id, ty), size_slot(size))
    }

    pub fn records(&self) -> &[u8] {
        &self.records
    }
}

/// A message directory: its properties, recipients and attachments.
#[derive(Debug, Clone, Default)]
pub struct MessageFixture {
    pub props: Props,
    pub recipients: Vec<Props>,
    pub attachments: Vec<AttachmentFixture>,
    /// Header counts to write instead of the real ones.
    pub counts_override: Option<(u32, u32)>,
}

#[derive(Debug, Clone)]
pub enum AttachmentFixture {
    File(Props),
    /// Attachment directory properties plus the message stored under the marker.
    Embedded(Props, Box<MessageFixture>),
}

impl MessageFixture {
    pub fn new(props: Props) -> Self {
        Self {
            props,
            ..Self::default()
        }
    }

    pub fn recipient(mut self, props: Props) -> Self {
        self.recipients.push(props);
        self
    }

    pub fn file(mut self, props: Props) -> Self {
        self.attachments.push(AttachmentFixture::File(props));
        self
    }

    pub fn embedded(mut self, props: Props, message: MessageFixture) -> Self {
        self.attachments
            .push(AttachmentFixture::Embedded(props, Box::new(message)));
        self
    }

    pub fn counts(mut self, recipients: u32, attachments: u32) -> Self {
        self.counts_override = Some((recipients, attachments));
        self
    }

    /// Serialize to a complete compound file.
    pub fn build(&self) -> Vec<u8> {
        self.build_version(Version::V3)
    }

    pub fn build_version(&self, version: Version) -> Vec<u8> {
        let mut cfb = CompoundFile::create_with_version(version, Cursor::new(Vec::new()))
            .expect("create cfb");
        write_message(&mut cfb, "", self, true);
        finish(cfb)
    }
}

/// Header of a message property stream.
pub fn message_header(recipients: u32, attachments: u32, is_root: bool) -> Vec<u8> {
    let mut header = vec![0u8; 8];
    for n in [recipients, attachments, recipients, attachments] {
        header.extend_from_slice(&n.to_le_bytes());
    }
    if is_root {
        header.extend_from_slice(&[0u8; 8]);
    }
    header
}

/// Compound file holding exactly the given streams; storages on their paths
/// are created as needed.
pub fn build_raw(streams: &[(&str, &[u8])]) -> Vec<u8> {
    let mut cfb = CompoundFile::create(Cursor::new(Vec::new())).expect("create cfb");
    for (path, data) in streams {
        let mut parent = String::new();
        let parts: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        for storage in &parts[..parts.len() - 1] {
            parent = format!("{parent}/{storage}");
            if !cfb.exists(&parent) {
                cfb.create_storage(&parent).expect("create storage");
            }
        }
        write_stream(&mut cfb, path, data);
    }
    finish(cfb)
}

/// Overwrite the declared stream size of the first directory entry named
/// `name`.
pub fn patch_stream_len(bytes: &mut [u8], name: &str, len: u64) {
    // Entry layout: UTF-16LE name [64], ..., stream size u64 at offset 120.
    let needle: Vec<u8> = name
        .encode_utf16()
        .chain(std::iter::once(0))
        .flat_map(u16::to_le_bytes)
        .collect();
    let start = bytes
        .windows(needle.len())
        .position(|w| w == needle.as_slice())
        .expect("directory entry");
    bytes[start + 120..start + 128].copy_from_slice(&len.to_le_bytes());
}

fn write_message(
    cfb: &mut CompoundFile<Cursor<Vec<u8>>>,
    dir: &str,
    fixture: &MessageFixture,
    is_root: bool,
) {
    let (recipients, attachments) = fixture.counts_override.unwrap_or((
        fixture.recipients.len() as u32,
        fixture.attachments.len() as u32,
    ));
    let mut stream = message_header(recipients, attachments, is_root);
    stream.extend_from_slice(fixture.props.records());
    write_stream(cfb, &format!("{dir}/__properties_version1.0"), &stream);
    write_aux(cfb, dir, &fixture.props);

    for (index, props) in fixture.recipients.iter().enumerate() {
        let path = format!("{dir}/__recip_version1.0_#{index:08X}");
        cfb.create_storage(&path).expect("create recipient");
        write_entity(cfb, &path, props);
    }

    for (index, attachment) in fixture.attachments.iter().enumerate() {
        let path = format!("{dir}/__attach_version1.0_#{index:08X}");
        cfb.create_storage(&path).expect("create attachment");
        match attachment {
            AttachmentFixture::File(props) => write_entity(cfb, &path, props),
            AttachmentFixture::Embedded(props, message) => {
                write_entity(cfb, &path, props);
                let nested = format!("{path}/__substg1.0_3701000D");
                cfb.create_storage(&nested).expect("create embedded");
                write_message(cfb, &nested, message, false);
            }
        }
    }
}

fn write_entity(cfb: &mut CompoundFile<Cursor<Vec<u8>>>, dir: &str, props: &Props) {
    let mut stream = vec![0u8; 8];
    stream.extend_from_slice(props.records());
    write_stream(cfb, &format!("{dir}/__properties_version1.0"), &stream);
    write_aux(cfb, dir, props);
}

fn write_aux(cfb: &mut CompoundFile<Cursor<Vec<u8>>>, dir: &str, props: &Props) {
    for (name, data) in &props.streams {
        write_stream(cfb, &format!("{dir}/{name}"), data);
    }
}

fn write_stream(cfb: &mut CompoundFile<Cursor<Vec<u8>>>, path: &str, data: &[u8]) {
    let mut stream = cfb.create_stream(path).expect("create stream");
    stream.write_all(data).expect("write stream");
    stream.flush().expect("flush stream");
}

fn finish(mut cfb: CompoundFile<Cursor<Vec<u8>>>) -> Vec<u8> {
    cfb.flush().expect("flush cfb");
    cfb.into_inner().into_inner()
}

fn substg(tag: PropertyTag) -> String {
    format!("__substg1.0_{:04X}{:04X}", tag.id, tag.ty.code())
}

fn size_slot(len: usize) -> [u8; 8] {
    let mut slot = [0u8; 8];
    slot[..4].copy_from_slice(&(len as u32).to_le_bytes());
    slot
}

fn utf16z(text: &str) -> Vec<u8> {
    text.encode_utf16()
        .chain(std::iter::once(0))
        .flat_map(u16::to_le_bytes)
        .collect()
}
