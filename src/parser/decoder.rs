//! Decoding of single property records.
//!
//! Each record is 16 bytes: a 4-byte tag, 4 bytes of flags and an 8-byte
//! value slot. Fixed-size values sit in the slot. Variable-size values
//! store their length in the slot and their payload in a `__substg1.0_*`
//! stream of the same directory.

use byteorder::{ByteOrder, LittleEndian};
use tracing::{debug, trace, warn};

use super::naming;
use super::{MissingStreamPolicy, ParseOptions};
use crate::container::{ByteStream, Container, Directory};
use crate::error::{MsgError, Result};
use crate::model::property::{FileTime, PropertyTag, PropertyType, PropertyValue};

/// Size of one property record.
pub const RECORD_SIZE: usize = 16;

/// Decodes records against one directory.
pub struct PropertyDecoder<'a, C: Container + ?Sized> {
    container: &'a mut C,
    directory: &'a Directory,
    options: &'a ParseOptions,
}

impl<'a, C: Container + ?Sized> PropertyDecoder<'a, C> {
    pub fn new(container: &'a mut C, directory: &'a Directory, options: &'a ParseOptions) -> Self {
        Self {
            container,
            directory,
            options,
        }
    }

    /// Decode the record at the cursor of `stream`.
    pub fn decode(&mut self, stream: &mut ByteStream) -> Result<(PropertyTag, PropertyValue)> {
        let remaining = stream.remaining();
        if remaining < RECORD_SIZE {
            return Err(MsgError::TruncatedRecord {
                stream: stream.name().to_string(),
                offset: stream.position(),
                remaining,
            });
        }

        let tag = PropertyTag::from_raw(stream.read_u32()?);
        let _flags = stream.read_u32()?;
        let slot: [u8; 8] = stream.read_array()?;

        let value = if tag.ty.is_variable_size() {
            let size = LittleEndian::read_u32(&slot[..4]);
            self.read_variable(tag, size)?
        } else {
            decode_fixed(tag, &slot)
        };
        trace!(tag = %tag, "Decoded property");
        Ok((tag, value))
    }

    fn read_variable(&mut self, tag: PropertyTag, size: u32) -> Result<PropertyValue> {
        let Some(data) = self.read_aux(&naming::value_stream(tag))? else {
            return Ok(PropertyValue::empty_of(tag.ty));
        };

        let value = match tag.ty {
            PropertyType::String8 => PropertyValue::String8(trim_string8(declared(&data, size))),
            PropertyType::Unicode => PropertyValue::Unicode(decode_utf16(declared(&data, size))),
            PropertyType::Binary | PropertyType::ServerId => {
                PropertyValue::Binary(declared(&data, size).to_vec())
            }
            PropertyType::Guid => PropertyValue::Guid(guid_at(tag, &data, 0)?),
            PropertyType::MultiInteger16 => PropertyValue::MultiInteger16(
                chunks(tag, &data, 2)?.map(LittleEndian::read_i16).collect(),
            ),
            PropertyType::MultiInteger32 => PropertyValue::MultiInteger32(
                chunks(tag, &data, 4)?.map(LittleEndian::read_i32).collect(),
            ),
            PropertyType::MultiFloating32 => PropertyValue::MultiFloating32(
                chunks(tag, &data, 4)?.map(LittleEndian::read_f32).collect(),
            ),
            PropertyType::MultiFloating64 => PropertyValue::MultiFloating64(
                chunks(tag, &data, 8)?.map(LittleEndian::read_f64).collect(),
            ),
            PropertyType::MultiCurrency => PropertyValue::MultiCurrency(
                chunks(tag, &data, 8)?.map(LittleEndian::read_i64).collect(),
            ),
            PropertyType::MultiFloatingTime => PropertyValue::MultiFloatingTime(
                chunks(tag, &data, 8)?.map(LittleEndian::read_f64).collect(),
            ),
            PropertyType::MultiInteger64 => PropertyValue::MultiInteger64(
                chunks(tag, &data, 8)?.map(LittleEndian::read_i64).collect(),
            ),
            PropertyType::MultiTime => PropertyValue::MultiTime(
                chunks(tag, &data, 8)?
                    .map(|c| FileTime(LittleEndian::read_u64(c)))
                    .collect(),
            ),
            PropertyType::MultiGuid => {
                let count = chunks(tag, &data, 16)?.len();
                let mut guids = Vec::with_capacity(count);
                for i in 0..count {
                    guids.push(guid_at(tag, &data, i * 16)?);
                }
                PropertyValue::MultiGuid(guids)
            }
            PropertyType::MultiString8 => PropertyValue::MultiString8(
                self.read_elements(tag, &data, 4)?
                    .into_iter()
                    .map(|e| trim_string8(&e))
                    .collect(),
            ),
            PropertyType::MultiUnicode => PropertyValue::MultiUnicode(
                self.read_elements(tag, &data, 4)?
                    .into_iter()
                    .map(|e| decode_utf16(&e))
                    .collect(),
            ),
            PropertyType::MultiBinary => {
                PropertyValue::MultiBinary(self.read_elements(tag, &data, 8)?)
            }
            _ => PropertyValue::Binary(data),
        };
        Ok(value)
    }

    /// Read the per-element streams of a variable-size multi-value property.
    ///
    /// `lengths` is the length table stream; each entry is `stride` bytes and
    /// starts with the element's 32-bit length.
    fn read_elements(
        &mut self,
        tag: PropertyTag,
        lengths: &[u8],
        stride: usize,
    ) -> Result<Vec<Vec<u8>>> {
        let table: Vec<u32> = chunks(tag, lengths, stride)?
            .map(|entry| LittleEndian::read_u32(&entry[..4]))
            .collect();
        let mut elements = Vec::with_capacity(table.len());
        for (index, len) in table.into_iter().enumerate() {
            let name = naming::multi_value_element(tag, index as u32);
            let data = self.read_aux(&name)?.unwrap_or_default();
            elements.push(declared(&data, len).to_vec());
        }
        Ok(elements)
    }

    /// Read an auxiliary stream. `Ok(None)` only when the stream is absent
    /// and the policy allows degrading to an empty value.
    fn read_aux(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        if !self.directory.has_entry(&*self.container, name) {
            return match self.options.missing_streams {
                MissingStreamPolicy::Fail => Err(MsgError::MissingAuxiliaryStream {
                    directory: self.directory.to_string(),
                    name: name.to_string(),
                }),
                MissingStreamPolicy::Empty => {
                    warn!(
                        directory = %self.directory,
                        name,
                        "Auxiliary stream missing, using empty value"
                    );
                    Ok(None)
                }
            };
        }
        let stream = self.directory.open_stream(&mut *self.container, name)?;
        Ok(Some(stream.into_bytes()))
    }
}

/// Interpret the 8-byte slot of a fixed-size property.
fn decode_fixed(tag: PropertyTag, slot: &[u8; 8]) -> PropertyValue {
    match tag.ty {
        PropertyType::Null | PropertyType::Unspecified => PropertyValue::Null,
        PropertyType::Integer16 => PropertyValue::Integer16(LittleEndian::read_i16(slot)),
        PropertyType::Integer32 => PropertyValue::Integer32(LittleEndian::read_i32(slot)),
        PropertyType::Floating32 => PropertyValue::Floating32(LittleEndian::read_f32(slot)),
        PropertyType::Floating64 => PropertyValue::Floating64(LittleEndian::read_f64(slot)),
        PropertyType::Currency => PropertyValue::Currency(LittleEndian::read_i64(slot)),
        PropertyType::FloatingTime => PropertyValue::FloatingTime(LittleEndian::read_f64(slot)),
        PropertyType::ErrorCode => PropertyValue::ErrorCode(LittleEndian::read_u32(slot)),
        PropertyType::Boolean => PropertyValue::Boolean(LittleEndian::read_u16(slot) != 0),
        PropertyType::Integer64 => PropertyValue::Integer64(LittleEndian::read_i64(slot)),
        PropertyType::Time => PropertyValue::Time(FileTime(LittleEndian::read_u64(slot))),
        PropertyType::Object => PropertyValue::Object {
            size: LittleEndian::read_u32(slot),
        },
        PropertyType::Restriction | PropertyType::RuleAction => {
            debug!(tag = %tag, "Restriction or rule action property, keeping raw value");
            PropertyValue::Unknown {
                code: tag.ty.code(),
                raw: *slot,
            }
        }
        other => {
            warn!(tag = %tag, ty = %other, "Unknown property type, keeping raw value");
            PropertyValue::Unknown {
                code: other.code(),
                raw: *slot,
            }
        }
    }
}

/// The first `size` bytes of `data`, or all of it if the stream is shorter.
fn declared(data: &[u8], size: u32) -> &[u8] {
    &data[..data.len().min(size as usize)]
}

fn chunks<'d>(
    tag: PropertyTag,
    data: &'d [u8],
    size: usize,
) -> Result<std::slice::ChunksExact<'d, u8>> {
    if data.len() % size != 0 {
        return Err(MsgError::InvalidAuxiliaryStream {
            name: naming::value_stream(tag),
            reason: format!("length {} is not a multiple of {size}", data.len()),
        });
    }
    Ok(data.chunks_exact(size))
}

fn guid_at(tag: PropertyTag, data: &[u8], offset: usize) -> Result<[u8; 16]> {
    data.get(offset..offset + 16)
        .and_then(|b| <[u8; 16]>::try_from(b).ok())
        .ok_or_else(|| MsgError::InvalidAuxiliaryStream {
            name: naming::value_stream(tag),
            reason: format!("expected 16-byte GUID, found {} bytes", data.len()),
        })
}

/// Strip trailing NUL terminators from an 8-bit string.
fn trim_string8(data: &[u8]) -> Vec<u8> {
    let end = data.iter().rposition(|&b| b != 0).map_or(0, |p| p + 1);
    data[..end].to_vec()
}

/// Decode UTF-16LE, dropping trailing NUL terminators.
fn decode_utf16(data: &[u8]) -> String {
    let units: Vec<u16> = data.chunks_exact(2).map(LittleEndian::read_u16).collect();
    let end = units.iter().rposition(|&u| u != 0).map_or(0, |p| p + 1);
    String::from_utf16_lossy(&units[..end])
}
