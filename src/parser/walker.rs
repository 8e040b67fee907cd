//! Walks a property stream record by record until it is exhausted.

use tracing::debug;

use super::decoder::PropertyDecoder;
use super::ParseOptions;
use crate::container::{ByteStream, Container, Directory};
use crate::error::Result;
use crate::model::property::PropertySink;

/// Decode records from the cursor of `stream` to its end, applying each to `sink`.
///
/// The stream carries no record count; iteration stops when no bytes remain.
/// A partial record at the end fails with `TruncatedRecord`.
/// Returns the number of records decoded.
pub fn walk_properties<C, S>(
    stream: &mut ByteStream,
    directory: &Directory,
    container: &mut C,
    options: &ParseOptions,
    sink: &mut S,
) -> Result<usize>
where
    C: Container + ?Sized,
    S: PropertySink + ?Sized,
{
    let mut decoder = PropertyDecoder::new(container, directory, options);
    let mut count = 0usize;
    while stream.remaining() > 0 {
        let (tag, value) = decoder.decode(stream)?;
        sink.set_property(tag, value);
        count += 1;
    }
    debug!(stream = stream.name(), records = count, "Walked property stream");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::CfbContainer;
    use crate::error::MsgError;
    use crate::model::property::{tags, Properties, PropertyTag, PropertyType};
    use std::io::Cursor;

    fn empty_container() -> CfbContainer<Cursor<Vec<u8>>> {
        let mut cfb = cfb::CompoundFile::create(Cursor::new(Vec::new())).unwrap();
        cfb.flush().unwrap();
        let mut bytes = cfb.into_inner();
        bytes.set_position(0);
        CfbContainer::open(bytes).unwrap()
    }

    fn int_record(id: u16, value: i32) -> Vec<u8> {
        let mut rec = Vec::new();
        let tag = PropertyTag::new(id, PropertyType::Integer32);
        rec.extend_from_slice(&tag.to_raw().to_le_bytes());
        rec.extend_from_slice(&[0x06, 0, 0, 0]);
        rec.extend_from_slice(&value.to_le_bytes());
        rec.extend_from_slice(&[0; 4]);
        rec
    }

    #[test]
    fn test_single_fixed_record() {
        let mut container = empty_container();
        let mut stream = ByteStream::new("props", int_record(tags::RECIPIENT_TYPE, 1));
        let mut props = Properties::new();
        let count = walk_properties(
            &mut stream,
            &Directory::root(),
            &mut container,
            &ParseOptions::default(),
            &mut props,
        )
        .unwrap();
        assert_eq!(count, 1);
        assert_eq!(stream.remaining(), 0);
        assert_eq!(props.int(tags::RECIPIENT_TYPE), Some(1));
    }

    #[test]
    fn test_record_count_matches_stride() {
        let mut container = empty_container();
        let mut data = Vec::new();
        for i in 0..5u16 {
            data.extend(int_record(0x6600 + i, i32::from(i)));
        }
        let len = data.len();
        let mut stream = ByteStream::new("props", data);
        let mut props = Properties::new();
        let count = walk_properties(
            &mut stream,
            &Directory::root(),
            &mut container,
            &ParseOptions::default(),
            &mut props,
        )
        .unwrap();
        assert_eq!(count, len / crate::parser::decoder::RECORD_SIZE);
        assert_eq!(props.len(), 5);
    }

    #[test]
    fn test_partial_record_is_truncated() {
        let mut container = empty_container();
        let mut data = int_record(tags::RECIPIENT_TYPE, 1);
        data.extend_from_slice(&[0x03, 0x00, 0x15, 0x0C, 0, 0]);
        let mut stream = ByteStream::new("props", data);
        let mut props = Properties::new();
        let result = walk_properties(
            &mut stream,
            &Directory::root(),
            &mut container,
            &ParseOptions::default(),
            &mut props,
        );
        match result {
            Err(MsgError::TruncatedRecord {
                offset, remaining, ..
            }) => {
                assert_eq!(offset, 16);
                assert_eq!(remaining, 6);
            }
            other => panic!("expected TruncatedRecord, got {other:?}"),
        }
    }
}
