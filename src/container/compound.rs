//! [`Container`] implementation backed by the `cfb` crate.

use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use cfb::CompoundFile;
use tracing::trace;

use super::{ByteStream, Container, Directory, Document, Entry};
use crate::error::{MsgError, Result};

/// An opened compound file.
pub struct CfbContainer<F> {
    inner: CompoundFile<F>,
    /// Size of the underlying source; no document can be longer.
    source_len: u64,
}

impl<F: Read + Seek> CfbContainer<F> {
    /// Open a compound file, validating its header and directory.
    pub fn open(mut source: F) -> Result<Self> {
        let source_len = source
            .seek(SeekFrom::End(0))
            .and_then(|len| source.seek(SeekFrom::Start(0)).map(|_| len))
            .map_err(MsgError::ContainerFormat)?;
        let inner = CompoundFile::open(source).map_err(MsgError::ContainerFormat)?;
        Ok(Self { inner, source_len })
    }

    pub fn into_inner(self) -> F {
        self.inner.into_inner()
    }
}

impl<F: Read + Seek> Container for CfbContainer<F> {
    fn lookup(&self, path: &Path) -> Option<Entry> {
        let entry = self.inner.entry(path).ok()?;
        if entry.is_storage() {
            Some(Entry::Directory(Directory::at(path)))
        } else {
            Some(Entry::Document(Document {
                path: path.to_path_buf(),
                len: entry.len(),
            }))
        }
    }

    fn open_stream(&mut self, document: &Document) -> Result<ByteStream> {
        let path = &document.path;
        // Version 4 files do not bound the declared length by the file size.
        if document.len > self.source_len {
            return Err(MsgError::ContainerFormat(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "'{}' declares {} bytes in a {}-byte file",
                    path.display(),
                    document.len,
                    self.source_len
                ),
            )));
        }
        let mut stream = self
            .inner
            .open_stream(path)
            .map_err(|e| MsgError::io(path, e))?;
        let mut data = Vec::with_capacity(document.len as usize);
        stream
            .read_to_end(&mut data)
            .map_err(|e| MsgError::io(path, e))?;
        trace!(path = %path.display(), len = data.len(), "Opened stream");
        Ok(ByteStream::new(path.display().to_string(), data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn sample() -> CfbContainer<Cursor<Vec<u8>>> {
        let mut cfb = CompoundFile::create(Cursor::new(Vec::new())).unwrap();
        cfb.create_storage("/dir").unwrap();
        let mut s = cfb.create_stream("/dir/doc").unwrap();
        s.write_all(b"hello").unwrap();
        s.flush().unwrap();
        drop(s);
        cfb.flush().unwrap();
        let mut bytes = cfb.into_inner();
        bytes.set_position(0);
        CfbContainer::open(bytes).unwrap()
    }

    #[test]
    fn test_lookup_variants() {
        let c = sample();
        assert!(matches!(
            c.lookup(Path::new("/dir")),
            Some(Entry::Directory(_))
        ));
        match c.lookup(Path::new("/dir/doc")) {
            Some(Entry::Document(doc)) => assert_eq!(doc.len, 5),
            other => panic!("expected document, got {other:?}"),
        }
        assert!(c.lookup(Path::new("/dir/missing")).is_none());
    }

    #[test]
    fn test_open_stream_reads_all() {
        let mut c = sample();
        let dir = Directory::at("/dir");
        let stream = dir.open_stream(&mut c, "doc").unwrap();
        assert_eq!(stream.remaining(), 5);
        assert_eq!(stream.into_bytes(), b"hello");
    }

    #[test]
    fn test_open_rejects_garbage() {
        let result = CfbContainer::open(Cursor::new(vec![0u8; 64]));
        assert!(matches!(result, Err(MsgError::ContainerFormat(_))));
    }

    #[test]
    fn test_wrong_entry_kind() {
        let c = sample();
        let root = Directory::root();
        assert!(matches!(
            root.document(&c, "dir"),
            Err(MsgError::NotADocument(_))
        ));
        assert!(matches!(
            root.directory(&c, "missing"),
            Err(MsgError::MissingEntry { .. })
        ));
    }
}
