//! Access to the compound file container that wraps a `.msg` message.
//!
//! The parser only needs a small capability: look up named entries inside
//! a directory, tell directories from documents, and open a document as a
//! [`ByteStream`]. [`Container`] captures that; [`CfbContainer`] implements it
//! on top of the `cfb` crate.

pub mod compound;
pub mod stream;

use std::path::{Path, PathBuf};

use crate::error::{MsgError, Result};

pub use compound::CfbContainer;
pub use stream::ByteStream;

/// Read-only view over a compound file.
pub trait Container {
    /// Look up the entry at `path`. Returns `None` if it does not exist.
    fn lookup(&self, path: &Path) -> Option<Entry>;

    /// Open a document and read it fully into a [`ByteStream`].
    fn open_stream(&mut self, document: &Document) -> Result<ByteStream>;
}

/// A named entry: either a directory (storage) or a document (stream).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Directory(Directory),
    Document(Document),
}

/// A document entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: PathBuf,
    pub len: u64,
}

/// A directory entry, identified by its absolute path in the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    path: PathBuf,
}

impl Directory {
    /// The container's root directory.
    pub fn root() -> Self {
        Self {
            path: PathBuf::from("/"),
        }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` for the root.
    pub fn parent(&self) -> Option<Directory> {
        self.path.parent().map(Directory::at)
    }

    pub fn is_root(&self) -> bool {
        self.parent().is_none()
    }

    pub fn child_path(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    pub fn get_entry<C: Container + ?Sized>(&self, container: &C, name: &str) -> Result<Entry> {
        container
            .lookup(&self.child_path(name))
            .ok_or_else(|| MsgError::MissingEntry {
                directory: self.to_string(),
                name: name.to_string(),
            })
    }

    pub fn has_entry<C: Container + ?Sized>(&self, container: &C, name: &str) -> bool {
        container.lookup(&self.child_path(name)).is_some()
    }

    /// Child entry `name`, which must be a directory.
    pub fn directory<C: Container + ?Sized>(&self, container: &C, name: &str) -> Result<Directory> {
        match self.get_entry(container, name)? {
            Entry::Directory(dir) => Ok(dir),
            Entry::Document(doc) => Err(MsgError::NotADirectory(doc.path.display().to_string())),
        }
    }

    /// Child entry `name`, which must be a document.
    pub fn document<C: Container + ?Sized>(&self, container: &C, name: &str) -> Result<Document> {
        match self.get_entry(container, name)? {
            Entry::Document(doc) => Ok(doc),
            Entry::Directory(dir) => Err(MsgError::NotADocument(dir.to_string())),
        }
    }

    /// Open child document `name`.
    pub fn open_stream<C: Container + ?Sized>(
        &self,
        container: &mut C,
        name: &str,
    ) -> Result<ByteStream> {
        let document = self.document(container, name)?;
        container.open_stream(&document)
    }
}

impl std::fmt::Display for Directory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_has_no_parent() {
        let root = Directory::root();
        assert!(root.is_root());
        assert!(root.parent().is_none());
    }

    #[test]
    fn test_child_parent() {
        let child = Directory::at(Directory::root().child_path("__attach_version1.0_#00000000"));
        assert!(!child.is_root());
        assert_eq!(child.parent(), Some(Directory::root()));
        assert_eq!(child.to_string(), "/__attach_version1.0_#00000000");
    }
}
