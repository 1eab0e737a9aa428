use std::path::{Path, PathBuf};

use crate::error::Result;

/// The document a request is made for: its full text and the directory
/// relative bibliography paths resolve against.
///
/// Built fresh for every request and passed by reference; nothing about a
/// document is remembered between calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentContext {
    pub path: Option<PathBuf>,
    pub text: String,
    pub base_dir: PathBuf,
}

impl DocumentContext {
    /// A document that has not been saved, or whose path is unknown.
    pub fn new(text: impl Into<String>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: None,
            text: text.into(),
            base_dir: base_dir.into(),
        }
    }

    /// Document text supplied by an editor for a file on disk.
    pub fn with_text(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        let path = path.into();
        let base_dir = parent_dir(&path);
        Self {
            path: Some(path),
            text: text.into(),
            base_dir,
        }
    }

    /// Read the document from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::with_text(path, text))
    }

    /// File name without extension, if the document has a path.
    pub fn stem(&self) -> Option<&str> {
        self.path.as_deref()?.file_stem()?.to_str()
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
