//! Choosing the bibliography file an inserted record is written to.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::bibliography::locate::BIB_EXTENSION;
use crate::document::DocumentContext;
use crate::error::Result;

const FALLBACK_STEM: &str = "references";

/// Where a new record can go, as far as the document's directory tells.
///
/// Only [`BibTarget::Existing`] can be used without asking: the other
/// cases need the caller to confirm creation or pick a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BibTarget {
    /// No `.bib` file yet; this is the file to offer creating.
    Create { path: PathBuf },
    /// Exactly one `.bib` file.
    Existing { path: PathBuf },
    /// Several `.bib` files, sorted by path.
    Choose { candidates: Vec<PathBuf> },
}

impl BibTarget {
    /// The target when no confirmation or choice is needed.
    pub fn auto_selected(&self) -> Option<&Path> {
        match self {
            Self::Existing { path } => Some(path),
            Self::Create { .. } | Self::Choose { .. } => None,
        }
    }
}

/// Inspect the document's directory for bibliography files.
pub fn select_target(doc: &DocumentContext) -> Result<BibTarget> {
    let mut found = bib_files_in(&doc.base_dir)?;
    found.sort();

    Ok(match found.len() {
        0 => BibTarget::Create {
            path: doc
                .base_dir
                .join(format!("{}.{BIB_EXTENSION}", doc.stem().unwrap_or(FALLBACK_STEM))),
        },
        1 => BibTarget::Existing {
            path: found.remove(0),
        },
        _ => BibTarget::Choose { candidates: found },
    })
}

fn bib_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_bib = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(BIB_EXTENSION));
        if is_bib && path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}
