//! Appending fetched records to a bibliography file.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Result;
use crate::formats::bibtex::{format_record, record_key};
use crate::identifiers::Doi;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InsertOutcome {
    Inserted { path: PathBuf, key: Option<String> },
    /// The DOI already appears in the file; nothing was written.
    AlreadyPresent { path: PathBuf },
}

/// Case-insensitive substring test for a DOI in file contents.
pub fn contains_doi(contents: &str, doi: &Doi) -> bool {
    contents.to_lowercase().contains(&doi.normalized)
}

/// Current contents of a bibliography file; a missing file reads as empty.
pub fn read_store(path: &Path) -> Result<String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(contents),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e.into()),
    }
}

/// Append `raw_bibtex` to `target` unless the DOI is already present.
///
/// The file is rewritten through a temporary file in the same directory
/// and renamed into place, so readers never observe a partial write.
pub fn insert_record(target: &Path, raw_bibtex: &str, doi: &Doi) -> Result<InsertOutcome> {
    let existing = read_store(target)?;
    if contains_doi(&existing, doi) {
        tracing::info!(%doi, file = %target.display(), "record already present");
        return Ok(InsertOutcome::AlreadyPresent {
            path: target.to_path_buf(),
        });
    }

    let mut contents = existing;
    if !contents.trim().is_empty() {
        if !contents.ends_with('\n') {
            contents.push('\n');
        }
        contents.push('\n');
    } else {
        contents.clear();
    }
    contents.push_str(&format_record(raw_bibtex));

    write_replacing(target, &contents)?;
    let key = record_key(raw_bibtex);
    tracing::info!(%doi, key = key.as_deref(), file = %target.display(), "record inserted");
    Ok(InsertOutcome::Inserted {
        path: target.to_path_buf(),
        key,
    })
}

/// Replace the contents of `target`. A symlinked target is resolved first
/// so the file it points to is rewritten and the link is left in place.
fn write_replacing(target: &Path, contents: &str) -> Result<()> {
    let target = match std::fs::canonicalize(target) {
        Ok(resolved) => resolved,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => target.to_path_buf(),
        Err(e) => return Err(e.into()),
    };
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    if let Ok(meta) = std::fs::metadata(&target) {
        tmp.as_file().set_permissions(meta.permissions())?;
    }
    tmp.persist(&target).map_err(|e| e.error)?;
    Ok(())
}
