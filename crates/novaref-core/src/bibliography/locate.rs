//! Discover bibliography files referenced by a document.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

/// File extension of bibliography files, without the dot.
pub const BIB_EXTENSION: &str = "bib";

static DIRECTIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bbibliography\s*\(([^)]*)\)").expect("valid bibliography directive regex")
});

static QUOTED_BIB_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"\n]*\.bib)""#).expect("valid quoted bib path regex"));

/// Quoted `.bib` paths inside `bibliography(...)` calls, in directive
/// order, then argument order. Nothing is resolved or checked.
pub fn bibliography_references(text: &str) -> Vec<String> {
    DIRECTIVE_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .flat_map(|args| {
            QUOTED_BIB_RE
                .captures_iter(args.as_str())
                .filter_map(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Resolve the document's bibliography references against `base_dir`
/// and keep only paths that exist. Duplicates are kept.
pub fn locate_bibliographies(text: &str, base_dir: &Path) -> Vec<PathBuf> {
    bibliography_references(text)
        .into_iter()
        .filter_map(|reference| {
            let path = resolve(base_dir, &reference);
            if path.is_file() {
                Some(path)
            } else {
                tracing::debug!(path = %path.display(), "referenced bibliography not found");
                None
            }
        })
        .collect()
}

fn resolve(base_dir: &Path, reference: &str) -> PathBuf {
    let candidate = Path::new(reference);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        base_dir.join(candidate)
    }
}
