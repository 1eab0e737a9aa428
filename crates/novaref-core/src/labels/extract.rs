use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::labels::catalog::{LabelType, classify};

static LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<([A-Za-z_][A-Za-z0-9_:\-]*)>").expect("valid label delimiter regex")
});

/// A label declaration found in document text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelOccurrence {
    /// Full identifier between the angle brackets, prefix included.
    pub name: String,
    /// Zero-based line index.
    pub line: usize,
    #[serde(rename = "type")]
    pub label_type: LabelType,
}

/// Scan document text for `<label>` declarations.
///
/// Results are in line order, then left to right. Repeated labels are
/// reported once per occurrence.
pub fn extract_labels(text: &str) -> Vec<LabelOccurrence> {
    text.lines()
        .enumerate()
        .flat_map(|(line, content)| {
            LABEL_RE.captures_iter(content).filter_map(move |caps| {
                let name = caps.get(1)?.as_str();
                Some(LabelOccurrence {
                    name: name.to_string(),
                    line,
                    label_type: classify(name),
                })
            })
        })
        .collect()
}
