//! Merge labels and bibliography entries into one ranked completion list.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::bibliography::{BibEntry, locate_bibliographies, parse_bibliography, read_bibliography};
use crate::document::DocumentContext;
use crate::labels::{IconKind, LabelOccurrence, extract_labels};

/// Ordering key for candidates. Every label sorts before every entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "group", rename_all = "snake_case")]
pub enum SortKey {
    Label { label_type: String, name: String },
    Bibliography { key: String },
}

impl SortKey {
    /// String form for surfaces that sort by plain text.
    pub fn sort_text(&self) -> String {
        match self {
            Self::Label { label_type, name } => format!("0:{label_type}:{name}"),
            Self::Bibliography { key } => format!("1:{key}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "item", rename_all = "snake_case")]
pub enum CandidateSource {
    Label(LabelOccurrence),
    Bibliography(BibEntry),
}

/// One completion suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateItem {
    pub label: String,
    pub detail: String,
    /// Markdown.
    pub documentation: String,
    pub insert_text: String,
    pub icon: IconKind,
    pub sort_key: SortKey,
    pub sort_text: String,
    pub source: CandidateSource,
}

impl CandidateItem {
    pub fn is_label(&self) -> bool {
        matches!(self.source, CandidateSource::Label(_))
    }
}

impl From<LabelOccurrence> for CandidateItem {
    fn from(occurrence: LabelOccurrence) -> Self {
        let ty = occurrence.label_type;
        let sort_key = SortKey::Label {
            label_type: ty.as_str().to_string(),
            name: occurrence.name.clone(),
        };
        let detail = format!("{} (line {})", ty.description(), occurrence.line + 1);
        let documentation = match ty.descriptor() {
            Some(descriptor) => format!("{}\n\n`<{}>`", descriptor.detail, occurrence.name),
            None => format!("`<{}>`", occurrence.name),
        };

        Self {
            label: occurrence.name.clone(),
            detail,
            documentation,
            insert_text: occurrence.name.clone(),
            icon: ty.icon(),
            sort_text: sort_key.sort_text(),
            sort_key,
            source: CandidateSource::Label(occurrence),
        }
    }
}

impl From<BibEntry> for CandidateItem {
    fn from(entry: BibEntry) -> Self {
        let sort_key = SortKey::Bibliography {
            key: entry.key.clone(),
        };

        Self {
            label: entry.key.clone(),
            detail: bib_detail(&entry),
            documentation: bib_documentation(&entry),
            insert_text: entry.key.clone(),
            icon: IconKind::Reference,
            sort_text: sort_key.sort_text(),
            sort_key,
            source: CandidateSource::Bibliography(entry),
        }
    }
}

/// `[type] First, Second, et al., year`; without authors, `[type] year`.
fn bib_detail(entry: &BibEntry) -> String {
    let mut detail = format!("[{}]", entry.entry_type);
    if !entry.authors.is_empty() {
        detail.push(' ');
        detail.push_str(&entry.authors.iter().take(2).cloned().collect::<Vec<_>>().join(", "));
        if entry.authors.len() > 2 {
            detail.push_str(", et al.");
        }
    }
    if let Some(year) = &entry.year {
        detail.push_str(if entry.authors.is_empty() { " " } else { ", " });
        detail.push_str(year);
    }
    detail
}

fn bib_documentation(entry: &BibEntry) -> String {
    let mut parts = Vec::new();
    if let Some(title) = &entry.title {
        parts.push(format!("**{title}**"));
    }
    if let Some(author) = &entry.author {
        parts.push(format!("*{author}*"));
    }
    if let Some(venue) = venue_line(entry) {
        parts.push(venue);
    }
    let source = entry
        .source_file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| entry.source_file.display().to_string());
    parts.push(format!("Source: {source}"));
    parts.join("\n\n")
}

/// Journal beats booktitle beats a bare year.
fn venue_line(entry: &BibEntry) -> Option<String> {
    let with_year = |venue: String| match &entry.year {
        Some(year) => format!("{venue} ({year})"),
        None => venue,
    };
    if let Some(journal) = &entry.journal {
        Some(with_year(journal.clone()))
    } else if let Some(booktitle) = &entry.booktitle {
        Some(with_year(format!("In: {booktitle}")))
    } else {
        entry.year.clone()
    }
}

/// Label candidates for a document's text, ordered by type then name.
pub fn label_candidates(text: &str) -> Vec<CandidateItem> {
    let mut items: Vec<CandidateItem> = extract_labels(text).into_iter().map(Into::into).collect();
    items.sort_by(|a, b| a.sort_key.cmp(&b.sort_key));
    items
}

/// Bibliography candidates from every file the document references, in
/// file-resolution order and then file order. Sorting by key is left to
/// whoever consumes `sort_key`.
///
/// All files are read before any is parsed. Unreadable files contribute
/// nothing.
pub fn bibliography_candidates(doc: &DocumentContext) -> Vec<CandidateItem> {
    let sources: Vec<(PathBuf, String)> = locate_bibliographies(&doc.text, &doc.base_dir)
        .into_iter()
        .filter_map(|path| read_bibliography(&path).map(|text| (path, text)))
        .collect();

    sources
        .iter()
        .flat_map(|(path, text)| parse_bibliography(text, path))
        .map(Into::into)
        .collect()
}

/// All candidates for a document: labels first, then bibliography entries.
pub fn build_candidates(doc: &DocumentContext) -> Vec<CandidateItem> {
    let mut items = label_candidates(&doc.text);
    items.extend(bibliography_candidates(doc));
    tracing::debug!(count = items.len(), "built completion candidates");
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::LabelType;
    use tempfile::TempDir;

    fn entry(key: &str) -> BibEntry {
        BibEntry {
            key: key.to_string(),
            entry_type: "article".to_string(),
            title: None,
            author: None,
            authors: Vec::new(),
            year: None,
            journal: None,
            booktitle: None,
            source_file: PathBuf::from("/refs/lib.bib"),
        }
    }

    #[test]
    fn label_candidate_presentation() {
        let item = CandidateItem::from(LabelOccurrence {
            name: "eq:einstein".to_string(),
            line: 4,
            label_type: LabelType::Equation,
        });
        assert_eq!(item.label, "eq:einstein");
        assert_eq!(item.detail, "Equation (line 5)");
        assert_eq!(item.insert_text, "eq:einstein");
        assert_eq!(item.sort_text, "0:eq:eq:einstein");
        assert_eq!(item.icon, IconKind::Operator);
    }

    #[test]
    fn unknown_label_detail() {
        let item = CandidateItem::from(LabelOccurrence {
            name: "intro".to_string(),
            line: 0,
            label_type: LabelType::Unknown,
        });
        assert_eq!(item.detail, "Label (line 1)");
        assert_eq!(item.icon, IconKind::Reference);
    }

    #[test]
    fn bib_detail_truncates_authors() {
        let mut e = entry("k");
        e.authors = vec!["A".into(), "B".into(), "C".into()];
        e.year = Some("2021".into());
        assert_eq!(bib_detail(&e), "[article] A, B, et al., 2021");

        e.authors.truncate(2);
        assert_eq!(bib_detail(&e), "[article] A, B, 2021");
    }

    #[test]
    fn bib_detail_without_authors() {
        let mut e = entry("k");
        e.year = Some("2021".into());
        assert_eq!(bib_detail(&e), "[article] 2021");

        e.year = None;
        assert_eq!(bib_detail(&e), "[article]");

        e.authors = vec!["Solo".into()];
        assert_eq!(bib_detail(&e), "[article] Solo");
    }

    #[test]
    fn venue_priority() {
        let mut e = entry("k");
        assert_eq!(venue_line(&e), None);

        e.year = Some("2020".into());
        assert_eq!(venue_line(&e).as_deref(), Some("2020"));

        e.booktitle = Some("Proc. X".into());
        assert_eq!(venue_line(&e).as_deref(), Some("In: Proc. X (2020)"));

        e.journal = Some("Nature".into());
        assert_eq!(venue_line(&e).as_deref(), Some("Nature (2020)"));
    }

    #[test]
    fn bib_documentation_layout() {
        let mut e = entry("k");
        e.title = Some("A Study".into());
        e.author = Some("Doe, Jane, Smith, John".into());
        e.journal = Some("Nature".into());
        e.year = Some("2020".into());
        assert_eq!(
            bib_documentation(&e),
            "**A Study**\n\n*Doe, Jane, Smith, John*\n\nNature (2020)\n\nSource: lib.bib"
        );
    }

    #[test]
    fn labels_are_sorted_by_type_then_name() {
        let items = label_candidates("<sec:b> <eq:z>\n<eq:a> <plain>");
        let names: Vec<_> = items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(names, vec!["eq:a", "eq:z", "sec:b", "plain"]);
    }

    #[test]
    fn build_candidates_puts_labels_before_entries() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("refs.bib"),
            "@article{aaa, title={First}}\n@book{Zed, title={Last}}",
        )
        .unwrap();
        std::fs::write(dir.path().join("more.bib"), "@misc{aaa, title={Again}}").unwrap();

        let text = "#bibliography((\"refs.bib\", \"missing.bib\", \"more.bib\"))\n<zz:last> <app:a>";
        let doc = DocumentContext::with_text(dir.path().join("main.typ"), text);
        let items = build_candidates(&doc);

        assert_eq!(items.len(), 5);
        assert!(items[..2].iter().all(CandidateItem::is_label));
        assert!(items[2..].iter().all(|i| !i.is_label()));
        // the same key in two files is kept twice
        assert_eq!(items.iter().filter(|i| i.label == "aaa").count(), 2);

        let max_label = items[..2].iter().map(|i| &i.sort_text).max().unwrap();
        let min_bib = items[2..].iter().map(|i| &i.sort_text).min().unwrap();
        assert!(max_label < min_bib);
        let max_label_key = items[..2].iter().map(|i| &i.sort_key).max().unwrap();
        let min_bib_key = items[2..].iter().map(|i| &i.sort_key).min().unwrap();
        assert!(max_label_key < min_bib_key);
    }

    #[test]
    fn entries_keep_file_resolution_order() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.bib"), "@misc{zeta}\n@misc{alpha}").unwrap();
        std::fs::write(dir.path().join("a.bib"), "@misc{mid}").unwrap();

        let text = "#bibliography((\"b.bib\", \"a.bib\"))";
        let doc = DocumentContext::with_text(dir.path().join("main.typ"), text);
        let keys: Vec<_> = bibliography_candidates(&doc)
            .into_iter()
            .map(|i| i.label)
            .collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn missing_bibliographies_leave_only_labels() {
        let doc = DocumentContext::new("#bibliography(\"nope.bib\")\n<fig:x>", "/nonexistent");
        let items = build_candidates(&doc);
        assert_eq!(items.len(), 1);
        assert!(items[0].is_label());
    }
}
