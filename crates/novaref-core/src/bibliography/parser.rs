use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::bibliography::scan::{Field, FieldValue, RawEntry, scan_entries};

/// A citable record parsed from a bibliography file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibEntry {
    pub key: String,
    /// Lower-cased entry type, e.g. `article`.
    #[serde(rename = "type")]
    pub entry_type: String,
    pub title: Option<String>,
    /// Author list with ` and ` separators rewritten to `, `.
    pub author: Option<String>,
    /// Individual author names, in source order.
    pub authors: Vec<String>,
    pub year: Option<String>,
    pub journal: Option<String>,
    pub booktitle: Option<String>,
    pub source_file: PathBuf,
}

impl BibEntry {
    fn from_raw(raw: &RawEntry<'_>, key: &str, source_file: &Path) -> Self {
        let fields = raw.fields();
        let authors_raw = text_field(&fields, "author");

        Self {
            key: key.to_string(),
            entry_type: raw.entry_type.to_ascii_lowercase(),
            title: text_field(&fields, "title"),
            author: authors_raw
                .as_deref()
                .map(|a| a.replace(" and ", ", ").trim().to_string()),
            authors: authors_raw
                .as_deref()
                .map(|a| {
                    a.split(" and ")
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(ToOwned::to_owned)
                        .collect()
                })
                .unwrap_or_default(),
            year: field(&fields, "year").and_then(|v| four_digit_year(&clean_text(v.text()))),
            journal: text_field(&fields, "journal"),
            booktitle: text_field(&fields, "booktitle"),
            source_file: source_file.to_path_buf(),
        }
    }
}

/// Parse every citable entry of a bibliography file's contents.
///
/// Pseudo-entries are dropped, as are entries without a usable key. A key
/// repeated within the same file keeps its first entry only.
pub fn parse_bibliography(text: &str, source_file: &Path) -> Vec<BibEntry> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for raw in scan_entries(text) {
        if raw.is_pseudo() {
            continue;
        }
        let key = raw.key();
        if key.is_empty() || key.contains(char::is_whitespace) {
            tracing::debug!(entry_type = raw.entry_type, "skipping entry without a usable key");
            continue;
        }
        if !seen.insert(key) {
            tracing::debug!(key, file = %source_file.display(), "duplicate key in file");
            continue;
        }
        entries.push(BibEntry::from_raw(&raw, key, source_file));
    }

    entries
}

/// Read a bibliography file. Unreadable files are logged and yield `None`.
pub fn read_bibliography(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(err) => {
            tracing::warn!(file = %path.display(), error = %err, "cannot read bibliography");
            None
        }
    }
}

/// Read and parse one bibliography file; failures yield no entries.
pub fn parse_bib_file(path: &Path) -> Vec<BibEntry> {
    read_bibliography(path)
        .map(|text| parse_bibliography(&text, path))
        .unwrap_or_default()
}

fn field<'a>(fields: &[Field<'a>], name: &str) -> Option<FieldValue<'a>> {
    fields
        .iter()
        .find(|f| f.name.eq_ignore_ascii_case(name))
        .map(|f| f.value)
}

fn text_field(fields: &[Field<'_>], name: &str) -> Option<String> {
    field(fields, name)
        .and_then(FieldValue::delimited)
        .map(clean_text)
        .filter(|s| !s.is_empty())
}

/// Drop literal braces and collapse whitespace runs.
fn clean_text(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, '{' | '}'))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn four_digit_year(value: &str) -> Option<String> {
    let digits: String = value.chars().take_while(char::is_ascii_digit).collect();
    let rest = &value[digits.len()..];
    (digits.len() == 4 && !rest.starts_with(char::is_alphanumeric)).then_some(digits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(text: &str) -> Vec<BibEntry> {
        parse_bibliography(text, Path::new("refs.bib"))
    }

    #[test]
    fn parses_article_with_common_fields() {
        let entries = parse(
            "@article{doe2020, title = {A Study}, author = {Doe, Jane and Smith, John}, \
             year = {2020}, journal = {Nature}}",
        );
        assert_eq!(
            entries,
            vec![BibEntry {
                key: "doe2020".to_string(),
                entry_type: "article".to_string(),
                title: Some("A Study".to_string()),
                author: Some("Doe, Jane, Smith, John".to_string()),
                authors: vec!["Doe, Jane".to_string(), "Smith, John".to_string()],
                year: Some("2020".to_string()),
                journal: Some("Nature".to_string()),
                booktitle: None,
                source_file: PathBuf::from("refs.bib"),
            }]
        );
    }

    #[test]
    fn pseudo_entries_are_not_citable() {
        let text = r#"
@string{nat = "Nature"}
@comment{ @article{hidden, title={No}} }
@preamble{"\newcommand{\x}{y}"}
@Book{Knuth84, Title = "The {\TeX}book", YEAR = 1984}
"#;
        let entries = parse(text);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, "Knuth84");
        assert_eq!(entries[0].entry_type, "book");
        assert_eq!(entries[0].title.as_deref(), Some("The \\TeXbook"));
        assert_eq!(entries[0].year.as_deref(), Some("1984"));
    }

    #[test]
    fn embedded_at_does_not_truncate() {
        let text = "@misc{m1, author = {Jo Bloggs <jo@uni.edu>}, title = {After the at}}\n\
                    @misc{m2, title = {Second}}";
        let entries = parse(text);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title.as_deref(), Some("After the at"));
        assert_eq!(entries[0].author.as_deref(), Some("Jo Bloggs <jo@uni.edu>"));
    }

    #[test]
    fn booktitle_is_not_mistaken_for_title() {
        let entries = parse(
            "@inproceedings{c1, booktitle = {Proc. of Things}, title = {Real Title}, year = 2019}",
        );
        assert_eq!(entries[0].title.as_deref(), Some("Real Title"));
        assert_eq!(entries[0].booktitle.as_deref(), Some("Proc. of Things"));
        assert_eq!(entries[0].year.as_deref(), Some("2019"));
    }

    #[test]
    fn multiline_values_are_normalised() {
        let text = "@article{long,\n  title = {A {Very}\n     Long Title},\n  author = {A. One and\n B. Two and C. Three},\n}";
        let entry = &parse(text)[0];
        assert_eq!(entry.title.as_deref(), Some("A Very Long Title"));
        assert_eq!(entry.author.as_deref(), Some("A. One, B. Two, C. Three"));
        assert_eq!(entry.authors.len(), 3);
    }

    #[test]
    fn year_requires_four_digits() {
        let entries = parse("@misc{a, year = {20}}\n@misc{b, year = \"1999a\"}\n@misc{c, year = {circa 2001}}");
        assert_eq!(entries[0].year, None);
        assert_eq!(entries[1].year, None);
        assert_eq!(entries[2].year, None);
    }

    #[test]
    fn duplicate_keys_keep_first_in_file() {
        let entries = parse("@misc{dup, title={First}}\n@misc{dup, title={Second}}");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title.as_deref(), Some("First"));
    }

    #[test]
    fn entries_without_key_are_skipped() {
        let entries = parse("@misc{, title={Nameless}}\n@misc{ok}");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, "ok");
        assert_eq!(entries[0].title, None);
    }

    #[test]
    fn parsing_is_idempotent() {
        let text = "@article{x, title={T}}\n@book{y, author={A and B}}";
        assert_eq!(parse(text), parse(text));
    }

    #[test]
    fn unreadable_file_yields_no_entries() {
        let dir = TempDir::new().unwrap();
        assert!(parse_bib_file(&dir.path().join("missing.bib")).is_empty());

        let binary = dir.path().join("binary.bib");
        std::fs::write(&binary, [0xff, 0xfe, 0x00, 0x40]).unwrap();
        assert!(parse_bib_file(&binary).is_empty());
    }

    #[test]
    fn parses_file_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("refs.bib");
        std::fs::write(&path, "@article{k, journal = \"J\"}").unwrap();
        let entries = parse_bib_file(&path);
        assert_eq!(entries[0].journal.as_deref(), Some("J"));
        assert_eq!(entries[0].source_file, path);
    }
}
