//! Tolerant lexical scanner for BibTeX files.
//!
//! Entry bodies are delimited by balanced braces (or parentheses for
//! `@type(...)` entries), so an `@` or a `}` nested inside a field
//! value never ends an entry early. Text between entries is ignored,
//! as BibTeX itself does. All delimiters are ASCII, so every slice
//! boundary produced here falls on a UTF-8 character boundary.

const PSEUDO_ENTRY_TYPES: [&str; 3] = ["comment", "string", "preamble"];

/// A field value as written in the source, without its outer delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Braced(&'a str),
    Quoted(&'a str),
    /// Number or macro name.
    Bare(&'a str),
}

impl<'a> FieldValue<'a> {
    /// Contents of a `{...}` or `"..."` value.
    pub fn delimited(self) -> Option<&'a str> {
        match self {
            Self::Braced(s) | Self::Quoted(s) => Some(s),
            Self::Bare(_) => None,
        }
    }

    pub fn text(self) -> &'a str {
        match self {
            Self::Braced(s) | Self::Quoted(s) | Self::Bare(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field<'a> {
    pub name: &'a str,
    pub value: FieldValue<'a>,
    /// Source text from the field name through the end of the value.
    pub raw: &'a str,
}

/// One `@type{...}` block, body excluding the outer delimiters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry<'a> {
    pub entry_type: &'a str,
    pub body: &'a str,
}

impl<'a> RawEntry<'a> {
    /// `@comment`, `@string` and `@preamble` blocks.
    pub fn is_pseudo(&self) -> bool {
        PSEUDO_ENTRY_TYPES
            .iter()
            .any(|t| self.entry_type.eq_ignore_ascii_case(t))
    }

    /// Citation key: the body up to the first comma.
    pub fn key(&self) -> &'a str {
        self.body.split(',').next().unwrap_or_default().trim()
    }

    pub fn fields(&self) -> Vec<Field<'a>> {
        match self.body.find(',') {
            Some(comma) => parse_fields(&self.body[comma + 1..]),
            None => Vec::new(),
        }
    }
}

/// Split a bibliography file into raw entries, in file order.
pub fn scan_entries(text: &str) -> Vec<RawEntry<'_>> {
    let bytes = text.as_bytes();
    let mut entries = Vec::new();
    let mut pos = 0;

    while let Some(offset) = text[pos..].find('@') {
        let at = pos + offset;
        let Some((entry_type, open)) = entry_header(text, at + 1) else {
            pos = at + 1;
            continue;
        };

        let close = if bytes[open] == b'(' { b')' } else { b'}' };
        let body_start = open + 1;
        let body_end = match find_closing(bytes, body_start, close) {
            Some(end) => end,
            None => {
                tracing::debug!(offset = at, entry_type, "unterminated entry");
                text[body_start..]
                    .find("\n@")
                    .map(|i| body_start + i)
                    .unwrap_or(text.len())
            }
        };

        entries.push(RawEntry {
            entry_type,
            body: &text[body_start..body_end],
        });
        pos = (body_end + 1).min(text.len());
    }

    entries
}

/// Parse `name = value` pairs separated by top-level commas.
pub fn parse_fields(s: &str) -> Vec<Field<'_>> {
    let bytes = s.as_bytes();
    let mut fields = Vec::new();
    let mut i = 0;

    loop {
        while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i] == b',') {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }

        let name_start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && !matches!(bytes[i], b'=' | b',' | b'{' | b'}' | b'"')
        {
            i += 1;
        }
        let name = &s[name_start..i];
        i = skip_whitespace(bytes, i);

        if name.is_empty() || bytes.get(i) != Some(&b'=') {
            tracing::debug!(field = name, "skipping malformed field");
            i = skip_to_next_field(bytes, i);
            continue;
        }

        i = skip_whitespace(bytes, i + 1);
        let Some((value, end)) = parse_value(s, i) else {
            tracing::debug!(field = name, "skipping field without a value");
            i = skip_to_next_field(bytes, i);
            continue;
        };

        fields.push(Field {
            name,
            value,
            raw: &s[name_start..end],
        });
        i = skip_to_next_field(bytes, end);
    }

    fields
}

fn entry_header(text: &str, start: usize) -> Option<(&str, usize)> {
    let bytes = text.as_bytes();
    let name_start = skip_whitespace(bytes, start);
    let mut i = name_start;
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || matches!(bytes[i], b'_' | b'-')) {
        i += 1;
    }
    if i == name_start || !bytes[name_start].is_ascii_alphabetic() {
        return None;
    }
    let name_end = i;
    let open = skip_whitespace(bytes, i);
    match bytes.get(open) {
        Some(b'{') | Some(b'(') => Some((&text[name_start..name_end], open)),
        _ => None,
    }
}

fn find_closing(bytes: &[u8], start: usize, close: u8) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_quote = false;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        match b {
            b'{' => depth += 1,
            b'}' if depth > 0 => depth -= 1,
            b'"' if depth == 0 => in_quote = !in_quote,
            _ if b == close && depth == 0 && !in_quote => return Some(i),
            _ => {}
        }
    }
    None
}

fn parse_value(s: &str, start: usize) -> Option<(FieldValue<'_>, usize)> {
    let bytes = s.as_bytes();
    match bytes.get(start)? {
        b'{' => {
            let close = matching_brace(bytes, start)?;
            Some((FieldValue::Braced(&s[start + 1..close]), close + 1))
        }
        b'"' => {
            let close = closing_quote(bytes, start + 1)?;
            Some((FieldValue::Quoted(&s[start + 1..close]), close + 1))
        }
        _ => {
            let mut end = start;
            while end < bytes.len()
                && !bytes[end].is_ascii_whitespace()
                && !matches!(bytes[end], b',' | b'#' | b'}' | b'"')
            {
                end += 1;
            }
            (end > start).then(|| (FieldValue::Bare(&s[start..end]), end))
        }
    }
}

fn matching_brace(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn closing_quote(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        match b {
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            b'"' if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

fn skip_to_next_field(bytes: &[u8], start: usize) -> usize {
    let mut depth = 0usize;
    let mut in_quote = false;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        match b {
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            b'"' if depth == 0 => in_quote = !in_quote,
            b',' if depth == 0 && !in_quote => return i + 1,
            _ => {}
        }
    }
    bytes.len()
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_entries_and_ignores_free_text() {
        let text = "Contact me at someone@example.org\n\
                    @article{a, title={One}}\n\
                    stray words\n\
                    @book{b, title={Two}}";
        let entries = scan_entries(text);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].entry_type, "article");
        assert_eq!(entries[0].key(), "a");
        assert_eq!(entries[1].key(), "b");
    }

    #[test]
    fn nested_braces_and_embedded_at_stay_inside_entry() {
        let text = "@misc{k, note = {mail {me}@host.org}, title = {T}}\n@misc{j, title={U}}";
        let entries = scan_entries(text);
        assert_eq!(entries.len(), 2);
        let fields = entries[0].fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].value, FieldValue::Braced("mail {me}@host.org"));
        assert_eq!(fields[1].name, "title");
    }

    #[test]
    fn parenthesised_entries() {
        let entries = scan_entries("@article(p, title = \"Paren (inner)\")");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key(), "p");
        assert_eq!(entries[0].fields()[0].value, FieldValue::Quoted("Paren (inner)"));
    }

    #[test]
    fn value_kinds_and_raw_spans() {
        let fields = parse_fields(" year = 2020, title = \"A {B} C\",\n month = jan ");
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].value, FieldValue::Bare("2020"));
        assert_eq!(fields[1].value, FieldValue::Quoted("A {B} C"));
        assert_eq!(fields[1].raw, "title = \"A {B} C\"");
        assert_eq!(fields[2].value.delimited(), None);
    }

    #[test]
    fn malformed_fields_are_skipped() {
        let fields = parse_fields("garbage, title = {Kept}, = {nameless}, author = {X}");
        let names: Vec<_> = fields.iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["title", "author"]);
    }

    #[test]
    fn unterminated_entry_ends_at_next_entry_line() {
        let text = "@article{broken, title = {Never closed\n@book{ok, title = {Fine}}";
        let entries = scan_entries(text);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].key(), "broken");
        assert_eq!(entries[1].key(), "ok");
    }

    #[test]
    fn pseudo_entries_are_recognised() {
        let text = "@String{jnl = \"Journal\"}\n@COMMENT{ anything @here }\n@preamble{\"x\"}";
        let entries = scan_entries(text);
        assert_eq!(entries.len(), 3);
        assert!(entries.iter().all(RawEntry::is_pseudo));
    }
}
