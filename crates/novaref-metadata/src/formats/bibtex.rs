//! Layout of fetched records before they are appended to a `.bib` file.

use novaref_core::bibliography::scan::scan_entries;

const INDENT: &str = "  ";

/// Lay a record out one field per line: the `@type{key,` line and the
/// closing `}` line flush left, every other line indented by two spaces.
///
/// Records delivered on a single line are split into fields first.
pub fn format_record(raw: &str) -> String {
    let raw = raw.trim();
    let lines = if raw.lines().count() == 1 {
        split_single_line(raw).unwrap_or_else(|| vec![raw.to_string()])
    } else {
        raw.lines().map(str::to_string).collect()
    };

    let mut out = String::new();
    for line in &lines {
        let line = line.trim();
        if line.is_empty() {
            // blank lines inside multi-line values are kept
            out.push('\n');
            continue;
        }
        if !is_flush_line(line) {
            out.push_str(INDENT);
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Citation key of the first entry in a record.
pub fn record_key(raw: &str) -> Option<String> {
    scan_entries(raw)
        .into_iter()
        .find(|entry| !entry.is_pseudo())
        .map(|entry| entry.key().to_string())
        .filter(|key| !key.is_empty())
}

/// Split a one-line record at its top-level commas. Every byte of the
/// body ends up in some line, so values the field parser does not
/// understand (`#` concatenation, empty values) are carried through.
fn split_single_line(raw: &str) -> Option<Vec<String>> {
    let entry = scan_entries(raw).into_iter().next()?;
    let mut parts = split_top_level(entry.body)
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty());
    let key = parts.next()?;
    let fields: Vec<&str> = parts.collect();
    if fields.is_empty() {
        return None;
    }

    let mut lines = Vec::with_capacity(fields.len() + 2);
    lines.push(format!("@{}{{{},", entry.entry_type, key));
    let last = fields.len() - 1;
    for (i, field) in fields.iter().enumerate() {
        let sep = if i == last { "" } else { "," };
        lines.push(format!("{field}{sep}"));
    }
    lines.push("}".to_string());
    Some(lines)
}

fn split_top_level(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut start = 0;
    for (i, b) in body.bytes().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            b'"' if depth == 0 => in_quote = !in_quote,
            b',' if depth == 0 && !in_quote => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[start..]);
    parts
}

fn is_flush_line(line: &str) -> bool {
    line == "}" || is_header_line(line)
}

fn is_header_line(line: &str) -> bool {
    let Some(rest) = line.strip_prefix('@') else {
        return false;
    };
    let name_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    name_len > 0 && rest[name_len..].trim_start().starts_with(['{', '('])
}
