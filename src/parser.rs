use crate::entry::{FieldMap, Publication, UNKNOWN_YEAR};
use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to read {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

lazy_static! {
    // @type{key,
    static ref HEADER_REGEX: Regex = Regex::new(r"^@(\w+)\s*\{\s*([^,]+)\s*,").unwrap();

    // name = value, with an optional trailing comma
    static ref FIELD_REGEX: Regex =
        Regex::new(r"^\s*([a-zA-Z]+)\s*=\s*(.+?)\s*,?\s*$").unwrap();

    static ref FIELD_START_REGEX: Regex = Regex::new(r"^\s*[a-zA-Z]+\s*=").unwrap();

    static ref YEAR_REGEX: Regex = Regex::new(r"\b(19\d{2}|20\d{2})\b").unwrap();

    static ref WHITESPACE_REGEX: Regex = Regex::new(r"\s+").unwrap();

    // Every line boundary, including bare CR and the Unicode separators
    static ref LINE_BREAK_REGEX: Regex =
        Regex::new(r"\r\n|[\n\r\x0b\x0c\x1c-\x1e\x{85}\x{2028}\x{2029}]").unwrap();
}

/// Parse a .bib file and return one publication per entry
pub fn parse_bib_file(path: &Path) -> Result<Vec<Publication>, ParseError> {
    let content = fs::read_to_string(path).map_err(|source| ParseError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_bib_string(&content))
}

/// Parse BibTeX text. Never fails: irregular input degrades to defaults.
pub fn parse_bib_string(content: &str) -> Vec<Publication> {
    let entries = split_entries(content);
    debug!("Found {} raw entries", entries.len());
    entries.iter().map(|raw| parse_entry(raw)).collect()
}

/// Split text into raw entry chunks using a running brace depth.
///
/// A line starting with `@` opens an entry. The entry closes once the
/// depth is back to zero or below on a line ending with `}`. Unbalanced
/// input may swallow the following entries or run to end of input.
pub fn split_entries(content: &str) -> Vec<String> {
    let mut entries = Vec::new();
    let mut buffer: Vec<&str> = Vec::new();
    let mut depth: i64 = 0;
    let mut in_entry = false;

    for line in split_lines(content) {
        let stripped = line.trim();

        if stripped.starts_with('@') {
            flush(&mut buffer, &mut entries);
            in_entry = true;
            depth = 0;
        }

        if in_entry {
            buffer.push(line);
            depth += brace_balance(line);
            if depth <= 0 && stripped.ends_with('}') {
                flush(&mut buffer, &mut entries);
                in_entry = false;
            }
        }
    }
    flush(&mut buffer, &mut entries);

    entries.retain(|entry| entry.starts_with('@'));
    entries
}

/// Split text into lines on any line boundary.
///
/// A trailing boundary does not produce a final empty line.
pub fn split_lines(content: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = LINE_BREAK_REGEX.split(content).collect();
    if lines.last().is_some_and(|last| last.is_empty()) {
        lines.pop();
    }
    lines
}

fn flush(buffer: &mut Vec<&str>, entries: &mut Vec<String>) {
    if !buffer.is_empty() {
        entries.push(buffer.join("\n").trim().to_string());
        buffer.clear();
    }
}

fn brace_balance(line: &str) -> i64 {
    line.chars().fold(0, |acc, c| match c {
        '{' => acc + 1,
        '}' => acc - 1,
        _ => acc,
    })
}

/// Parse one raw entry into a publication
pub fn parse_entry(raw: &str) -> Publication {
    let lines = split_lines(raw);
    let header = lines.first().copied().unwrap_or_default().trim();

    let (entry_type, key, header_rest) = match HEADER_REGEX.captures(header) {
        Some(caps) => (
            caps[1].to_lowercase(),
            caps[2].trim().to_string(),
            &header[caps[0].len()..],
        ),
        None => {
            debug!("Unrecognized entry header {:?}, using misc", header);
            ("misc".to_string(), String::new(), header)
        }
    };

    let mut fields = FieldMap::new();
    for segment in split_assignments(header_rest) {
        insert_field(&mut fields, segment);
    }
    for line in lines.iter().skip(1) {
        insert_field(&mut fields, line);
    }
    let year = resolve_year(&fields, raw);

    Publication::from_fields(entry_type, key, year, &fields)
}

/// Record a `name = value` line, overwriting an earlier field of the same name
fn insert_field(fields: &mut FieldMap, line: &str) {
    if let Some(caps) = FIELD_REGEX.captures(line) {
        fields.insert(caps[1].to_lowercase(), clean_value(&caps[2]));
    }
}

/// Split the text after an entry header at top-level commas that are
/// followed by another assignment.
///
/// Commas inside braces or double quotes, or followed by anything other
/// than `name =`, stay part of the value.
fn split_assignments(line: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth: i64 = 0;
    let mut in_quotes = false;
    let mut start = 0;

    for (idx, c) in line.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth -= 1,
            '"' if depth <= 0 => in_quotes = !in_quotes,
            ',' if depth <= 0 && !in_quotes => {
                if FIELD_START_REGEX.is_match(&line[idx + 1..]) {
                    segments.push(&line[start..idx]);
                    start = idx + 1;
                }
            }
            _ => {}
        }
    }
    segments.push(&line[start..]);
    segments
}

/// Normalize a raw field value.
///
/// Drops one level of surrounding braces, then one level of surrounding
/// quotes, collapses whitespace and removes any remaining brace characters.
pub fn clean_value(raw: &str) -> String {
    let mut value = raw.trim();
    value = strip_pair(value, '{', '}');
    value = strip_pair(value, '"', '"');

    let collapsed = WHITESPACE_REGEX.replace_all(value, " ");
    collapsed.trim().replace(['{', '}'], "")
}

fn strip_pair(value: &str, open: char, close: char) -> &str {
    if value.starts_with(open) && value.ends_with(close) {
        // A lone quote is both the opener and the closer
        value
            .get(open.len_utf8()..value.len().saturating_sub(close.len_utf8()))
            .unwrap_or_default()
    } else {
        value
    }
}

/// Year field if set, else the first 1900-2099 number anywhere in the entry
fn resolve_year(fields: &FieldMap, raw: &str) -> String {
    if let Some(year) = fields.get("year").filter(|year| !year.is_empty()) {
        return year.clone();
    }
    match YEAR_REGEX.find(raw) {
        Some(found) => {
            debug!("No year field, using {} found in entry text", found.as_str());
            found.as_str().to_string()
        }
        None => UNKNOWN_YEAR.to_string(),
    }
}
