use serde::Serialize;
use std::collections::HashMap;

/// Year used when neither a `year` field nor a year-like number is found
pub const UNKNOWN_YEAR: &str = "Unknown";

/// Title used when an entry has no `title` field
pub const UNTITLED: &str = "Untitled";

/// Lowercased field name to cleaned value for a single entry
pub type FieldMap = HashMap<String, String>;

/// Normalized publication record, ready for sorting and rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Publication {
    /// Entry type (article, inproceedings, book, etc.)
    pub entry_type: String,
    /// Citation key from the bib file
    pub key: String,
    /// Resolved year, never empty
    pub year: String,
    pub title: String,
    /// Author list with " and " rewritten to ", "
    pub author: String,
    /// Journal, booktitle or publisher
    pub venue: String,
    /// Link target: explicit url, else a doi.org link, else empty
    pub url: String,
    /// Venue, volume, number and pages joined by ", "
    pub extra: String,
}

impl Publication {
    /// Build a record from parsed fields and an already resolved year
    pub fn from_fields(entry_type: String, key: String, year: String, fields: &FieldMap) -> Self {
        let title = fields
            .get("title")
            .cloned()
            .unwrap_or_else(|| UNTITLED.to_string());
        let author = fields
            .get("author")
            .map(|a| join_authors(a))
            .unwrap_or_default();
        let venue = resolve_venue(fields);
        let url = resolve_link(fields);
        let extra = describe_extra(&venue, fields);

        Self {
            entry_type,
            key,
            year,
            title,
            author,
            venue,
            url,
            extra,
        }
    }

    /// Year as a number when it is made only of ASCII digits
    pub fn numeric_year(&self) -> Option<NumericYear> {
        numeric_year(&self.year)
    }

    pub fn has_link(&self) -> bool {
        !self.url.is_empty()
    }
}

/// Digit-only year of any length, ordered by numeric value
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NumericYear {
    // Field order matters for the derived Ord: more digits is larger,
    // equal lengths compare as ASCII.
    len: usize,
    digits: String,
}

/// Parse a year string that consists solely of ASCII digits
pub fn numeric_year(year: &str) -> Option<NumericYear> {
    if year.is_empty() || !year.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let digits = year.trim_start_matches('0');
    Some(NumericYear {
        len: digits.len(),
        digits: digits.to_string(),
    })
}

/// Plain substring rewrite, not a name-list parse
pub fn join_authors(author: &str) -> String {
    author.replace(" and ", ", ")
}

fn non_empty<'a>(fields: &'a FieldMap, name: &str) -> Option<&'a str> {
    fields
        .get(name)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}

fn resolve_venue(fields: &FieldMap) -> String {
    ["journal", "booktitle", "publisher"]
        .iter()
        .find_map(|name| non_empty(fields, name))
        .unwrap_or_default()
        .to_string()
}

fn resolve_link(fields: &FieldMap) -> String {
    if let Some(url) = non_empty(fields, "url") {
        return url.to_string();
    }
    match non_empty(fields, "doi") {
        Some(doi) => format!("https://doi.org/{}", doi),
        None => String::new(),
    }
}

fn describe_extra(venue: &str, fields: &FieldMap) -> String {
    let mut parts = Vec::new();
    if !venue.is_empty() {
        parts.push(venue.to_string());
    }
    if let Some(volume) = non_empty(fields, "volume") {
        parts.push(format!("vol. {}", volume));
    }
    if let Some(number) = non_empty(fields, "number") {
        parts.push(format!("no. {}", number));
    }
    if let Some(pages) = non_empty(fields, "pages") {
        parts.push(format!("pp. {}", pages));
    }
    parts.join(", ")
}
