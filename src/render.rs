use crate::entry::Publication;
use crate::group::YearBucket;
use std::io::Write;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize publications: {0}")]
    Json(#[from] serde_json::Error),
}

const SECTION_SPACING: &str = " style=\"margin-top:14px;\"";

/// Escape text for use in HTML content and double-quoted attributes
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Format the inner HTML of one list item
pub fn format_citation(publication: &Publication) -> String {
    let title = html_escape(&publication.title);

    let mut parts = Vec::new();
    if publication.has_link() {
        parts.push(format!(
            "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\"><strong>{}</strong></a>",
            html_escape(&publication.url),
            title
        ));
    } else {
        parts.push(format!("<strong>{}</strong>", title));
    }

    if !publication.author.is_empty() {
        parts.push(format!("— {}.", html_escape(&publication.author)));
    }
    if !publication.extra.is_empty() {
        parts.push(format!("<em>{}</em>.", html_escape(&publication.extra)));
    }

    parts.join(" ")
}

/// Write one `<section class="card">` per bucket, no document wrapper
pub fn render_html<W: Write>(buckets: &[YearBucket], out: &mut W) -> Result<(), RenderError> {
    for (i, bucket) in buckets.iter().enumerate() {
        let spacing = if i == 0 { "" } else { SECTION_SPACING };
        writeln!(out, "<section class=\"card\"{}>", spacing)?;
        writeln!(out, "  <h2>{}</h2>", html_escape(&bucket.year))?;
        writeln!(out, "  <ul class=\"pub-list\">")?;
        for publication in &bucket.publications {
            writeln!(out, "    <li>{}</li>", format_citation(publication))?;
        }
        writeln!(out, "  </ul>")?;
        writeln!(out, "</section>")?;
        writeln!(out)?;
    }
    Ok(())
}

/// Write the buckets as a pretty-printed JSON array
pub fn render_json<W: Write>(buckets: &[YearBucket], out: &mut W) -> Result<(), RenderError> {
    serde_json::to_writer_pretty(&mut *out, buckets)?;
    writeln!(out)?;
    Ok(())
}
