pub mod entry;
pub mod group;
pub mod parser;
pub mod render;

use group::YearBucket;
use parser::ParseError;
use render::RenderError;
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `<section class="card">` fragments for embedding in a page
    #[default]
    Html,
    /// Grouped publications as JSON
    Json,
}

/// Configuration for the generator
#[derive(Debug, Clone, Default)]
pub struct GeneratorConfig {
    pub format: OutputFormat,
}

/// Runs parse, sort, group and render over a bibliography
pub struct PublicationGenerator {
    config: GeneratorConfig,
}

impl PublicationGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// Read a .bib file and write the rendered output.
    ///
    /// Nothing is written if the file cannot be read. Returns the number of
    /// publications rendered.
    pub fn generate_from_file<W: Write>(&self, path: &Path, out: &mut W) -> Result<usize, Error> {
        let publications = parser::parse_bib_file(path)?;
        self.render(group::arrange(publications), out)
    }

    /// Render BibTeX text. Returns the number of publications rendered.
    pub fn generate<W: Write>(&self, content: &str, out: &mut W) -> Result<usize, Error> {
        self.render(collect_publications(content), out)
    }

    fn render<W: Write>(&self, buckets: Vec<YearBucket>, out: &mut W) -> Result<usize, Error> {
        let count = buckets.iter().map(|b| b.publications.len()).sum();
        debug!("Rendering {} publications in {} year groups", count, buckets.len());

        match self.config.format {
            OutputFormat::Html => render::render_html(&buckets, out)?,
            OutputFormat::Json => render::render_json(&buckets, out)?,
        }
        Ok(count)
    }
}

/// Parse BibTeX text into sorted year buckets
pub fn collect_publications(content: &str) -> Vec<YearBucket> {
    group::arrange(parser::parse_bib_string(content))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate_html(content: &str) -> String {
        let generator = PublicationGenerator::new(GeneratorConfig::default());
        let mut out = Vec::new();
        generator.generate(content, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    const SAMPLE: &str = r#"
@article{zebra2021,
  title = {Zebra},
  author = {Z. Zed},
  year = {2021},
}

@misc{nodate,
  title = {Timeless Notes},
  note = {no date given}
}

@inproceedings{apple2021,
  title = {Apple},
  booktitle = {Proc. of Fruit},
  pages = {1--2},
  year = 2021
}

@book{old,
  title = {Old Book},
  publisher = {Press},
  note = {Reprinted 1998}
}

@article{new2023,
  title = {Newer & <Better>},
  doi = {10.1/xyz},
  year = {2023}
}
"#;

    #[test]
    fn test_worked_example() {
        let html = generate_html(
            "@article{x2020, title={Hello World}, author={A and B}, year={2020}, url={http://ex.com}}",
        );
        let expected = concat!(
            "<section class=\"card\">\n",
            "  <h2>2020</h2>\n",
            "  <ul class=\"pub-list\">\n",
            "    <li><a href=\"http://ex.com\" target=\"_blank\" rel=\"noopener noreferrer\"><strong>Hello World</strong></a> — A, B.</li>\n",
            "  </ul>\n",
            "</section>\n",
            "\n",
        );
        assert_eq!(html, expected);
    }

    #[test]
    fn test_bucket_order_and_title_order() {
        let html = generate_html(SAMPLE);

        let pos = |needle: &str| html.find(needle).unwrap_or_else(|| panic!("missing {needle}"));
        assert!(pos("<h2>2023</h2>") < pos("<h2>2021</h2>"));
        assert!(pos("<h2>2021</h2>") < pos("<h2>1998</h2>"));
        assert!(pos("<h2>1998</h2>") < pos("<h2>Unknown</h2>"));
        assert!(pos("<strong>Apple</strong>") < pos("<strong>Zebra</strong>"));
        assert!(pos("<h2>Unknown</h2>") < pos("<strong>Timeless Notes</strong>"));

        // Only the first section has no spacing
        assert_eq!(html.matches("<section class=\"card\">").count(), 1);
        assert_eq!(
            html.matches("<section class=\"card\" style=\"margin-top:14px;\">").count(),
            3
        );
    }

    #[test]
    fn test_doi_link_and_escaping() {
        let html = generate_html(SAMPLE);
        assert!(html.contains(
            "<a href=\"https://doi.org/10.1/xyz\" target=\"_blank\" rel=\"noopener noreferrer\"><strong>Newer &amp; &lt;Better&gt;</strong></a>"
        ));
        assert!(!html.contains("<Better>"));
        assert!(html.contains("<em>Proc. of Fruit, pp. 1--2</em>."));
    }

    #[test]
    fn test_output_is_deterministic() {
        assert_eq!(generate_html(SAMPLE), generate_html(SAMPLE));
    }

    #[test]
    fn test_malformed_input_still_renders() {
        let html = generate_html("@article{broken,\n  title = {Never closed\n");
        assert!(html.contains("<h2>Unknown</h2>"));
        assert!(html.contains("<strong>Never closed</strong>"));

        assert_eq!(generate_html("no entries here"), "");
    }

    #[test]
    fn test_collect_publications_counts() {
        let buckets = collect_publications(SAMPLE);
        let years: Vec<_> = buckets.iter().map(|b| b.year.as_str()).collect();
        assert_eq!(years, vec!["2023", "2021", "1998", "Unknown"]);
        let total: usize = buckets.iter().map(|b| b.publications.len()).sum();
        assert_eq!(total, 5);
    }

    #[test]
    fn test_generate_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let generator = PublicationGenerator::new(GeneratorConfig {
            format: OutputFormat::Json,
        });
        let mut out = Vec::new();
        let count = generator.generate_from_file(file.path(), &mut out).unwrap();
        assert_eq!(count, 5);

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value[0]["year"], "2023");
        assert_eq!(value[0]["publications"][0]["url"], "https://doi.org/10.1/xyz");
    }

    #[test]
    fn test_unreadable_file_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let generator = PublicationGenerator::new(GeneratorConfig::default());
        let mut out = Vec::new();

        let err = generator
            .generate_from_file(&dir.path().join("absent.bib"), &mut out)
            .unwrap_err();
        assert!(matches!(err, Error::Parse(ParseError::Read { .. })));
        assert!(out.is_empty());
    }
}
