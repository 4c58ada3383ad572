use bib2html::render::RenderError;
use bib2html::{GeneratorConfig, OutputFormat, PublicationGenerator};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "bib2html")]
#[command(version = "0.1.0")]
#[command(about = "Render a BibTeX file as year-grouped HTML publication lists", long_about = None)]
struct Args {
    /// Input .bib file
    bib: PathBuf,

    /// Output format
    #[arg(long, short, value_enum, default_value_t = Format::Html)]
    format: Format,

    /// Verbose output (written to stderr)
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Html,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Html => OutputFormat::Html,
            Format::Json => OutputFormat::Json,
        }
    }
}

fn main() -> ExitCode {
    // Usage errors exit with 1, help and version with 0
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // Initialize logging; stdout carries the rendered output
    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("bib2html=debug")
            .with_writer(io::stderr)
            .init();
    }

    if !args.bib.exists() {
        eprintln!("{} File not found: {}", "Error:".red().bold(), args.bib.display());
        return ExitCode::FAILURE;
    }

    let generator = PublicationGenerator::new(GeneratorConfig {
        format: args.format.into(),
    });

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    let result = generator
        .generate_from_file(&args.bib, &mut out)
        .and_then(|count| {
            out.flush().map_err(RenderError::from)?;
            Ok(count)
        });

    match result {
        Ok(count) => {
            debug!("Wrote {} publications", count);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
