//! CLI: validate documents against a schema, or print them with defaults filled in.
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use rayon::prelude::*;
use serde_json::json;

use confcheck::document::dump;
use confcheck::{Document, Error, SchemaValidator, ValidationResult, ValidatorOptions};

pub const EXIT_INVALID: u8 = 1;
pub const EXIT_LOAD_ERROR: u8 = 2;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// validate JSON configuration files against a JSON schema, and fill in schema defaults
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// validate one or more documents and print a report per document
    Validate(ValidateCmd),
    /// print a document with schema defaults applied
    Defaults(DefaultsCmd),
}

#[derive(Args, Debug, Clone)]
struct SchemaSettings {
    /// JSON schema file
    #[arg(long, short)]
    schema: PathBuf,

    /// validator options (JSON); see `ValidatorOptions`
    #[arg(long)]
    options: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum Format {
    #[default]
    Text,
    Json,
}

#[derive(clap::Parser, Debug)]
struct ValidateCmd {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// JSON Pointer to select a subnode in each document (e.g. /services/api)
    #[arg(long)]
    json_pointer: Option<String>,

    /// validate documents as written, without applying defaults first
    #[arg(long, default_value_t = false)]
    no_defaults: bool,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(clap::Parser, Debug)]
struct DefaultsCmd {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// input document
    #[arg(long, short)]
    input: PathBuf,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

/// Outcome for one input file.
struct FileReport {
    path: PathBuf,
    outcome: Result<ValidationResult, Error>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl SchemaSettings {
    fn load(&self) -> anyhow::Result<SchemaValidator> {
        let (schema, _) = load_document(&self.schema)
            .with_context(|| format!("loading schema {}", self.schema.display()))?;
        let options = match self.options.as_ref() {
            Some(path) => ValidatorOptions::load(path)
                .with_context(|| format!("loading options {}", path.display()))?,
            None => ValidatorOptions::default(),
        };
        Ok(SchemaValidator::with_options(schema, options))
    }
}

impl ValidateCmd {
    fn check_file(&self, validator: &SchemaValidator, path: &Path) -> Result<ValidationResult, Error> {
        let (document, source) = load_document(path)?;
        // line lookup only makes sense against the whole file
        let (data, source) = match self.json_pointer.as_deref() {
            Some(pointer) => {
                let node = document.pointer(pointer).cloned().ok_or_else(|| Error::PointerNotFound {
                    pointer: pointer.to_string(),
                    origin: path.display().to_string(),
                })?;
                (node, None)
            }
            None => (document, Some(source.as_str())),
        };
        tracing::debug!(path = %path.display(), "validating");
        let result = if self.no_defaults {
            validator.validate_all(&data, source)
        } else {
            validator.check(&data, source).1
        };
        Ok(result)
    }

    fn run(&self) -> anyhow::Result<ExitCode> {
        let validator = self.schema_settings.load()?;
        let paths = resolve_file_path_patterns(&self.input).context("resolving inputs")?;

        let reports: Vec<FileReport> = paths
            .par_iter()
            .map(|path| FileReport { path: path.clone(), outcome: self.check_file(&validator, path) })
            .collect();

        match self.format {
            Format::Text => print_text(&reports),
            Format::Json => print_json(&reports)?,
        }

        let code = if reports.iter().any(|r| r.outcome.is_err()) {
            EXIT_LOAD_ERROR
        } else if reports.iter().any(|r| r.outcome.as_ref().is_ok_and(|res| !res.is_valid())) {
            EXIT_INVALID
        } else {
            0
        };
        Ok(ExitCode::from(code))
    }
}

impl DefaultsCmd {
    fn run(&self) -> anyhow::Result<ExitCode> {
        let validator = self.schema_settings.load()?;
        let (data, _) = load_document(&self.input)
            .with_context(|| format!("loading {}", self.input.display()))?;
        let populated = validator.set_defaults(&data);
        let rendered = dump::dump(&populated);
        match self.out.as_ref() {
            Some(out) => {
                if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("creating {}", parent.display()))?;
                }
                std::fs::write(out, format!("{rendered}\n"))
                    .with_context(|| format!("writing {}", out.display()))?;
            }
            None => println!("{rendered}"),
        }
        Ok(ExitCode::SUCCESS)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> anyhow::Result<ExitCode> {
        match &self.cmd {
            Command::Validate(target) => target.run(),
            Command::Defaults(target) => target.run(),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn load_document(path: &Path) -> confcheck::Result<(Document, String)> {
    let source = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let document = Document::from_json_str(&source, &path.display().to_string())?;
    Ok((document, source))
}

fn print_text(reports: &[FileReport]) {
    for report in reports {
        println!("{}", report.path.display().to_string().bold());
        match &report.outcome {
            Err(error) => println!("{} {error}", "error:".red().bold()),
            Ok(result) => {
                let text = result.format();
                let (headline, rest) = text.split_once('\n').unwrap_or((text.as_str(), ""));
                let headline = if !result.is_valid() {
                    headline.red().bold()
                } else if result.diagnostics().is_empty() {
                    headline.green().bold()
                } else {
                    headline.yellow().bold()
                };
                println!("{headline}");
                if !rest.is_empty() {
                    println!("{rest}");
                }
            }
        }
    }
}

fn print_json(reports: &[FileReport]) -> anyhow::Result<()> {
    let entries: Vec<serde_json::Value> = reports
        .iter()
        .map(|report| {
            let file = report.path.display().to_string();
            match &report.outcome {
                Ok(result) => json!({
                    "file": file,
                    "valid": result.is_valid(),
                    "diagnostics": result.diagnostics(),
                }),
                Err(error) => json!({"file": file, "error": error.to_string()}),
            }
        })
        .collect();
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &entries)?;
    writeln!(stdout)?;
    Ok(())
}

fn resolve_file_path_patterns<I>(patterns: I) -> confcheck::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                return Err(Error::NoMatches(pattern.to_string()));
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
