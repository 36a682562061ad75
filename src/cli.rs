//! CLI: check documents against a catalog, or convert them between formats.
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use rayon::prelude::*;
use tracing::{debug, info};

// Parsing and decoding recurse once per nesting level; pool threads get the
// stack a main thread would have rather than the 2 MiB default.
const WORKER_STACK_SIZE: usize = 16 * 1024 * 1024;

use config_loader::catalog::Catalog;
use config_loader::lower::{SchemaSet, lower_catalog};
use config_loader::{DynRecord, Error, Json, Loader, Options, SchemaRef, Status, Xml};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// load XML/JSON configuration documents against a schema catalog
#[derive(Parser, Debug)]
#[command(name = "config-loader", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// load every input and report its status code
    Check(CheckCmd),
    /// load one document and write it back in another format
    Convert(ConvertCmd),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Xml,
    Json,
}

#[derive(Args, Debug, Clone)]
struct SchemaSettings {
    /// JSON schema catalog declaring the record types
    #[arg(long, short)]
    schema: PathBuf,

    /// record to load documents as (defaults to the catalog's root)
    #[arg(long)]
    root: Option<String>,

    /// deepest node nesting accepted
    #[arg(long, default_value_t = config_loader::DEFAULT_MAX_DEPTH)]
    max_depth: usize,
}

#[derive(clap::Parser, Debug)]
struct CheckCmd {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// document format (guessed from each file extension if omitted)
    #[arg(long, short)]
    format: Option<Format>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct ConvertCmd {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// input format (guessed from the file extension if omitted)
    #[arg(long)]
    from: Option<Format>,

    /// output format
    #[arg(long)]
    to: Format,

    /// input document
    #[arg(long, short)]
    input: PathBuf,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Format {
    fn guess(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "xml" => Some(Self::Xml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    fn resolve(explicit: Option<Self>, path: &Path) -> anyhow::Result<Self> {
        match explicit.or_else(|| Self::guess(path)) {
            Some(format) => Ok(format),
            None => bail!("cannot tell the format of {}; pass it explicitly", path.display()),
        }
    }

    fn load(self, options: &Options, record: &mut DynRecord, path: &Path) -> Result<(), Error> {
        match self {
            Self::Xml => Loader::new(Xml).with_options(options.clone()).load_file(record, path),
            Self::Json => Loader::new(Json).with_options(options.clone()).load_file(record, path),
        }
    }

    fn save(self, record: &DynRecord) -> Result<String, Error> {
        match self {
            Self::Xml => config_loader::save_to_text(Xml, record),
            Self::Json => config_loader::save_to_text(Json, record),
        }
    }
}

impl SchemaSettings {
    fn load(&self) -> anyhow::Result<(SchemaRef, Options)> {
        let catalog = Catalog::from_file(&self.schema)?;
        let schemas: SchemaSet = lower_catalog(&catalog)
            .with_context(|| format!("in catalog {}", self.schema.display()))?;
        let root = schemas.root(self.root.as_deref())?;
        debug!(root = root.get().name(), "schema ready");
        Ok((root, Options { max_depth: self.max_depth }))
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> anyhow::Result<ExitCode> {
        match &self.cmd {
            Command::Check(target) => target.run(),
            Command::Convert(target) => target.run(),
        }
    }
}

impl CheckCmd {
    fn run(&self) -> anyhow::Result<ExitCode> {
        let (root, options) = self.schema_settings.load()?;
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        info!(files = source_paths.len(), "checking");

        let pool = rayon::ThreadPoolBuilder::new()
            .stack_size(WORKER_STACK_SIZE)
            .build()
            .context("failed to start worker threads")?;

        // One parser per file; reports come back in input order.
        let reports = pool.install(|| {
            source_paths
                .par_iter()
                .map(|path| -> anyhow::Result<Result<(), Error>> {
                    let format = Format::resolve(self.format, path)?;
                    let mut record = DynRecord::new(root.clone());
                    Ok(format.load(&options, &mut record, path))
                })
                .collect::<Vec<_>>()
        });

        let mut failures = 0usize;
        for (path, report) in source_paths.iter().zip(reports) {
            let path = path.display();
            match report {
                Ok(Ok(())) => println!("{} {path}", Status::Success.code().green()),
                Ok(Err(error)) => {
                    failures += 1;
                    println!("{} {path}: {error}", error.status().code().red().bold());
                }
                Err(error) => {
                    failures += 1;
                    println!("{} {path}: {error:#}", "ERROR".red().bold());
                }
            }
        }
        if failures > 0 {
            eprintln!("{}", format!("{failures} of {} files failed", source_paths.len()).red());
            return Ok(ExitCode::FAILURE);
        }
        Ok(ExitCode::SUCCESS)
    }
}

impl ConvertCmd {
    fn run(&self) -> anyhow::Result<ExitCode> {
        let (root, options) = self.schema_settings.load()?;
        let from = Format::resolve(self.from, &self.input)?;
        let mut record = DynRecord::new(root);
        from.load(&options, &mut record, &self.input)
            .with_context(|| format!("failed to load {}", self.input.display()))?;
        let text = self.to.save(&record).context("failed to write document")?;

        if let Some(out) = self.out.as_ref() {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(out, &text)
                .with_context(|| format!("failed to write {}", out.display()))?;
        } else {
            println!("{text}");
        }
        Ok(ExitCode::SUCCESS)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
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
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
