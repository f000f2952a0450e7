//! Expand command
//!
//! Reads a dictionary source, expands every entry in parallel and writes the
//! result in the requested format.

use anyhow::{Context, Result};
use dictgen_core::{FallbackPolicy, parse_dictionary, process_batch};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::OutputFormat;
use crate::commands::load_config;
use crate::output::{ExpandSummary, OutputFormatter};

/// Arguments of `dictgen expand`
#[derive(Debug)]
pub struct ExpandArgs {
    pub input: PathBuf,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub target: Option<String>,
    pub max_depth: Option<usize>,
    pub fallback: Option<FallbackPolicy>,
    pub strict: bool,
}

impl ExpandArgs {
    fn reads_stdin(&self) -> bool {
        self.input.as_os_str() == "-"
    }

    /// Directory config discovery starts from
    fn start_dir(&self) -> PathBuf {
        if self.reads_stdin() {
            return PathBuf::from(".");
        }
        match self.input.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

/// Expand command implementation
pub fn expand_command(args: ExpandArgs, config_path: Option<PathBuf>) -> Result<()> {
    debug!("Running expand command: {:?}", args);

    let mut config = load_config(config_path.as_deref(), &args.start_dir())?;
    if let Some(target) = &args.target {
        config.engine.target = Some(target.clone());
    }
    if let Some(max_depth) = args.max_depth {
        config.engine.max_depth = max_depth;
    }
    if let Some(policy) = args.fallback {
        config.fallback.policy = policy;
    }

    let pipeline = config.build_pipeline()?;
    for warning in pipeline.registry().warnings() {
        warn!("{}", warning);
    }

    let source = read_source(&args)?;
    let started = Instant::now();

    let parse = parse_dictionary(&source, config.engine.target.as_deref());
    let report = process_batch(&pipeline, parse.records);
    let elapsed = started.elapsed();

    // Colors never go to files
    if args.output.is_some() {
        colored::control::set_override(false);
    }

    let formatter = OutputFormatter::new(args.format);
    let rendered = formatter.render(&report)?;
    match &args.output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write output to '{}'", path.display()))?;
            info!("Wrote {} entries to {}", report.entries.len(), path.display());
        }
        None => print!("{rendered}"),
    }

    let summary = ExpandSummary {
        entries: report.entries.len(),
        failures: report.failures.len(),
        diagnostics: parse.diagnostics.len(),
        elapsed,
    };
    formatter.print_summary(&summary, &report, &parse.diagnostics);

    if summary.failures > 0 || (args.strict && summary.diagnostics > 0) {
        std::process::exit(1);
    }

    Ok(())
}

fn read_source(args: &ExpandArgs) -> Result<String> {
    if args.reads_stdin() {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .context("Failed to read dictionary from stdin")?;
        return Ok(source);
    }
    read_file(&args.input)
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("Failed to read dictionary '{}'", path.display()))
}
