//! Process command - rebuild invoice records from an OCR cache file.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use hospinv_core::{DocumentOptions, HospitalInvoiceParser, HospinvConfig, OcrCache};

use super::config::load_config;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// OCR cache file (`{"results": [page, ...]}`)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Process at most this many pages (0 = all)
    #[arg(long)]
    max_pages: Option<usize>,

    /// Write compact JSON
    #[arg(long)]
    compact: bool,

    /// Abort on the first page that fails
    #[arg(long)]
    fail_fast: bool,
}

impl ProcessArgs {
    /// Apply command-line overrides on top of the loaded configuration.
    fn apply(&self, mut config: HospinvConfig) -> HospinvConfig {
        if let Some(max_pages) = self.max_pages {
            config.input.max_pages = max_pages;
        }
        if self.compact {
            config.output.pretty = false;
        }
        if self.fail_fast {
            config.output.continue_on_error = false;
        }
        config
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = args.apply(load_config(config_path)?);
    config.validate()?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing OCR cache: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Loading OCR cache...");

    let content = tokio::fs::read_to_string(&args.input)
        .await
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let pages = OcrCache::from_json(&content)
        .with_context(|| format!("Invalid OCR cache {}", args.input.display()))?
        .into_pages()?;
    debug!("OCR cache has {} pages", pages.len());

    pb.set_message(format!("Extracting {} pages...", pages.len()));

    let parser = HospitalInvoiceParser::from_config(&config);
    let result = parser.extract_document(&pages, &DocumentOptions::from_config(&config));

    pb.finish_and_clear();
    let result = result?;

    let output = if config.output.pretty {
        serde_json::to_string_pretty(&result.records)?
    } else {
        serde_json::to_string(&result.records)?
    };

    if let Some(output_path) = &args.output {
        tokio::fs::write(output_path, &output).await?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    eprintln!(
        "{} Extracted {} records, skipped {} pages",
        style("ℹ").blue(),
        style(result.records.len()).green(),
        style(result.failures.len()).red()
    );
    for failure in &result.failures {
        eprintln!("  {} page {}: {}", style("✗").red(), failure.page, failure.error);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}
