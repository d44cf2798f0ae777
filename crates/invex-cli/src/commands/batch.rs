//! Batch processing command for multiple invoice PDFs.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use invex_core::export;
use invex_core::models::config::InvexConfig;
use invex_core::models::invoice::Extraction;

use super::{extract_document, load_config, raw_fallback, read_pdf_text};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory for the export bundle
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Abort on the first failure instead of continuing with the rest
    #[arg(long)]
    fail_fast: bool,

    /// Write only the combined CSV, no per-invoice files
    #[arg(long)]
    combined_only: bool,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    extraction: Option<Extraction>,
    error: Option<String>,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    // Expand glob pattern
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching PDF files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    // Strictly sequential: the model call for one file completes before the
    // next file is touched.
    let client = reqwest::Client::new();
    let mut results = Vec::with_capacity(files.len());

    for path in files {
        match process_file(&client, &config, &path, args.fail_fast).await {
            Ok(extraction) => {
                results.push(ProcessResult {
                    path,
                    extraction: Some(extraction),
                    error: None,
                });
            }
            Err(e) => {
                if args.fail_fast {
                    pb.abandon();
                    return Err(e.context(format!("while processing {}", path.display())));
                }
                warn!("Failed to process {}: {}", path.display(), e);
                results.push(ProcessResult {
                    path,
                    extraction: None,
                    error: Some(e.to_string()),
                });
            }
        }
        pb.inc(1);
    }

    pb.finish_with_message("Complete");

    let records: Vec<Extraction> = results
        .iter()
        .filter_map(|r| r.extraction.clone())
        .collect();
    let structured = records.iter().filter(|r| !r.is_unclassified()).count();
    let fallbacks = records.len() - structured;
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    let bundle = export::build_bundle(&records)?;
    let base_dir = args
        .output_dir
        .unwrap_or_else(|| config.export.output_dir.clone());
    let per_invoice = config.export.per_invoice && !args.combined_only;
    let session_dir = bundle.write_to(&base_dir, per_invoice)?;

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} structured, {} raw-text fallback, {} failed",
        style(structured).green(),
        style(fallbacks).yellow(),
        style(failed.len()).red()
    );
    println!(
        "{} Export written to {}",
        style("✓").green(),
        session_dir.display()
    );

    if fallbacks > 0 {
        println!();
        println!("{}", style("Raw-text fallbacks:").yellow());
        for result in &results {
            if result.extraction.as_ref().is_some_and(Extraction::is_unclassified) {
                println!("  - {}", result.path.display());
            }
        }
    }

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

/// Process one file. A model-call failure degrades to the raw-text fallback
/// for that file unless `fail_fast` is set; PDF read failures always error.
async fn process_file(
    client: &reqwest::Client,
    config: &InvexConfig,
    path: &Path,
    fail_fast: bool,
) -> anyhow::Result<Extraction> {
    let text = read_pdf_text(path)?;

    match extract_document(client, config, &text).await {
        Ok(extraction) => Ok(extraction),
        Err(e) if !fail_fast => {
            warn!(
                "Model call failed for {}: {}; falling back to raw text",
                path.display(),
                e
            );
            Ok(raw_fallback(config, &text))
        }
        Err(e) => Err(e.into()),
    }
}
