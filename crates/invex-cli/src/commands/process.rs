//! Process command - extract data from a single invoice PDF.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use invex_core::export;
use invex_core::models::invoice::{Extraction, InvoiceRecord, Scalar};

use super::{extract_document, load_config, read_pdf_text};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    Text,
    /// JSON record
    Json,
    /// CSV rows
    Csv,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let extension = args
        .input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if extension != "pdf" {
        anyhow::bail!("Unsupported file format: {}", extension);
    }

    info!("Processing file: {}", args.input.display());

    let text = read_pdf_text(&args.input)?;

    // A model-call failure is fatal for a single-file run; batch mode is the
    // one that degrades to the raw-text fallback.
    let client = reqwest::Client::new();
    let extraction = extract_document(&client, &config, &text).await?;

    if let Some(record) = extraction.as_invoice() {
        let (filled, total) = record.coverage();
        debug!(filled, total, items = record.line_items.len(), "Structured record extracted");
    }

    let output = format_extraction(&extraction, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

pub fn format_extraction(extraction: &Extraction, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(extraction)?),
        OutputFormat::Csv => {
            let bundle = export::build_bundle(std::slice::from_ref(extraction))?;
            Ok(bundle.combined.contents)
        }
        OutputFormat::Text => Ok(format_text(extraction)),
    }
}

fn format_text(extraction: &Extraction) -> String {
    match extraction {
        Extraction::Unclassified { raw_text } => {
            let mut output = String::new();
            output.push_str("This file does not look like an invoice. Raw text preview:\n\n");
            output.push_str(raw_text);
            output.push('\n');
            output
        }
        Extraction::Invoice(record) => format_summary(record),
    }
}

fn format_summary(record: &InvoiceRecord) -> String {
    let mut output = String::new();
    output.push_str("Invoice Summary\n");

    let fields = [
        ("Invoice Number", &record.invoice_number),
        ("User Name", &record.user_name),
        ("Due Date", &record.due_date),
        ("Billing Address", &record.billing_address),
        ("Currency", &record.currency),
        ("Tax Amount", &record.tax_amount),
        ("Payment Terms", &record.payment_terms),
        ("Total Amount", &record.total_amount),
    ];

    // Empty and "N/A" fields are left out of the summary entirely.
    for (label, value) in fields {
        if let Some(value) = value {
            if value.is_filled() {
                output.push_str(&format!("  {label}: {value}\n"));
            }
        }
    }

    if record.line_items.is_empty() {
        output.push_str("\nNo product details found in this invoice.\n");
    } else {
        output.push_str("\nProduct Details:\n");
        let cell =
            |v: &Option<Scalar>| v.as_ref().map(|s| s.to_string()).unwrap_or_default();
        for item in &record.line_items {
            output.push_str(&format!(
                "  - {} | qty: {} | price: {} | total: {}\n",
                cell(&item.name),
                cell(&item.quantity),
                cell(&item.price),
                cell(&item.total),
            ));
        }
    }

    output
}
