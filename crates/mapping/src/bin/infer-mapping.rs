//! infer-mapping — derive an index mapping from sample documents.
//!
//! Reads newline-delimited JSON documents, lets dynamic mapping create a
//! field for everything it has not seen yet, and prints the final mapping
//! as JSON on stdout. Logs go to stderr.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;
use serde_json::Value;
use tracing::{info, warn};

use dynamap_core::config::{load_dotenv, MappingConfig};
use dynamap_core::Dynamic;
use dynamap_mapping::{IndexMapping, ParseOutcome};

// ── CLI ─────────────────────────────────────────────────────────────

/// Infer a mapping from NDJSON documents.
#[derive(Parser, Debug)]
#[command(name = "infer-mapping", version, about)]
struct Cli {
    /// NDJSON input file; stdin when omitted.
    input: Option<PathBuf>,

    /// Configuration profile (keys are read as `{PROFILE}_{KEY}` first).
    #[arg(long, env = "DYNAMAP_PROFILE", default_value = "")]
    profile: String,

    /// Parse each batch of documents in parallel against a mapping snapshot.
    #[arg(long)]
    parallel: bool,

    /// Documents per parallel batch.
    #[arg(long, default_value_t = 1000)]
    batch_size: usize,

    /// Map numeric strings as numbers.
    #[arg(long)]
    numeric_detection: bool,

    /// Never map strings as dates.
    #[arg(long)]
    no_date_detection: bool,

    /// Date formats tried during detection, in order (repeatable).
    #[arg(long = "date-format")]
    date_formats: Vec<String>,

    /// Policy of the root object: true, runtime, false or strict.
    #[arg(long)]
    dynamic: Option<Dynamic>,

    /// YAML or JSON file with dynamic templates.
    #[arg(long)]
    templates: Option<PathBuf>,
}

impl Cli {
    fn apply(&self, config: &mut MappingConfig) {
        if self.numeric_detection {
            config.detection.numeric_detection = true;
        }
        if self.no_date_detection {
            config.detection.date_detection = false;
        }
        if !self.date_formats.is_empty() {
            config.detection.dynamic_date_formats = self.date_formats.clone();
        }
        if let Some(dynamic) = self.dynamic {
            config.dynamic = dynamic;
        }
        if let Some(path) = &self.templates {
            config.templates_file = Some(path.clone());
        }
    }
}

// ── Ingest ──────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Stats {
    documents: usize,
    rejected: usize,
    new_fields: usize,
}

impl Stats {
    fn record(&mut self, line: usize, mapping: &mut IndexMapping, parsed: dynamap_mapping::Result<ParseOutcome>) {
        self.documents += 1;
        let merged = parsed.and_then(|outcome| mapping.merge(&outcome));
        match merged {
            Ok(added) => self.new_fields += added,
            Err(e) => {
                self.rejected += 1;
                warn!(line, error = %e, "document rejected");
            }
        }
    }
}

/// Non-empty input lines with their 1-based line numbers.
fn read_documents(input: Option<&PathBuf>) -> Result<Vec<(usize, String)>> {
    let reader: Box<dyn BufRead> = match input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut documents = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.context("failed to read input")?;
        if !line.trim().is_empty() {
            documents.push((idx + 1, line));
        }
    }
    Ok(documents)
}

fn parse_line(mapping: &IndexMapping, line: &str) -> dynamap_mapping::Result<ParseOutcome> {
    let source: Value = serde_json::from_str(line)?;
    mapping.parse(&source)
}

/// Each document sees everything committed by the ones before it.
fn ingest_sequential(mapping: &mut IndexMapping, documents: &[(usize, String)]) -> Stats {
    let mut stats = Stats::default();
    for (line, source) in documents {
        let parsed = parse_line(mapping, source);
        stats.record(*line, mapping, parsed);
    }
    stats
}

/// Documents of a batch are parsed concurrently against the same snapshot;
/// their updates are then merged in input order.
fn ingest_parallel(mapping: &mut IndexMapping, documents: &[(usize, String)], batch_size: usize) -> Stats {
    let mut stats = Stats::default();
    for batch in documents.chunks(batch_size.max(1)) {
        let snapshot: &IndexMapping = mapping;
        let parsed: Vec<(usize, dynamap_mapping::Result<ParseOutcome>)> = batch
            .par_iter()
            .map(|(line, source)| (*line, parse_line(snapshot, source)))
            .collect();
        for (line, result) in parsed {
            stats.record(line, mapping, result);
        }
    }
    stats
}

// ── main ────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    load_dotenv();
    let cli = Cli::parse();

    let mut config = MappingConfig::for_profile(&cli.profile);
    cli.apply(&mut config);
    config.log_summary();

    let mut mapping = IndexMapping::from_config(&config).context("failed to build mapping rules")?;
    let documents = read_documents(cli.input.as_ref())?;
    info!(documents = documents.len(), parallel = cli.parallel, "ingesting");

    let stats = if cli.parallel {
        ingest_parallel(&mut mapping, &documents, cli.batch_size)
    } else {
        ingest_sequential(&mut mapping, &documents)
    };
    info!(
        documents = stats.documents,
        rejected = stats.rejected,
        new_fields = stats.new_fields,
        "done"
    );

    println!("{}", serde_json::to_string_pretty(&mapping.to_json())?);
    Ok(())
}
