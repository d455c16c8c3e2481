use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use crate::cli::LinkArgs;
use crate::common::{
    create_count_progress_bar, create_spinner, format_elapsed, setup_logging, PairStats,
};
use crate::config::BatchConfig;
use crate::linkage::{
    counter_column, link_records, tally_citations, year_label, CitedRecord, CitingRecord, Linkage,
};
use crate::store::{CitationSink, ParquetStore, RecordSource};

/// Outcome of the yearly counter update for a pair whose linkages were written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregationStatus {
    Updated { column: String, rows: usize },
    /// The citing table name carries no year
    Skipped,
    Failed(String),
}

/// Outcome of one (citing, cited) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairStatus {
    Written {
        table: String,
        rows: usize,
        aggregation: AggregationStatus,
    },
    NoResult,
    SourceFailed(String),
    WriteFailed(String),
}

impl PairStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, PairStatus::Written { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, PairStatus::SourceFailed(_) | PairStatus::WriteFailed(_))
    }
}

impl fmt::Display for AggregationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregationStatus::Updated { column, rows } => {
                write!(f, "added counts to {} on {} records", column, rows)
            }
            AggregationStatus::Skipped => {
                write!(f, "citation counts skipped (no year in citing table name)")
            }
            AggregationStatus::Failed(e) => write!(f, "citation count update failed: {}", e),
        }
    }
}

impl fmt::Display for PairStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairStatus::Written {
                table,
                rows,
                aggregation,
            } => write!(f, "success: wrote {} rows to {}; {}", rows, table, aggregation),
            PairStatus::NoResult => write!(f, "no result"),
            PairStatus::SourceFailed(e) => write!(f, "source read failed: {}", e),
            PairStatus::WriteFailed(e) => write!(f, "write failed: {}", e),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PairReport {
    pub citing_table: String,
    pub cited_table: String,
    pub status: PairStatus,
    pub stats: PairStats,
}

/// Status of every pair, in processing order
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub pairs: Vec<PairReport>,
}

impl BatchReport {
    pub fn status(&self, citing_table: &str, cited_table: &str) -> Option<&PairStatus> {
        self.pairs
            .iter()
            .find(|p| p.citing_table == citing_table && p.cited_table == cited_table)
            .map(|p| &p.status)
    }

    pub fn succeeded(&self) -> usize {
        self.pairs.iter().filter(|p| p.status.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.pairs.iter().filter(|p| p.status.is_failure()).count()
    }

    pub fn empty(&self) -> usize {
        self.pairs
            .iter()
            .filter(|p| p.status == PairStatus::NoResult)
            .count()
    }
}

/// Match every configured pair. Failures stay local to their pair.
pub fn run_batch<S: RecordSource + CitationSink>(store: &mut S, config: &BatchConfig) -> BatchReport {
    let total_pairs = config.citing_tables.len() * config.cited_tables.len();
    let progress = create_count_progress_bar(total_pairs as u64);
    let mut report = BatchReport::default();

    for citing_table in &config.citing_tables {
        info!("Citing table: {}", citing_table);

        let year = year_label(citing_table);
        if year.is_none() {
            warn!(
                "Cannot derive a year from table name {}; citation counts will not be updated",
                citing_table
            );
        }

        for cited_table in &config.cited_tables {
            progress.set_message(format!("{} -> {}", citing_table, cited_table));

            let (status, stats) = process_pair(store, config, citing_table, cited_table, year);
            info!("{} cites {}: {}", citing_table, cited_table, status);

            report.pairs.push(PairReport {
                citing_table: citing_table.clone(),
                cited_table: cited_table.clone(),
                status,
                stats,
            });
            progress.inc(1);
        }
    }

    progress.finish_and_clear();
    report
}

fn read_pair<S: RecordSource>(
    store: &S,
    citing_table: &str,
    cited_table: &str,
) -> Result<(Vec<CitedRecord>, Vec<CitingRecord>)> {
    let cited = store
        .cited_records(cited_table)
        .with_context(|| format!("Failed to read cited table {}", cited_table))?;
    let citing = store
        .citing_records(citing_table)
        .with_context(|| format!("Failed to read citing table {}", citing_table))?;
    Ok((cited, citing))
}

fn process_pair<S: RecordSource + CitationSink>(
    store: &mut S,
    config: &BatchConfig,
    citing_table: &str,
    cited_table: &str,
    year: Option<&str>,
) -> (PairStatus, PairStats) {
    let start = Instant::now();
    info!("Matching {} -> {}", cited_table, citing_table);

    let (cited, citing) = match read_pair(store, citing_table, cited_table) {
        Ok(records) => records,
        Err(e) => {
            error!("{:#}", e);
            return (PairStatus::SourceFailed(format!("{:#}", e)), PairStats::default());
        }
    };
    info!(
        "Read {} cited records and {} citing records",
        cited.len(),
        citing.len()
    );

    let spinner = create_spinner("Matching references...");
    let linkage = link_records(&cited, &citing);
    spinner.finish_and_clear();

    let stats = linkage.stats.clone();
    debug!("Pair statistics: {:?}", stats);
    info!(
        "{} signatures ({} by first author), {} reference entries ({} with DOI)",
        stats.signatures, stats.author_fallbacks, stats.reference_entries, stats.entries_with_doi
    );
    info!(
        "Signature matches: {} | DOI matches: {} | merged: {} | {}",
        stats.identifier_links,
        stats.doi_links,
        stats.merged_links,
        format_elapsed(start.elapsed())
    );

    let result_table = config.result_table_name(citing_table, cited_table);

    if let Some(dir) = &config.keep_intermediates {
        if !cited.is_empty() && !citing.is_empty() {
            if let Err(e) = write_intermediates(dir, &result_table, &linkage.identifier, &linkage.doi) {
                warn!("Failed to write intermediate matches: {:#}", e);
            }
        }
    }

    if linkage.merged.is_empty() {
        return (PairStatus::NoResult, stats);
    }

    if let Err(e) = store.replace_linkages(&result_table, &linkage.merged) {
        error!("Failed to write {}: {:#}", result_table, e);
        return (PairStatus::WriteFailed(format!("{:#}", e)), stats);
    }
    info!("Wrote {} linkages to {}", linkage.merged.len(), result_table);

    let aggregation = match year {
        Some(year) => update_citation_counts(store, cited_table, year, &linkage.merged),
        None => AggregationStatus::Skipped,
    };

    (
        PairStatus::Written {
            table: result_table,
            rows: linkage.merged.len(),
            aggregation,
        },
        stats,
    )
}

fn update_citation_counts<S: CitationSink>(
    store: &mut S,
    cited_table: &str,
    year: &str,
    linkages: &[Linkage],
) -> AggregationStatus {
    let column = counter_column(year);
    let tallies = tally_citations(linkages);

    match store.increment_counters(cited_table, &column, &tallies) {
        Ok(rows) => {
            info!("Updated {} on {} records of {}", column, rows, cited_table);
            AggregationStatus::Updated { column, rows }
        }
        Err(e) => {
            error!("Citation count update failed for {}: {:#}", cited_table, e);
            AggregationStatus::Failed(format!("{:#}", e))
        }
    }
}

fn write_jsonl(path: &Path, linkages: &[Linkage]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create JSONL file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    for linkage in linkages {
        writeln!(writer, "{}", serde_json::to_string(linkage)?)?;
    }

    writer.flush()?;
    Ok(())
}

fn write_intermediates(
    dir: &Path,
    result_table: &str,
    identifier: &[Linkage],
    doi: &[Linkage],
) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    write_jsonl(&dir.join(format!("{}.identifier.jsonl", result_table)), identifier)?;
    write_jsonl(&dir.join(format!("{}.doi.jsonl", result_table)), doi)?;
    Ok(())
}

fn configure_threads(threads: usize) {
    let num_threads = if threads == 0 {
        let cores = num_cpus::get();
        info!("Auto-detected {} CPU cores. Using {} threads.", cores, cores);
        cores
    } else {
        info!("Using specified {} threads.", threads);
        threads
    };

    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
    {
        error!("Failed to build thread pool: {}. Using default.", e);
    }
}

/// Run the link command with the given arguments
pub fn run_link(args: LinkArgs) -> Result<BatchReport> {
    let start_time = Instant::now();

    setup_logging(&args.log_level)?;

    let config = BatchConfig::from_args(&args)?;

    info!("Starting citation linkage");
    info!("Data directory: {}", config.data_dir.display());
    info!("Citing tables: {:?}", config.citing_tables);
    info!("Cited tables: {:?}", config.cited_tables);
    info!("Result table template: {}", config.result_table_template);

    configure_threads(args.threads);

    let mut store = ParquetStore::new(&config.data_dir);
    let report = run_batch(&mut store, &config);

    info!("==================== FINAL SUMMARY ====================");
    info!("Total execution time: {}", format_elapsed(start_time.elapsed()));
    info!("Pairs processed: {}", report.pairs.len());
    info!("  Written: {}", report.succeeded());
    info!("  No result: {}", report.empty());
    info!("  Failed: {}", report.failed());
    for pair in &report.pairs {
        info!("{} cites {}: {}", pair.citing_table, pair.cited_table, pair.status);
    }
    info!("========================================================");

    Ok(report)
}
