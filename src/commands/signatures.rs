use anyhow::{Context, Result};
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::Instant;

use crate::cli::SignaturesArgs;
use crate::common::{format_elapsed, setup_logging, SignatureStats};
use crate::linkage::{build_signatures, SignatureBasis, SignedRecord};
use crate::store::{ParquetStore, RecordSource};

/// Write signed records as JSON lines
pub fn write_signatures<W: Write>(writer: &mut W, signed: &[SignedRecord]) -> Result<()> {
    for record in signed {
        writeln!(writer, "{}", serde_json::to_string(record)?)?;
    }
    Ok(())
}

/// Run the signatures command with the given arguments
pub fn run_signatures(args: SignaturesArgs) -> Result<SignatureStats> {
    let start_time = Instant::now();

    setup_logging(&args.log_level)?;

    info!("Building signatures for table {}", args.table);
    info!("Data directory: {}", args.data_dir);
    info!("Output: {}", args.output);

    let store = ParquetStore::new(&args.data_dir);
    let cited = store.cited_records(&args.table)?;
    let signed = build_signatures(&cited);

    let file = File::create(&args.output)
        .with_context(|| format!("Failed to create output file: {}", args.output))?;
    let mut writer = BufWriter::new(file);
    write_signatures(&mut writer, &signed)?;
    writer.flush()?;

    let stats = SignatureStats {
        cited_records: cited.len(),
        signed: signed.len(),
        dropped_incomplete: cited.len() - signed.len(),
        author_fallbacks: signed
            .iter()
            .filter(|s| s.basis == SignatureBasis::Author)
            .count(),
    };

    info!("==================== FINAL SUMMARY ====================");
    info!("Total execution time: {}", format_elapsed(start_time.elapsed()));
    info!("Cited records read: {}", stats.cited_records);
    info!("Signatures written: {}", stats.signed);
    info!("  Using first author (no start page): {}", stats.author_fallbacks);
    info!("Dropped (missing year, source or volume): {}", stats.dropped_incomplete);
    info!("Output file: {}", args.output);
    info!("========================================================");

    Ok(stats)
}
