pub mod memory;
pub mod parquet;
pub mod schema;

pub use memory::MemoryStore;
pub use parquet::ParquetStore;

use anyhow::Result;

use crate::linkage::{CitationTally, CitedRecord, CitingRecord, Linkage};

/// Where cited and citing records come from
pub trait RecordSource {
    fn cited_records(&self, table: &str) -> Result<Vec<CitedRecord>>;
    fn citing_records(&self, table: &str) -> Result<Vec<CitingRecord>>;
}

/// Where linkages and yearly counters go
pub trait CitationSink {
    /// Replace the linkage table with exactly these rows
    fn replace_linkages(&mut self, table: &str, linkages: &[Linkage]) -> Result<()>;

    /// Add each tally to `column` of the cited table, creating the column with
    /// zeros first if needed. Applied as a single update; returns the number
    /// of rows changed. Not idempotent: calling twice adds twice.
    fn increment_counters(
        &mut self,
        table: &str,
        column: &str,
        tallies: &[CitationTally],
    ) -> Result<usize>;
}

/// Reject table names that are not plain names
pub fn validate_table_name(table: &str) -> Result<()> {
    if table.trim().is_empty()
        || table.contains(['/', '\\'])
        || table == "."
        || table == ".."
        || table.starts_with('.')
    {
        anyhow::bail!("Invalid table name: {:?}", table);
    }
    Ok(())
}
