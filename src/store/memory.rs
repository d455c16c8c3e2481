use anyhow::{anyhow, Result};
use std::collections::HashMap;

use super::{validate_table_name, CitationSink, RecordSource};
use crate::linkage::{CitationTally, CitedRecord, CitingRecord, Linkage};

/// In-process tables, for callers that already hold their records
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    cited: HashMap<String, Vec<CitedRecord>>,
    citing: HashMap<String, Vec<CitingRecord>>,
    linkages: HashMap<String, Vec<Linkage>>,
    /// table -> column -> one value per cited row
    counters: HashMap<String, HashMap<String, Vec<i64>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_cited(&mut self, table: &str, records: Vec<CitedRecord>) {
        self.counters.remove(table);
        self.cited.insert(table.to_string(), records);
    }

    pub fn insert_citing(&mut self, table: &str, records: Vec<CitingRecord>) {
        self.citing.insert(table.to_string(), records);
    }

    /// Rows of a linkage table, if it has been written
    pub fn linkages(&self, table: &str) -> Option<&[Linkage]> {
        self.linkages.get(table).map(Vec::as_slice)
    }

    pub fn has_counter_column(&self, table: &str, column: &str) -> bool {
        self.counters
            .get(table)
            .is_some_and(|columns| columns.contains_key(column))
    }

    /// Counter value of the first row with this id
    pub fn counter(&self, table: &str, column: &str, id: &str) -> Option<i64> {
        let row = self.cited.get(table)?.iter().position(|r| r.id == id)?;
        self.counters.get(table)?.get(column)?.get(row).copied()
    }
}

impl RecordSource for MemoryStore {
    fn cited_records(&self, table: &str) -> Result<Vec<CitedRecord>> {
        self.cited
            .get(table)
            .cloned()
            .ok_or_else(|| anyhow!("Table does not exist: {}", table))
    }

    fn citing_records(&self, table: &str) -> Result<Vec<CitingRecord>> {
        self.citing
            .get(table)
            .cloned()
            .ok_or_else(|| anyhow!("Table does not exist: {}", table))
    }
}

impl CitationSink for MemoryStore {
    fn replace_linkages(&mut self, table: &str, linkages: &[Linkage]) -> Result<()> {
        validate_table_name(table)?;
        self.linkages.insert(table.to_string(), linkages.to_vec());
        Ok(())
    }

    fn increment_counters(
        &mut self,
        table: &str,
        column: &str,
        tallies: &[CitationTally],
    ) -> Result<usize> {
        let rows = self
            .cited
            .get(table)
            .ok_or_else(|| anyhow!("Table does not exist: {}", table))?;

        let values = self
            .counters
            .entry(table.to_string())
            .or_default()
            .entry(column.to_string())
            .or_insert_with(|| vec![0; rows.len()]);

        let deltas: HashMap<&str, i64> = tallies
            .iter()
            .map(|t| (t.cited_id.as_str(), t.count as i64))
            .collect();

        let mut rows_updated = 0;
        for (value, record) in values.iter_mut().zip(rows) {
            if let Some(delta) = deltas.get(record.id.as_str()) {
                *value += delta;
                rows_updated += 1;
            }
        }

        Ok(rows_updated)
    }
}
