use anyhow::{Context, Result};
use log::{debug, info, warn};
use polars::prelude::*;
use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::{schema, validate_table_name, CitationSink, RecordSource};
use crate::linkage::{parse_author_list, CitationTally, CitedRecord, CitingRecord, Linkage};

/// A directory of Parquet files, one per table: `<data_dir>/<table>.parquet`
#[derive(Debug, Clone)]
pub struct ParquetStore {
    data_dir: PathBuf,
}

impl ParquetStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn table_path(&self, table: &str) -> Result<PathBuf> {
        validate_table_name(table)?;
        Ok(self.data_dir.join(format!("{}.parquet", table)))
    }

    /// Read a whole table as stored
    pub fn read_table(&self, table: &str) -> Result<DataFrame> {
        let path = self.existing_table_path(table)?;
        LazyFrame::scan_parquet(&path, Default::default())
            .with_context(|| format!("Failed to scan table {}", table))?
            .collect()
            .with_context(|| format!("Failed to read table {}", table))
    }

    /// Write a table through a temp file renamed into place, replacing any previous version
    pub fn write_table(&self, table: &str, df: &mut DataFrame) -> Result<PathBuf> {
        let path = self.table_path(table)?;
        fs::create_dir_all(&self.data_dir).with_context(|| {
            format!("Failed to create data directory: {}", self.data_dir.display())
        })?;

        let run_id = &Uuid::new_v4().to_string()[..8];
        let temp_path = self.data_dir.join(format!(".{}.{}.tmp", table, run_id));

        let written = File::create(&temp_path)
            .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))
            .and_then(|file| {
                ParquetWriter::new(file)
                    .with_compression(ParquetCompression::Zstd(None))
                    .finish(df)
                    .with_context(|| format!("Failed to write table {}", table))
            });

        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }

        fs::rename(&temp_path, &path)
            .with_context(|| format!("Failed to move {} into place", path.display()))?;
        debug!("Wrote {} rows to {}", df.height(), path.display());
        Ok(path)
    }

    fn existing_table_path(&self, table: &str) -> Result<PathBuf> {
        let path = self.table_path(table)?;
        if !path.exists() {
            return Err(anyhow::anyhow!(
                "Table does not exist: {} ({})",
                table,
                path.display()
            ));
        }
        Ok(path)
    }

    /// Read selected columns, coercing every value to text
    fn read_text_columns(&self, table: &str, columns: &[&str]) -> Result<DataFrame> {
        let path = self.existing_table_path(table)?;
        let exprs: Vec<Expr> = columns
            .iter()
            .map(|name| col(*name).cast(DataType::String))
            .collect();

        LazyFrame::scan_parquet(&path, Default::default())
            .with_context(|| format!("Failed to scan table {}", table))?
            .select(exprs)
            .collect()
            .with_context(|| format!("Failed to read columns {:?} from table {}", columns, table))
    }
}

fn text_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a StringChunked> {
    df.column(name)?
        .str()
        .with_context(|| format!("Column {} is not text", name))
}

fn owned(value: Option<&str>) -> Option<String> {
    value.map(str::to_string)
}

impl RecordSource for ParquetStore {
    fn cited_records(&self, table: &str) -> Result<Vec<CitedRecord>> {
        let df = self.read_text_columns(table, &schema::CITED_COLUMNS)?;

        let ids = text_column(&df, schema::ID)?;
        let dois = text_column(&df, schema::DOI)?;
        let sources = text_column(&df, schema::SOURCE_ABBREV)?;
        let volumes = text_column(&df, schema::VOLUME)?;
        let years = text_column(&df, schema::YEAR)?;
        let pages = text_column(&df, schema::START_PAGE)?;
        let authors = text_column(&df, schema::AUTHORS)?;

        let mut records = Vec::with_capacity(df.height());
        let mut missing_ids = 0;

        for i in 0..df.height() {
            let Some(id) = ids.get(i) else {
                missing_ids += 1;
                continue;
            };
            records.push(CitedRecord {
                id: id.to_string(),
                doi: owned(dois.get(i)),
                source_abbrev: owned(sources.get(i)),
                volume: owned(volumes.get(i)),
                year: owned(years.get(i)),
                start_page: owned(pages.get(i)),
                authors: authors.get(i).map(parse_author_list).unwrap_or_default(),
            });
        }

        if missing_ids > 0 {
            warn!("Skipped {} rows without {} in {}", missing_ids, schema::ID, table);
        }

        Ok(records)
    }

    fn citing_records(&self, table: &str) -> Result<Vec<CitingRecord>> {
        let df = self.read_text_columns(table, &schema::CITING_COLUMNS)?;

        let ids = text_column(&df, schema::ID)?;
        let references = text_column(&df, schema::REFERENCES)?;

        let records: Vec<CitingRecord> = (0..df.height())
            .filter_map(|i| {
                ids.get(i).map(|id| CitingRecord {
                    id: id.to_string(),
                    references: owned(references.get(i)),
                })
            })
            .collect();

        if records.len() < df.height() {
            warn!(
                "Skipped {} rows without {} in {}",
                df.height() - records.len(),
                schema::ID,
                table
            );
        }

        Ok(records)
    }
}

impl CitationSink for ParquetStore {
    fn replace_linkages(&mut self, table: &str, linkages: &[Linkage]) -> Result<()> {
        let cited: Vec<&str> = linkages.iter().map(|l| l.cited_id.as_str()).collect();
        let citing: Vec<&str> = linkages.iter().map(|l| l.citing_id.as_str()).collect();

        let mut df = DataFrame::new(vec![
            Column::new(schema::LINK_CITED.into(), &cited),
            Column::new(schema::LINK_CITING.into(), &citing),
        ])?;

        self.write_table(table, &mut df)?;
        Ok(())
    }

    fn increment_counters(
        &mut self,
        table: &str,
        column: &str,
        tallies: &[CitationTally],
    ) -> Result<usize> {
        let mut df = self.read_table(table)?;

        let current: Vec<i64> = if df.column(column).is_ok() {
            let values = df
                .column(column)?
                .cast(&DataType::Int64)
                .with_context(|| format!("Counter column {} is not numeric", column))?;
            values.i64()?.into_iter().map(|v| v.unwrap_or(0)).collect()
        } else {
            info!("Adding counter column {} to {}", column, table);
            vec![0; df.height()]
        };

        let ids = df
            .column(schema::ID)
            .with_context(|| format!("Table {} has no {} column", table, schema::ID))?
            .cast(&DataType::String)?;
        let ids = ids.str()?;

        let deltas: HashMap<&str, i64> = tallies
            .iter()
            .map(|t| (t.cited_id.as_str(), t.count as i64))
            .collect();

        let mut rows_updated = 0;
        let updated: Vec<i64> = current
            .iter()
            .zip(ids.into_iter())
            .map(|(value, id)| match id.and_then(|id| deltas.get(id)) {
                Some(delta) => {
                    rows_updated += 1;
                    value + delta
                }
                None => *value,
            })
            .collect();

        df.with_column(Column::new(column.into(), updated))?;
        self.write_table(table, &mut df)?;

        Ok(rows_updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_cited_fixture(store: &ParquetStore, table: &str) {
        let mut df = DataFrame::new(vec![
            Column::new(schema::ID.into(), &["C1", "C2"]),
            Column::new(schema::DOI.into(), &[Some("10.1063/5.0012345"), None]),
            Column::new(schema::SOURCE_ABBREV.into(), &["PHYS FLUIDS", "FARMACIA"]),
            Column::new(schema::VOLUME.into(), &["32", "67(2)"]),
            Column::new(schema::YEAR.into(), &[2020i64, 2019]),
            Column::new(schema::START_PAGE.into(), &[Some("1"), None]),
            Column::new(schema::AUTHORS.into(), &["Wang, L###Li, X", "Luca, A"]),
        ])
        .unwrap();
        store.write_table(table, &mut df).unwrap();
    }

    #[test]
    fn test_read_cited_records_coerces_to_text() {
        let dir = tempdir().unwrap();
        let store = ParquetStore::new(dir.path());
        write_cited_fixture(&store, "cited");

        let records = store.cited_records("cited").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].year.as_deref(), Some("2020"));
        assert_eq!(records[0].authors, vec!["Wang, L".to_string(), "Li, X".to_string()]);
        assert_eq!(records[1].doi, None);
        assert_eq!(records[1].start_page, None);
    }

    #[test]
    fn test_missing_table_is_an_error() {
        let dir = tempdir().unwrap();
        let store = ParquetStore::new(dir.path());
        assert!(store.cited_records("nope").is_err());
        assert!(store.citing_records("../nope").is_err());
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let dir = tempdir().unwrap();
        let store = ParquetStore::new(dir.path());
        let mut df = DataFrame::new(vec![Column::new(schema::ID.into(), &["P1"])]).unwrap();
        store.write_table("citing", &mut df).unwrap();
        assert!(store.citing_records("citing").is_err());
    }

    #[test]
    fn test_replace_linkages_replaces() {
        let dir = tempdir().unwrap();
        let mut store = ParquetStore::new(dir.path());

        store
            .replace_linkages("links", &[Linkage::new("C1", "P1"), Linkage::new("C2", "P1")])
            .unwrap();
        store.replace_linkages("links", &[Linkage::new("C3", "P2")]).unwrap();

        let df = store.read_table("links").unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(df.width(), schema::LINKAGE_COLUMNS.len());
        assert!(schema::LINKAGE_COLUMNS.iter().all(|name| df.column(name).is_ok()));
        assert_eq!(text_column(&df, schema::LINK_CITED).unwrap().get(0), Some("C3"));
    }

    #[test]
    fn test_increment_counters_creates_then_adds() {
        let dir = tempdir().unwrap();
        let mut store = ParquetStore::new(dir.path());
        write_cited_fixture(&store, "cited");

        let tallies = vec![CitationTally { cited_id: "C2".to_string(), count: 3 }];
        assert_eq!(store.increment_counters("cited", "citation_count_2023", &tallies).unwrap(), 1);
        assert_eq!(store.increment_counters("cited", "citation_count_2023", &tallies).unwrap(), 1);

        let df = store.read_table("cited").unwrap();
        let counts: Vec<Option<i64>> = df
            .column("citation_count_2023")
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(counts, vec![Some(0), Some(6)]);
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = tempdir().unwrap();
        let mut store = ParquetStore::new(dir.path());
        store.replace_linkages("links", &[Linkage::new("C1", "P1")]).unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["links.parquet".to_string()]);
    }
}
