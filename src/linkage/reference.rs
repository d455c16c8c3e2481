use lazy_static::lazy_static;
use regex::Regex;

use super::records::{CitingRecord, ReferenceEntry, FIELD_DELIMITER};

lazy_static! {
    /// DOI embedded in a reference entry: "DOI 10.1016/j.x.2019.01.001", "doi:10.1063/1.5"
    pub static ref REFERENCE_DOI_PATTERN: Regex = Regex::new(
        r"(?i)\bdoi[:\s]\s*(10\.\d{4,}/\S+)"
    ).unwrap();
}

/// First DOI token in a reference entry, as written
pub fn extract_reference_doi(text: &str) -> Option<String> {
    REFERENCE_DOI_PATTERN
        .captures(text)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}

/// Split a raw reference list into trimmed, non-blank entries
pub fn split_references(raw: &str) -> impl Iterator<Item = &str> {
    raw.trim()
        .split(FIELD_DELIMITER)
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
}

/// Explode citing records into one entry per reference
pub fn split_citing_records(records: &[CitingRecord]) -> Vec<ReferenceEntry> {
    records
        .iter()
        .flat_map(|record| {
            record
                .references
                .as_deref()
                .into_iter()
                .flat_map(split_references)
                .map(move |text| ReferenceEntry {
                    citing_id: record.id.clone(),
                    text: text.to_string(),
                    doi: extract_reference_doi(text),
                })
        })
        .collect()
}
