use serde::Serialize;

/// Counters for one (citing, cited) table pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PairStats {
    pub cited_records: usize,
    pub signatures: usize,
    pub author_fallbacks: usize,
    pub citing_records: usize,
    pub reference_entries: usize,
    pub entries_with_doi: usize,
    pub identifier_links: usize,
    pub doi_links: usize,
    pub merged_links: usize,
}

/// Statistics from the signatures step
#[derive(Debug, Clone, Default)]
pub struct SignatureStats {
    pub cited_records: usize,
    pub signed: usize,
    pub dropped_incomplete: usize,
    pub author_fallbacks: usize,
}
