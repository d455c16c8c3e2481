pub mod aggregate;
pub mod doi;
pub mod identifier;
pub mod merge;
pub mod records;
pub mod reference;
pub mod signature;

pub use aggregate::*;
pub use doi::{match_by_doi, CitedDoiIndex};
pub use identifier::{match_by_signature, SignatureIndex};
pub use merge::merge_linkages;
pub use records::*;
pub use reference::{extract_reference_doi, split_citing_records, split_references};
pub use signature::{build_signature, build_signatures, sign_record};

use crate::common::PairStats;

/// Everything one table pair produced
#[derive(Debug, Clone, Default)]
pub struct PairLinkage {
    pub identifier: Vec<Linkage>,
    pub doi: Vec<Linkage>,
    pub merged: Vec<Linkage>,
    pub stats: PairStats,
}

/// Run both matchers over one pair of record sets and merge the result
pub fn link_records(cited: &[CitedRecord], citing: &[CitingRecord]) -> PairLinkage {
    let mut stats = PairStats {
        cited_records: cited.len(),
        citing_records: citing.len(),
        ..Default::default()
    };

    if cited.is_empty() || citing.is_empty() {
        return PairLinkage {
            stats,
            ..Default::default()
        };
    }

    let signed = build_signatures(cited);
    let entries = split_citing_records(citing);
    stats.signatures = signed.len();
    stats.author_fallbacks = signed
        .iter()
        .filter(|s| s.basis == SignatureBasis::Author)
        .count();
    stats.reference_entries = entries.len();
    stats.entries_with_doi = entries.iter().filter(|e| e.doi.is_some()).count();

    let identifier = match_by_signature(&signed, &entries);
    let doi = match_by_doi(&signed, &entries);
    let merged = merge_linkages(identifier.clone(), doi.clone());

    stats.identifier_links = identifier.len();
    stats.doi_links = doi.len();
    stats.merged_links = merged.len();

    PairLinkage {
        identifier,
        doi,
        merged,
        stats,
    }
}
