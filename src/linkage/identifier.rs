//! Signature containment matching.
//!
//! Every reference entry is compared against every distinct signature after
//! both sides are stripped of whitespace and lower-cased. The first signature
//! found, in insertion order of the index, wins. Signatures are bucketed by
//! their year token so that an entry is only compared against signatures
//! whose year it mentions; since the year is itself a substring of the
//! signature this never drops a hit, and candidates are re-sorted into
//! insertion order so the winner on ties is unchanged.

use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

use super::records::{Linkage, ReferenceEntry, SignedRecord};
use super::signature::normalize_for_matching;

#[derive(Debug, Clone)]
struct IndexedSignature {
    lower: String,
    original: String,
}

/// Lower-cased signature -> original signature, in stable insertion order
#[derive(Debug, Default)]
pub struct SignatureIndex {
    entries: Vec<IndexedSignature>,
    positions: HashMap<String, usize>,
    by_year: HashMap<String, Vec<usize>>,
    owners: HashMap<String, Vec<String>>,
}

impl SignatureIndex {
    /// Build the index from signed records.
    ///
    /// A signature that collides case-insensitively with an earlier one keeps
    /// the earlier position but takes the later original spelling.
    pub fn build(signed: &[SignedRecord]) -> Self {
        let mut index = Self::default();

        for record in signed {
            index
                .owners
                .entry(record.signature.clone())
                .or_default()
                .push(record.id.clone());

            let lower = record.signature.to_lowercase();
            let existing = index.positions.get(&lower).copied();
            match existing {
                Some(pos) => {
                    index.entries[pos].original = record.signature.clone();
                }
                None => {
                    let pos = index.entries.len();
                    index.positions.insert(lower.clone(), pos);
                    index
                        .by_year
                        .entry(record.year_key.clone())
                        .or_default()
                        .push(pos);
                    index.entries.push(IndexedSignature {
                        lower,
                        original: record.signature.clone(),
                    });
                }
            }
        }

        index
    }

    /// Number of distinct (case-insensitive) signatures
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn candidates(&self, normalized: &str) -> Vec<usize> {
        let mut candidates: Vec<usize> = self
            .by_year
            .iter()
            .filter(|(year, _)| normalized.contains(year.as_str()))
            .flat_map(|(_, positions)| positions.iter().copied())
            .collect();
        candidates.sort_unstable();
        candidates
    }

    /// First signature contained in already-normalized entry text
    pub fn find(&self, normalized: &str) -> Option<&str> {
        self.candidates(normalized)
            .into_iter()
            .map(|pos| &self.entries[pos])
            .find(|entry| normalized.contains(entry.lower.as_str()))
            .map(|entry| entry.original.as_str())
    }

    /// Cited record ids whose signature is exactly `signature`
    pub fn owners(&self, signature: &str) -> &[String] {
        self.owners
            .get(signature)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// A reference entry whose text contains a signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHit {
    pub citing_id: String,
    pub signature: String,
}

/// Scan every entry against the index. Hits come back in entry order.
pub fn find_signature_hits(index: &SignatureIndex, entries: &[ReferenceEntry]) -> Vec<SignatureHit> {
    if index.is_empty() {
        return Vec::new();
    }

    entries
        .par_iter()
        .filter_map(|entry| {
            let normalized = normalize_for_matching(&entry.text);
            index.find(&normalized).map(|signature| SignatureHit {
                citing_id: entry.citing_id.clone(),
                signature: signature.to_string(),
            })
        })
        .collect()
}

/// Join hits back to cited ids, dropping repeated pairs
pub fn resolve_hits(index: &SignatureIndex, hits: &[SignatureHit]) -> Vec<Linkage> {
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut linkages = Vec::new();

    for hit in hits {
        for cited_id in index.owners(&hit.signature) {
            if seen.insert((cited_id.as_str(), hit.citing_id.as_str())) {
                linkages.push(Linkage::new(cited_id.as_str(), hit.citing_id.as_str()));
            }
        }
    }

    linkages
}

/// Link citing entries to cited records by signature containment
pub fn match_by_signature(signed: &[SignedRecord], entries: &[ReferenceEntry]) -> Vec<Linkage> {
    if signed.is_empty() || entries.is_empty() {
        return Vec::new();
    }

    let index = SignatureIndex::build(signed);
    let hits = find_signature_hits(&index, entries);
    resolve_hits(&index, &hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linkage::records::{CitedRecord, CitingRecord};
    use crate::linkage::reference::split_citing_records;
    use crate::linkage::signature::build_signatures;

    fn entry(citing_id: &str, text: &str) -> ReferenceEntry {
        ReferenceEntry {
            citing_id: citing_id.to_string(),
            text: text.to_string(),
            doi: None,
        }
    }

    fn signed(cited: &[CitedRecord]) -> Vec<SignedRecord> {
        build_signatures(cited)
    }

    #[test]
    fn test_match_wos_style_reference() {
        let cited = signed(&[CitedRecord::new("C1")
            .with_source("2020", "NATURE", "12")
            .with_start_page("45")]);
        let entries = vec![entry("P1", "Smith J, 2020, NATURE, V12, P45")];

        let links = match_by_signature(&cited, &entries);
        assert_eq!(links, vec![Linkage::new("C1", "P1")]);
    }

    #[test]
    fn test_match_is_case_and_whitespace_insensitive() {
        let cited = signed(&[CitedRecord::new("C1")
            .with_source("2019", "Farmacia", "67")
            .with_authors(&["Luca A"])]);
        let entries = vec![entry("P1", "[Anonymous] LUCA A,2019 , FARMACIA,  v67, p.12.")];

        let links = match_by_signature(&cited, &entries);
        assert_eq!(links, vec![Linkage::new("C1", "P1")]);
    }

    #[test]
    fn test_no_match_yields_nothing() {
        let cited = signed(&[CitedRecord::new("C1")
            .with_source("2020", "NATURE", "12")
            .with_start_page("45")]);
        let entries = vec![entry("P1", "Smith J, 2021, SCIENCE, V3, P1")];
        assert!(match_by_signature(&cited, &entries).is_empty());
    }

    #[test]
    fn test_first_inserted_signature_wins_on_ties() {
        // "2020,nature,v1" is a prefix of "2020,nature,v12,...": substring
        // ambiguity is resolved by insertion order, not by specificity.
        let cited = signed(&[
            CitedRecord::new("SHORT").with_source("2020", "NATURE", "1").with_authors(&[""]),
            CitedRecord::new("LONG").with_source("2020", "NATURE", "12").with_start_page("5"),
        ]);
        let index = SignatureIndex::build(&cited);
        let normalized = normalize_for_matching("x, 2020, NATURE, V12, P5");
        assert_eq!(index.find(&normalized), Some(",2020,NATURE,V1"));

        let reversed: Vec<SignedRecord> = cited.iter().rev().cloned().collect();
        let index = SignatureIndex::build(&reversed);
        assert_eq!(index.find(&normalized), Some("2020,NATURE,V12,P5"));
    }

    #[test]
    fn test_year_pruning_keeps_insertion_order_across_years() {
        let cited = signed(&[
            CitedRecord::new("A").with_source("2021", "J", "1").with_start_page("1"),
            CitedRecord::new("B").with_source("2020", "J", "1").with_start_page("1"),
        ]);
        let index = SignatureIndex::build(&cited);
        let normalized = normalize_for_matching("2020,J,V1,P1 and 2021,J,V1,P1");
        assert_eq!(index.find(&normalized), Some("2021,J,V1,P1"));
    }

    #[test]
    fn test_case_collision_keeps_first_position_last_spelling() {
        let cited = signed(&[
            CitedRecord::new("A").with_source("2020", "Nature", "1").with_start_page("1"),
            CitedRecord::new("B").with_source("2020", "NATURE", "1").with_start_page("1"),
        ]);
        let index = SignatureIndex::build(&cited);
        assert_eq!(index.len(), 1);
        assert_eq!(index.find("2020,nature,v1,p1"), Some("2020,NATURE,V1,P1"));

        // Only records spelled exactly like the winning signature are linked
        let links = match_by_signature(&cited, &[entry("P", "2020, NATURE, V1, P1")]);
        assert_eq!(links, vec![Linkage::new("B", "P")]);
    }

    #[test]
    fn test_shared_signature_links_every_owner() {
        let cited = signed(&[
            CitedRecord::new("A").with_source("2020", "J", "1").with_start_page("1"),
            CitedRecord::new("B").with_source("2020", "J", "1").with_start_page("1"),
        ]);
        let links = match_by_signature(&cited, &[entry("P", "2020,J,V1,P1")]);
        assert_eq!(links, vec![Linkage::new("A", "P"), Linkage::new("B", "P")]);
    }

    #[test]
    fn test_repeated_references_are_deduplicated() {
        let cited = signed(&[CitedRecord::new("C1")
            .with_source("2020", "NATURE", "12")
            .with_start_page("45")]);
        let entries = split_citing_records(&[CitingRecord::new(
            "P1",
            "2020, NATURE, V12, P45###Smith, 2020, NATURE, V12, P45, DOI 10.1/x",
        )]);
        assert_eq!(entries.len(), 2);
        assert_eq!(match_by_signature(&cited, &entries).len(), 1);
    }

    #[test]
    fn test_empty_inputs() {
        let cited = signed(&[CitedRecord::new("C1").with_source("2020", "J", "1")]);
        assert!(match_by_signature(&cited, &[]).is_empty());
        assert!(match_by_signature(&[], &[entry("P", "anything")]).is_empty());
    }
}
