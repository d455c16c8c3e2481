use log::warn;
use regex::{Regex, RegexBuilder};
use std::collections::{HashMap, HashSet};

use super::records::{Linkage, ReferenceEntry, SignedRecord};

/// Compiled size limit for the cited-DOI alternation
const MENTION_PATTERN_SIZE_LIMIT: usize = 256 * 1024 * 1024;

/// Cited DOIs, both as an exact lookup and as a substring prefilter
#[derive(Debug, Default)]
pub struct CitedDoiIndex {
    owners: HashMap<String, Vec<String>>,
    mention: Option<Regex>,
}

impl CitedDoiIndex {
    pub fn build(signed: &[SignedRecord]) -> Self {
        let mut owners: HashMap<String, Vec<String>> = HashMap::new();
        let mut ordered: Vec<&str> = Vec::new();

        for record in signed {
            let Some(doi) = record.doi.as_deref().map(str::trim).filter(|d| !d.is_empty()) else {
                continue;
            };
            let ids = owners.entry(doi.to_string()).or_default();
            if ids.is_empty() {
                ordered.push(doi);
            }
            ids.push(record.id.clone());
        }

        let mention = if ordered.is_empty() {
            None
        } else {
            build_mention_pattern(&ordered)
        };

        Self { owners, mention }
    }

    /// Number of distinct cited DOIs
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Does the text mention any cited DOI, bare or behind `doi.org/`?
    ///
    /// Without a compiled pattern every text passes; the exact comparison
    /// still decides the match.
    pub fn mentions_cited_doi(&self, text: &str) -> bool {
        if self.is_empty() {
            return false;
        }
        match &self.mention {
            Some(pattern) => pattern.is_match(text),
            None => true,
        }
    }

    /// Cited record ids carrying exactly this DOI
    pub fn owners(&self, doi: &str) -> &[String] {
        self.owners
            .get(doi)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

fn build_mention_pattern(dois: &[&str]) -> Option<Regex> {
    let alternation = dois
        .iter()
        .map(|doi| regex::escape(doi))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(r"(?:doi\.org/)?(?:{})", alternation);

    match RegexBuilder::new(&pattern)
        .size_limit(MENTION_PATTERN_SIZE_LIMIT)
        .build()
    {
        Ok(regex) => Some(regex),
        Err(e) => {
            warn!(
                "Could not compile DOI prefilter for {} DOIs ({}); comparing every extracted DOI",
                dois.len(),
                e
            );
            None
        }
    }
}

/// Link entries to cited records whose DOI equals the entry's extracted DOI
pub fn match_by_doi(signed: &[SignedRecord], entries: &[ReferenceEntry]) -> Vec<Linkage> {
    if signed.is_empty() || entries.is_empty() {
        return Vec::new();
    }

    let index = CitedDoiIndex::build(signed);
    if index.is_empty() {
        return Vec::new();
    }

    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut linkages = Vec::new();

    for entry in entries {
        let Some(doi) = entry.doi.as_deref() else {
            continue;
        };
        if !index.mentions_cited_doi(&entry.text) {
            continue;
        }
        for cited_id in index.owners(doi) {
            if seen.insert((cited_id.as_str(), entry.citing_id.as_str())) {
                linkages.push(Linkage::new(cited_id.as_str(), entry.citing_id.as_str()));
            }
        }
    }

    linkages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linkage::records::{CitedRecord, CitingRecord};
    use crate::linkage::reference::split_citing_records;
    use crate::linkage::signature::build_signatures;

    fn cited_with_doi(id: &str, doi: &str) -> CitedRecord {
        CitedRecord::new(id)
            .with_source("2020", "PHYS FLUIDS", "32")
            .with_start_page("1")
            .with_doi(doi)
    }

    #[test]
    fn test_match_on_extracted_doi() {
        let signed = build_signatures(&[cited_with_doi("C1", "10.1063/5.0012345")]);
        let entries = split_citing_records(&[CitingRecord::new(
            "P1",
            "Wang L, 2020, PHYS FLUIDS, V32, DOI 10.1063/5.0012345",
        )]);

        assert_eq!(match_by_doi(&signed, &entries), vec![Linkage::new("C1", "P1")]);
    }

    #[test]
    fn test_mention_without_extracted_token_is_not_a_match() {
        let signed = build_signatures(&[cited_with_doi("C1", "10.1063/5.0012345")]);
        let entries = split_citing_records(&[CitingRecord::new(
            "P1",
            "https://doi.org/10.1063/5.0012345",
        )]);

        assert_eq!(entries[0].doi, None);
        assert!(match_by_doi(&signed, &entries).is_empty());
    }

    #[test]
    fn test_trailing_punctuation_breaks_equality() {
        let signed = build_signatures(&[cited_with_doi("C1", "10.1063/5.0012345")]);
        let entries = split_citing_records(&[CitingRecord::new(
            "P1",
            "DOI 10.1063/5.0012345, 10.1063/5.0099999",
        )]);

        assert!(match_by_doi(&signed, &entries).is_empty());
    }

    #[test]
    fn test_no_cited_dois_yields_empty() {
        let signed = build_signatures(&[CitedRecord::new("C1").with_source("2020", "J", "1")]);
        let entries = split_citing_records(&[CitingRecord::new("P1", "DOI 10.1063/5.0012345")]);
        assert!(match_by_doi(&signed, &entries).is_empty());
    }

    #[test]
    fn test_blank_dois_are_ignored() {
        let signed = build_signatures(&[cited_with_doi("C1", "  ")]);
        let index = CitedDoiIndex::build(&signed);
        assert!(index.is_empty());
        assert!(!index.mentions_cited_doi("anything"));
    }

    #[test]
    fn test_prefilter_accepts_doi_org_form() {
        let signed = build_signatures(&[cited_with_doi("C1", "10.1000/a(b)")]);
        let index = CitedDoiIndex::build(&signed);
        assert_eq!(index.len(), 1);
        assert!(index.mentions_cited_doi("see doi.org/10.1000/a(b) here"));
        assert!(index.mentions_cited_doi("10.1000/a(b)"));
        assert!(!index.mentions_cited_doi("10.1000/ab"));
    }

    #[test]
    fn test_same_pair_from_two_entries_is_deduplicated() {
        let signed = build_signatures(&[cited_with_doi("C1", "10.1063/5.0012345")]);
        let entries = split_citing_records(&[CitingRecord::new(
            "P1",
            "A, DOI 10.1063/5.0012345###B, doi:10.1063/5.0012345",
        )]);
        assert_eq!(match_by_doi(&signed, &entries).len(), 1);
    }

    #[test]
    fn test_records_sharing_a_doi_are_all_linked() {
        let signed = build_signatures(&[
            cited_with_doi("C1", "10.1063/5.0012345"),
            cited_with_doi("C2", "10.1063/5.0012345"),
        ]);
        let entries = split_citing_records(&[CitingRecord::new("P1", "DOI 10.1063/5.0012345")]);
        assert_eq!(
            match_by_doi(&signed, &entries),
            vec![Linkage::new("C1", "P1"), Linkage::new("C2", "P1")]
        );
    }
}
