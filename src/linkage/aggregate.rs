use std::collections::BTreeMap;

use super::records::{CitationTally, Linkage};

/// Prefix of the per-year counter column on a cited table
pub const COUNTER_COLUMN_PREFIX: &str = "citation_count_";

/// Counter column for a year label: "2023" -> "citation_count_2023"
pub fn counter_column(year: &str) -> String {
    format!("{}{}", COUNTER_COLUMN_PREFIX, year)
}

/// Year label of a citing table: its first four characters, if they are digits
pub fn year_label(citing_table: &str) -> Option<&str> {
    citing_table
        .get(..4)
        .filter(|prefix| prefix.bytes().all(|b| b.is_ascii_digit()))
}

/// Count linkages per cited id, ordered by cited id
pub fn tally_citations(linkages: &[Linkage]) -> Vec<CitationTally> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for link in linkages {
        *counts.entry(link.cited_id.as_str()).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|(cited_id, count)| CitationTally {
            cited_id: cited_id.to_string(),
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_label() {
        assert_eq!(year_label("2023esi_Physics_of_Fluids"), Some("2023"));
        assert_eq!(year_label("2023"), Some("2023"));
        assert_eq!(year_label("esi_2023"), None);
        assert_eq!(year_label("202"), None);
        assert_eq!(year_label("20a3_table"), None);
        assert_eq!(year_label("２０２３"), None);
    }

    #[test]
    fn test_counter_column() {
        assert_eq!(counter_column("2023"), "citation_count_2023");
    }

    #[test]
    fn test_tally_counts_per_cited_id() {
        let tallies = tally_citations(&[
            Linkage::new("B", "P1"),
            Linkage::new("A", "P1"),
            Linkage::new("B", "P2"),
        ]);
        assert_eq!(
            tallies,
            vec![
                CitationTally { cited_id: "A".to_string(), count: 1 },
                CitationTally { cited_id: "B".to_string(), count: 2 },
            ]
        );
    }

    #[test]
    fn test_tally_empty() {
        assert!(tally_citations(&[]).is_empty());
    }
}
