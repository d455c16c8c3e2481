use std::collections::HashSet;

use super::records::Linkage;

/// Union of both matchers' linkages, each pair at most once.
/// First occurrence wins, so identifier matches come first.
pub fn merge_linkages(identifier: Vec<Linkage>, doi: Vec<Linkage>) -> Vec<Linkage> {
    let mut seen: HashSet<Linkage> = HashSet::with_capacity(identifier.len() + doi.len());
    identifier
        .into_iter()
        .chain(doi)
        .filter(|link| seen.insert(link.clone()))
        .collect()
}
