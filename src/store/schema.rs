//! Column layout of the tables the linker reads and writes.

/// External id, shared by cited and citing tables
pub const ID: &str = "UT";

/// Cited table
pub const DOI: &str = "DI";
pub const SOURCE_ABBREV: &str = "J9";
pub const VOLUME: &str = "VL";
pub const YEAR: &str = "PY";
pub const START_PAGE: &str = "BP";
pub const AUTHORS: &str = "AU";

/// Citing table
pub const REFERENCES: &str = "CR";

/// Linkage result table
pub const LINK_CITED: &str = "cited_UT";
pub const LINK_CITING: &str = "citing_UT";

pub const CITED_COLUMNS: [&str; 7] = [ID, DOI, SOURCE_ABBREV, VOLUME, YEAR, START_PAGE, AUTHORS];
pub const CITING_COLUMNS: [&str; 2] = [ID, REFERENCES];
pub const LINKAGE_COLUMNS: [&str; 2] = [LINK_CITED, LINK_CITING];
