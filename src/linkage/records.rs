use serde::{Deserialize, Serialize};

/// Delimiter between authors in `AU` and between entries in `CR`
pub const FIELD_DELIMITER: &str = "###";

/// A publication that may be referenced by others
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CitedRecord {
    pub id: String,
    pub doi: Option<String>,
    pub source_abbrev: Option<String>,
    pub volume: Option<String>,
    pub year: Option<String>,
    pub start_page: Option<String>,
    pub authors: Vec<String>,
}

impl CitedRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_doi(mut self, doi: &str) -> Self {
        self.doi = Some(doi.to_string());
        self
    }

    pub fn with_source(mut self, year: &str, source_abbrev: &str, volume: &str) -> Self {
        self.year = Some(year.to_string());
        self.source_abbrev = Some(source_abbrev.to_string());
        self.volume = Some(volume.to_string());
        self
    }

    pub fn with_start_page(mut self, start_page: &str) -> Self {
        self.start_page = Some(start_page.to_string());
        self
    }

    pub fn with_authors(mut self, authors: &[&str]) -> Self {
        self.authors = authors.iter().map(|a| a.to_string()).collect();
        self
    }
}

/// A publication carrying a raw reference list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CitingRecord {
    pub id: String,
    pub references: Option<String>,
}

impl CitingRecord {
    pub fn new(id: impl Into<String>, references: &str) -> Self {
        Self {
            id: id.into(),
            references: Some(references.to_string()),
        }
    }
}

/// One reference from a citing record's list, with its embedded DOI if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceEntry {
    pub citing_id: String,
    pub text: String,
    pub doi: Option<String>,
}

/// Which fields a signature was assembled from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureBasis {
    /// `year,source,Vvolume,Ppage`
    Page,
    /// `author,year,source,Vvolume` (no usable start page)
    Author,
}

impl SignatureBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureBasis::Page => "page",
            SignatureBasis::Author => "author",
        }
    }
}

impl std::fmt::Display for SignatureBasis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A cited record reduced to what the matchers need
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedRecord {
    pub id: String,
    pub doi: Option<String>,
    pub signature: String,
    /// Lower-cased year token, always a substring of the lower-cased signature
    #[serde(skip)]
    pub year_key: String,
    pub basis: SignatureBasis,
}

/// One citing -> cited relationship
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Linkage {
    pub cited_id: String,
    pub citing_id: String,
}

impl Linkage {
    pub fn new(cited_id: impl Into<String>, citing_id: impl Into<String>) -> Self {
        Self {
            cited_id: cited_id.into(),
            citing_id: citing_id.into(),
        }
    }
}

/// Number of citing records in one pass that referenced a cited record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationTally {
    pub cited_id: String,
    pub count: usize,
}

/// Split a delimited author field into trimmed author names
pub fn parse_author_list(raw: &str) -> Vec<String> {
    raw.split(FIELD_DELIMITER)
        .map(|a| a.trim().to_string())
        .collect()
}
