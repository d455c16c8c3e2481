use lazy_static::lazy_static;
use regex::Regex;

use super::records::{CitedRecord, SignatureBasis, SignedRecord};

lazy_static! {
    /// Characters dropped from the first author before it joins a signature
    static ref AUTHOR_NOISE: Regex = Regex::new(r"[\s,]+").unwrap();
}

/// Remove every whitespace character
pub fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Form used on both sides of the identifier comparison
pub fn normalize_for_matching(text: &str) -> String {
    strip_whitespace(text).to_lowercase()
}

/// Keep only the digits of a volume or page field ("12(3)" -> "123")
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Normalize the start page; a page with no digits left is treated as absent
pub fn normalize_start_page(raw: Option<&str>) -> Option<String> {
    raw.map(digits_only).filter(|page| !page.is_empty())
}

/// First author, without whitespace or commas, lower-cased. Empty if there is none.
pub fn first_author_token(authors: &[String]) -> String {
    authors
        .first()
        .map(|author| AUTHOR_NOISE.replace_all(author, "").to_lowercase())
        .unwrap_or_default()
}

/// Assemble a canonical signature from already-normalized parts
pub fn build_signature(
    year: &str,
    source_abbrev: &str,
    volume: &str,
    start_page: Option<&str>,
    first_author: &str,
) -> String {
    let base = format!("{},{},V{}", year, source_abbrev, volume);
    let signature = match start_page {
        Some(page) => format!("{},P{}", base, page),
        None => format!("{},{}", first_author, base),
    };
    strip_whitespace(&signature)
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.trim().is_empty())
}

/// Sign one cited record, or `None` when year, source or volume is missing
pub fn sign_record(record: &CitedRecord) -> Option<SignedRecord> {
    let year = present(&record.year)?;
    let source_abbrev = present(&record.source_abbrev)?;
    let volume = digits_only(present(&record.volume)?);
    let start_page = normalize_start_page(record.start_page.as_deref());

    let (signature, basis) = match start_page.as_deref() {
        Some(page) => (
            build_signature(year, source_abbrev, &volume, Some(page), ""),
            SignatureBasis::Page,
        ),
        None => (
            build_signature(
                year,
                source_abbrev,
                &volume,
                None,
                &first_author_token(&record.authors),
            ),
            SignatureBasis::Author,
        ),
    };

    Some(SignedRecord {
        id: record.id.clone(),
        doi: record.doi.clone(),
        signature,
        year_key: normalize_for_matching(year),
        basis,
    })
}

/// Sign a batch of cited records, dropping the incomplete ones
pub fn build_signatures(records: &[CitedRecord]) -> Vec<SignedRecord> {
    records.iter().filter_map(sign_record).collect()
}
