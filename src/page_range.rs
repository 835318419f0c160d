use crate::error::{FormatError, FormatResult};
use std::collections::BTreeSet;

/// Inclusive range of 1-based page numbers. A single page has `start == end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: u64,
    pub end: u64,
}

impl PageRange {
    /// Parse a page range token like "5" or "1-3"
    pub fn parse(s: &str) -> FormatResult<Self> {
        let s = s.trim();
        let invalid = || FormatError::new(format!("invalid page range: {}", s));

        if let Some((start, end)) = s.split_once('-') {
            let start = parse_page_number(start).ok_or_else(invalid)?;
            let end = parse_page_number(end).ok_or_else(invalid)?;
            Ok(PageRange { start, end })
        } else {
            let page = parse_page_number(s).ok_or_else(invalid)?;
            Ok(PageRange {
                start: page,
                end: page,
            })
        }
    }

    /// Zero-based indices of this range that fall inside a document of
    /// `page_count` pages. A reversed range yields nothing.
    pub fn indices(&self, page_count: usize) -> impl Iterator<Item = usize> {
        // Page 0 has no index; clamp both ends into 1..=page_count.
        let first = self.start.max(1);
        let last = self.end.min(page_count as u64);
        (first..=last).map(|page| (page - 1) as usize)
    }
}

fn parse_page_number(s: &str) -> Option<u64> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Parse a comma-separated list of page ranges like "1-3,5". Empty entries are
/// skipped.
pub fn parse_page_ranges(s: &str) -> FormatResult<Vec<PageRange>> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(PageRange::parse)
        .collect()
}

/// Resolve a page range list into sorted, unique, zero-based page indices
/// bounded by `page_count`.
///
/// Pages outside the document are dropped. It is an error for nothing to
/// remain, and for any entry not to be a page number or a `start-end` pair.
pub fn resolve_page_indices(spec: &str, page_count: usize) -> FormatResult<Vec<usize>> {
    let ranges = parse_page_ranges(spec)?;

    let indices: BTreeSet<usize> = ranges
        .iter()
        .flat_map(|range| range.indices(page_count))
        .collect();

    if indices.is_empty() {
        return Err(FormatError::new("no valid pages selected"));
    }

    Ok(indices.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_page() {
        let range = PageRange::parse("5").unwrap();
        assert_eq!(range, PageRange { start: 5, end: 5 });
        assert_eq!(range.indices(10).collect::<Vec<_>>(), vec![4]);
    }

    #[test]
    fn test_page_range() {
        let range = PageRange::parse(" 1 - 5 ").unwrap();
        assert_eq!(range.indices(10).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_reverse_range_is_empty() {
        let range = PageRange::parse("5-2").unwrap();
        assert_eq!(range.indices(10).count(), 0);
    }

    #[test]
    fn test_comma_separated() {
        assert_eq!(resolve_page_indices("1-3,5", 10).unwrap(), vec![0, 1, 2, 4]);
    }

    #[test]
    fn test_out_of_bounds_dropped() {
        assert_eq!(resolve_page_indices("1-3,5", 3).unwrap(), vec![0, 1, 2]);
        assert_eq!(resolve_page_indices("0,2,99", 3).unwrap(), vec![1]);
    }

    #[test]
    fn test_duplicates_collapse_and_sort() {
        assert_eq!(
            resolve_page_indices("4, 2-3, 3, 1-2", 10).unwrap(),
            vec![0, 1, 2, 3]
        );
    }

    #[test]
    fn test_huge_range_is_clamped() {
        assert_eq!(
            resolve_page_indices("2-18446744073709551615", 3).unwrap(),
            vec![1, 2]
        );
    }

    #[test]
    fn test_empty_entries_skipped() {
        assert_eq!(resolve_page_indices("1,,3,", 5).unwrap(), vec![0, 2]);
    }

    #[test]
    fn test_no_valid_pages() {
        for spec in ["", "  ", "5-2", "0", "11-20"] {
            let err = resolve_page_indices(spec, 10).unwrap_err();
            assert_eq!(err.message(), "no valid pages selected");
        }
    }

    #[test]
    fn test_malformed_token_names_token() {
        let err = resolve_page_indices("1, abc ,3", 10).unwrap_err();
        assert_eq!(err.message(), "invalid page range: abc");

        for spec in ["-3", "2-", "1-2-3", "+4", "3x", "1.5"] {
            assert!(resolve_page_indices(spec, 10).is_err(), "{spec}");
        }
    }
}
