//! Column discovery across sources.

use crate::source::Source;
use indexmap::{IndexMap, IndexSet};

/// Map each source name to its ordered header list.
pub fn columns_of<'a, I>(sources: I) -> IndexMap<String, Vec<String>>
where
    I: IntoIterator<Item = &'a Source>,
{
    sources
        .into_iter()
        .map(|s| (s.name().to_string(), s.headers().to_vec()))
        .collect()
}

/// Headers present in every source, by exact string match.
///
/// Ordered by first appearance when sources are walked in order. A single
/// source shares all of its own headers; no sources share nothing.
pub fn shared_columns<'a, I>(sources: I) -> IndexSet<String>
where
    I: IntoIterator<Item = &'a Source>,
{
    let sources: Vec<&Source> = sources.into_iter().collect();
    if sources.is_empty() {
        return IndexSet::new();
    }

    let mut shared = IndexSet::new();
    for header in sources.iter().flat_map(|s| s.headers()) {
        if shared.contains(header) {
            continue;
        }
        if sources.iter().all(|s| s.has_column(header)) {
            shared.insert(header.clone());
        }
    }

    tracing::debug!(
        sources = sources.len(),
        shared = shared.len(),
        "computed shared columns"
    );
    shared
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::CellValue;

    fn source(name: &str, headers: &[&str]) -> Source {
        Source::from_data::<_, CellValue>(name, headers, Vec::new())
    }

    #[test]
    fn test_no_sources() {
        assert!(shared_columns(std::iter::empty::<&Source>()).is_empty());
    }

    #[test]
    fn test_single_source_shares_everything() {
        let a = source("a.xlsx", &["ID", "Name"]);
        let shared = shared_columns([&a]);
        assert_eq!(shared.iter().collect::<Vec<_>>(), vec!["ID", "Name"]);
    }

    #[test]
    fn test_disjoint_sources() {
        let a = source("a.xlsx", &["A", "B"]);
        let b = source("b.xlsx", &["C", "D"]);
        let c = source("c.xlsx", &["E"]);
        assert!(shared_columns([&a, &b]).is_empty());
        assert!(shared_columns([&a, &b, &c]).is_empty());
    }

    #[test]
    fn test_first_seen_order() {
        let a = source("a.xlsx", &["Date", "ID", "Only A"]);
        let b = source("b.xlsx", &["ID", "Only B", "Date"]);
        let shared = shared_columns([&a, &b]);
        assert_eq!(shared.iter().collect::<Vec<_>>(), vec!["Date", "ID"]);
    }

    #[test]
    fn test_exact_match_only() {
        let a = source("a.xlsx", &["id"]);
        let b = source("b.xlsx", &["ID"]);
        assert!(shared_columns([&a, &b]).is_empty());
    }

    #[test]
    fn test_columns_of() {
        let a = source("a.xlsx", &["A"]);
        let b = source("b.xlsx", &["B", "C"]);
        let columns = columns_of([&a, &b]);
        assert_eq!(columns.keys().collect::<Vec<_>>(), vec!["a.xlsx", "b.xlsx"]);
        assert_eq!(columns["b.xlsx"], vec!["B".to_string(), "C".to_string()]);
    }
}
