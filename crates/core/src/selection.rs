use serde::{Deserialize, Serialize};
use std::fmt;

/// A caller-selected (source, column) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub source: String,
    pub column: String,
}

impl ColumnRef {
    /// Create a new column reference
    pub fn new(source: impl Into<String>, column: impl Into<String>) -> Self {
        ColumnRef {
            source: source.into(),
            column: column.into(),
        }
    }

    fn matches(&self, source: &str, column: &str) -> bool {
        self.source == source && self.column == column
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.column)
    }
}

/// Ordered set of selected columns.
///
/// Insertion order decides output column layout and, for same-named
/// columns, the order in which sources are concatenated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SelectionData")]
pub struct SelectionSet {
    refs: Vec<ColumnRef>,
}

/// Loaded refs go through [`FromIterator`], which drops duplicates.
#[derive(Deserialize)]
struct SelectionData {
    refs: Vec<ColumnRef>,
}

impl From<SelectionData> for SelectionSet {
    fn from(data: SelectionData) -> Self {
        data.refs.into_iter().collect()
    }
}

impl SelectionSet {
    /// Create an empty selection
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of selected refs
    #[must_use]
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    /// Check if nothing is selected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Iterate over refs in selection order
    pub fn iter(&self) -> impl Iterator<Item = &ColumnRef> {
        self.refs.iter()
    }

    /// Check whether a (source, column) pair is selected
    #[must_use]
    pub fn contains(&self, source: &str, column: &str) -> bool {
        self.refs.iter().any(|r| r.matches(source, column))
    }

    /// Remove the ref if present, append it otherwise.
    ///
    /// Returns `true` if the ref is selected afterwards.
    pub fn toggle(&mut self, column_ref: ColumnRef) -> bool {
        match self
            .refs
            .iter()
            .position(|r| r.matches(&column_ref.source, &column_ref.column))
        {
            Some(index) => {
                self.refs.remove(index);
                false
            }
            None => {
                self.refs.push(column_ref);
                true
            }
        }
    }

    /// Whether every listed source has a ref for `column`.
    ///
    /// Vacuously true for an empty source list.
    pub fn covers<'a, I>(&self, column: &str, sources: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        sources
            .into_iter()
            .all(|source| self.contains(source, column))
    }

    /// Toggle a column across all listed sources at once.
    ///
    /// If every source already has a ref for `column`, all refs for it are
    /// removed. Otherwise a ref is appended for each source lacking one,
    /// leaving existing refs where they are. Returns `true` if the column is
    /// selected afterwards.
    pub fn toggle_shared<'a, I>(&mut self, column: &str, sources: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        let sources: Vec<&str> = sources.into_iter().collect();

        if self.covers(column, sources.iter().copied()) {
            self.refs.retain(|r| r.column != column);
            return false;
        }

        for source in sources {
            if !self.contains(source, column) {
                self.refs.push(ColumnRef::new(source, column));
            }
        }
        true
    }

    /// Drop every ref pointing at `source`. Returns how many were removed.
    pub fn prune_source(&mut self, source: &str) -> usize {
        let before = self.refs.len();
        self.refs.retain(|r| r.source != source);
        before - self.refs.len()
    }

    /// Point every ref at `old` to `new`, keeping column and position.
    pub fn rename_source(&mut self, old: &str, new: &str) {
        for r in self.refs.iter_mut().filter(|r| r.source == old) {
            r.source = new.to_string();
        }
    }
}

impl<'a> IntoIterator for &'a SelectionSet {
    type Item = &'a ColumnRef;
    type IntoIter = std::slice::Iter<'a, ColumnRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.refs.iter()
    }
}

impl FromIterator<ColumnRef> for SelectionSet {
    fn from_iter<T: IntoIterator<Item = ColumnRef>>(iter: T) -> Self {
        let mut set = SelectionSet::new();
        for r in iter {
            if !set.contains(&r.source, &r.column) {
                set.refs.push(r);
            }
        }
        set
    }
}
