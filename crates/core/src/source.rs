use crate::value::CellValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

static EMPTY: CellValue = CellValue::Empty;

/// One ingested spreadsheet reduced to headers and row records.
///
/// Rows are stored positionally against `headers`; every row has exactly
/// `headers.len()` cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SourceData")]
pub struct Source {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

/// Wire form of a [`Source`], reshaped through [`Source::new`] on load.
#[derive(Deserialize)]
struct SourceData {
    name: String,
    headers: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<CellValue>>,
}

impl From<SourceData> for Source {
    fn from(data: SourceData) -> Self {
        Source::new(data.name, data.headers, data.rows)
    }
}

impl Source {
    /// Build a source from a header list and positional rows.
    ///
    /// Short rows are padded with empty cells and long rows truncated so the
    /// result is rectangular.
    #[must_use]
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();

        Source {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Build a source from string headers and any convertible values.
    #[must_use]
    pub fn from_data<H, T>(name: &str, headers: &[H], rows: Vec<Vec<T>>) -> Self
    where
        H: AsRef<str>,
        T: Into<CellValue>,
    {
        let headers = headers.iter().map(|h| h.as_ref().to_string()).collect();
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        Self::new(name, headers, rows)
    }

    /// Get the source name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Get the ordered header list
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Get all rows
    #[must_use]
    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Get the number of data rows
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check whether the source exposes a column
    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    /// Position of a column in `headers`
    #[must_use]
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    /// Values of one column in row order.
    ///
    /// A column the source does not expose yields one empty value per row,
    /// the same as reading an absent key from every row record.
    pub fn column_values<'a>(&'a self, column: &str) -> impl Iterator<Item = &'a CellValue> + 'a {
        let index = self.column_index(column);
        self.rows.iter().map(move |row| match index {
            Some(i) => row.get(i).unwrap_or(&EMPTY),
            None => &EMPTY,
        })
    }

    /// A single row as a header-keyed record.
    #[must_use]
    pub fn record(&self, index: usize) -> Option<IndexMap<&str, &CellValue>> {
        let row = self.rows.get(index)?;
        Some(
            self.headers
                .iter()
                .map(String::as_str)
                .zip(row.iter())
                .collect(),
        )
    }
}
