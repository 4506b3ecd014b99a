use crate::merge::MergedColumns;
use crate::source::Source;
use crate::value::CellValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A rectangular table: named columns and equal-length rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "TableData")]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

#[derive(Deserialize)]
struct TableData {
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<CellValue>>,
}

impl From<TableData> for Table {
    fn from(data: TableData) -> Self {
        Table::new(data.columns, data.rows)
    }
}

impl Table {
    /// Build a table, padding or truncating rows to the column count.
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();
        Table { columns, rows }
    }

    /// Get the column names in display order
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Get all rows
    #[must_use]
    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Get the number of rows
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// One row as a column-keyed record, columns in display order.
    #[must_use]
    pub fn record(&self, index: usize) -> Option<IndexMap<&str, &CellValue>> {
        let row = self.rows.get(index)?;
        Some(
            self.columns
                .iter()
                .map(String::as_str)
                .zip(row.iter())
                .collect(),
        )
    }

    /// Iterate over all rows as records.
    pub fn records(&self) -> impl Iterator<Item = IndexMap<&str, &CellValue>> + '_ {
        self.rows.iter().map(|row| {
            self.columns
                .iter()
                .map(String::as_str)
                .zip(row.iter())
                .collect()
        })
    }

    /// Rows as JSON objects, keys in column order.
    #[must_use]
    pub fn to_json(&self) -> Vec<serde_json::Value> {
        self.rows
            .iter()
            .map(|row| {
                let object = self
                    .columns
                    .iter()
                    .zip(row)
                    .map(|(name, value)| {
                        let json = match value {
                            CellValue::Number(n) => serde_json::Number::from_f64(*n)
                                .map_or(serde_json::Value::Null, serde_json::Value::Number),
                            other => serde_json::Value::String(other.to_string()),
                        };
                        (name.clone(), json)
                    })
                    .collect();
                serde_json::Value::Object(object)
            })
            .collect()
    }
}

/// Turn ragged merged columns into a rectangular table.
///
/// The row count is the length of the longest column; shorter columns are
/// padded with empty cells. Column order follows the merged column order.
pub fn reconcile(merged: &MergedColumns) -> Table {
    let max_len = merged.values().map(Vec::len).max().unwrap_or(0);

    let rows = (0..max_len)
        .map(|i| {
            merged
                .values()
                .map(|values| values.get(i).cloned().unwrap_or(CellValue::Empty))
                .collect()
        })
        .collect();

    Table {
        columns: merged.keys().cloned().collect(),
        rows,
    }
}

impl From<&Source> for Table {
    fn from(source: &Source) -> Self {
        Table {
            columns: source.headers().to_vec(),
            rows: source.rows().to_vec(),
        }
    }
}
