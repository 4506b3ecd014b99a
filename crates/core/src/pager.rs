use crate::error::{MergeError, Result};
use crate::table::Table;
use crate::value::CellValue;

/// One page of a reconciled table.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Column names of the full table
    pub columns: Vec<String>,
    /// 1-based page number actually served (after clamping)
    pub number: usize,
    /// Total number of pages, at least 1
    pub total_pages: usize,
    /// Total rows in the full table
    pub total_rows: usize,
    /// Rows on this page
    pub rows: Vec<Vec<CellValue>>,
}

impl Page {
    /// Check whether a later page exists
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    /// Check whether an earlier page exists
    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    /// The page's rows as a standalone table
    #[must_use]
    pub fn into_table(self) -> Table {
        Table::new(self.columns, self.rows)
    }
}

/// Number of pages needed for `rows` rows, never less than one.
#[must_use]
pub fn page_count(rows: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    rows.div_ceil(page_size).max(1)
}

/// Slice out a 1-based page.
///
/// Out-of-range page numbers are clamped into `1..=total_pages`, so page 0
/// serves the first page and anything past the end serves the last one.
pub fn paginate(table: &Table, page_size: usize, page_number: usize) -> Result<Page> {
    if page_size == 0 {
        return Err(MergeError::InvalidPageSize(page_size));
    }

    let total_rows = table.row_count();
    let total_pages = page_count(total_rows, page_size);
    let number = page_number.clamp(1, total_pages);

    let start = (number - 1) * page_size;
    let end = (start + page_size).min(total_rows);

    Ok(Page {
        columns: table.columns().to_vec(),
        number,
        total_pages,
        total_rows,
        rows: table.rows()[start.min(total_rows)..end].to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::MergedColumns;
    use crate::table::reconcile;

    fn table(rows: usize) -> Table {
        let mut merged = MergedColumns::new();
        merged.insert(
            "N".to_string(),
            (0..rows).map(|i| CellValue::from(i as i64)).collect(),
        );
        reconcile(&merged)
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 10), 1);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(page_count(150, 10), 15);
    }

    #[test]
    fn test_middle_and_last_page() {
        let table = table(25);

        let page = paginate(&table, 10, 2).unwrap();
        assert_eq!(page.rows.len(), 10);
        assert_eq!(page.rows[0][0], CellValue::from(10));
        assert!(page.has_next());
        assert!(page.has_previous());

        let last = paginate(&table, 10, 3).unwrap();
        assert_eq!(last.rows.len(), 5);
        assert!(!last.has_next());
    }

    #[test]
    fn test_out_of_range_clamps() {
        let table = table(25);

        let past_end = paginate(&table, 10, 99).unwrap();
        assert_eq!(past_end.number, 3);
        assert_eq!(past_end.rows.len(), 5);

        let zero = paginate(&table, 10, 0).unwrap();
        assert_eq!(zero.number, 1);
        assert_eq!(zero.rows[0][0], CellValue::from(0));
    }

    #[test]
    fn test_empty_table() {
        let table = Table::default();
        let page = paginate(&table, 10, 1).unwrap();
        assert_eq!(page.total_pages, 1);
        assert!(page.rows.is_empty());
    }

    #[test]
    fn test_zero_page_size_rejected() {
        assert_eq!(
            paginate(&table(3), 0, 1),
            Err(MergeError::InvalidPageSize(0))
        );
    }

    #[test]
    fn test_into_table_keeps_columns() {
        let page = paginate(&table(12), 10, 2).unwrap();
        let slice = page.into_table();
        assert_eq!(slice.columns(), &["N".to_string()]);
        assert_eq!(slice.row_count(), 2);
    }
}
