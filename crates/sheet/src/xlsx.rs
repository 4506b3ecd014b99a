use crate::error::{Result, SheetError};
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use rust_xlsxwriter::Workbook;
use sheetmerge_core::{CellValue, Source, Table};
use std::io::Cursor;
use std::path::Path;

/// Raw bytes of one spreadsheet file as handed over by the caller.
#[derive(Debug, Clone)]
pub struct FilePayload {
    /// File name; becomes the source name
    pub name: String,
    /// Unparsed file contents
    pub bytes: Vec<u8>,
}

impl FilePayload {
    /// Create a payload from a name and bytes
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        FilePayload {
            name: name.into(),
            bytes,
        }
    }

    /// Read a payload from disk, named after the file name
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        Ok(Self::new(file_name(path), bytes))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Convert calamine Data to CellValue
fn data_to_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        // Date-formatted cells keep their serial; the merge engine decodes it
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}

fn is_blank(value: &CellValue) -> bool {
    value.is_empty() || value.as_text() == Some("")
}

/// Parse one spreadsheet file into a source.
///
/// Only the first sheet is read. Its first row supplies the headers; cells
/// that are empty there drop their whole column. Every later non-blank row
/// becomes a record keyed by the remaining headers.
///
/// # Errors
///
/// Returns [`SheetError::Format`] if the bytes are not a readable `.xlsx` or
/// `.xls` workbook, or the workbook has no sheets.
pub fn ingest(payload: &FilePayload) -> Result<Source> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(payload.bytes.as_slice()))
        .map_err(|e| SheetError::format(&payload.name, e))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SheetError::format(&payload.name, "workbook has no sheets"))?
        .map_err(|e| SheetError::format(&payload.name, e))?;

    let source = source_from_range(&payload.name, &range);
    tracing::debug!(
        file = %payload.name,
        columns = source.headers().len(),
        rows = source.row_count(),
        "ingested spreadsheet"
    );
    Ok(source)
}

/// Parse a spreadsheet file from disk.
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed.
pub fn ingest_path<P: AsRef<Path>>(path: P) -> Result<Source> {
    ingest(&FilePayload::from_path(path)?)
}

fn source_from_range(name: &str, range: &Range<Data>) -> Source {
    let mut rows = range.rows();

    let Some(header_row) = rows.next() else {
        return Source::new(name, Vec::new(), Vec::new());
    };

    // Header text plus the physical column it came from
    let mut headers: Vec<String> = Vec::new();
    let mut indices: Vec<usize> = Vec::new();
    for (index, cell) in header_row.iter().enumerate() {
        let Some(header) = data_to_cell_value(cell).as_header() else {
            continue;
        };
        if headers.contains(&header) {
            tracing::warn!(file = %name, header = %header, "duplicate header, keeping first");
            continue;
        }
        headers.push(header);
        indices.push(index);
    }

    let records = rows
        .map(|row| {
            indices
                .iter()
                .map(|&i| row.get(i).map(data_to_cell_value).unwrap_or_default())
                .collect::<Vec<_>>()
        })
        .filter(|cells| !cells.iter().all(is_blank))
        .collect();

    Source::new(name, headers, records)
}

/// Serialize a table as a single-sheet `.xlsx` workbook.
///
/// The first row holds the column names; data rows follow in order. Empty
/// cells are left unwritten.
///
/// # Errors
///
/// Returns error if the sheet name is rejected or the table exceeds the
/// worksheet size limits.
pub fn export(table: &Table, sheet_name: &str) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name).map_err(SheetError::export)?;

    for (col_idx, name) in table.columns().iter().enumerate() {
        let col_num = u16::try_from(col_idx).map_err(|_| SheetError::export("Column index overflow"))?;
        worksheet
            .write_string(0, col_num, name)
            .map_err(SheetError::export)?;
    }

    for (row_idx, row) in table.rows().iter().enumerate() {
        let row_num =
            u32::try_from(row_idx + 1).map_err(|_| SheetError::export("Row index overflow"))?;

        for (col_idx, cell) in row.iter().enumerate() {
            let col_num =
                u16::try_from(col_idx).map_err(|_| SheetError::export("Column index overflow"))?;

            match cell {
                CellValue::Empty => {}
                CellValue::Number(n) => {
                    worksheet
                        .write_number(row_num, col_num, *n)
                        .map_err(SheetError::export)?;
                }
                CellValue::Text(s) => {
                    worksheet
                        .write_string(row_num, col_num, s)
                        .map_err(SheetError::export)?;
                }
            }
        }
    }

    let bytes = workbook.save_to_buffer().map_err(SheetError::export)?;
    tracing::debug!(
        sheet = %sheet_name,
        rows = table.row_count(),
        bytes = bytes.len(),
        "exported table"
    );
    Ok(bytes)
}

/// Export a table and write it to disk.
///
/// # Errors
///
/// Returns error if export fails or the file cannot be written.
pub fn export_to_path<P: AsRef<Path>>(table: &Table, sheet_name: &str, path: P) -> Result<()> {
    let bytes = export(table, sheet_name)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workbook_bytes(rows: &[&[Option<&str>]]) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                if let Some(text) = cell {
                    worksheet.write_string(r as u32, c as u16, *text).unwrap();
                }
            }
        }
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_empty_header_drops_column() {
        let bytes = workbook_bytes(&[
            &[Some("Name"), None, Some("City")],
            &[Some("Alice"), Some("hidden"), Some("NYC")],
        ]);

        let source = ingest(&FilePayload::new("people.xlsx", bytes)).unwrap();
        assert_eq!(source.headers(), &["Name".to_string(), "City".to_string()]);
        assert_eq!(
            source.rows()[0],
            vec![CellValue::from("Alice"), CellValue::from("NYC")]
        );
    }

    #[test]
    fn test_duplicate_header_keeps_first() {
        let bytes = workbook_bytes(&[
            &[Some("ID"), Some("ID")],
            &[Some("first"), Some("second")],
        ]);

        let source = ingest(&FilePayload::new("dup.xlsx", bytes)).unwrap();
        assert_eq!(source.headers(), &["ID".to_string()]);
        assert_eq!(source.rows()[0], vec![CellValue::from("first")]);
    }

    #[test]
    fn test_blank_rows_skipped() {
        let bytes = workbook_bytes(&[
            &[Some("A")],
            &[Some("1")],
            &[None],
            &[Some("3")],
        ]);

        let source = ingest(&FilePayload::new("gaps.xlsx", bytes)).unwrap();
        assert_eq!(source.row_count(), 2);
    }

    #[test]
    fn test_garbage_is_format_error() {
        let err = ingest(&FilePayload::new("notes.xlsx", b"not a workbook".to_vec())).unwrap_err();
        assert!(matches!(err, SheetError::Format { ref file, .. } if file == "notes.xlsx"));
    }

    #[test]
    fn test_export_rejects_bad_sheet_name() {
        let result = export(&Table::default(), "bad[name]");
        assert!(matches!(result, Err(SheetError::Export(_))));
    }
}
