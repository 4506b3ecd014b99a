use futures::future::AbortHandle;
use rust_xlsxwriter::{Format, Workbook};
use sheetmerge_core::{CellValue, MergeOptions, Session};
use sheetmerge_sheet::{export, ingest, ingest_path, FilePayload, Loader, SheetError};
use tempfile::tempdir;

/// Build an .xlsx payload whose first row is `headers` and later rows hold numbers.
fn numeric_file(name: &str, headers: &[&str], rows: &[&[f64]]) -> FilePayload {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    for (c, header) in headers.iter().enumerate() {
        worksheet.write_string(0, c as u16, *header).unwrap();
    }
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            worksheet
                .write_number(r as u32 + 1, c as u16, *value)
                .unwrap();
        }
    }
    FilePayload::new(name, workbook.save_to_buffer().unwrap())
}

fn text_file(name: &str, headers: &[&str], rows: &[&[&str]]) -> FilePayload {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    for (c, header) in headers.iter().enumerate() {
        worksheet.write_string(0, c as u16, *header).unwrap();
    }
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            worksheet
                .write_string(r as u32 + 1, c as u16, *value)
                .unwrap();
        }
    }
    FilePayload::new(name, workbook.save_to_buffer().unwrap())
}

fn broken_file(name: &str) -> FilePayload {
    FilePayload::new(name, b"PK\x03\x04 definitely not a workbook".to_vec())
}

// ===== Ingestion Tests =====

#[test]
fn test_ingest_headers_and_rows() {
    let source = ingest(&text_file(
        "people.xlsx",
        &["Name", "City"],
        &[&["Alice", "NYC"], &["Bob", "LA"]],
    ))
    .unwrap();

    assert_eq!(source.name(), "people.xlsx");
    assert_eq!(source.headers(), &["Name".to_string(), "City".to_string()]);
    assert_eq!(source.row_count(), 2);
    assert_eq!(source.rows()[1][1], CellValue::from("LA"));
}

#[test]
fn test_ingest_first_sheet_only() {
    let mut workbook = Workbook::new();
    workbook
        .add_worksheet()
        .set_name("First")
        .unwrap()
        .write_string(0, 0, "Kept")
        .unwrap();
    workbook
        .add_worksheet()
        .set_name("Second")
        .unwrap()
        .write_string(0, 0, "Ignored")
        .unwrap();
    let payload = FilePayload::new("two.xlsx", workbook.save_to_buffer().unwrap());

    let source = ingest(&payload).unwrap();
    assert_eq!(source.headers(), &["Kept".to_string()]);
}

#[test]
fn test_ingest_date_formatted_cells_decode() {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let date_format = Format::new().set_num_format("dd/mm/yyyy hh:mm");
    worksheet.write_string(0, 0, "When").unwrap();
    worksheet.write_string(0, 1, "Qty").unwrap();
    worksheet
        .write_number_with_format(1, 0, 44197.25, &date_format)
        .unwrap();
    worksheet.write_number(1, 1, 5.0).unwrap();
    let payload = FilePayload::new("dates.xlsx", workbook.save_to_buffer().unwrap());

    let mut session = Session::new();
    let name = session.add_source(ingest(&payload).unwrap());
    session.toggle_column(&name, "When").unwrap();
    session.toggle_column(&name, "Qty").unwrap();

    let table = session.table();
    assert_eq!(table.rows()[0][0], CellValue::from("01/01/2021 06:00:00"));
    assert_eq!(table.rows()[0][1], CellValue::from(5));
}

#[test]
fn test_ingest_rejects_garbage() {
    let err = ingest(&broken_file("broken.xlsx")).unwrap_err();
    assert!(matches!(err, SheetError::Format { .. }));
    assert!(err.to_string().contains("broken.xlsx"));
}

#[test]
fn test_ingest_path_uses_file_name() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sales_q1.xlsx");
    std::fs::write(&path, text_file("ignored", &["Region"], &[&["North"]]).bytes).unwrap();

    let source = ingest_path(&path).unwrap();
    assert_eq!(source.name(), "sales_q1.xlsx");
}

// ===== Export Tests =====

#[test]
fn test_export_full_table_regardless_of_page_size() {
    let rows: Vec<Vec<f64>> = (0..150).map(|i| vec![f64::from(i), f64::from(i * 2)]).collect();
    let row_refs: Vec<&[f64]> = rows.iter().map(Vec::as_slice).collect();
    let payload = numeric_file("big.xlsx", &["X", "Y"], &row_refs);

    let options = MergeOptions::default()
        .with_page_size(10)
        .with_date_decoding(false);
    let mut session = Session::with_options(options).unwrap();
    let name = session.add_source(ingest(&payload).unwrap());
    session.toggle_column(&name, "X").unwrap();
    session.toggle_column(&name, "Y").unwrap();
    assert_eq!(session.preview(1).unwrap().rows.len(), 10);

    let bytes = export(&session.table(), "Combined Data").unwrap();
    let reread = ingest(&FilePayload::new("combined_data.xlsx", bytes)).unwrap();

    assert_eq!(reread.headers(), &["X".to_string(), "Y".to_string()]);
    assert_eq!(reread.row_count(), 150);
    assert_eq!(reread.rows()[149][1], CellValue::from(298));
}

#[test]
fn test_export_round_trips_padded_rows() {
    let mut session = Session::new();
    let a = session.add_source(
        ingest(&text_file("a.xlsx", &["X"], &[&["1"], &["2"], &["3"]])).unwrap(),
    );
    let b = session.add_source(ingest(&text_file("b.xlsx", &["Y"], &[&["7"]])).unwrap());
    session.toggle_column(&a, "X").unwrap();
    session.toggle_column(&b, "Y").unwrap();

    let bytes = export(&session.table(), "Combined Data").unwrap();
    let reread = ingest(&FilePayload::new("out.xlsx", bytes)).unwrap();

    assert_eq!(reread.row_count(), 3);
    assert_eq!(reread.rows()[0], vec![CellValue::from("1"), CellValue::from("7")]);
    assert_eq!(reread.rows()[2], vec![CellValue::from("3"), CellValue::Empty]);
}

// ===== Loader Tests =====

#[tokio::test]
async fn test_batch_failure_does_not_block_siblings() {
    let loader = Loader::default();
    let report = loader
        .add_sources(vec![
            text_file("a.xlsx", &["ID"], &[&["1"]]),
            broken_file("bad.xlsx"),
            text_file("b.xlsx", &["ID"], &[&["2"]]),
        ])
        .await;

    assert!(!report.is_complete());
    let mut added = report.added.clone();
    added.sort();
    assert_eq!(added, vec!["a.xlsx", "b.xlsx"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "bad.xlsx");
    assert!(report.error_message().unwrap().contains("bad.xlsx"));

    assert!(loader.shared_columns().await.contains("ID"));
}

#[tokio::test]
async fn test_replace_migrates_selection() {
    let loader = Loader::default();
    loader
        .add_sources(vec![text_file("A.xlsx", &["X"], &[&["old"]])])
        .await;
    loader.toggle_column("A.xlsx", "X").await.unwrap();

    let name = loader
        .replace_source("A.xlsx", text_file("A_v2.xlsx", &["X"], &[&["new"]]))
        .await
        .unwrap();
    assert_eq!(name, "A_v2.xlsx");

    let session = loader.lock().await;
    assert!(session.is_selected("A_v2.xlsx", "X"));
    assert!(session.source("A.xlsx").is_none());
    assert_eq!(session.table().rows()[0][0], CellValue::from("new"));
}

#[tokio::test]
async fn test_failed_replace_leaves_state_untouched() {
    let loader = Loader::default();
    loader
        .add_sources(vec![text_file("A.xlsx", &["X"], &[&["old"]])])
        .await;
    loader.toggle_column("A.xlsx", "X").await.unwrap();

    let err = loader
        .replace_source("A.xlsx", broken_file("A_v2.xlsx"))
        .await
        .unwrap_err();
    assert!(matches!(err, SheetError::Format { .. }));

    let session = loader.lock().await;
    assert!(session.is_selected("A.xlsx", "X"));
    assert_eq!(session.table().rows()[0][0], CellValue::from("old"));
}

#[tokio::test]
async fn test_replace_unknown_source() {
    let loader = Loader::default();
    let err = loader
        .replace_source("missing.xlsx", text_file("x.xlsx", &["X"], &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, SheetError::Merge(_)));
}

#[tokio::test]
async fn test_aborted_batch_leaves_session_empty() {
    let loader = Loader::default();
    let (handle, registration) = AbortHandle::new_pair();
    handle.abort();

    let result = loader
        .add_sources_abortable(vec![text_file("a.xlsx", &["X"], &[&["1"]])], registration)
        .await;

    assert!(matches!(result, Err(SheetError::Cancelled)));
    assert_eq!(loader.lock().await.source_count(), 0);
}

#[tokio::test]
async fn test_aborted_replace_keeps_original() {
    let loader = Loader::default();
    let report = loader
        .add_sources(vec![text_file("A.xlsx", &["X"], &[&["old"]])])
        .await;
    assert!(report.is_complete());
    loader.toggle_column("A.xlsx", "X").await.unwrap();

    let (handle, registration) = AbortHandle::new_pair();
    handle.abort();
    let result = loader
        .replace_source_abortable(
            "A.xlsx",
            text_file("A_v2.xlsx", &["X"], &[&["new"]]),
            registration,
        )
        .await;
    assert!(matches!(result, Err(SheetError::Cancelled)));

    let session = loader.lock().await;
    assert_eq!(session.source_names().collect::<Vec<_>>(), vec!["A.xlsx"]);
    assert!(session.is_selected("A.xlsx", "X"));
    assert!(!session.is_selected("A_v2.xlsx", "X"));
    assert_eq!(session.table().rows()[0][0], CellValue::from("old"));
}

#[tokio::test]
async fn test_export_all_uses_configured_names() {
    let dir = tempdir().unwrap();
    let loader = Loader::default();
    loader
        .add_sources(vec![text_file("a.xlsx", &["X"], &[&["1"], &["2"]])])
        .await;
    loader.toggle_column("a.xlsx", "X").await.unwrap();

    let exported = loader.export_all().await.unwrap();
    assert_eq!(exported.file_name, "combined_data.xlsx");

    let path = exported.save_in(dir.path()).unwrap();
    let reread = ingest_path(&path).unwrap();
    assert_eq!(reread.row_count(), 2);
}
