//! Spreadsheet I/O for sheetmerge
//!
//! Reads `.xlsx`/`.xls` payloads into [`Source`](sheetmerge_core::Source)s,
//! writes reconciled tables back out as single-sheet `.xlsx` workbooks, and
//! loads batches of files concurrently onto a shared session.
//!
//! # Examples
//!
//! ## Ingesting and exporting
//!
//! ```no_run
//! use sheetmerge_core::Session;
//! use sheetmerge_sheet::{export_to_path, ingest_path};
//!
//! let mut session = Session::new();
//! let a = session.add_source(ingest_path("q1.xlsx").unwrap());
//! let b = session.add_source(ingest_path("q2.xls").unwrap());
//!
//! session.toggle_column(&a, "Date").unwrap();
//! session.toggle_column(&b, "Date").unwrap();
//!
//! export_to_path(&session.table(), "Combined Data", "combined_data.xlsx").unwrap();
//! ```
//!
//! ## Loading a batch concurrently
//!
//! ```no_run
//! use sheetmerge_sheet::{FilePayload, Loader};
//!
//! # async fn run() -> sheetmerge_sheet::Result<()> {
//! let loader = Loader::default();
//! let report = loader
//!     .add_sources(vec![
//!         FilePayload::from_path("q1.xlsx")?,
//!         FilePayload::from_path("q2.xlsx")?,
//!     ])
//!     .await;
//!
//! if let Some(message) = report.error_message() {
//!     eprintln!("{message}");
//! }
//!
//! let exported = loader.export_all().await?;
//! exported.save_in(".")?;
//! # Ok(())
//! # }
//! ```

mod error;
mod loader;
mod xlsx;

/// Re-export sheet error types.
pub use error::{Result, SheetError};
/// Re-export the async loader and its reports.
pub use loader::{ingest_async, BatchReport, ExportedFile, Loader};
/// Re-export synchronous ingestion and export.
pub use xlsx::{export, export_to_path, ingest, ingest_path, FilePayload};
