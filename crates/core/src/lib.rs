//! # sheetmerge-core
//!
//! Multi-source tabular merge engine.
//!
//! This crate provides:
//! - A closed cell value model shared by every stage
//! - Sources (one ingested spreadsheet reduced to headers and rows)
//! - Shared-column discovery across sources
//! - An ordered selection of (source, column) pairs
//! - Column concatenation with date-serial normalization
//! - Reconciliation of ragged columns into a rectangular table, and paging
//!
//! Everything here is synchronous and free of I/O. Reading and writing
//! spreadsheet files lives in `sheetmerge-sheet`.
//!
//! # Examples
//!
//! ```
//! use sheetmerge_core::{Session, Source};
//!
//! let mut session = Session::new();
//! session.add_source(Source::from_data("a.xlsx", &["ID", "Name"], vec![vec!["1", "Ann"]]));
//! session.add_source(Source::from_data("b.xlsx", &["ID"], vec![vec!["2"], vec!["3"]]));
//!
//! assert_eq!(session.shared_columns().len(), 1);
//!
//! session.toggle_shared_column("ID").unwrap();
//! let table = session.table();
//! assert_eq!(table.columns(), &["ID".to_string()]);
//! assert_eq!(table.row_count(), 3);
//! ```

/// Spreadsheet date-serial decoding.
pub mod datetime;
/// Error types and result aliases.
pub mod error;
/// Column concatenation across sources.
pub mod merge;
/// Session and normalization options.
pub mod options;
/// Fixed-size paging over reconciled tables.
pub mod pager;
/// Column discovery across sources.
pub mod schema;
/// Ordered selection of (source, column) pairs.
pub mod selection;
/// Session state and caller-facing operations.
pub mod session;
/// Ingested sources.
pub mod source;
/// Rectangular tables and reconciliation.
pub mod table;
/// Cell values.
pub mod value;

pub use error::{MergeError, Result};
pub use merge::{merge, MergedColumns};
pub use options::MergeOptions;
pub use pager::{paginate, Page};
pub use schema::{columns_of, shared_columns};
pub use selection::{ColumnRef, SelectionSet};
pub use session::Session;
pub use source::Source;
pub use table::{reconcile, Table};
pub use value::CellValue;
