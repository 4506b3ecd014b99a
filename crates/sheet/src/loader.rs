//! Asynchronous loading of spreadsheet files into a shared session.
//!
//! Files are parsed on the blocking pool, concurrently and independently.
//! Each result is applied to the session as soon as it resolves, one at a
//! time, so completion order (not submission order) decides load order.

use crate::error::{Result, SheetError};
use crate::xlsx::{export, ingest, FilePayload};
use futures::future::{AbortRegistration, Abortable};
use futures::stream::{FuturesUnordered, StreamExt};
use indexmap::IndexSet;
use sheetmerge_core::{Page, Session, Source, Table};
use std::fmt::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Parse one file on the blocking pool.
///
/// # Errors
///
/// Returns [`SheetError::Format`] for unreadable files and
/// [`SheetError::Task`] if the parsing task panicked.
pub async fn ingest_async(payload: FilePayload) -> Result<Source> {
    let file = payload.name.clone();
    tokio::task::spawn_blocking(move || ingest(&payload))
        .await
        .map_err(|e| SheetError::Task {
            file,
            message: e.to_string(),
        })?
}

/// Outcome of loading a batch of files.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Names the successfully parsed sources were stored under, in load order
    pub added: Vec<String>,
    /// Files that failed, with the reason
    pub failed: Vec<(String, SheetError)>,
}

impl BatchReport {
    /// Check whether every file loaded
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// One human-readable line describing all failures, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        if self.failed.is_empty() {
            return None;
        }

        let mut message = format!("Could not read {} file(s): ", self.failed.len());
        for (i, (file, err)) in self.failed.iter().enumerate() {
            if i > 0 {
                message.push_str("; ");
            }
            let _ = write!(message, "{file} ({err})");
        }
        Some(message)
    }
}

/// An exported workbook ready to be saved or downloaded.
#[derive(Debug, Clone)]
pub struct ExportedFile {
    /// Suggested file name
    pub file_name: String,
    /// Workbook bytes
    pub bytes: Vec<u8>,
}

impl ExportedFile {
    /// Write the workbook into `dir` under its file name.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written.
    pub fn save_in<P: AsRef<Path>>(&self, dir: P) -> Result<std::path::PathBuf> {
        let path = dir.as_ref().join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// Caller-facing handle over a session shared between tasks.
///
/// Every mutation takes the session lock once, so readers never observe a
/// source list that is out of step with the selection.
#[derive(Debug, Clone, Default)]
pub struct Loader {
    session: Arc<Mutex<Session>>,
}

impl Loader {
    /// Wrap a session
    #[must_use]
    pub fn new(session: Session) -> Self {
        Loader {
            session: Arc::new(Mutex::new(session)),
        }
    }

    /// Lock the session for direct access
    pub async fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().await
    }

    /// Parse files concurrently and add each one as it finishes.
    ///
    /// A file that fails to parse is reported and does not affect the rest
    /// of the batch.
    pub async fn add_sources(&self, files: Vec<FilePayload>) -> BatchReport {
        let mut pending: FuturesUnordered<_> = files
            .into_iter()
            .map(|payload| async move {
                let file = payload.name.clone();
                (file, ingest_async(payload).await)
            })
            .collect();

        let mut report = BatchReport::default();
        while let Some((file, result)) = pending.next().await {
            match result {
                Ok(source) => {
                    let name = self.session.lock().await.add_source(source);
                    report.added.push(name);
                }
                Err(err) => {
                    tracing::warn!(file = %file, error = %err, "failed to load file");
                    report.failed.push((file, err));
                }
            }
        }
        report
    }

    /// Like [`Loader::add_sources`], but can be abandoned through the
    /// matching `AbortHandle`.
    ///
    /// Files that resolved before the abort stay loaded; the rest are
    /// discarded without touching the session.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::Cancelled`] if the batch was aborted.
    pub async fn add_sources_abortable(
        &self,
        files: Vec<FilePayload>,
        registration: AbortRegistration,
    ) -> Result<BatchReport> {
        Abortable::new(self.add_sources(files), registration)
            .await
            .map_err(|_| SheetError::Cancelled)
    }

    /// Re-ingest a file in place of `old_name`.
    ///
    /// The old source stays usable while the new file is parsed. Only a
    /// successful parse swaps it in and migrates the selection; a failed one
    /// leaves the session untouched.
    ///
    /// # Errors
    ///
    /// Returns error if `old_name` is not loaded or the file cannot be parsed.
    pub async fn replace_source(&self, old_name: &str, file: FilePayload) -> Result<String> {
        if self.session.lock().await.source(old_name).is_none() {
            return Err(sheetmerge_core::MergeError::source_not_found(old_name).into());
        }

        let source = ingest_async(file).await?;
        let name = self.session.lock().await.replace_source(old_name, source)?;
        Ok(name)
    }

    /// Like [`Loader::replace_source`], but can be abandoned before the swap.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::Cancelled`] if aborted, otherwise as
    /// [`Loader::replace_source`].
    pub async fn replace_source_abortable(
        &self,
        old_name: &str,
        file: FilePayload,
        registration: AbortRegistration,
    ) -> Result<String> {
        Abortable::new(self.replace_source(old_name, file), registration)
            .await
            .map_err(|_| SheetError::Cancelled)?
    }

    /// Remove a source and its selected columns.
    ///
    /// # Errors
    ///
    /// Returns error if the source is not loaded.
    pub async fn delete_source(&self, name: &str) -> Result<()> {
        self.session.lock().await.delete_source(name)?;
        Ok(())
    }

    /// Toggle one (source, column) pair.
    ///
    /// # Errors
    ///
    /// Returns error if the source or column does not exist.
    pub async fn toggle_column(&self, source: &str, column: &str) -> Result<bool> {
        Ok(self.session.lock().await.toggle_column(source, column)?)
    }

    /// Toggle a shared column across all sources.
    ///
    /// # Errors
    ///
    /// Returns error if the column is not shared by every source.
    pub async fn toggle_shared_column(&self, column: &str) -> Result<bool> {
        Ok(self.session.lock().await.toggle_shared_column(column)?)
    }

    /// Columns present in every loaded source
    pub async fn shared_columns(&self) -> IndexSet<String> {
        self.session.lock().await.shared_columns()
    }

    /// The full reconciled table
    pub async fn table(&self) -> Table {
        self.session.lock().await.table()
    }

    /// One page of the reconciled table.
    ///
    /// # Errors
    ///
    /// Returns error if the configured page size is invalid.
    pub async fn preview(&self, page_number: usize) -> Result<Page> {
        Ok(self.session.lock().await.preview(page_number)?)
    }

    /// Export the full reconciled table, never just the current page.
    ///
    /// # Errors
    ///
    /// Returns error if the workbook cannot be produced.
    pub async fn export_all(&self) -> Result<ExportedFile> {
        let (table, options) = {
            let session = self.session.lock().await;
            (session.table(), session.options().clone())
        };

        let bytes = export(&table, &options.export_sheet_name)?;
        tracing::info!(
            file = %options.export_file_name,
            rows = table.row_count(),
            "exported combined data"
        );
        Ok(ExportedFile {
            file_name: options.export_file_name,
            bytes,
        })
    }
}
