use crate::error::{MergeError, Result};
use crate::merge::{merge, MergedColumns};
use crate::options::MergeOptions;
use crate::pager::{paginate, Page};
use crate::schema;
use crate::selection::{ColumnRef, SelectionSet};
use crate::source::Source;
use crate::table::{reconcile, Table};
use indexmap::{IndexMap, IndexSet};
use std::path::Path;

/// The state of one merge session: loaded sources and the current selection.
///
/// Shared columns, merged columns and the reconciled table are derived on
/// demand from this state and never cached, so they cannot go stale.
#[derive(Debug, Clone, Default)]
pub struct Session {
    sources: IndexMap<String, Source>,
    selection: SelectionSet,
    options: MergeOptions,
}

impl Session {
    /// Create an empty session with default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty session with the given options
    pub fn with_options(options: MergeOptions) -> Result<Self> {
        options.validate()?;
        Ok(Session {
            options,
            ..Self::default()
        })
    }

    /// Get the session options
    #[must_use]
    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    /// Replace the session options
    pub fn set_options(&mut self, options: MergeOptions) -> Result<()> {
        options.validate()?;
        self.options = options;
        Ok(())
    }

    // ===== Sources =====

    /// Get the number of loaded sources
    #[must_use]
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Source names in load order
    pub fn source_names(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    /// Get a source by name
    #[must_use]
    pub fn source(&self, name: &str) -> Option<&Source> {
        self.sources.get(name)
    }

    /// Iterate over sources in load order
    pub fn sources(&self) -> impl Iterator<Item = &Source> {
        self.sources.values()
    }

    /// Add a freshly ingested source.
    ///
    /// A name that is already taken gets a numeric suffix. Returns the name
    /// the source was stored under.
    pub fn add_source(&mut self, mut source: Source) -> String {
        let name = unique_name(&self.sources, source.name(), None);
        source.set_name(name.clone());

        tracing::info!(
            source = %name,
            columns = source.headers().len(),
            rows = source.row_count(),
            "added source"
        );
        self.sources.insert(name.clone(), source);
        name
    }

    /// Remove a source and every selected column that points at it.
    pub fn delete_source(&mut self, name: &str) -> Result<Source> {
        let source = self
            .sources
            .shift_remove(name)
            .ok_or_else(|| MergeError::source_not_found(name))?;

        let pruned = self.selection.prune_source(name);
        tracing::info!(source = %name, pruned, "deleted source");
        Ok(source)
    }

    /// Swap in a re-ingested source for `old_name`.
    ///
    /// The new source takes the old one's position, and selected columns are
    /// migrated to the new name. Nothing changes if `old_name` is not loaded.
    /// Returns the name the new source was stored under.
    pub fn replace_source(&mut self, old_name: &str, mut source: Source) -> Result<String> {
        let index = self
            .sources
            .get_index_of(old_name)
            .ok_or_else(|| MergeError::source_not_found(old_name))?;

        let name = unique_name(&self.sources, source.name(), Some(old_name));
        source.set_name(name.clone());

        self.sources.shift_remove_index(index);
        self.sources.shift_insert(index, name.clone(), source);
        self.selection.rename_source(old_name, &name);

        tracing::info!(old = %old_name, new = %name, "replaced source");
        Ok(name)
    }

    // ===== Schema =====

    /// Header list of every source, keyed by source name
    #[must_use]
    pub fn columns_of(&self) -> IndexMap<String, Vec<String>> {
        schema::columns_of(self.sources.values())
    }

    /// Columns present in every loaded source
    #[must_use]
    pub fn shared_columns(&self) -> IndexSet<String> {
        schema::shared_columns(self.sources.values())
    }

    // ===== Selection =====

    /// Get the current selection
    #[must_use]
    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    /// Check whether a (source, column) pair is selected
    #[must_use]
    pub fn is_selected(&self, source: &str, column: &str) -> bool {
        self.selection.contains(source, column)
    }

    /// Check whether every loaded source has `column` selected
    #[must_use]
    pub fn is_shared_selected(&self, column: &str) -> bool {
        !self.sources.is_empty() && self.selection.covers(column, self.source_names())
    }

    /// Select or deselect one column of one source.
    ///
    /// Returns `true` if the column is selected afterwards.
    pub fn toggle_column(&mut self, source: &str, column: &str) -> Result<bool> {
        let loaded = self
            .sources
            .get(source)
            .ok_or_else(|| MergeError::source_not_found(source))?;
        if !loaded.has_column(column) {
            return Err(MergeError::column_not_found(source, column));
        }

        Ok(self.selection.toggle(ColumnRef::new(source, column)))
    }

    /// Select or deselect a shared column in every source at once.
    ///
    /// Returns `true` if the column is selected afterwards.
    pub fn toggle_shared_column(&mut self, column: &str) -> Result<bool> {
        if !self.shared_columns().contains(column) {
            return Err(MergeError::ColumnNotShared {
                column: column.to_string(),
            });
        }

        let names: Vec<&str> = self.sources.keys().map(String::as_str).collect();
        Ok(self.selection.toggle_shared(column, names))
    }

    // ===== Derived output =====

    /// Selected columns concatenated across sources
    #[must_use]
    pub fn merged_columns(&self) -> MergedColumns {
        merge(&self.sources, &self.selection, &self.options)
    }

    /// The full reconciled table for preview and export
    #[must_use]
    pub fn table(&self) -> Table {
        reconcile(&self.merged_columns())
    }

    /// One page of the reconciled table, using the configured page size
    pub fn preview(&self, page_number: usize) -> Result<Page> {
        paginate(&self.table(), self.options.page_size, page_number)
    }

    /// One source's own headers and rows, without normalization
    pub fn source_table(&self, name: &str) -> Result<Table> {
        self.sources
            .get(name)
            .map(Table::from)
            .ok_or_else(|| MergeError::source_not_found(name))
    }
}

/// Pick a free name for a source, appending `_N` before the extension.
///
/// `ignore` names a slot that may be reused (the source being replaced).
fn unique_name(sources: &IndexMap<String, Source>, base: &str, ignore: Option<&str>) -> String {
    let taken = |name: &str| sources.contains_key(name) && ignore != Some(name);
    if !taken(base) {
        return base.to_string();
    }

    let path = Path::new(base);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(base);
    let extension = path.extension().and_then(|s| s.to_str());

    let mut suffix = 1;
    loop {
        let candidate = match extension {
            Some(ext) => format!("{stem}_{suffix}.{ext}"),
            None => format!("{stem}_{suffix}"),
        };
        if !taken(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}
