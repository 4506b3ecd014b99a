//! Column-level concatenation across sources.

use crate::datetime::normalize;
use crate::options::MergeOptions;
use crate::selection::SelectionSet;
use crate::source::Source;
use crate::value::CellValue;
use indexmap::IndexMap;

/// Merged output columns keyed by column name, in first-selected order.
pub type MergedColumns = IndexMap<String, Vec<CellValue>>;

/// Concatenate the selected columns of every source.
///
/// Refs are walked in selection order. Each ref appends its source's values
/// for that column (normalized, in row order) to the merged column of the
/// same name, so `(A, "X")` then `(B, "X")` gives A's rows followed by B's.
/// Refs to sources that are no longer loaded are skipped.
pub fn merge(
    sources: &IndexMap<String, Source>,
    selection: &SelectionSet,
    options: &MergeOptions,
) -> MergedColumns {
    let mut merged = MergedColumns::new();

    for column_ref in selection {
        let values = merged.entry(column_ref.column.clone()).or_default();

        let Some(source) = sources.get(&column_ref.source) else {
            tracing::debug!(%column_ref, "skipping reference to unloaded source");
            continue;
        };

        values.extend(
            source
                .column_values(&column_ref.column)
                .map(|value| normalize(value, options)),
        );
    }

    tracing::debug!(
        refs = selection.len(),
        columns = merged.len(),
        "merged selected columns"
    );
    merged
}
