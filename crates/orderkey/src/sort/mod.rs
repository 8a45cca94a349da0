//! Row sorting driven by a `CompositeOrderBuilder`.
//!
//! Keys are projected once per row before any comparison runs, so a row
//! that fails projection aborts the sort with the input left untouched.

#[cfg(test)]
mod tests;

use crate::{builder::CompositeOrderBuilder, error::OrderError, key::CompositeKey};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::trace;

///
/// SortOptions
///
/// Host-configurable knobs for one sort pass.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct SortOptions {
    /// Keep only the first `limit` rows in order.
    pub limit: Option<usize>,
}

impl SortOptions {
    #[must_use]
    pub const fn limit(limit: usize) -> Self {
        Self { limit: Some(limit) }
    }
}

/// Stable sort of `rows` under the builder's ordering.
pub fn sort_rows<T>(
    builder: &CompositeOrderBuilder<T>,
    rows: &mut Vec<T>,
) -> Result<(), OrderError> {
    let mut keyed = project_rows(builder, rows)?;
    keyed.sort_by(|left, right| builder.compare(&left.0, &right.0));

    trace!(rows = keyed.len(), clauses = builder.len(), "rows sorted");
    rows.extend(keyed.into_iter().map(|(_, row)| row));

    Ok(())
}

/// Keep the first `keep_count` rows of the stable order, in order.
///
/// Selects the top-k set before sorting it; input position is the final
/// tie-break so the result matches a full stable sort truncated to
/// `keep_count`.
pub fn sort_rows_bounded<T>(
    builder: &CompositeOrderBuilder<T>,
    rows: &mut Vec<T>,
    keep_count: usize,
) -> Result<(), OrderError> {
    if keep_count == 0 {
        rows.clear();
        return Ok(());
    }

    let mut keyed: Vec<_> = project_rows(builder, rows)?
        .into_iter()
        .enumerate()
        .map(|(position, (key, row))| (key, position, row))
        .collect();
    let compare = |left: &(CompositeKey, usize, T), right: &(CompositeKey, usize, T)| -> Ordering {
        builder
            .compare(&left.0, &right.0)
            .then_with(|| left.1.cmp(&right.1))
    };

    if keyed.len() > keep_count {
        // Partition around the last row we keep; `0..keep_count` is then the
        // top-k set, unsorted.
        keyed.select_nth_unstable_by(keep_count - 1, compare);
        keyed.truncate(keep_count);
    }
    keyed.sort_unstable_by(compare);

    trace!(
        rows = keyed.len(),
        keep_count,
        clauses = builder.len(),
        "rows sorted (bounded)"
    );
    rows.extend(keyed.into_iter().map(|(_, _, row)| row));

    Ok(())
}

/// Sort `rows` according to `options`.
pub fn sort_rows_with<T>(
    builder: &CompositeOrderBuilder<T>,
    rows: &mut Vec<T>,
    options: &SortOptions,
) -> Result<(), OrderError> {
    match options.limit {
        Some(keep_count) => sort_rows_bounded(builder, rows, keep_count),
        None => sort_rows(builder, rows),
    }
}

// Project every row up front; on failure `rows` is left as it was.
// On success `rows` is drained into the returned pairs.
fn project_rows<T>(
    builder: &CompositeOrderBuilder<T>,
    rows: &mut Vec<T>,
) -> Result<Vec<(CompositeKey, T)>, OrderError> {
    let keys = rows
        .iter()
        .map(|row| builder.project(row))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(keys.into_iter().zip(rows.drain(..)).collect())
}
