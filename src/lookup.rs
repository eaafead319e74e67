//! # Sharded coefficient lookup engine
//!
//! Given an arbitrary, possibly unordered, possibly duplicate-containing
//! batch of source ids, this module locates the shard(s) whose partition
//! range could contain each id, intersects the batch against each shard's
//! identifier column, and reassembles per-shard [`CoeffBatch`]es whose rows
//! stay tied to the caller's **original input positions**.
//!
//! ## The sorted-access protocol
//! -----------------
//! The storage layer only serves multi-row coefficient reads whose indices
//! are strictly increasing. Intersection, however, produces shard rows in
//! matched-value order. The engine therefore:
//!
//! 1. argsorts the shard rows into an ascending fetch order,
//! 2. fetches the BP and RP coefficient rows in that order, and
//! 3. applies the inverse permutation so each output row lines up with its
//!    matched value again,
//!
//! before concatenating BP and RP into the 110-wide coefficient matrix.
//! Auxiliary scalar columns take the other path: the whole column is loaded
//! and gathered per output row, with no ordering correction needed or
//! applied.
//!
//! ## Duplicate handling
//! -----------------
//! With `assume_unique` set, the intersection trusts both sides to be
//! duplicate-free; a violated assumption is detected from the shape of the
//! sorted merge (or, as a backstop, from the storage layer rejecting a
//! non-monotonic fetch) and surfaces as
//! [`StarshardError::DuplicateSourceId`] instead of silently wrong rows.
//! With `assume_unique` off, both sides are deduplicated before the
//! intersection and every original occurrence of a matched value receives
//! its own output row.
//!
//! ## Laziness
//! -----------------
//! [`XpCoeffStream`] is a pull-based iterator holding the remaining shard
//! cursor: each shard's reads only happen when the caller asks for the next
//! batch. The stream is finite and not restartable; abandoning it and
//! calling [`crate::store::XpCoeffStore::stream`] again starts from scratch.

use std::cmp::Ordering;

use itertools::Itertools;
use nalgebra::DMatrix;

use crate::accessor::ShardAccessor;
use crate::catalog::ShardDescriptor;
use crate::constants::{
    FastHashMap, PartitionKey, SourceId, BP_COEFF_COLUMN, BP_COEFF_ERROR_COLUMN, RP_COEFF_COLUMN,
    RP_COEFF_ERROR_COLUMN, XP_BAND_WIDTH, XP_COEFF_WIDTH,
};
use crate::container::ColumnData;
use crate::partition::partition_keys;
use crate::starshard_errors::StarshardError;
use crate::store::XpCoeffStore;

/// Options of one lookup call.
#[derive(Debug, Clone)]
pub struct StreamOptions {
    /// Caller asserts the query batch contains no duplicate values.
    ///
    /// Leaving this on skips deduplication; if the assertion is wrong the
    /// call fails with [`StarshardError::DuplicateSourceId`].
    pub assume_unique: bool,
    /// Also fetch the BP/RP coefficient error columns.
    pub return_errors: bool,
    /// Names of scalar auxiliary columns to return alongside each batch,
    /// in this order.
    pub extra_columns: Vec<String>,
}

impl Default for StreamOptions {
    fn default() -> Self {
        StreamOptions {
            assume_unique: true,
            return_errors: false,
            extra_columns: Vec::new(),
        }
    }
}

/// One scalar auxiliary column of a batch, typed as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtraColumn {
    pub name: String,
    pub values: ColumnData,
}

/// All matches of one shard against the query batch.
///
/// Row `i` of [`coefficients`](CoeffBatch::coefficients) (and of `errors` and
/// of every extra column) belongs to the query id at input position
/// [`positions`](CoeffBatch::positions)`[i]`. Across batches no ordering is
/// guaranteed; callers wanting input-order output scatter rows into an array
/// of the original batch length keyed by position. Ids with no match in any
/// shard produce no row at all.
#[derive(Debug, Clone)]
pub struct CoeffBatch {
    /// Matched coefficient rows, `rows × 110`: BP in columns `0..55`, RP in
    /// columns `55..110`.
    pub coefficients: DMatrix<f64>,
    /// Original input position of each row.
    pub positions: Vec<usize>,
    /// Coefficient errors in the same layout, when requested.
    pub errors: Option<DMatrix<f64>>,
    /// Requested auxiliary columns, in request order.
    pub extras: Vec<ExtraColumn>,
}

impl CoeffBatch {
    /// Number of matched rows in this batch.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// True when the batch holds no rows.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Lazy, per-shard sequence of [`CoeffBatch`]es for one query batch.
///
/// Shards are visited in catalog (container storage) order; shards with no
/// candidate or no match emit nothing. After the first error the stream is
/// exhausted: partial progress is not resumable and the caller retries the
/// whole lookup.
pub struct XpCoeffStream<'a> {
    store: &'a XpCoeffStore,
    ids: Vec<SourceId>,
    keys: Vec<PartitionKey>,
    options: StreamOptions,
    cursor: usize,
    poisoned: bool,
    #[cfg(feature = "progress")]
    progress: indicatif::ProgressBar,
}

impl<'a> XpCoeffStream<'a> {
    pub(crate) fn new(store: &'a XpCoeffStore, ids: &[SourceId], options: StreamOptions) -> Self {
        let ids = ids.to_vec();
        // One pass over the whole batch; shards reuse these keys.
        let keys = partition_keys(&ids);
        #[cfg(feature = "progress")]
        let progress = indicatif::ProgressBar::new(store.catalog().len() as u64);
        XpCoeffStream {
            store,
            ids,
            keys,
            options,
            cursor: 0,
            poisoned: false,
            #[cfg(feature = "progress")]
            progress,
        }
    }

    /// Length of the query batch this stream serves.
    pub fn total_num(&self) -> usize {
        self.ids.len()
    }

    /// Run the full lookup protocol against one shard.
    ///
    /// Returns `Ok(None)` when the shard has no candidate ids or no matches.
    fn shard_batch(
        &self,
        descriptor: &ShardDescriptor,
    ) -> Result<Option<CoeffBatch>, StarshardError> {
        let accessor = ShardAccessor::new(self.store.container(), descriptor);

        let mask = accessor.membership_mask(&self.ids, &self.keys);
        let mut candidates: Vec<SourceId> = Vec::new();
        let mut candidate_positions: Vec<usize> = Vec::new();
        for (position, keep) in mask.iter().enumerate() {
            if *keep {
                candidates.push(self.ids[position]);
                candidate_positions.push(position);
            }
        }
        if candidates.is_empty() {
            return Ok(None);
        }

        let shard_ids = accessor.load_source_ids()?;
        let isect = if self.options.assume_unique {
            intersect_assume_unique(&candidates, &shard_ids)?
        } else {
            intersect_deduplicated(&candidates, &shard_ids)
        };
        if isect.values.is_empty() {
            // Ids routed here by partition but without stored coefficients.
            return Ok(None);
        }

        // Sorted-access protocol: fetch ascending, then undo the sort.
        let sort_perm = argsort(&isect.shard_rows);
        let rows_sorted: Vec<usize> = sort_perm.iter().map(|&p| isect.shard_rows[p]).collect();
        let inverse_perm = invert_permutation(&sort_perm);

        let bp = self.fetch_sorted(&accessor, BP_COEFF_COLUMN, &rows_sorted)?;
        let rp = self.fetch_sorted(&accessor, RP_COEFF_COLUMN, &rows_sorted)?;

        // Output rows as (match index, original position) pairs.
        let out: Vec<(usize, usize)> = if self.options.assume_unique {
            isect
                .candidate_rows
                .iter()
                .enumerate()
                .map(|(m, &c)| (m, candidate_positions[c]))
                .collect()
        } else {
            // Every occurrence of a matched value gets its own row.
            let mut by_value: FastHashMap<SourceId, Vec<usize>> = FastHashMap::default();
            for (c, &v) in candidates.iter().enumerate() {
                by_value.entry(v).or_default().push(c);
            }
            let mut out = Vec::new();
            for (m, v) in isect.values.iter().enumerate() {
                if let Some(occurrences) = by_value.get(v) {
                    for &c in occurrences {
                        out.push((m, candidate_positions[c]));
                    }
                }
            }
            out
        };

        let rows = out.len();
        let mut coefficients = DMatrix::<f64>::zeros(rows, XP_COEFF_WIDTH);
        for (r, &(m, _)) in out.iter().enumerate() {
            let src = inverse_perm[m] * XP_BAND_WIDTH;
            for c in 0..XP_BAND_WIDTH {
                coefficients[(r, c)] = bp[src + c];
                coefficients[(r, XP_BAND_WIDTH + c)] = rp[src + c];
            }
        }

        let errors = if self.options.return_errors {
            let bp_err = self.fetch_sorted(&accessor, BP_COEFF_ERROR_COLUMN, &rows_sorted)?;
            let rp_err = self.fetch_sorted(&accessor, RP_COEFF_ERROR_COLUMN, &rows_sorted)?;
            let mut matrix = DMatrix::<f64>::zeros(rows, XP_COEFF_WIDTH);
            for (r, &(m, _)) in out.iter().enumerate() {
                let src = inverse_perm[m] * XP_BAND_WIDTH;
                for c in 0..XP_BAND_WIDTH {
                    matrix[(r, c)] = bp_err[src + c];
                    matrix[(r, XP_BAND_WIDTH + c)] = rp_err[src + c];
                }
            }
            Some(matrix)
        } else {
            None
        };

        // Auxiliary columns: whole-column load, gathered per output row in
        // raw intersection order (no sort/unsort pass on this path).
        let mut extras = Vec::with_capacity(self.options.extra_columns.len());
        if !self.options.extra_columns.is_empty() {
            let shard_row_per_out: Vec<usize> =
                out.iter().map(|&(m, _)| isect.shard_rows[m]).collect();
            for name in &self.options.extra_columns {
                let column = accessor.load_scalar_column(name)?;
                extras.push(ExtraColumn {
                    name: name.clone(),
                    values: column.gather(&shard_row_per_out),
                });
            }
        }

        let positions = out.iter().map(|&(_, p)| p).collect();
        Ok(Some(CoeffBatch {
            coefficients,
            positions,
            errors,
            extras,
        }))
    }

    /// Fetch one coefficient matrix column in ascending row order.
    ///
    /// A non-monotonic rejection out of the storage layer can only mean the
    /// sorted fetch plan was corrupted by a violated uniqueness assumption,
    /// so under `assume_unique` it is re-raised as
    /// [`StarshardError::DuplicateSourceId`].
    fn fetch_sorted(
        &self,
        accessor: &ShardAccessor<'_>,
        column: &str,
        rows_sorted: &[usize],
    ) -> Result<Vec<f64>, StarshardError> {
        let values = accessor
            .fetch_f64_rows(column, rows_sorted)
            .map_err(|e| match e {
                StarshardError::NonMonotonicAccess { .. } if self.options.assume_unique => {
                    StarshardError::DuplicateSourceId
                }
                other => other,
            })?;
        if values.len() != rows_sorted.len() * XP_BAND_WIDTH {
            return Err(StarshardError::ColumnTypeMismatch {
                column: column.to_string(),
                reason: format!(
                    "expected {} coefficients per row, found {}",
                    XP_BAND_WIDTH,
                    values.len() / rows_sorted.len().max(1)
                ),
            });
        }
        Ok(values)
    }
}

impl Iterator for XpCoeffStream<'_> {
    type Item = Result<CoeffBatch, StarshardError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.poisoned {
            return None;
        }
        let shards = self.store.catalog().shards();
        while self.cursor < shards.len() {
            let descriptor = &shards[self.cursor];
            self.cursor += 1;
            #[cfg(feature = "progress")]
            self.progress.inc(1);
            match self.shard_batch(descriptor) {
                Ok(Some(batch)) => return Some(Ok(batch)),
                Ok(None) => continue,
                Err(e) => {
                    self.poisoned = true;
                    return Some(Err(e));
                }
            }
        }
        #[cfg(feature = "progress")]
        self.progress.finish_and_clear();
        None
    }
}

impl std::iter::FusedIterator for XpCoeffStream<'_> {}

/// Matches of a candidate slice against one shard's identifier column.
struct ShardIntersection {
    /// Matched values, ascending.
    values: Vec<SourceId>,
    /// Index into the candidate slice per match.
    candidate_rows: Vec<usize>,
    /// Row in the shard per match.
    shard_rows: Vec<usize>,
}

/// Exact-match intersection trusting both sides to be duplicate-free.
///
/// Both slices are merged through one stable sort of their concatenation;
/// every adjacent equal pair is then a (candidate, shard) match with the
/// candidate first. Any adjacency that stays on a single side proves the
/// uniqueness assumption wrong, and the whole lookup must fail rather than
/// hand back rows fetched for the wrong ids.
fn intersect_assume_unique(
    candidates: &[SourceId],
    shard_ids: &[SourceId],
) -> Result<ShardIntersection, StarshardError> {
    let n1 = candidates.len();
    let total = n1 + shard_ids.len();
    let value_at = |i: usize| {
        if i < n1 {
            candidates[i]
        } else {
            shard_ids[i - n1]
        }
    };
    let order: Vec<usize> = (0..total).sorted_by_key(|&i| value_at(i)).collect();

    let mut values = Vec::new();
    let mut candidate_rows = Vec::new();
    let mut shard_rows = Vec::new();
    for w in order.windows(2) {
        if value_at(w[0]) != value_at(w[1]) {
            continue;
        }
        if w[0] >= n1 || w[1] < n1 {
            return Err(StarshardError::DuplicateSourceId);
        }
        values.push(value_at(w[0]));
        candidate_rows.push(w[0]);
        shard_rows.push(w[1] - n1);
    }
    Ok(ShardIntersection {
        values,
        candidate_rows,
        shard_rows,
    })
}

/// Exact-match intersection with both sides deduplicated first.
///
/// Each matched value maps to its **first occurrence** on either side; the
/// caller expands candidate-side occurrences afterwards.
fn intersect_deduplicated(candidates: &[SourceId], shard_ids: &[SourceId]) -> ShardIntersection {
    let (cand_values, cand_first) = unique_with_first_index(candidates);
    let (shard_values, shard_first) = unique_with_first_index(shard_ids);

    let mut values = Vec::new();
    let mut candidate_rows = Vec::new();
    let mut shard_rows = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < cand_values.len() && j < shard_values.len() {
        match cand_values[i].cmp(&shard_values[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                values.push(cand_values[i]);
                candidate_rows.push(cand_first[i]);
                shard_rows.push(shard_first[j]);
                i += 1;
                j += 1;
            }
        }
    }
    ShardIntersection {
        values,
        candidate_rows,
        shard_rows,
    }
}

/// Sorted unique values of a slice plus the first original index of each.
fn unique_with_first_index(values: &[SourceId]) -> (Vec<SourceId>, Vec<usize>) {
    let order: Vec<usize> = (0..values.len()).sorted_by_key(|&i| values[i]).collect();
    let mut unique = Vec::new();
    let mut first = Vec::new();
    for &i in &order {
        if unique.last() != Some(&values[i]) {
            unique.push(values[i]);
            first.push(i);
        }
    }
    (unique, first)
}

/// Indices that sort `values` ascending (stable).
fn argsort(values: &[usize]) -> Vec<usize> {
    (0..values.len()).sorted_by_key(|&i| values[i]).collect()
}

/// Inverse of a permutation: `inv[perm[i]] == i`.
fn invert_permutation(perm: &[usize]) -> Vec<usize> {
    let mut inv = vec![0usize; perm.len()];
    for (i, &p) in perm.iter().enumerate() {
        inv[p] = i;
    }
    inv
}

#[cfg(test)]
mod test_lookup {
    use super::*;

    #[test]
    fn test_intersect_assume_unique_recovers_indices() {
        let candidates = vec![50, 10, 30];
        let shard_ids = vec![30, 70, 10, 60];
        let isect = intersect_assume_unique(&candidates, &shard_ids).unwrap();
        assert_eq!(isect.values, vec![10, 30]);
        assert_eq!(isect.candidate_rows, vec![1, 2]);
        assert_eq!(isect.shard_rows, vec![2, 0]);
    }

    #[test]
    fn test_intersect_assume_unique_rejects_query_duplicates() {
        let candidates = vec![10, 20, 10];
        let shard_ids = vec![10, 30];
        assert!(matches!(
            intersect_assume_unique(&candidates, &shard_ids),
            Err(StarshardError::DuplicateSourceId)
        ));
    }

    #[test]
    fn test_intersect_assume_unique_rejects_shard_duplicates() {
        let candidates = vec![10];
        let shard_ids = vec![10, 10];
        assert!(matches!(
            intersect_assume_unique(&candidates, &shard_ids),
            Err(StarshardError::DuplicateSourceId)
        ));
    }

    #[test]
    fn test_intersect_assume_unique_without_matches() {
        let isect = intersect_assume_unique(&[1, 2], &[3, 4]).unwrap();
        assert!(isect.values.is_empty());
    }

    #[test]
    fn test_intersect_deduplicated_uses_first_occurrences() {
        let candidates = vec![30, 10, 30, 10];
        let shard_ids = vec![10, 30];
        let isect = intersect_deduplicated(&candidates, &shard_ids);
        assert_eq!(isect.values, vec![10, 30]);
        assert_eq!(isect.candidate_rows, vec![1, 0]);
        assert_eq!(isect.shard_rows, vec![0, 1]);
    }

    #[test]
    fn test_unique_with_first_index_is_stable() {
        let (values, first) = unique_with_first_index(&[7, 3, 7, 3, 1]);
        assert_eq!(values, vec![1, 3, 7]);
        assert_eq!(first, vec![4, 1, 0]);
    }

    #[test]
    fn test_argsort_and_inverse() {
        let rows = vec![42, 7, 19];
        let perm = argsort(&rows);
        assert_eq!(perm, vec![1, 2, 0]);
        let inv = invert_permutation(&perm);
        // Fetched order is rows[perm]; inv brings a fetched row back to its
        // match position.
        let sorted: Vec<usize> = perm.iter().map(|&p| rows[p]).collect();
        assert_eq!(sorted, vec![7, 19, 42]);
        for (i, &row) in rows.iter().enumerate() {
            assert_eq!(sorted[inv[i]], row);
        }
    }
}
