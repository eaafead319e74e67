//! Per-shard column access.
//!
//! A [`ShardAccessor`] binds one [`ShardDescriptor`] to its backing container
//! group and exposes the reads the lookup engine needs:
//!
//! * the **membership mask** routing a query batch to this shard,
//! * the full **identifier column** (eager; shards are sized so this stays
//!   affordable),
//! * **coefficient/error row fetches**, which inherit the storage layer's
//!   strictly-increasing index precondition,
//! * **auxiliary column loads**, which read the whole column into memory and
//!   are therefore free of any access-order constraint.
//!
//! The last two points are deliberately asymmetric: coefficient matrices are
//! fetched row-by-row through the ordered read path, while auxiliary scalars
//! are gathered from an in-memory copy in raw intersection order. Both paths
//! deliver rows in matched-value order; the asymmetry is kept rather than
//! unified so downstream consumers see stable behavior if either path
//! changes.

use crate::catalog::ShardDescriptor;
use crate::constants::{PartitionKey, SourceId, MIN_VALID_SOURCE_ID, SOURCE_ID_COLUMN};
use crate::container::{ColumnData, ColumnDtype, GroupEntry, XpContainer};
use crate::starshard_errors::StarshardError;

/// Read access to one shard's columns.
pub struct ShardAccessor<'a> {
    container: &'a XpContainer,
    descriptor: &'a ShardDescriptor,
    group: &'a GroupEntry,
}

impl<'a> ShardAccessor<'a> {
    /// Bind a descriptor to its backing group.
    pub fn new(container: &'a XpContainer, descriptor: &'a ShardDescriptor) -> Self {
        ShardAccessor {
            container,
            descriptor,
            group: container.group(descriptor.group_index),
        }
    }

    /// The shard descriptor this accessor reads for.
    pub fn descriptor(&self) -> &ShardDescriptor {
        self.descriptor
    }

    /// Number of objects stored in this shard.
    pub fn n_rows(&self) -> usize {
        self.group.n_rows
    }

    /// Which queried ids could live in this shard.
    ///
    /// An id is a candidate when its partition key falls in the shard's
    /// inclusive range **and** the id itself is valid (`>= 1`); sentinel ids
    /// are excluded here regardless of any numeric coincidence of their key.
    ///
    /// Arguments
    /// -----------------
    /// * `ids`: The query batch, in caller order.
    /// * `keys`: Partition key of each id (computed once per batch).
    ///
    /// Return
    /// ----------
    /// * One flag per query position.
    pub fn membership_mask(&self, ids: &[SourceId], keys: &[PartitionKey]) -> Vec<bool> {
        debug_assert_eq!(ids.len(), keys.len(), "ids/keys length mismatch");
        ids.iter()
            .zip(keys)
            .map(|(&id, &key)| self.descriptor.contains_key(key) && id >= MIN_VALID_SOURCE_ID)
            .collect()
    }

    /// Load the full identifier column.
    ///
    /// The column is not guaranteed to be sorted; the engine intersects
    /// against it by value.
    pub fn load_source_ids(&self) -> Result<Vec<SourceId>, StarshardError> {
        let descriptor = self.container.column(self.group, SOURCE_ID_COLUMN)?;
        if descriptor.dtype != ColumnDtype::Int64 || descriptor.width != 1 {
            return Err(StarshardError::ColumnTypeMismatch {
                column: SOURCE_ID_COLUMN.to_string(),
                reason: format!(
                    "expected scalar i64 identifiers, found {:?} with width {}",
                    descriptor.dtype, descriptor.width
                ),
            });
        }
        self.container
            .read_full_column(self.group, descriptor)?
            .as_i64_vec()
    }

    /// Fetch selected rows of an `f64` matrix column, flattened row-major.
    ///
    /// Inherits the storage precondition: `rows` must be strictly
    /// increasing, otherwise [`StarshardError::NonMonotonicAccess`] is
    /// raised. Width of the returned rows is the column's stored width.
    pub fn fetch_f64_rows(
        &self,
        column: &str,
        rows: &[usize],
    ) -> Result<Vec<f64>, StarshardError> {
        let descriptor = self.container.column(self.group, column)?;
        self.container.read_f64_rows(self.group, descriptor, rows)
    }

    /// Load a whole scalar auxiliary column into memory.
    ///
    /// Matrix columns are rejected: auxiliary values are one element per row.
    pub fn load_scalar_column(&self, column: &str) -> Result<ColumnData, StarshardError> {
        let descriptor = self.container.column(self.group, column)?;
        if descriptor.width != 1 {
            return Err(StarshardError::ColumnTypeMismatch {
                column: column.to_string(),
                reason: format!(
                    "expected a scalar column, found width {}",
                    descriptor.width
                ),
            });
        }
        self.container.read_full_column(self.group, descriptor)
    }
}
