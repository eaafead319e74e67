//! Shard catalog: partition ranges decoded from container group names.
//!
//! Each top-level group of the container is named `"<min>-<max>"`, the
//! inclusive HEALPix level-8 range of the objects it stores. The catalog
//! decodes those names once at open time into [`ShardDescriptor`]s; the
//! lookup engine borrows the descriptors and never mutates them.
//!
//! Iteration order is **container storage order**, not range order, and
//! nothing guarantees that ranges are disjoint or cover every partition:
//! gaps simply match no shard, and an id whose key falls in two overlapping
//! ranges is matched (and reported) by each of them independently.

use std::fmt;

use crate::container::XpContainer;
use crate::constants::PartitionKey;
use crate::starshard_errors::StarshardError;

/// One shard: an inclusive partition-key range and the directory index of
/// the container group holding its columns.
///
/// Constructed once when the catalog is opened; immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ShardDescriptor {
    /// Inclusive lower bound of the partition-key range.
    pub partition_min: PartitionKey,
    /// Inclusive upper bound of the partition-key range.
    pub partition_max: PartitionKey,
    /// Group name as stored in the container.
    pub name: String,
    /// Directory index of the backing group.
    pub(crate) group_index: usize,
}

impl ShardDescriptor {
    /// True when `key` falls inside this shard's inclusive range.
    #[inline]
    pub fn contains_key(&self, key: PartitionKey) -> bool {
        self.partition_min <= key && key <= self.partition_max
    }
}

impl fmt::Display for ShardDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "shard {} [{}..={}]",
            self.name, self.partition_min, self.partition_max
        )
    }
}

/// The decoded set of shard descriptors of one container.
#[derive(Debug, Clone)]
pub struct ShardCatalog {
    shards: Vec<ShardDescriptor>,
}

impl ShardCatalog {
    /// Decode every group name of an opened container.
    ///
    /// The substring before the **last** `-` is the lower partition bound and
    /// the substring after it the upper bound, both base-10 integers. Any
    /// group whose name does not follow that pattern fails the whole open
    /// with [`StarshardError::InvalidGroupName`].
    ///
    /// Arguments
    /// -----------------
    /// * `container`: The opened container whose groups are to be cataloged.
    ///
    /// Return
    /// ----------
    /// * A catalog listing one descriptor per group, in storage order.
    pub fn open(container: &XpContainer) -> Result<Self, StarshardError> {
        let shards = container
            .groups()
            .iter()
            .enumerate()
            .map(|(group_index, group)| {
                let (partition_min, partition_max) = parse_range(&group.name)?;
                Ok(ShardDescriptor {
                    partition_min,
                    partition_max,
                    name: group.name.clone(),
                    group_index,
                })
            })
            .collect::<Result<Vec<_>, StarshardError>>()?;
        Ok(ShardCatalog { shards })
    }

    /// Shard descriptors in container storage order.
    ///
    /// Callers must not assume the ranges are sorted, disjoint, or
    /// exhaustive.
    pub fn shards(&self) -> &[ShardDescriptor] {
        &self.shards
    }

    /// Number of shards in the catalog.
    pub fn len(&self) -> usize {
        self.shards.len()
    }

    /// True when the container holds no shard groups.
    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }
}

/// Split `"<min>-<max>"` on the last `-` and parse both bounds.
fn parse_range(name: &str) -> Result<(PartitionKey, PartitionKey), StarshardError> {
    let dash = name
        .rfind('-')
        .ok_or_else(|| StarshardError::InvalidGroupName(name.to_string()))?;
    let min = name[..dash]
        .parse::<PartitionKey>()
        .map_err(|_| StarshardError::InvalidGroupName(name.to_string()))?;
    let max = name[dash + 1..]
        .parse::<PartitionKey>()
        .map_err(|_| StarshardError::InvalidGroupName(name.to_string()))?;
    Ok((min, max))
}
