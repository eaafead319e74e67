//! Source-id to partition-key routing.
//!
//! Gaia-style source ids carry the sky position of the object in their most
//! significant bits; integer division by [`HEALPIX8_DIVISOR`] recovers the
//! HEALPix level-8 index that shard ranges are expressed in. The same
//! convention is used when the container is compiled, so the division must be
//! applied uniformly to every queried id.

use crate::constants::{PartitionKey, SourceId, HEALPIX8_DIVISOR};

/// Partition key of a source id (HEALPix level-8 index).
///
/// Pure integer division, total over all inputs. Sentinel ids (`< 1`) still
/// produce a key here; validity is enforced separately by the shard
/// membership mask so that an invalid id can never match a range by numeric
/// coincidence.
#[inline]
pub fn partition_key(id: SourceId) -> PartitionKey {
    id / HEALPIX8_DIVISOR
}

/// Partition keys for a whole query batch, computed once.
pub fn partition_keys(ids: &[SourceId]) -> Vec<PartitionKey> {
    ids.iter().map(|&id| partition_key(id)).collect()
}
