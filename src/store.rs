//! One lookup session over a coefficient container.
//!
//! [`XpCoeffStore`] pairs an opened [`XpContainer`] with its decoded
//! [`ShardCatalog`] and hands out lazy [`XpCoeffStream`]s over query batches.
//! Everything is read-only after open: the store can serve any number of
//! successive lookups, each driven entirely by the caller pulling batches.
//!
//! # Example
//!
//! ```rust, no_run
//! use camino::Utf8Path;
//! use starshard::{StreamOptions, XpCoeffStore};
//!
//! # fn main() -> Result<(), starshard::StarshardError> {
//! let store = XpCoeffStore::open(Utf8Path::new("xp_coeffs.xpshard"))?;
//!
//! let ids = vec![5_188_146_770_731_873_152, 4_611_686_018_427_432_192];
//! let mut recovered = vec![f64::NAN; ids.len()];
//! for maybe_batch in store.stream(&ids, StreamOptions::default()) {
//!     let batch = maybe_batch?;
//!     for (row, &position) in batch.positions.iter().enumerate() {
//!         // First BP coefficient of the matched object, in input order.
//!         recovered[position] = batch.coefficients[(row, 0)];
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use camino::Utf8Path;

use crate::catalog::ShardCatalog;
use crate::constants::SourceId;
use crate::container::XpContainer;
use crate::lookup::{StreamOptions, XpCoeffStream};
use crate::starshard_errors::StarshardError;

/// An opened container plus its shard catalog.
#[derive(Debug)]
pub struct XpCoeffStore {
    container: XpContainer,
    catalog: ShardCatalog,
}

impl XpCoeffStore {
    /// Open a store with the default page-cache budgets.
    ///
    /// Arguments
    /// -----------------
    /// * `path`: Filesystem location of the coefficient container.
    ///
    /// Return
    /// ----------
    /// * A store ready to serve lookups, or the first open-time error
    ///   (missing container, malformed header, malformed group name).
    pub fn open(path: &Utf8Path) -> Result<Self, StarshardError> {
        let container = XpContainer::open(path)?;
        let catalog = ShardCatalog::open(&container)?;
        Ok(XpCoeffStore { container, catalog })
    }

    /// Open a store and size the container's page cache.
    ///
    /// The cache budgets only affect read performance, never results.
    pub fn open_with_cache(
        path: &Utf8Path,
        cache_bytes: usize,
        cache_slots: usize,
    ) -> Result<Self, StarshardError> {
        let container = XpContainer::open_with_cache(path, cache_bytes, cache_slots)?;
        let catalog = ShardCatalog::open(&container)?;
        Ok(XpCoeffStore { container, catalog })
    }

    /// The underlying container.
    pub fn container(&self) -> &XpContainer {
        &self.container
    }

    /// The decoded shard catalog.
    pub fn catalog(&self) -> &ShardCatalog {
        &self.catalog
    }

    /// Start a lazy lookup over `ids`.
    ///
    /// Shards are visited in catalog order and one [`crate::lookup::CoeffBatch`]
    /// is emitted per shard with at least one match; ids found nowhere
    /// contribute no row. See [`StreamOptions`] for the option matrix.
    pub fn stream(&self, ids: &[SourceId], options: StreamOptions) -> XpCoeffStream<'_> {
        XpCoeffStream::new(self, ids, options)
    }
}
