//! # Constants and type definitions for starshard
//!
//! This module centralizes the **partitioning constants**, **column naming
//! conventions**, and **common type definitions** used throughout the
//! `starshard` library.
//!
//! ## Overview
//!
//! - The HEALPix level-8 divisor that routes source ids to sky partitions
//! - Widths of the BP/RP coefficient vectors stored per object
//! - Reserved column names of the coefficient container
//! - Page-cache tuning defaults
//! - Core type aliases used across the crate

use std::collections::HashMap;

use ahash::RandomState;

// -------------------------------------------------------------------------------------------------
// Partitioning
// -------------------------------------------------------------------------------------------------

/// Divisor mapping a Gaia DR3 source id to its HEALPix level-8 cell (2^43).
///
/// Source ids encode the HEALPix index of the source in their most
/// significant bits; dividing by this constant recovers the level-8 index
/// used to name the shards.
pub const HEALPIX8_DIVISOR: i64 = 8_796_093_022_208;

/// Smallest source id considered valid. Anything below is a sentinel and
/// never matches a shard.
pub const MIN_VALID_SOURCE_ID: i64 = 1;

// -------------------------------------------------------------------------------------------------
// Coefficient layout
// -------------------------------------------------------------------------------------------------

/// Number of basis coefficients stored per photometer band (BP or RP).
pub const XP_BAND_WIDTH: usize = 55;

/// Width of a full coefficient row: BP followed by RP.
pub const XP_COEFF_WIDTH: usize = 2 * XP_BAND_WIDTH;

// -------------------------------------------------------------------------------------------------
// Reserved container column names
// -------------------------------------------------------------------------------------------------

/// Identifier column present in every shard.
pub const SOURCE_ID_COLUMN: &str = "source_id";

/// BP coefficient matrix column (`f64`, width [`XP_BAND_WIDTH`]).
pub const BP_COEFF_COLUMN: &str = "bp_coefficients";

/// RP coefficient matrix column (`f64`, width [`XP_BAND_WIDTH`]).
pub const RP_COEFF_COLUMN: &str = "rp_coefficients";

/// BP coefficient error matrix column (optional per shard).
pub const BP_COEFF_ERROR_COLUMN: &str = "bp_coefficient_errors";

/// RP coefficient error matrix column (optional per shard).
pub const RP_COEFF_ERROR_COLUMN: &str = "rp_coefficient_errors";

// -------------------------------------------------------------------------------------------------
// Page cache tuning
// -------------------------------------------------------------------------------------------------

/// Default page-cache budget in bytes (16 GiB).
pub const DEFAULT_CACHE_BYTES: usize = 16 * 1024 * 1024 * 1024;

/// Default page-cache slot count.
pub const DEFAULT_CACHE_SLOTS: usize = 100_000_000;

/// Size of one cached page in bytes.
pub const CACHE_PAGE_SIZE: usize = 8 * 1024;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// 64-bit object identifier of a catalog source.
pub type SourceId = i64;

/// Integer partition key derived from a [`SourceId`] (HEALPix level-8 index).
pub type PartitionKey = i64;

/// Hash map with a fast, non-cryptographic hasher.
pub type FastHashMap<K, V> = HashMap<K, V, RandomState>;
