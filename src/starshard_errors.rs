use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors surfaced by the coefficient container and the lookup engine.
///
/// All read paths are deterministic, so none of these conditions is worth an
/// automatic retry: a failed call fails again unless the caller changes its
/// inputs (most notably `assume_unique`, see [`StarshardError::DuplicateSourceId`]).
#[derive(Error, Debug)]
pub enum StarshardError {
    #[error("Coefficient container not found at: {0}")]
    ContainerNotFound(Utf8PathBuf),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid container format: {0}")]
    InvalidContainerFormat(String),

    #[error("Container truncated: need {needed} bytes at offset {offset}, file is {file_len} bytes")]
    TruncatedContainer {
        offset: u64,
        needed: usize,
        file_len: u64,
    },

    #[error("Shard group name {0:?} does not match the <min>-<max> pattern")]
    InvalidGroupName(String),

    #[error("Column {column:?} not found in {location}")]
    UnknownColumn { column: String, location: String },

    #[error("Column {column:?} has an unexpected layout: {reason}")]
    ColumnTypeMismatch { column: String, reason: String },

    #[error("Row indices must be strictly increasing for multi-row reads (got {previous} then {current})")]
    NonMonotonicAccess { previous: usize, current: usize },

    #[error("Row index {index} out of range for a shard with {n_rows} rows")]
    RowIndexOutOfRange { index: usize, n_rows: usize },

    #[error(
        "Query source ids contain duplicate values while assume_unique is set; \
         retry the whole lookup with assume_unique = false"
    )]
    DuplicateSourceId,
}
