//! Typed column values and element-type codes.
//!
//! Shard groups store fixed-width, row-major columns of one of six element
//! types. [`ColumnDtype`] maps the on-disk type code to an element size;
//! [`ColumnData`] holds a fully decoded column (or a gathered subset of one)
//! with its native type preserved.

use crate::starshard_errors::StarshardError;

/// Element type of a stored column, as encoded in the group directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnDtype {
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
}

impl ColumnDtype {
    /// Decode an on-disk type code.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(ColumnDtype::Int8),
            1 => Some(ColumnDtype::Int16),
            2 => Some(ColumnDtype::Int32),
            3 => Some(ColumnDtype::Int64),
            4 => Some(ColumnDtype::Float32),
            5 => Some(ColumnDtype::Float64),
            _ => None,
        }
    }

    /// On-disk type code of this element type.
    pub fn code(self) -> i32 {
        match self {
            ColumnDtype::Int8 => 0,
            ColumnDtype::Int16 => 1,
            ColumnDtype::Int32 => 2,
            ColumnDtype::Int64 => 3,
            ColumnDtype::Float32 => 4,
            ColumnDtype::Float64 => 5,
        }
    }

    /// Size of one element in bytes.
    pub fn elem_size(self) -> usize {
        match self {
            ColumnDtype::Int8 => 1,
            ColumnDtype::Int16 => 2,
            ColumnDtype::Int32 => 4,
            ColumnDtype::Int64 => 8,
            ColumnDtype::Float32 => 4,
            ColumnDtype::Float64 => 8,
        }
    }
}

/// A decoded scalar column (or a gathered subset of one), native type kept.
///
/// Auxiliary catalog columns come in several integer and floating widths;
/// keeping the native representation lets callers decide when (and whether)
/// to widen to `f64`.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

impl ColumnData {
    /// Decode a raw little-endian byte buffer into `n` elements of `dtype`.
    ///
    /// The buffer length must be exactly `n * dtype.elem_size()`; the caller
    /// (the container read path) guarantees this by construction.
    pub(crate) fn decode(dtype: ColumnDtype, bytes: &[u8], n: usize) -> Self {
        debug_assert_eq!(bytes.len(), n * dtype.elem_size());
        match dtype {
            ColumnDtype::Int8 => {
                ColumnData::Int8(bytes.iter().map(|&b| b as i8).collect())
            }
            ColumnDtype::Int16 => ColumnData::Int16(
                bytes
                    .chunks_exact(2)
                    .map(|c| i16::from_le_bytes(c.try_into().unwrap()))
                    .collect(),
            ),
            ColumnDtype::Int32 => ColumnData::Int32(
                bytes
                    .chunks_exact(4)
                    .map(|c| i32::from_le_bytes(c.try_into().unwrap()))
                    .collect(),
            ),
            ColumnDtype::Int64 => ColumnData::Int64(
                bytes
                    .chunks_exact(8)
                    .map(|c| i64::from_le_bytes(c.try_into().unwrap()))
                    .collect(),
            ),
            ColumnDtype::Float32 => ColumnData::Float32(
                bytes
                    .chunks_exact(4)
                    .map(|c| f32::from_le_bytes(c.try_into().unwrap()))
                    .collect(),
            ),
            ColumnDtype::Float64 => ColumnData::Float64(
                bytes
                    .chunks_exact(8)
                    .map(|c| f64::from_le_bytes(c.try_into().unwrap()))
                    .collect(),
            ),
        }
    }

    /// Element type of this column.
    pub fn dtype(&self) -> ColumnDtype {
        match self {
            ColumnData::Int8(_) => ColumnDtype::Int8,
            ColumnData::Int16(_) => ColumnDtype::Int16,
            ColumnData::Int32(_) => ColumnDtype::Int32,
            ColumnData::Int64(_) => ColumnDtype::Int64,
            ColumnData::Float32(_) => ColumnDtype::Float32,
            ColumnData::Float64(_) => ColumnDtype::Float64,
        }
    }

    /// Number of elements held.
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Int8(v) => v.len(),
            ColumnData::Int16(v) => v.len(),
            ColumnData::Int32(v) => v.len(),
            ColumnData::Int64(v) => v.len(),
            ColumnData::Float32(v) => v.len(),
            ColumnData::Float64(v) => v.len(),
        }
    }

    /// True when the column holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Select the elements at `indices`, in the given order.
    ///
    /// Indices may repeat and need not be sorted: the column is fully in
    /// memory, so no access-order constraint applies here.
    pub fn gather(&self, indices: &[usize]) -> ColumnData {
        match self {
            ColumnData::Int8(v) => ColumnData::Int8(indices.iter().map(|&i| v[i]).collect()),
            ColumnData::Int16(v) => ColumnData::Int16(indices.iter().map(|&i| v[i]).collect()),
            ColumnData::Int32(v) => ColumnData::Int32(indices.iter().map(|&i| v[i]).collect()),
            ColumnData::Int64(v) => ColumnData::Int64(indices.iter().map(|&i| v[i]).collect()),
            ColumnData::Float32(v) => ColumnData::Float32(indices.iter().map(|&i| v[i]).collect()),
            ColumnData::Float64(v) => ColumnData::Float64(indices.iter().map(|&i| v[i]).collect()),
        }
    }

    /// Widen every element to `f64`.
    ///
    /// Lossless for all supported integer widths up to `i32` and for `f32`;
    /// `i64` values above 2^53 lose precision, which is acceptable for the
    /// numeric transforms this feeds.
    pub fn as_f64_vec(&self) -> Vec<f64> {
        match self {
            ColumnData::Int8(v) => v.iter().map(|&x| x as f64).collect(),
            ColumnData::Int16(v) => v.iter().map(|&x| x as f64).collect(),
            ColumnData::Int32(v) => v.iter().map(|&x| x as f64).collect(),
            ColumnData::Int64(v) => v.iter().map(|&x| x as f64).collect(),
            ColumnData::Float32(v) => v.iter().map(|&x| x as f64).collect(),
            ColumnData::Float64(v) => v.clone(),
        }
    }

    /// Borrow the values as `i64`, failing on floating columns.
    pub fn as_i64_vec(&self) -> Result<Vec<i64>, StarshardError> {
        match self {
            ColumnData::Int8(v) => Ok(v.iter().map(|&x| x as i64).collect()),
            ColumnData::Int16(v) => Ok(v.iter().map(|&x| x as i64).collect()),
            ColumnData::Int32(v) => Ok(v.iter().map(|&x| x as i64).collect()),
            ColumnData::Int64(v) => Ok(v.clone()),
            ColumnData::Float32(_) | ColumnData::Float64(_) => {
                Err(StarshardError::ColumnTypeMismatch {
                    column: String::new(),
                    reason: "floating column cannot be read as i64".to_string(),
                })
            }
        }
    }
}
