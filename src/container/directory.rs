//! Group directory reader for the coefficient container.
//!
//! The directory sits at the byte offset announced by the header and lists
//! every top-level shard group in **container storage order**, together with
//! its column layout. Each entry encodes:
//!
//! * a 32-byte padded group name (by convention `"<min>-<max>"`),
//! * `n_rows` — number of objects stored in the group,
//! * the column table: 32-byte padded column name, element type code,
//!   row width (1 for scalar columns, 55 for coefficient matrices), and the
//!   absolute byte offset of the row-major column data.
//!
//! All integers are little-endian. The directory is decoded once at open time
//! and kept in memory; column data stay on disk until read.
//!
//! # See also
//! ------------
//! * `header` module — announces `n_groups` and `dir_offset`.
//! * [`crate::container::XpContainer`] — drives the decode at open time.

use nom::{
    bytes::complete::take,
    number::complete::{le_i32, le_i64},
    IResult,
};

use super::column::ColumnDtype;

/// Byte size of the fixed part of a group entry (name + n_rows + n_columns).
pub(crate) const GROUP_ENTRY_FIXED_SIZE: usize = 44;

/// Byte size of one column descriptor entry.
pub(crate) const COLUMN_ENTRY_SIZE: usize = 48;

/// Layout of one stored column within a shard group.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    /// Column name, trimmed of padding.
    pub name: String,
    /// Element type of the stored values.
    pub dtype: ColumnDtype,
    /// Elements per row (1 for scalar columns, 55 for coefficient matrices).
    pub width: usize,
    /// Absolute byte offset of the row-major column data.
    pub data_offset: u64,
}

/// One top-level shard group: its name, row count, and column table.
///
/// All columns of a group share the same row count and row ordering; the
/// directory does not record per-column lengths for that reason.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupEntry {
    /// Group name as stored (by convention `"<min>-<max>"`).
    pub name: String,
    /// Number of objects stored in this group.
    pub n_rows: usize,
    /// Column table in storage order.
    pub columns: Vec<ColumnDescriptor>,
}

impl GroupEntry {
    /// Look up a column descriptor by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Parse the fixed head of a group entry: `(name, n_rows, n_columns)`.
    pub(crate) fn parse_head(input: &[u8]) -> IResult<&[u8], (String, usize, usize)> {
        let (input, name) = take(32usize)(input)?;
        let (input, n_rows) = le_i64(input)?;
        let (input, n_columns) = le_i32(input)?;
        Ok((
            input,
            (
                String::from_utf8_lossy(name).trim().to_string(),
                n_rows as usize,
                n_columns as usize,
            ),
        ))
    }

    /// Parse one column descriptor entry.
    ///
    /// The dtype code is returned raw; the caller validates it against the
    /// known [`ColumnDtype`] codes so that a malformed directory surfaces a
    /// container-format error rather than a parser failure.
    pub(crate) fn parse_column(input: &[u8]) -> IResult<&[u8], (String, i32, usize, u64)> {
        let (input, name) = take(32usize)(input)?;
        let (input, dtype_code) = le_i32(input)?;
        let (input, width) = le_i32(input)?;
        let (input, data_offset) = le_i64(input)?;
        Ok((
            input,
            (
                String::from_utf8_lossy(name).trim().to_string(),
                dtype_code,
                width as usize,
                data_offset as u64,
            ),
        ))
    }
}
