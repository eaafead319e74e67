//! Container header parsing utilities.
//!
//! This module provides a lightweight parser and a pretty-printer for the
//! fixed-size header record of a coefficient container file. It reads the
//! first record of a container, extracts structural metadata (format word,
//! version, group count, directory pointer), and exposes them through the
//! [`ContainerHeader`] struct.
//!
//! # What the header contains
//!
//! * **`idword`**: Format identifier (`"XPSHARD "`), eight ASCII bytes.
//! * **`version`**: Layout version of the container; this reader understands
//!   version 1 only.
//! * **`n_groups`**: Number of top-level shard groups listed in the directory.
//! * **`dir_offset`**: Absolute byte offset of the group directory.
//! * **`internal_name`**: Human-readable container name (60 bytes, padded).
//! * **`locfmt`**: Binary platform tag (`"LTL-IEEE"`) telling how numeric data
//!   are encoded inside the file.
//!
//! # Endianness & safety notes
//!
//! All integers in the header are **little-endian**. The header is fixed-size
//! (1024 bytes) and includes reserved bytes; this module skips them as opaque
//! padding.
//!
//! # See also
//! ------------
//! * [`ContainerHeader::parse`] – Binary decoder for the header record.
//! * [`core::fmt::Display`] for [`ContainerHeader`] – Fixed-width summary.
//! * The `directory` module – Decodes the group directory the header points at.

use nom::{
    bytes::complete::take,
    number::complete::{le_i32, le_i64},
    IResult,
};

/// Size of the container header record in bytes.
pub const HEADER_RECORD_SIZE: usize = 1024;

/// Eight-byte format identifier expected at the start of every container.
pub const CONTAINER_IDWORD: &str = "XPSHARD";

/// Container layout version understood by this reader.
pub const CONTAINER_VERSION: i32 = 1;

/// In-memory representation of the container header (first 1024-byte record).
///
/// The string fields are already trimmed of trailing padding.
#[derive(Debug, PartialEq, Clone)]
pub struct ContainerHeader {
    /// 8-byte identifier, `"XPSHARD"` once trimmed.
    pub idword: String,
    /// Container layout version.
    pub version: i32,
    /// Number of top-level shard groups.
    pub n_groups: i32,
    /// Absolute byte offset of the group directory.
    pub dir_offset: i64,
    /// 60-byte, padded internal container name.
    pub internal_name: String,
    /// Platform tag describing numeric representation (e.g. `"LTL-IEEE"`).
    pub locfmt: String,
}

impl ContainerHeader {
    /// Parse the first 1024-byte record into a [`ContainerHeader`].
    ///
    /// Arguments
    /// -----------------
    /// * `input`: A byte slice starting at the beginning of the file, at least
    ///   1024 bytes long.
    ///
    /// Return
    /// ----------
    /// * An [`IResult`] whose value is a tuple `(remaining, header)`. On
    ///   success, `remaining` points past the header record; `header` contains
    ///   all extracted fields with trailing spaces removed.
    ///
    /// See also
    /// ------------
    /// * [`core::fmt::Display`] for [`ContainerHeader`] – Human-readable rendering.
    pub fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, idword) = take(8usize)(input)?; // "XPSHARD "
        let (input, version) = le_i32(input)?;
        let (input, n_groups) = le_i32(input)?;
        let (input, dir_offset) = le_i64(input)?;
        let (input, internal_name) = take(60usize)(input)?;
        let (input, locfmt) = take(8usize)(input)?;
        let (input, _) = take(932usize)(input)?; // reserved
        Ok((
            input,
            ContainerHeader {
                idword: String::from_utf8_lossy(idword).trim().to_string(),
                version,
                n_groups,
                dir_offset,
                internal_name: String::from_utf8_lossy(internal_name).trim().to_string(),
                locfmt: String::from_utf8_lossy(locfmt).trim().to_string(),
            },
        ))
    }
}

use std::fmt;

impl fmt::Display for ContainerHeader {
    /// Render a fixed-width table summarizing the container header fields.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const LABEL_WIDTH: usize = 18;
        const VALUE_WIDTH: usize = 44;

        let border = format!(
            "+{:-<label$}+{:-<value$}+",
            "",
            "",
            label = LABEL_WIDTH + 1,
            value = VALUE_WIDTH + 1
        );

        writeln!(f, "{border}")?;
        writeln!(
            f,
            "| {:<label$}| {:<value$}|",
            "Container Header",
            "",
            label = LABEL_WIDTH,
            value = VALUE_WIDTH
        )?;
        writeln!(f, "{border}")?;

        writeln!(
            f,
            "| {:<label$}| {:<value$}|",
            "ID Word",
            format!("{} (Format ID)", self.idword),
            label = LABEL_WIDTH,
            value = VALUE_WIDTH
        )?;
        writeln!(
            f,
            "| {:<label$}| {:<value$}|",
            "Version",
            format!("{}", self.version),
            label = LABEL_WIDTH,
            value = VALUE_WIDTH
        )?;
        writeln!(
            f,
            "| {:<label$}| {:<value$}|",
            "Internal Name",
            format!("{}", self.internal_name),
            label = LABEL_WIDTH,
            value = VALUE_WIDTH
        )?;
        writeln!(
            f,
            "| {:<label$}| {:<value$}|",
            "Groups",
            format!("{} shard groups", self.n_groups),
            label = LABEL_WIDTH,
            value = VALUE_WIDTH
        )?;
        writeln!(
            f,
            "| {:<label$}| {:<value$}|",
            "Directory Offset",
            format!("byte {}", self.dir_offset),
            label = LABEL_WIDTH,
            value = VALUE_WIDTH
        )?;
        writeln!(
            f,
            "| {:<label$}| {:<value$}|",
            "Binary Format",
            format!("{}", self.locfmt),
            label = LABEL_WIDTH,
            value = VALUE_WIDTH
        )?;

        writeln!(f, "{border}")
    }
}

#[cfg(test)]
mod test_container_header {
    use super::*;

    fn header_bytes() -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_RECORD_SIZE);
        buf.extend_from_slice(b"XPSHARD ");
        buf.extend_from_slice(&1i32.to_le_bytes());
        buf.extend_from_slice(&3i32.to_le_bytes());
        buf.extend_from_slice(&987_654i64.to_le_bytes());
        let mut name = [b' '; 60];
        name[..14].copy_from_slice(b"xp_dr3_healpix");
        buf.extend_from_slice(&name);
        buf.extend_from_slice(b"LTL-IEEE");
        buf.resize(HEADER_RECORD_SIZE, 0);
        buf
    }

    #[test]
    fn test_parse_header() {
        let bytes = header_bytes();
        let (rest, header) = ContainerHeader::parse(&bytes).unwrap();
        assert!(rest.is_empty());
        assert_eq!(header.idword, CONTAINER_IDWORD);
        assert_eq!(header.version, CONTAINER_VERSION);
        assert_eq!(header.n_groups, 3);
        assert_eq!(header.dir_offset, 987_654);
        assert_eq!(header.internal_name, "xp_dr3_healpix");
        assert_eq!(header.locfmt, "LTL-IEEE");
    }

    #[test]
    fn test_display_header() {
        let header = ContainerHeader {
            idword: "XPSHARD".to_string(),
            version: 1,
            n_groups: 3,
            dir_offset: 987_654,
            internal_name: "xp_dr3_healpix".to_string(),
            locfmt: "LTL-IEEE".to_string(),
        };

        let expected = r#"+-------------------+---------------------------------------------+
| Container Header  |                                             |
+-------------------+---------------------------------------------+
| ID Word           | XPSHARD (Format ID)                         |
| Version           | 1                                           |
| Internal Name     | xp_dr3_healpix                              |
| Groups            | 3 shard groups                              |
| Directory Offset  | byte 987654                                 |
| Binary Format     | LTL-IEEE                                    |
+-------------------+---------------------------------------------+
"#;
        let output = format!("{header}");
        assert_eq!(output, expected);
    }
}
