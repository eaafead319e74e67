//! Shared fixtures: an in-memory container writer standing in for the
//! offline catalog compiler, plus deterministic coefficient generators so
//! tests can check exact values after routing and reassembly.

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

use starshard::constants::XP_BAND_WIDTH;

const HEADER_RECORD_SIZE: usize = 1024;

/// Typed values of one fixture column.
pub enum TestValues {
    I16(Vec<i16>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl TestValues {
    fn dtype_code(&self) -> i32 {
        match self {
            TestValues::I16(_) => 1,
            TestValues::I64(_) => 3,
            TestValues::F32(_) => 4,
            TestValues::F64(_) => 5,
        }
    }

    fn len(&self) -> usize {
        match self {
            TestValues::I16(v) => v.len(),
            TestValues::I64(v) => v.len(),
            TestValues::F32(v) => v.len(),
            TestValues::F64(v) => v.len(),
        }
    }

    fn byte_len(&self) -> usize {
        match self {
            TestValues::I16(v) => v.len() * 2,
            TestValues::I64(v) => v.len() * 8,
            TestValues::F32(v) => v.len() * 4,
            TestValues::F64(v) => v.len() * 8,
        }
    }

    fn write_to(&self, buf: &mut Vec<u8>) {
        match self {
            TestValues::I16(v) => v.iter().for_each(|x| buf.extend_from_slice(&x.to_le_bytes())),
            TestValues::I64(v) => v.iter().for_each(|x| buf.extend_from_slice(&x.to_le_bytes())),
            TestValues::F32(v) => v.iter().for_each(|x| buf.extend_from_slice(&x.to_le_bytes())),
            TestValues::F64(v) => v.iter().for_each(|x| buf.extend_from_slice(&x.to_le_bytes())),
        }
    }
}

pub struct TestColumn {
    pub name: String,
    pub width: usize,
    pub values: TestValues,
}

pub struct TestGroup {
    pub name: String,
    pub columns: Vec<TestColumn>,
}

/// Serialize fixture groups into the container layout understood by the
/// reader: header record, column data, then the group directory.
pub fn write_container(path: &Utf8Path, groups: &[TestGroup]) {
    // Lay out the data region first so directory entries carry final offsets.
    let mut offset = HEADER_RECORD_SIZE;
    let mut column_offsets: Vec<Vec<usize>> = Vec::new();
    for group in groups {
        let mut per_group = Vec::new();
        for column in &group.columns {
            per_group.push(offset);
            offset += column.values.byte_len();
        }
        column_offsets.push(per_group);
    }
    let dir_offset = offset;

    let mut buf = Vec::with_capacity(dir_offset);
    buf.extend_from_slice(b"XPSHARD ");
    buf.extend_from_slice(&1i32.to_le_bytes());
    buf.extend_from_slice(&(groups.len() as i32).to_le_bytes());
    buf.extend_from_slice(&(dir_offset as i64).to_le_bytes());
    let mut name = [b' '; 60];
    name[..22].copy_from_slice(b"starshard test fixture");
    buf.extend_from_slice(&name);
    buf.extend_from_slice(b"LTL-IEEE");
    buf.resize(HEADER_RECORD_SIZE, 0);

    for group in groups {
        for column in &group.columns {
            column.values.write_to(&mut buf);
        }
    }

    for (group, offsets) in groups.iter().zip(&column_offsets) {
        let mut gname = [b' '; 32];
        gname[..group.name.len()].copy_from_slice(group.name.as_bytes());
        buf.extend_from_slice(&gname);
        let n_rows = group
            .columns
            .first()
            .map(|c| c.values.len() / c.width)
            .unwrap_or(0);
        buf.extend_from_slice(&(n_rows as i64).to_le_bytes());
        buf.extend_from_slice(&(group.columns.len() as i32).to_le_bytes());
        for (column, &data_offset) in group.columns.iter().zip(offsets) {
            let mut cname = [b' '; 32];
            cname[..column.name.len()].copy_from_slice(column.name.as_bytes());
            buf.extend_from_slice(&cname);
            buf.extend_from_slice(&column.values.dtype_code().to_le_bytes());
            buf.extend_from_slice(&(column.width as i32).to_le_bytes());
            buf.extend_from_slice(&(data_offset as i64).to_le_bytes());
        }
    }

    std::fs::write(path, buf).unwrap();
}

/// Write fixture groups into a fresh temporary directory.
pub fn temp_container(groups: &[TestGroup]) -> (TempDir, Utf8PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = Utf8Path::from_path(dir.path())
        .unwrap()
        .join("xp_coeffs.xpshard");
    write_container(&path, groups);
    (dir, path)
}

// Deterministic per-object coefficient values, so any returned row can be
// checked against the id it claims to belong to.

pub fn bp_value(id: i64, c: usize) -> f64 {
    (id % 1_000_003) as f64 + c as f64 * 1e-3
}

pub fn rp_value(id: i64, c: usize) -> f64 {
    bp_value(id, c) + 0.5
}

pub fn bp_error_value(id: i64, c: usize) -> f64 {
    (id % 997) as f64 + c as f64 * 1e-3
}

pub fn rp_error_value(id: i64, c: usize) -> f64 {
    bp_error_value(id, c) + 0.25
}

/// Build a shard group with the fixed XP schema for the given ids, stored in
/// the order given (deliberately not sorted by the callers that care).
pub fn xp_group(name: &str, source_ids: &[i64], with_errors: bool) -> TestGroup {
    let n = source_ids.len();
    let mut bp = Vec::with_capacity(n * XP_BAND_WIDTH);
    let mut rp = Vec::with_capacity(n * XP_BAND_WIDTH);
    let mut bp_err = Vec::with_capacity(n * XP_BAND_WIDTH);
    let mut rp_err = Vec::with_capacity(n * XP_BAND_WIDTH);
    for &id in source_ids {
        for c in 0..XP_BAND_WIDTH {
            bp.push(bp_value(id, c));
            rp.push(rp_value(id, c));
            bp_err.push(bp_error_value(id, c));
            rp_err.push(rp_error_value(id, c));
        }
    }

    let mut columns = vec![
        TestColumn {
            name: "source_id".to_string(),
            width: 1,
            values: TestValues::I64(source_ids.to_vec()),
        },
        TestColumn {
            name: "bp_coefficients".to_string(),
            width: XP_BAND_WIDTH,
            values: TestValues::F64(bp),
        },
        TestColumn {
            name: "rp_coefficients".to_string(),
            width: XP_BAND_WIDTH,
            values: TestValues::F64(rp),
        },
    ];
    if with_errors {
        columns.push(TestColumn {
            name: "bp_coefficient_errors".to_string(),
            width: XP_BAND_WIDTH,
            values: TestValues::F64(bp_err),
        });
        columns.push(TestColumn {
            name: "rp_coefficient_errors".to_string(),
            width: XP_BAND_WIDTH,
            values: TestValues::F64(rp_err),
        });
    }
    TestGroup {
        name: name.to_string(),
        columns,
    }
}
