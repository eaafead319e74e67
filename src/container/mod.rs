//! High-level reader for the sharded coefficient container.
//!
//! This module ties together the fixed-size header, the group directory, and
//! the typed column decoding to expose a convenient read API over a single
//! hierarchical binary file.
//!
//! # What this module does
//! 1. Reads the **header record** to discover the layout (format word,
//!    version, group count, directory pointer).
//! 2. Decodes the **group directory** into [`GroupEntry`] values, one per
//!    top-level shard group, in container storage order.
//! 3. Serves **column reads**: whole scalar columns decoded to their native
//!    type, and multi-row reads of `f64` matrix columns under the storage
//!    precondition that row indices are presented in **strictly increasing**
//!    order.
//!
//! All reads go through a page cache bounded by the byte/slot budgets chosen
//! at open time; the file handle itself is only read positionally, so one
//! opened container serves a whole lookup session without seeking state.
//!
//! # Units & conventions
//! * All on-disk integers and floats are **little-endian**.
//! * A "row" is one stored object; matrix columns hold `width` values per row.

pub mod column;
pub mod directory;
pub mod header;
mod page_cache;

use std::cell::RefCell;
use std::fs::File;
use std::io;
use std::os::unix::fs::FileExt;

use camino::Utf8Path;

use crate::constants::{CACHE_PAGE_SIZE, DEFAULT_CACHE_BYTES, DEFAULT_CACHE_SLOTS};
use crate::starshard_errors::StarshardError;

pub use column::{ColumnData, ColumnDtype};
pub use directory::{ColumnDescriptor, GroupEntry};
pub use header::ContainerHeader;

use directory::{COLUMN_ENTRY_SIZE, GROUP_ENTRY_FIXED_SIZE};
use header::{CONTAINER_IDWORD, CONTAINER_VERSION, HEADER_RECORD_SIZE};
use page_cache::PageCache;

/// An opened, read-only coefficient container.
///
/// The header and directory are decoded eagerly at open time; column data
/// stay on disk and are fetched on demand through the page cache. The cache
/// uses interior mutability, so the container is not `Sync`; concurrent
/// sessions each open their own handle.
///
/// See also
/// ------------
/// * [`XpContainer::open_with_cache`] – Build this structure from a file.
/// * [`crate::catalog::ShardCatalog`] – Interprets group names as partition ranges.
#[derive(Debug)]
pub struct XpContainer {
    file: File,
    file_len: u64,
    header: ContainerHeader,
    groups: Vec<GroupEntry>,
    cache: RefCell<PageCache>,
}

impl XpContainer {
    /// Open a container with the default page-cache budgets.
    pub fn open(path: &Utf8Path) -> Result<Self, StarshardError> {
        Self::open_with_cache(path, DEFAULT_CACHE_BYTES, DEFAULT_CACHE_SLOTS)
    }

    /// Open a container and size its page cache.
    ///
    /// The full decode pipeline runs here: header record → format checks →
    /// group directory. A missing file is reported as
    /// [`StarshardError::ContainerNotFound`]; a present but malformed file as
    /// [`StarshardError::InvalidContainerFormat`].
    ///
    /// Arguments
    /// -----------------
    /// * `path`: Filesystem location of the container.
    /// * `cache_bytes`: Page-cache byte budget.
    /// * `cache_slots`: Page-cache slot budget.
    ///
    /// Return
    /// ----------
    /// * A fully indexed [`XpContainer`] with all group entries decoded.
    pub fn open_with_cache(
        path: &Utf8Path,
        cache_bytes: usize,
        cache_slots: usize,
    ) -> Result<Self, StarshardError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StarshardError::ContainerNotFound(path.to_owned()),
            _ => StarshardError::IoError(e),
        })?;
        let file_len = file.metadata()?.len();

        if (file_len as usize) < HEADER_RECORD_SIZE {
            return Err(StarshardError::InvalidContainerFormat(format!(
                "file is {file_len} bytes, shorter than the {HEADER_RECORD_SIZE}-byte header record"
            )));
        }

        let mut header_buf = vec![0u8; HEADER_RECORD_SIZE];
        file.read_exact_at(&mut header_buf, 0)?;
        let (_, header) = ContainerHeader::parse(&header_buf).map_err(|_| {
            StarshardError::InvalidContainerFormat("unreadable header record".to_string())
        })?;

        if header.idword != CONTAINER_IDWORD {
            return Err(StarshardError::InvalidContainerFormat(format!(
                "unexpected id word {:?}",
                header.idword
            )));
        }
        if header.version != CONTAINER_VERSION {
            return Err(StarshardError::InvalidContainerFormat(format!(
                "unsupported container version {}",
                header.version
            )));
        }

        let mut container = XpContainer {
            file,
            file_len,
            header,
            groups: Vec::new(),
            cache: RefCell::new(PageCache::new(cache_bytes, cache_slots)),
        };
        container.groups = container.read_directory()?;
        Ok(container)
    }

    /// Decode the group directory announced by the header.
    fn read_directory(&self) -> Result<Vec<GroupEntry>, StarshardError> {
        let n_groups = self.header.n_groups;
        if n_groups < 0 {
            return Err(StarshardError::InvalidContainerFormat(format!(
                "negative group count {n_groups}"
            )));
        }

        let mut groups = Vec::with_capacity(n_groups as usize);
        let mut offset = self.header.dir_offset as u64;

        for _ in 0..n_groups {
            let head = self.read_bytes(offset, GROUP_ENTRY_FIXED_SIZE)?;
            let (_, (name, n_rows, n_columns)) = GroupEntry::parse_head(&head).map_err(|_| {
                StarshardError::InvalidContainerFormat("unreadable group entry".to_string())
            })?;
            offset += GROUP_ENTRY_FIXED_SIZE as u64;

            let mut columns = Vec::with_capacity(n_columns);
            for _ in 0..n_columns {
                let entry = self.read_bytes(offset, COLUMN_ENTRY_SIZE)?;
                let (_, (col_name, dtype_code, width, data_offset)) =
                    GroupEntry::parse_column(&entry).map_err(|_| {
                        StarshardError::InvalidContainerFormat(
                            "unreadable column entry".to_string(),
                        )
                    })?;
                let dtype = ColumnDtype::from_code(dtype_code).ok_or_else(|| {
                    StarshardError::InvalidContainerFormat(format!(
                        "unknown element type code {dtype_code} for column {col_name:?} in group {name:?}"
                    ))
                })?;
                columns.push(ColumnDescriptor {
                    name: col_name,
                    dtype,
                    width,
                    data_offset,
                });
                offset += COLUMN_ENTRY_SIZE as u64;
            }

            groups.push(GroupEntry {
                name,
                n_rows,
                columns,
            });
        }

        Ok(groups)
    }

    /// The decoded header record.
    pub fn header(&self) -> &ContainerHeader {
        &self.header
    }

    /// All shard groups, in container storage order.
    pub fn groups(&self) -> &[GroupEntry] {
        &self.groups
    }

    /// Borrow one group by directory index.
    pub fn group(&self, index: usize) -> &GroupEntry {
        &self.groups[index]
    }

    /// Resolve a column of a group by name.
    pub fn column<'a>(
        &self,
        group: &'a GroupEntry,
        name: &str,
    ) -> Result<&'a ColumnDescriptor, StarshardError> {
        group
            .column(name)
            .ok_or_else(|| StarshardError::UnknownColumn {
                column: name.to_string(),
                location: format!("shard group {:?}", group.name),
            })
    }

    /// Decode a whole column into memory with its native element type.
    ///
    /// Used for the identifier column (shards are sized so this stays
    /// affordable) and for scalar auxiliary columns.
    pub fn read_full_column(
        &self,
        group: &GroupEntry,
        descriptor: &ColumnDescriptor,
    ) -> Result<ColumnData, StarshardError> {
        let n = group.n_rows * descriptor.width;
        let bytes = self.read_bytes(descriptor.data_offset, n * descriptor.dtype.elem_size())?;
        Ok(ColumnData::decode(descriptor.dtype, &bytes, n))
    }

    /// Fetch selected rows of an `f64` matrix column, flattened row-major.
    ///
    /// **Precondition**: `rows` must be **strictly increasing**. The storage
    /// layer refuses unsorted or repeated selections so that physical reads
    /// always move forward through the file; callers own the permutation
    /// bookkeeping required to honor this (see the lookup engine).
    ///
    /// Arguments
    /// -----------------
    /// * `group`: The shard group holding the column.
    /// * `descriptor`: Column to read; element type must be `f64`.
    /// * `rows`: Strictly increasing row indices.
    ///
    /// Return
    /// ----------
    /// * `rows.len() * descriptor.width` values, row-major, in `rows` order.
    pub fn read_f64_rows(
        &self,
        group: &GroupEntry,
        descriptor: &ColumnDescriptor,
        rows: &[usize],
    ) -> Result<Vec<f64>, StarshardError> {
        if descriptor.dtype != ColumnDtype::Float64 {
            return Err(StarshardError::ColumnTypeMismatch {
                column: descriptor.name.clone(),
                reason: format!("expected f64 elements, found {:?}", descriptor.dtype),
            });
        }
        for w in rows.windows(2) {
            if w[1] <= w[0] {
                return Err(StarshardError::NonMonotonicAccess {
                    previous: w[0],
                    current: w[1],
                });
            }
        }
        if let Some(&last) = rows.last() {
            if last >= group.n_rows {
                return Err(StarshardError::RowIndexOutOfRange {
                    index: last,
                    n_rows: group.n_rows,
                });
            }
        }

        let row_bytes = descriptor.width * descriptor.dtype.elem_size();
        let mut out = Vec::with_capacity(rows.len() * descriptor.width);
        for &row in rows {
            let bytes =
                self.read_bytes(descriptor.data_offset + (row * row_bytes) as u64, row_bytes)?;
            out.extend(
                bytes
                    .chunks_exact(8)
                    .map(|c| f64::from_le_bytes(c.try_into().unwrap())),
            );
        }
        Ok(out)
    }

    /// Read an arbitrary byte range through the page cache.
    fn read_bytes(&self, offset: u64, len: usize) -> Result<Vec<u8>, StarshardError> {
        let end = offset
            .checked_add(len as u64)
            .ok_or_else(|| StarshardError::InvalidContainerFormat(
                "byte range overflows the address space".to_string(),
            ))?;
        if end > self.file_len {
            return Err(StarshardError::TruncatedContainer {
                offset,
                needed: len,
                file_len: self.file_len,
            });
        }

        let mut out = Vec::with_capacity(len);
        let mut pos = offset;
        let mut remaining = len;
        let page_size = CACHE_PAGE_SIZE as u64;

        while remaining > 0 {
            let page = pos / page_size;
            let page_start = page * page_size;
            let in_page = (pos - page_start) as usize;
            let take = remaining.min(CACHE_PAGE_SIZE - in_page);

            let mut cache = self.cache.borrow_mut();
            if cache.get(page).is_none() {
                let page_len = (self.file_len - page_start).min(page_size) as usize;
                let mut buf = vec![0u8; page_len];
                self.file.read_exact_at(&mut buf, page_start)?;
                cache.insert(page, buf);
            }
            let data = cache.get(page).expect("page resident after insert");
            out.extend_from_slice(&data[in_page..in_page + take]);
            drop(cache);

            pos += take as u64;
            remaining -= take;
        }

        Ok(out)
    }
}
