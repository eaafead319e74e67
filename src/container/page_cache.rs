//! Read-only page cache for container column data.
//!
//! Column reads go through fixed-size pages so that repeated row fetches in
//! the same region of a shard hit memory instead of disk. The cache is
//! bounded by both a byte budget and a slot count (whichever is smaller
//! wins), mirroring the two tuning knobs exposed on the store open path.
//! Eviction is insertion-ordered: reads are append-mostly during a lookup
//! pass, so recency tracking buys little here.

use std::collections::VecDeque;

use crate::constants::{FastHashMap, CACHE_PAGE_SIZE};

#[derive(Debug)]
pub(crate) struct PageCache {
    pages: FastHashMap<u64, Vec<u8>>,
    order: VecDeque<u64>,
    /// Maximum number of resident pages.
    capacity: usize,
}

impl PageCache {
    /// Build a cache bounded by `cache_bytes` and `cache_slots`.
    ///
    /// Capacity is `min(cache_slots, cache_bytes / page_size)`, clamped to at
    /// least one page so a degenerate configuration still functions.
    pub(crate) fn new(cache_bytes: usize, cache_slots: usize) -> Self {
        let capacity = cache_slots.min(cache_bytes / CACHE_PAGE_SIZE).max(1);
        PageCache {
            pages: FastHashMap::default(),
            order: VecDeque::new(),
            capacity,
        }
    }

    /// Borrow a resident page, if any.
    pub(crate) fn get(&self, page: u64) -> Option<&[u8]> {
        self.pages.get(&page).map(|p| p.as_slice())
    }

    /// Insert a page, evicting the oldest resident page when full.
    pub(crate) fn insert(&mut self, page: u64, data: Vec<u8>) {
        if self.pages.contains_key(&page) {
            return;
        }
        if self.pages.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.pages.remove(&oldest);
            }
        }
        self.order.push_back(page);
        self.pages.insert(page, data);
    }

    #[cfg(test)]
    pub(crate) fn resident(&self) -> usize {
        self.pages.len()
    }
}
