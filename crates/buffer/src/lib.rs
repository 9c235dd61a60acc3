//! Buffer pool: the sole mediator for page reads, holding at most a fixed
//! number of pages resident with FIFO eviction.
//!
//! The pool hands out `Arc<Page>` clones; resident pages are immutable.
//! Modifications go through [`BufferPool::write_page`], which writes through
//! to disk and never inserts the written page. Operators that rewrite a
//! resident page must drop the stale copy explicitly.
//!
//! Eviction is FIFO by arrival order, not LRU: a cache hit does not promote
//! the page. Sequential scans dominate the workload, and FIFO keeps the
//! replacement behavior deterministic for tests.

#[cfg(test)]
mod tests;

use std::collections::VecDeque;
use std::sync::Arc;

use ahash::RandomState;
use common::{DbResult, Row};
use hashbrown::HashMap;
use storage::{Page, PageStore};

type Map<K, V> = HashMap<K, V, RandomState>;

/// Identifies one resident page by owning relation and block index.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PageKey {
    pub relation: String,
    pub block: usize,
}

impl PageKey {
    fn new(relation: &str, block: usize) -> Self {
        Self {
            relation: relation.to_string(),
            block,
        }
    }
}

#[derive(Debug)]
pub struct BufferPool {
    store: PageStore,
    capacity: usize,
    resident: Map<PageKey, Arc<Page>>,
    arrivals: VecDeque<PageKey>,
}

impl BufferPool {
    /// Create a pool over `store` holding at most `capacity` pages.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(store: PageStore, capacity: usize) -> Self {
        assert!(capacity > 0, "pool capacity must be > 0");
        Self {
            store,
            capacity,
            resident: Map::default(),
            arrivals: VecDeque::with_capacity(capacity),
        }
    }

    /// Fetch a page, reading it from disk on a miss and evicting the oldest
    /// resident page if the pool is full. A hit does not change the
    /// eviction order.
    pub fn get_page(&mut self, relation: &str, block: usize) -> DbResult<Arc<Page>> {
        let key = PageKey::new(relation, block);
        if let Some(page) = self.resident.get(&key) {
            return Ok(Arc::clone(page));
        }

        let page = Arc::new(self.store.read_page(relation, block)?);
        if self.resident.len() == self.capacity {
            if let Some(oldest) = self.arrivals.pop_front() {
                self.resident.remove(&oldest);
            }
        }
        self.arrivals.push_back(key.clone());
        self.resident.insert(key, Arc::clone(&page));
        Ok(page)
    }

    /// Write a page through to disk. The written page is not inserted into
    /// the pool; a stale resident copy, if any, stays until dropped.
    pub fn write_page(&mut self, relation: &str, block: usize, rows: &[Row]) -> DbResult<()> {
        self.store.write_page(relation, block, rows)
    }

    /// Remove a resident page without touching disk.
    pub fn drop_page(&mut self, relation: &str, block: usize) {
        let key = PageKey::new(relation, block);
        if self.resident.remove(&key).is_some() {
            self.arrivals.retain(|k| *k != key);
        }
    }

    /// Remove a page from the pool and from disk.
    pub fn delete_page(&mut self, relation: &str, block: usize) -> DbResult<()> {
        self.drop_page(relation, block);
        self.store.delete_page(relation, block)
    }

    /// Rename a page file, dropping stale resident copies under both names.
    pub fn rename_page(&mut self, from: &str, to: &str, block: usize) -> DbResult<()> {
        self.drop_page(from, block);
        self.drop_page(to, block);
        self.store.rename_page(from, to, block)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn resident_count(&self) -> usize {
        self.resident.len()
    }

    /// Whether a page is currently resident (no disk access).
    pub fn contains(&self, relation: &str, block: usize) -> bool {
        self.resident.contains_key(&PageKey::new(relation, block))
    }

    pub fn store(&self) -> &PageStore {
        &self.store
    }
}
