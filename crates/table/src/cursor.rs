use std::sync::Arc;

use buffer::BufferPool;
use common::{DbResult, Row};
use storage::Page;

/// Forward iterator over a table's pages, delivering one row per call and
/// advancing between pages transparently. Cursors are the only way operators
/// read rows, which bounds peak memory by the pool size regardless of table
/// size.
///
/// A cursor is cheap to clone; the clone forks the scan position. The
/// sort-merge join uses forked cursors to enumerate runs of duplicate keys
/// without losing the primary position.
#[derive(Clone, Debug)]
pub struct Cursor {
    relation: String,
    block_count: usize,
    page: Arc<Page>,
    page_index: usize,
    page_pointer: usize,
}

impl Cursor {
    /// Open a cursor at `start_block`. `block_count` is a snapshot of the
    /// table's page count; tables are never resized while scanned.
    pub fn new(
        relation: &str,
        start_block: usize,
        block_count: usize,
        pool: &mut BufferPool,
    ) -> DbResult<Self> {
        let page = if block_count == 0 {
            Arc::new(Page::empty())
        } else {
            pool.get_page(relation, start_block)?
        };
        Ok(Self {
            relation: relation.to_string(),
            block_count,
            page,
            page_index: start_block,
            page_pointer: 0,
        })
    }

    /// The next row of the scan, or `None` when every page is exhausted.
    pub fn next_row(&mut self, pool: &mut BufferPool) -> DbResult<Option<Row>> {
        loop {
            if let Some(row) = self.page.row(self.page_pointer) {
                self.page_pointer += 1;
                return Ok(Some(row.clone()));
            }
            if self.page_index + 1 >= self.block_count {
                return Ok(None);
            }
            let next = self.page_index + 1;
            self.reposition(next, pool)?;
        }
    }

    /// Point the cursor at a specific page and rewind to its first row.
    pub fn reposition(&mut self, block: usize, pool: &mut BufferPool) -> DbResult<()> {
        self.page = pool.get_page(&self.relation, block)?;
        self.page_index = block;
        self.page_pointer = 0;
        Ok(())
    }

    /// All rows of the currently resident page, for in-page operations.
    pub fn page_rows(&self) -> &[Row] {
        self.page.rows()
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }
}
