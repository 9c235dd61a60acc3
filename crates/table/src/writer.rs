use buffer::BufferPool;
use common::{DbResult, Row};
use hashbrown::HashSet;

use crate::{DistinctSet, Table};

/// Builds a result table one row at a time: rows accumulate in a staging
/// buffer of `max_rows_per_block` and flush as full pages, with per-column
/// distinct statistics maintained along the way.
///
/// The table under construction is owned by the writer and only handed back
/// by [`TableWriter::finish`]; a failed operator therefore never registers a
/// half-written table.
#[derive(Debug)]
pub struct TableWriter {
    table: Table,
    staging: Vec<Row>,
    distinct: Vec<DistinctSet>,
}

impl TableWriter {
    pub fn new(table: Table) -> Self {
        let columns = table.column_count();
        Self {
            staging: Vec::with_capacity(table.max_rows_per_block),
            distinct: vec![DistinctSet::default(); columns],
            table,
        }
    }

    /// Append one row, flushing a page when the staging buffer fills.
    pub fn push(&mut self, row: Row, pool: &mut BufferPool) -> DbResult<()> {
        debug_assert_eq!(row.len(), self.table.column_count());
        for (set, value) in self.distinct.iter_mut().zip(&row) {
            set.insert(*value);
        }
        self.table.row_count += 1;
        self.staging.push(row);
        if self.staging.len() == self.table.max_rows_per_block {
            self.flush(pool)?;
        }
        Ok(())
    }

    fn flush(&mut self, pool: &mut BufferPool) -> DbResult<()> {
        if self.staging.is_empty() {
            return Ok(());
        }
        pool.write_page(&self.table.name, self.table.block_count, &self.staging)?;
        self.table.block_count += 1;
        self.table.rows_per_block.push(self.staging.len());
        self.staging.clear();
        Ok(())
    }

    /// Flush the final partial page and seal the statistics. The distinct
    /// working sets are discarded here; only their cardinalities survive.
    pub fn finish(mut self, pool: &mut BufferPool) -> DbResult<Table> {
        self.flush(pool)?;
        self.table.distinct_counts = self.distinct.iter().map(HashSet::len).collect();
        Ok(self.table)
    }

    /// Columns of the table under construction.
    pub fn columns(&self) -> &[String] {
        &self.table.columns
    }
}
