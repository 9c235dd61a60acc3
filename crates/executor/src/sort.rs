//! SORT and ORDER: external sort-merge with a bounded buffer pool.
//!
//! Phase 1 sorts every page individually in memory and writes it back.
//! Phase 2 merges runs bottom-up, `fan_in = pool_capacity - 1` runs at a
//! time (one page slot stays reserved for the output buffer), writing merged
//! pages to a scratch relation that is renamed over the original after each
//! level. Run length grows by `fan_in` per level until one run remains.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use buffer::BufferPool;
use common::{compare_rows, DbError, DbResult, Row, SortDirection, SortKey};
use table::{Cursor, Table};
use tracing::debug;

use crate::{copy_table, ensure_result_free, ExecutionContext};

/// `SORT t BY ...` rearranges a table in place.
pub fn sort_command(
    ctx: &mut ExecutionContext,
    name: &str,
    keys: &[(String, SortDirection)],
) -> DbResult<()> {
    if keys.is_empty() {
        return Err(DbError::Executor("SORT needs at least one key".into()));
    }
    let table = ctx.tables.get_mut(name)?;
    let resolved = keys
        .iter()
        .map(|(column, direction)| {
            Ok(SortKey {
                column: table.resolve_column(column)?,
                direction: *direction,
            })
        })
        .collect::<DbResult<Vec<_>>>()?;
    sort_table(table, &resolved, &mut ctx.pool)
}

/// `r <- ORDER s BY col dir` sorts a copy, leaving the source untouched.
pub fn order(
    ctx: &mut ExecutionContext,
    result: &str,
    source: &str,
    column: &str,
    direction: SortDirection,
) -> DbResult<()> {
    ensure_result_free(ctx, result)?;
    let key = SortKey {
        column: ctx.tables.get(source)?.resolve_column(column)?,
        direction,
    };
    let mut table = copy_table(ctx, source, result)?;
    sort_table(&mut table, &[key], &mut ctx.pool)?;
    ctx.tables.insert(table)
}

/// External sort-merge of one table by a composite key. Row count, block
/// count and the rows-per-block distribution are preserved.
pub fn sort_table(table: &mut Table, keys: &[SortKey], pool: &mut BufferPool) -> DbResult<()> {
    debug!(table = %table.name, blocks = table.block_count, "sort");

    // Phase 1: every page becomes a sorted run of length one.
    for block in 0..table.block_count {
        let page = pool.get_page(&table.name, block)?;
        let mut rows = page.rows().to_vec();
        drop(page);
        rows.sort_by(|a, b| compare_rows(a, b, keys));
        pool.write_page(&table.name, block, &rows)?;
        pool.drop_page(&table.name, block);
    }
    if table.block_count <= 1 {
        return Ok(());
    }

    let fan_in = pool.capacity() - 1;
    if fan_in < 2 {
        return Err(DbError::Executor(format!(
            "pool capacity {} is too small for a k-way merge",
            pool.capacity()
        )));
    }

    // Phase 2: merge fan_in adjacent runs per group, level by level.
    let scratch = format!("{}~sort", table.name);
    let mut run_len = 1usize;
    while run_len < table.block_count {
        let counts = merge_level(table, keys, run_len, fan_in, &scratch, pool)?;
        debug_assert_eq!(counts.len(), table.block_count);
        debug_assert_eq!(counts.iter().sum::<usize>(), table.row_count);

        for block in 0..counts.len() {
            pool.rename_page(&scratch, &table.name, block)?;
        }
        for block in counts.len()..table.block_count {
            pool.delete_page(&table.name, block)?;
        }
        table.block_count = counts.len();
        table.rows_per_block = counts;
        run_len = run_len.saturating_mul(fan_in);
    }
    Ok(())
}

/// One cursor per run plus the count of rows it still owes.
struct MergeRun {
    cursor: Cursor,
    remaining: usize,
}

/// Merge every group of `fan_in` adjacent `run_len`-page runs into the
/// scratch relation, returning the per-page row counts it wrote.
fn merge_level(
    table: &Table,
    keys: &[SortKey],
    run_len: usize,
    fan_in: usize,
    scratch: &str,
    pool: &mut BufferPool,
) -> DbResult<Vec<usize>> {
    let mut prefix = Vec::with_capacity(table.block_count + 1);
    prefix.push(0usize);
    for count in &table.rows_per_block {
        prefix.push(prefix.last().unwrap() + count);
    }

    let group_len = run_len * fan_in;
    let mut counts = Vec::with_capacity(table.block_count);
    let mut staging: Vec<Row> = Vec::with_capacity(table.max_rows_per_block);
    let mut out_block = 0usize;

    let mut group_start = 0usize;
    while group_start < table.block_count {
        let group_end = (group_start + group_len).min(table.block_count);

        let mut runs = Vec::new();
        let mut start = group_start;
        while start < group_end {
            let end = (start + run_len).min(group_end);
            runs.push(MergeRun {
                cursor: Cursor::new(&table.name, start, table.block_count, pool)?,
                remaining: prefix[end] - prefix[start],
            });
            start = end;
        }

        let mut heap = BinaryHeap::with_capacity(runs.len());
        for (index, run) in runs.iter_mut().enumerate() {
            if let Some(entry) = refill(run, index, keys, pool)? {
                heap.push(Reverse(entry));
            }
        }

        while let Some(Reverse(entry)) = heap.pop() {
            let index = entry.run;
            staging.push(entry.row);
            if staging.len() == table.max_rows_per_block {
                pool.write_page(scratch, out_block, &staging)?;
                counts.push(staging.len());
                out_block += 1;
                staging.clear();
            }
            if let Some(next) = refill(&mut runs[index], index, keys, pool)? {
                heap.push(Reverse(next));
            }
        }

        // A partial page closes the group so runs keep page-aligned starts.
        if !staging.is_empty() {
            pool.write_page(scratch, out_block, &staging)?;
            counts.push(staging.len());
            out_block += 1;
            staging.clear();
        }

        group_start = group_end;
    }

    Ok(counts)
}

fn refill(
    run: &mut MergeRun,
    index: usize,
    keys: &[SortKey],
    pool: &mut BufferPool,
) -> DbResult<Option<MergeEntry>> {
    if run.remaining == 0 {
        return Ok(None);
    }
    let row = run
        .cursor
        .next_row(pool)?
        .ok_or_else(|| DbError::Storage("sorted run ended before its row count".into()))?;
    run.remaining -= 1;
    Ok(Some(MergeEntry::new(row, index, keys)))
}

/// One directed component of a composite merge key. Every heap entry builds
/// the same variant per position, so the derived enum ordering never
/// compares across variants.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
enum KeyPart {
    Asc(i64),
    Desc(Reverse<i64>),
}

/// Heap entry: composite key first, run index as the stability tie-break.
struct MergeEntry {
    key: Vec<KeyPart>,
    run: usize,
    row: Row,
}

impl MergeEntry {
    fn new(row: Row, run: usize, keys: &[SortKey]) -> Self {
        let key = keys
            .iter()
            .map(|k| match k.direction {
                SortDirection::Asc => KeyPart::Asc(row[k.column]),
                SortDirection::Desc => KeyPart::Desc(Reverse(row[k.column])),
            })
            .collect();
        Self { key, run, row }
    }
}

impl PartialEq for MergeEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.run == other.run
    }
}

impl Eq for MergeEntry {}

impl PartialOrd for MergeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MergeEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key).then(self.run.cmp(&other.run))
    }
}
