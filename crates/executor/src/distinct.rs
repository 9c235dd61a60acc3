//! DISTINCT: sort a scratch copy on all columns, then drop adjacent
//! duplicates in one streaming pass.

use common::{DbResult, Row, SortDirection, SortKey};
use table::{Table, TableWriter};
use tracing::debug;

use crate::{copy_table, ensure_result_free, sort::sort_table, ExecutionContext};

pub fn distinct(ctx: &mut ExecutionContext, result: &str, source: &str) -> DbResult<()> {
    debug!(result, source, "distinct");
    ensure_result_free(ctx, result)?;
    ctx.tables.get(source)?;

    let mut scratch = copy_table(ctx, source, &format!("{result}~dedup"))?;
    let keys: Vec<SortKey> = (0..scratch.column_count())
        .map(|column| SortKey {
            column,
            direction: SortDirection::Asc,
        })
        .collect();
    sort_table(&mut scratch, &keys, &mut ctx.pool)?;

    let target = Table::with_columns(result, scratch.columns.clone(), &ctx.config)?;
    let mut writer = TableWriter::new(target);
    let mut cursor = scratch.cursor(&mut ctx.pool)?;
    let mut previous: Option<Row> = None;
    while let Some(row) = cursor.next_row(&mut ctx.pool)? {
        if previous.as_ref() != Some(&row) {
            writer.push(row.clone(), &mut ctx.pool)?;
            previous = Some(row);
        }
    }

    let table = writer.finish(&mut ctx.pool)?;
    scratch.unload(&ctx.config, &mut ctx.pool)?;
    ctx.tables.insert(table)
}
