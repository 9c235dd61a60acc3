//! PROJECT: one streaming scan mapping each row onto a column subset.

use common::DbResult;
use table::{Table, TableWriter};
use tracing::debug;

use crate::{ensure_result_free, ExecutionContext};

pub fn project(
    ctx: &mut ExecutionContext,
    result: &str,
    source: &str,
    columns: &[String],
) -> DbResult<()> {
    debug!(result, source, "project");
    ensure_result_free(ctx, result)?;
    let src = ctx.tables.get(source)?;

    let indices = columns
        .iter()
        .map(|name| src.resolve_column(name))
        .collect::<DbResult<Vec<_>>>()?;

    let target = Table::with_columns(result, columns.to_vec(), &ctx.config)?;
    let mut writer = TableWriter::new(target);
    let mut cursor = src.cursor(&mut ctx.pool)?;
    while let Some(row) = cursor.next_row(&mut ctx.pool)? {
        let projected = indices.iter().map(|&i| row[i]).collect();
        writer.push(projected, &mut ctx.pool)?;
    }

    let table = writer.finish(&mut ctx.pool)?;
    ctx.tables.insert(table)
}
