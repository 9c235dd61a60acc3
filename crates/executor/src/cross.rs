//! CROSS: nested-loop cross product, rescanning the right table once per
//! left row.

use common::{DbError, DbResult};
use table::{Table, TableWriter};
use tracing::debug;

use crate::{ensure_result_free, ExecutionContext};

pub fn cross(
    ctx: &mut ExecutionContext,
    result: &str,
    left: &str,
    right: &str,
) -> DbResult<()> {
    debug!(result, left, right, "cross");
    ensure_result_free(ctx, result)?;
    let lhs = ctx.tables.get(left)?;
    let rhs = ctx.tables.get(right)?;

    let mut columns = lhs.columns.clone();
    columns.extend(rhs.columns.iter().cloned());
    for column in &rhs.columns {
        if lhs.has_column(column) {
            return Err(DbError::Catalog(format!(
                "CROSS result has duplicate column '{column}'"
            )));
        }
    }

    let target = Table::with_columns(result, columns, &ctx.config)?;
    let mut writer = TableWriter::new(target);
    let mut outer = lhs.cursor(&mut ctx.pool)?;
    while let Some(left_row) = outer.next_row(&mut ctx.pool)? {
        let mut inner = rhs.cursor(&mut ctx.pool)?;
        while let Some(right_row) = inner.next_row(&mut ctx.pool)? {
            let mut row = left_row.clone();
            row.extend_from_slice(&right_row);
            writer.push(row, &mut ctx.pool)?;
        }
    }

    let table = writer.finish(&mut ctx.pool)?;
    ctx.tables.insert(table)
}
