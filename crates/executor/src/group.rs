//! GROUP ... HAVING ... RETURN: grouped aggregation over a scratch copy sorted
//! ascending on the grouping column.

use buffer::BufferPool;
use common::{Accumulator, DbResult, SortDirection, SortKey};
use parser::{AggregateExpr, HavingClause};
use table::{Table, TableWriter};
use tracing::debug;

use crate::{copy_table, ensure_result_free, sort::sort_table, ExecutionContext};

pub fn group(
    ctx: &mut ExecutionContext,
    result: &str,
    source: &str,
    group_column: &str,
    having: &HavingClause,
    returning: &AggregateExpr,
) -> DbResult<()> {
    debug!(result, source, group_column, "group");
    ensure_result_free(ctx, result)?;

    let src = ctx.tables.get(source)?;
    let group_index = src.resolve_column(group_column)?;
    let having_index = src.resolve_column(&having.aggregate.column)?;
    let return_index = src.resolve_column(&returning.column)?;

    let mut scratch = copy_table(ctx, source, &format!("{result}~group"))?;
    sort_table(
        &mut scratch,
        &[SortKey {
            column: group_index,
            direction: SortDirection::Asc,
        }],
        &mut ctx.pool,
    )?;

    let columns = vec![
        group_column.to_string(),
        format!("{}{}", returning.func, returning.column),
    ];
    let target = Table::with_columns(result, columns, &ctx.config)?;
    let mut writer = TableWriter::new(target);

    let mut cursor = scratch.cursor(&mut ctx.pool)?;
    let mut current_key: Option<i64> = None;
    let mut having_acc = Accumulator::new(having.aggregate.func);
    let mut return_acc = Accumulator::new(returning.func);

    while let Some(row) = cursor.next_row(&mut ctx.pool)? {
        let key = row[group_index];
        if current_key != Some(key) {
            if let Some(finished) = current_key {
                finalize(
                    finished,
                    &having_acc,
                    &return_acc,
                    having,
                    &mut writer,
                    &mut ctx.pool,
                )?;
                having_acc.reset();
                return_acc.reset();
            }
            current_key = Some(key);
        }
        having_acc.push(row[having_index]);
        return_acc.push(row[return_index]);
    }
    if let Some(finished) = current_key {
        finalize(
            finished,
            &having_acc,
            &return_acc,
            having,
            &mut writer,
            &mut ctx.pool,
        )?;
    }

    let table = writer.finish(&mut ctx.pool)?;
    scratch.unload(&ctx.config, &mut ctx.pool)?;
    ctx.tables.insert(table)
}

/// Close one group: evaluate HAVING and emit `(key, return aggregate)` when
/// it holds.
fn finalize(
    key: i64,
    having_acc: &Accumulator,
    return_acc: &Accumulator,
    having: &HavingClause,
    writer: &mut TableWriter,
    pool: &mut BufferPool,
) -> DbResult<()> {
    if having.operator.eval(having_acc.finish(), having.literal) {
        writer.push(vec![key, return_acc.finish()], pool)?;
    }
    Ok(())
}
