//! JOIN: sort-merge theta join. The merge requires both inputs ascending on
//! their join columns, so the executor always materializes sorted scratch
//! copies first; stored order is never trusted.

use buffer::BufferPool;
use common::{BinaryOperator, DbError, DbResult, SortDirection, SortKey};
use table::{Table, TableWriter};
use tracing::debug;

use crate::{copy_table, ensure_result_free, sort::sort_table, ExecutionContext};

#[allow(clippy::too_many_arguments)]
pub fn join(
    ctx: &mut ExecutionContext,
    result: &str,
    left: &str,
    right: &str,
    left_column: &str,
    right_column: &str,
    operator: BinaryOperator,
) -> DbResult<()> {
    debug!(result, left, right, %operator, "join");
    if operator == BinaryOperator::NotEqual {
        return Err(DbError::Executor("JOIN on '!=' is not supported".into()));
    }
    ensure_result_free(ctx, result)?;

    let lhs_meta = ctx.tables.get(left)?;
    let rhs_meta = ctx.tables.get(right)?;
    let left_index = lhs_meta.resolve_column(left_column)?;
    let right_index = rhs_meta.resolve_column(right_column)?;

    let mut columns = lhs_meta.columns.clone();
    for column in &rhs_meta.columns {
        if lhs_meta.has_column(column) {
            return Err(DbError::Catalog(format!(
                "JOIN result has duplicate column '{column}'"
            )));
        }
        columns.push(column.clone());
    }

    let mut lhs = copy_table(ctx, left, &format!("{result}~left"))?;
    sort_table(
        &mut lhs,
        &[SortKey {
            column: left_index,
            direction: SortDirection::Asc,
        }],
        &mut ctx.pool,
    )?;
    let mut rhs = copy_table(ctx, right, &format!("{result}~right"))?;
    sort_table(
        &mut rhs,
        &[SortKey {
            column: right_index,
            direction: SortDirection::Asc,
        }],
        &mut ctx.pool,
    )?;

    let target = Table::with_columns(result, columns, &ctx.config)?;
    let mut writer = TableWriter::new(target);
    merge_join(
        &lhs,
        &rhs,
        left_index,
        right_index,
        operator,
        &mut writer,
        &mut ctx.pool,
    )?;
    let table = writer.finish(&mut ctx.pool)?;

    lhs.unload(&ctx.config, &mut ctx.pool)?;
    rhs.unload(&ctx.config, &mut ctx.pool)?;
    ctx.tables.insert(table)
}

/// Merge two ascending inputs. Duplicate key runs are enumerated with forked
/// cursors so neither primary loses its position; for the inequality
/// operators the sorted order makes the entire remaining scan of one side
/// match, again walked by a fork.
fn merge_join(
    lhs: &Table,
    rhs: &Table,
    left_index: usize,
    right_index: usize,
    operator: BinaryOperator,
    writer: &mut TableWriter,
    pool: &mut BufferPool,
) -> DbResult<()> {
    let mut left_cursor = lhs.cursor(pool)?;
    let mut right_cursor = rhs.cursor(pool)?;
    let mut left = left_cursor.next_row(pool)?;
    let mut right = right_cursor.next_row(pool)?;

    loop {
        let (row_a, row_b) = match (&left, &right) {
            (Some(a), Some(b)) => (a.clone(), b.clone()),
            _ => break,
        };
        let (key_a, key_b) = (row_a[left_index], row_b[right_index]);

        match operator {
            BinaryOperator::Equal => {
                if key_a == key_b {
                    emit(writer, &row_a, &row_b, pool)?;
                    let mut fork = left_cursor.clone();
                    while let Some(next_a) = fork.next_row(pool)? {
                        if next_a[left_index] != key_b {
                            break;
                        }
                        emit(writer, &next_a, &row_b, pool)?;
                    }
                    let mut fork = right_cursor.clone();
                    while let Some(next_b) = fork.next_row(pool)? {
                        if next_b[right_index] != key_a {
                            break;
                        }
                        emit(writer, &row_a, &next_b, pool)?;
                    }
                    left = left_cursor.next_row(pool)?;
                    right = right_cursor.next_row(pool)?;
                } else if key_a < key_b {
                    left = left_cursor.next_row(pool)?;
                } else {
                    right = right_cursor.next_row(pool)?;
                }
            }
            BinaryOperator::Less | BinaryOperator::Leq => {
                if operator.eval(key_a, key_b) {
                    // Ascending right side: every remaining row matches too.
                    emit(writer, &row_a, &row_b, pool)?;
                    let mut fork = right_cursor.clone();
                    while let Some(next_b) = fork.next_row(pool)? {
                        emit(writer, &row_a, &next_b, pool)?;
                    }
                    left = left_cursor.next_row(pool)?;
                } else {
                    right = right_cursor.next_row(pool)?;
                }
            }
            BinaryOperator::Greater | BinaryOperator::Geq => {
                if operator.eval(key_a, key_b) {
                    // Ascending left side: every remaining row matches too.
                    emit(writer, &row_a, &row_b, pool)?;
                    let mut fork = left_cursor.clone();
                    while let Some(next_a) = fork.next_row(pool)? {
                        emit(writer, &next_a, &row_b, pool)?;
                    }
                    right = right_cursor.next_row(pool)?;
                } else {
                    left = left_cursor.next_row(pool)?;
                }
            }
            BinaryOperator::NotEqual => {
                unreachable!("rejected before the merge starts")
            }
        }
    }
    Ok(())
}

fn emit(
    writer: &mut TableWriter,
    left: &[i64],
    right: &[i64],
    pool: &mut BufferPool,
) -> DbResult<()> {
    let mut row = Vec::with_capacity(left.len() + right.len());
    row.extend_from_slice(left);
    row.extend_from_slice(right);
    writer.push(row, pool)
}
