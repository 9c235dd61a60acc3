//! SELECT: one streaming scan keeping the rows that satisfy the predicate.

use common::{BinaryOperator, DbResult};
use parser::SelectCondition;
use table::{Table, TableWriter};
use tracing::debug;

use crate::{ensure_result_free, ExecutionContext};

/// Predicate with column names resolved to indices.
enum Resolved {
    Literal {
        column: usize,
        operator: BinaryOperator,
        literal: i64,
    },
    Columns {
        left: usize,
        operator: BinaryOperator,
        right: usize,
    },
}

impl Resolved {
    fn matches(&self, row: &[i64]) -> bool {
        match *self {
            Self::Literal {
                column,
                operator,
                literal,
            } => operator.eval(row[column], literal),
            Self::Columns {
                left,
                operator,
                right,
            } => operator.eval(row[left], row[right]),
        }
    }
}

pub fn select(
    ctx: &mut ExecutionContext,
    result: &str,
    source: &str,
    condition: &SelectCondition,
) -> DbResult<()> {
    debug!(result, source, "select");
    ensure_result_free(ctx, result)?;
    let src = ctx.tables.get(source)?;

    let resolved = match condition {
        SelectCondition::ColumnLiteral {
            column,
            operator,
            literal,
        } => Resolved::Literal {
            column: src.resolve_column(column)?,
            operator: *operator,
            literal: *literal,
        },
        SelectCondition::ColumnColumn {
            left,
            operator,
            right,
        } => Resolved::Columns {
            left: src.resolve_column(left)?,
            operator: *operator,
            right: src.resolve_column(right)?,
        },
    };

    let target = Table::with_columns(result, src.columns.clone(), &ctx.config)?;
    let mut writer = TableWriter::new(target);
    let mut cursor = src.cursor(&mut ctx.pool)?;
    while let Some(row) = cursor.next_row(&mut ctx.pool)? {
        if resolved.matches(&row) {
            writer.push(row, &mut ctx.pool)?;
        }
    }

    let table = writer.finish(&mut ctx.pool)?;
    ctx.tables.insert(table)
}
