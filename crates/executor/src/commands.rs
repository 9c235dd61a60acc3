//! The single-scan commands: LOAD, PRINT, EXPORT, RENAME, TRANSPOSE,
//! CHECKSYMMETRY, CLEAR, SOURCE and LIST TABLES.

use std::fs;

use common::{pretty, DbError, DbResult};
use matrix::Matrix;
use parser::ParsedQuery;
use table::Table;
use tracing::info;

use crate::{execute, ensure_result_free, ExecutionContext};

pub fn load(ctx: &mut ExecutionContext, name: &str) -> DbResult<()> {
    info!(table = name, "LOAD");
    ensure_result_free(ctx, name)?;
    let mut table = Table::from_csv(name, &ctx.config);
    if !table.source_file.exists() {
        return Err(DbError::Catalog(format!(
            "no data file for table '{name}'"
        )));
    }
    table.load(&ctx.config, &mut ctx.pool)?;
    ctx.tables.insert(table)
}

pub fn load_matrix(ctx: &mut ExecutionContext, name: &str) -> DbResult<()> {
    info!(matrix = name, "LOAD MATRIX");
    ensure_result_free(ctx, name)?;
    let mut matrix = Matrix::from_csv(name, &ctx.config);
    if !matrix.source_file.exists() {
        return Err(DbError::Catalog(format!(
            "no data file for matrix '{name}'"
        )));
    }
    matrix.load(&mut ctx.pool)?;
    ctx.matrices.insert(matrix)
}

/// First `print_count` rows plus the total row count.
pub fn print(ctx: &mut ExecutionContext, name: &str) -> DbResult<String> {
    let table = ctx.tables.get(name)?;
    let shown = table.row_count.min(ctx.config.print_count);
    let mut cursor = table.cursor(&mut ctx.pool)?;
    let mut rows = Vec::with_capacity(shown);
    while rows.len() < shown {
        match cursor.next_row(&mut ctx.pool)? {
            Some(row) => rows.push(row),
            None => break,
        }
    }
    Ok(format!(
        "{}\nRow count: {}",
        pretty::render_rows(&table.columns, &rows),
        table.row_count
    ))
}

pub fn print_matrix(ctx: &mut ExecutionContext, name: &str) -> DbResult<String> {
    let matrix = ctx.matrices.get(name)?;
    matrix.print(&ctx.config, &mut ctx.pool)
}

pub fn export(ctx: &mut ExecutionContext, name: &str) -> DbResult<()> {
    info!(table = name, "EXPORT");
    let table = ctx.tables.get_mut(name)?;
    table.make_permanent(&ctx.config, &mut ctx.pool)
}

pub fn export_matrix(ctx: &mut ExecutionContext, name: &str) -> DbResult<()> {
    info!(matrix = name, "EXPORT MATRIX");
    let matrix = ctx.matrices.get_mut(name)?;
    matrix.make_permanent(&ctx.config, &mut ctx.pool)
}

pub fn rename_column(ctx: &mut ExecutionContext, table: &str, from: &str, to: &str) -> DbResult<()> {
    let table = ctx.tables.get_mut(table)?;
    table.rename_column(from, to)
}

pub fn rename_matrix(ctx: &mut ExecutionContext, from: &str, to: &str) -> DbResult<()> {
    ensure_result_free(ctx, to)?;
    let mut matrix = ctx.matrices.remove(from)?;
    let renamed = matrix.rename(to, &mut ctx.pool);
    // Re-register under whichever name the matrix ended up with.
    ctx.matrices.insert(matrix)?;
    renamed
}

pub fn transpose(ctx: &mut ExecutionContext, name: &str) -> DbResult<()> {
    info!(matrix = name, "TRANSPOSE");
    let matrix = ctx.matrices.get(name)?;
    matrix.transpose(&mut ctx.pool)
}

pub fn check_symmetry(ctx: &mut ExecutionContext, name: &str) -> DbResult<String> {
    let matrix = ctx.matrices.get(name)?;
    let symmetric = matrix.check_symmetry(&mut ctx.pool)?;
    Ok(if symmetric { "TRUE" } else { "FALSE" }.to_string())
}

/// Unload a table or matrix: every page file is deleted, and a temporary
/// relation's source CSV with them.
pub fn clear(ctx: &mut ExecutionContext, name: &str) -> DbResult<()> {
    info!(relation = name, "CLEAR");
    if ctx.tables.contains(name) {
        let table = ctx.tables.remove(name)?;
        table.unload(&ctx.config, &mut ctx.pool)
    } else if ctx.matrices.contains(name) {
        let matrix = ctx.matrices.remove(name)?;
        matrix.unload(&ctx.config, &mut ctx.pool)
    } else {
        Err(DbError::Catalog(format!("unknown relation '{name}'")))
    }
}

pub fn list_tables(ctx: &ExecutionContext) -> String {
    pretty::render_names("TABLES", &ctx.tables.names())
}

/// Replay `<data>/<script>.ra` line by line, skipping blanks and `--`
/// comments. A QUIT in the script stops the replay.
pub fn source(ctx: &mut ExecutionContext, script: &str) -> DbResult<Option<String>> {
    let path = ctx.config.script_path(script);
    let content = fs::read_to_string(&path)
        .map_err(|e| DbError::Catalog(format!("no script '{script}': {e}")))?;

    let mut outputs = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("--") {
            continue;
        }
        let query = parser::parse(line)?;
        if query == ParsedQuery::Quit {
            break;
        }
        if let Some(output) = execute(ctx, query)? {
            outputs.push(output);
        }
    }
    Ok(if outputs.is_empty() {
        None
    } else {
        Some(outputs.join("\n"))
    })
}
