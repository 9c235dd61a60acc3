//! Query executor: dispatches a [`ParsedQuery`] onto the table and matrix
//! operators, threading one explicit engine context through every call.
//!
//! The context replaces the process-wide singletons of a classic
//! single-session design (buffer pool, table catalogue, matrix catalogue),
//! so several engines can coexist in one process. Tests rely on this.
//!
//! # Example
//!
//! ```no_run
//! use common::Config;
//! use executor::{execute, ExecutionContext};
//!
//! let mut ctx = ExecutionContext::new(Config::default()).unwrap();
//! let query = parser::parse("LOAD employees").unwrap();
//! execute(&mut ctx, query).unwrap();
//! ```

mod commands;
mod cross;
mod distinct;
mod group;
mod join;
mod project;
mod select;
mod sort;

pub use sort::sort_table;

use buffer::BufferPool;
use catalog::{MatrixCatalogue, TableCatalogue};
use common::{Config, DbError, DbResult};
use parser::ParsedQuery;
use storage::PageStore;
use table::{Table, TableWriter};

/// All state one engine needs: configuration, both catalogues and the
/// buffer pool over the page store rooted in the temp directory.
pub struct ExecutionContext {
    pub config: Config,
    pub tables: TableCatalogue,
    pub matrices: MatrixCatalogue,
    pub pool: BufferPool,
}

impl ExecutionContext {
    /// Build a context rooted at the configured data directory, creating it
    /// and its temp subdirectory if needed.
    pub fn new(config: Config) -> DbResult<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        let store = PageStore::new(config.temp_dir())?;
        let pool = BufferPool::new(store, config.pool_capacity);
        Ok(Self {
            config,
            tables: TableCatalogue::new(),
            matrices: MatrixCatalogue::new(),
            pool,
        })
    }
}

/// Execute one query. Printing commands return their rendered output.
pub fn execute(ctx: &mut ExecutionContext, query: ParsedQuery) -> DbResult<Option<String>> {
    match query {
        ParsedQuery::Load { table } => commands::load(ctx, &table).map(|()| None),
        ParsedQuery::LoadMatrix { matrix } => commands::load_matrix(ctx, &matrix).map(|()| None),
        ParsedQuery::Print { table } => commands::print(ctx, &table).map(Some),
        ParsedQuery::PrintMatrix { matrix } => commands::print_matrix(ctx, &matrix).map(Some),
        ParsedQuery::Export { table } => commands::export(ctx, &table).map(|()| None),
        ParsedQuery::ExportMatrix { matrix } => {
            commands::export_matrix(ctx, &matrix).map(|()| None)
        }
        ParsedQuery::RenameColumn { table, from, to } => {
            commands::rename_column(ctx, &table, &from, &to).map(|()| None)
        }
        ParsedQuery::RenameMatrix { from, to } => {
            commands::rename_matrix(ctx, &from, &to).map(|()| None)
        }
        ParsedQuery::Project {
            result,
            source,
            columns,
        } => project::project(ctx, &result, &source, &columns).map(|()| None),
        ParsedQuery::Select {
            result,
            source,
            condition,
        } => select::select(ctx, &result, &source, &condition).map(|()| None),
        ParsedQuery::Join {
            result,
            left,
            right,
            left_column,
            right_column,
            operator,
        } => join::join(
            ctx,
            &result,
            &left,
            &right,
            &left_column,
            &right_column,
            operator,
        )
        .map(|()| None),
        ParsedQuery::Cross {
            result,
            left,
            right,
        } => cross::cross(ctx, &result, &left, &right).map(|()| None),
        ParsedQuery::Distinct { result, source } => {
            distinct::distinct(ctx, &result, &source).map(|()| None)
        }
        ParsedQuery::Sort { table, keys } => sort::sort_command(ctx, &table, &keys).map(|()| None),
        ParsedQuery::Order {
            result,
            source,
            column,
            direction,
        } => sort::order(ctx, &result, &source, &column, direction).map(|()| None),
        ParsedQuery::Group {
            result,
            source,
            group_column,
            having,
            returning,
        } => group::group(ctx, &result, &source, &group_column, &having, &returning)
            .map(|()| None),
        ParsedQuery::Transpose { matrix } => commands::transpose(ctx, &matrix).map(|()| None),
        ParsedQuery::CheckSymmetry { matrix } => commands::check_symmetry(ctx, &matrix).map(Some),
        ParsedQuery::Clear { relation } => commands::clear(ctx, &relation).map(|()| None),
        ParsedQuery::Source { script } => commands::source(ctx, &script),
        ParsedQuery::ListTables => Ok(Some(commands::list_tables(ctx))),
        ParsedQuery::Quit => Ok(None),
    }
}

/// A result name must be free in both catalogues before an operator runs.
pub(crate) fn ensure_result_free(ctx: &ExecutionContext, name: &str) -> DbResult<()> {
    if ctx.tables.contains(name) || ctx.matrices.contains(name) {
        return Err(DbError::Catalog(format!(
            "relation '{name}' already exists"
        )));
    }
    Ok(())
}

/// Materialize an unregistered copy of `source` under `name`. Operators use
/// this for the scratch tables they sort and later unload.
pub(crate) fn copy_table(
    ctx: &mut ExecutionContext,
    source: &str,
    name: &str,
) -> DbResult<Table> {
    let src = ctx.tables.get(source)?;
    let target = Table::with_columns(name, src.columns.clone(), &ctx.config)?;
    let mut writer = TableWriter::new(target);
    let mut cursor = src.cursor(&mut ctx.pool)?;
    while let Some(row) = cursor.next_row(&mut ctx.pool)? {
        writer.push(row, &mut ctx.pool)?;
    }
    writer.finish(&mut ctx.pool)
}
