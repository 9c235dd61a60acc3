//! Integer tables partitioned into fixed-capacity pages, the CSV loader that
//! blockifies them, and the cursor that streams them back.

mod cursor;
#[cfg(test)]
mod tests;
mod writer;

pub use cursor::Cursor;
pub use writer::TableWriter;

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use ahash::RandomState;
use buffer::BufferPool;
use common::{Config, DbError, DbResult, Row};
use hashbrown::HashSet;
use storage::PageStore;
use tracing::debug;

type NameSet = HashSet<String, RandomState>;
pub(crate) type DistinctSet = HashSet<i64, RandomState>;

/// Metadata of one named table; its rows live in page files on disk.
#[derive(Clone, Debug)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub max_rows_per_block: usize,
    pub row_count: usize,
    pub block_count: usize,
    pub rows_per_block: Vec<usize>,
    /// Distinct-value count per column, maintained at load and by writers.
    pub distinct_counts: Vec<usize>,
    /// CSV this table was loaded from, or will re-export to. Directly under
    /// the data directory for permanent tables, under `temp/` otherwise.
    pub source_file: PathBuf,
}

impl Table {
    /// A table about to be loaded from `<data>/<name>.csv`. Columns and
    /// page layout are discovered by [`Table::load`].
    pub fn from_csv(name: &str, config: &Config) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
            max_rows_per_block: 0,
            row_count: 0,
            block_count: 0,
            rows_per_block: Vec::new(),
            distinct_counts: Vec::new(),
            source_file: config.csv_path(name),
        }
    }

    /// An empty result table with known columns. Its header line is written
    /// to a temporary CSV so the table has a source until EXPORT.
    pub fn with_columns(name: &str, columns: Vec<String>, config: &Config) -> DbResult<Self> {
        let mut seen = NameSet::default();
        for column in &columns {
            if !seen.insert(column.clone()) {
                return Err(DbError::Catalog(format!(
                    "duplicate column '{column}' in result table '{name}'"
                )));
            }
        }
        if columns.is_empty() {
            return Err(DbError::Catalog(format!(
                "result table '{name}' has no columns"
            )));
        }

        let max_rows_per_block = config.max_rows_per_block(columns.len());
        if max_rows_per_block == 0 {
            return Err(DbError::Storage(format!(
                "table '{name}': one row does not fit in a {} byte block",
                config.block_size
            )));
        }

        let source_file = config.temp_csv_path(name);
        let mut out = BufWriter::new(File::create(&source_file)?);
        writeln!(out, "{}", columns.join(","))?;
        out.flush()?;

        Ok(Self {
            name: name.to_string(),
            columns,
            max_rows_per_block,
            row_count: 0,
            block_count: 0,
            rows_per_block: Vec::new(),
            distinct_counts: Vec::new(),
            source_file,
        })
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Resolve a column name to its index, erroring the way operators report
    /// a missing column.
    pub fn resolve_column(&self, name: &str) -> DbResult<usize> {
        self.column_index(name).ok_or_else(|| {
            DbError::Catalog(format!(
                "no column '{name}' in table '{}'",
                self.name
            ))
        })
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> DbResult<()> {
        if self.has_column(to) {
            return Err(DbError::Catalog(format!(
                "column '{to}' already exists in table '{}'",
                self.name
            )));
        }
        let index = self.resolve_column(from)?;
        self.columns[index] = to.to_string();
        Ok(())
    }

    /// A table is permanent iff its source CSV sits directly in the data
    /// directory; temporaries live under `temp/` and die on CLEAR.
    pub fn is_permanent(&self, config: &Config) -> bool {
        self.source_file.parent() == Some(config.data_dir.as_path())
    }

    /// Load the source CSV: parse the header, then stream rows into pages
    /// while maintaining per-column distinct statistics. The distinct sets
    /// are discarded afterwards; only their cardinalities stay.
    pub fn load(&mut self, config: &Config, pool: &mut BufferPool) -> DbResult<()> {
        debug!(table = %self.name, "load");
        let file = File::open(&self.source_file).map_err(|e| {
            DbError::Storage(format!("open {}: {e}", self.source_file.display()))
        })?;
        let mut lines = BufReader::new(file).lines();

        let header = lines.next().ok_or_else(|| {
            DbError::Storage(format!("{}: empty source file", self.source_file.display()))
        })??;
        self.extract_column_names(&header)?;

        self.max_rows_per_block = config.max_rows_per_block(self.column_count());
        if self.max_rows_per_block == 0 {
            return Err(DbError::Storage(format!(
                "table '{}': one row does not fit in a {} byte block",
                self.name, config.block_size
            )));
        }

        let mut distinct: Vec<DistinctSet> = vec![DistinctSet::default(); self.column_count()];
        let mut staging: Vec<Row> = Vec::with_capacity(self.max_rows_per_block);

        for line in lines {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let row = parse_csv_row(&line, self.column_count(), &self.name)?;
            for (set, value) in distinct.iter_mut().zip(&row) {
                set.insert(*value);
            }
            self.row_count += 1;
            staging.push(row);
            if staging.len() == self.max_rows_per_block {
                self.flush_block(&staging, pool)?;
                staging.clear();
            }
        }
        if !staging.is_empty() {
            self.flush_block(&staging, pool)?;
        }

        if self.row_count == 0 {
            return Err(DbError::Storage(format!(
                "table '{}' has no rows",
                self.name
            )));
        }

        self.distinct_counts = distinct.iter().map(HashSet::len).collect();
        Ok(())
    }

    fn extract_column_names(&mut self, header: &str) -> DbResult<()> {
        let mut seen = NameSet::default();
        for field in header.split(',') {
            let name: String = field.chars().filter(|c| !c.is_whitespace()).collect();
            if name.is_empty() {
                return Err(DbError::Storage(format!(
                    "table '{}': empty column name in header",
                    self.name
                )));
            }
            if !seen.insert(name.clone()) {
                return Err(DbError::Storage(format!(
                    "table '{}': duplicate column '{name}'",
                    self.name
                )));
            }
            self.columns.push(name);
        }
        Ok(())
    }

    fn flush_block(&mut self, rows: &[Row], pool: &mut BufferPool) -> DbResult<()> {
        pool.write_page(&self.name, self.block_count, rows)?;
        self.block_count += 1;
        self.rows_per_block.push(rows.len());
        Ok(())
    }

    /// A cursor over this table's pages, starting at page 0.
    pub fn cursor(&self, pool: &mut BufferPool) -> DbResult<Cursor> {
        Cursor::new(&self.name, 0, self.block_count, pool)
    }

    /// Stream all rows to `<data>/<name>.csv` and make the table permanent.
    /// A previous temporary source CSV is removed.
    pub fn make_permanent(&mut self, config: &Config, pool: &mut BufferPool) -> DbResult<()> {
        debug!(table = %self.name, "make_permanent");
        if !self.is_permanent(config) && self.source_file.exists() {
            PageStore::delete_file(&self.source_file)?;
        }

        let target = config.csv_path(&self.name);
        let mut out = BufWriter::new(File::create(&target)?);
        writeln!(out, "{}", self.columns.join(","))?;

        let mut cursor = self.cursor(pool)?;
        while let Some(row) = cursor.next_row(pool)? {
            let line = row.iter().map(i64::to_string).collect::<Vec<_>>().join(",");
            writeln!(out, "{line}")?;
        }
        out.flush()?;

        self.source_file = target;
        Ok(())
    }

    /// Delete every page file; a temporary table's source CSV goes with it.
    pub fn unload(&self, config: &Config, pool: &mut BufferPool) -> DbResult<()> {
        debug!(table = %self.name, "unload");
        for block in 0..self.block_count {
            pool.delete_page(&self.name, block)?;
        }
        if !self.is_permanent(config) && self.source_file.exists() {
            PageStore::delete_file(&self.source_file)?;
        }
        Ok(())
    }
}

pub(crate) fn parse_csv_row(line: &str, column_count: usize, table: &str) -> DbResult<Row> {
    let mut row = Row::with_capacity(column_count);
    for field in line.split(',') {
        let value = field.trim().parse::<i64>().map_err(|e| {
            DbError::Storage(format!(
                "table '{table}': bad integer '{}': {e}",
                field.trim()
            ))
        })?;
        row.push(value);
    }
    if row.len() != column_count {
        return Err(DbError::Storage(format!(
            "table '{table}': expected {column_count} values, found {}",
            row.len()
        )));
    }
    Ok(row)
}
