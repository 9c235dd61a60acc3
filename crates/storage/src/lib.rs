//! Page store: fixed-shape integer pages persisted one file per
//! `(relation, block)`.
//!
//! A page file is text: a header line with the valid row count and the
//! column count, then one whitespace-separated row per line. The format is
//! bit-exact within one deployment but not a stable wire protocol.

#[cfg(test)]
mod tests;

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use common::{DbError, DbResult, Row};

/// A rectangular block of integer rows. Only valid rows are stored; rows
/// past the valid count do not exist.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Page {
    rows: Vec<Row>,
    column_count: usize,
}

impl Page {
    pub fn new(rows: Vec<Row>, column_count: usize) -> Self {
        Self { rows, column_count }
    }

    /// A page with no rows, used as the seat of a cursor over an empty table.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The row at `index`, or `None` past the valid row count.
    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }
}

/// Serializes pages to disk and back. The buffer pool is its only caller for
/// reads; writes go through it directly (write-through).
#[derive(Debug)]
pub struct PageStore {
    dir: PathBuf,
}

impl PageStore {
    /// Create a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> DbResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// File path of one page.
    pub fn page_path(&self, relation: &str, block: usize) -> PathBuf {
        self.dir.join(format!("{relation}_Page{block}"))
    }

    /// Read a page back, validating its header against its body.
    pub fn read_page(&self, relation: &str, block: usize) -> DbResult<Page> {
        let path = self.page_path(relation, block);
        let file = File::open(&path).map_err(|e| {
            DbError::Storage(format!("open page {}: {e}", path.display()))
        })?;
        let mut lines = BufReader::new(file).lines();

        let header = lines
            .next()
            .ok_or_else(|| DbError::Storage(format!("page {} is empty", path.display())))??;
        let mut parts = header.split_whitespace();
        let row_count: usize = parse_header_field(&mut parts, &path)?;
        let column_count: usize = parse_header_field(&mut parts, &path)?;

        let mut rows = Vec::with_capacity(row_count);
        for line in lines.take(row_count) {
            let line = line?;
            let row = line
                .split_whitespace()
                .map(|field| {
                    field.parse::<i64>().map_err(|e| {
                        DbError::Storage(format!("page {}: bad value '{field}': {e}", path.display()))
                    })
                })
                .collect::<DbResult<Row>>()?;
            if row.len() != column_count {
                return Err(DbError::Storage(format!(
                    "page {}: expected {column_count} columns, found {}",
                    path.display(),
                    row.len()
                )));
            }
            rows.push(row);
        }
        if rows.len() != row_count {
            return Err(DbError::Storage(format!(
                "page {}: expected {row_count} rows, found {}",
                path.display(),
                rows.len()
            )));
        }

        Ok(Page::new(rows, column_count))
    }

    /// Write a page atomically: the content lands in a scratch file that is
    /// renamed over the target, so a failed write never leaves a torn page.
    pub fn write_page(&self, relation: &str, block: usize, rows: &[Row]) -> DbResult<()> {
        let path = self.page_path(relation, block);
        let scratch = path.with_extension("tmp");
        let column_count = rows.first().map_or(0, Vec::len);

        {
            let file = File::create(&scratch).map_err(|e| {
                DbError::Storage(format!("create page {}: {e}", scratch.display()))
            })?;
            let mut out = BufWriter::new(file);
            writeln!(out, "{} {}", rows.len(), column_count)?;
            for row in rows {
                let line = row
                    .iter()
                    .map(i64::to_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                writeln!(out, "{line}")?;
            }
            out.flush()?;
        }

        fs::rename(&scratch, &path)
            .map_err(|e| DbError::Storage(format!("publish page {}: {e}", path.display())))?;
        Ok(())
    }

    /// Remove one page file.
    pub fn delete_page(&self, relation: &str, block: usize) -> DbResult<()> {
        let path = self.page_path(relation, block);
        fs::remove_file(&path)
            .map_err(|e| DbError::Storage(format!("delete page {}: {e}", path.display())))
    }

    /// Rename the page file of `(from, block)` to belong to `to`.
    pub fn rename_page(&self, from: &str, to: &str, block: usize) -> DbResult<()> {
        let old = self.page_path(from, block);
        let new = self.page_path(to, block);
        fs::rename(&old, &new).map_err(|e| {
            DbError::Storage(format!(
                "rename page {} -> {}: {e}",
                old.display(),
                new.display()
            ))
        })
    }

    /// Remove an arbitrary file (source CSVs on unload/export).
    pub fn delete_file(path: &Path) -> DbResult<()> {
        fs::remove_file(path)
            .map_err(|e| DbError::Storage(format!("delete {}: {e}", path.display())))
    }
}

fn parse_header_field<'a>(
    parts: &mut impl Iterator<Item = &'a str>,
    path: &Path,
) -> DbResult<usize> {
    parts
        .next()
        .ok_or_else(|| DbError::Storage(format!("page {}: truncated header", path.display())))?
        .parse::<usize>()
        .map_err(|e| DbError::Storage(format!("page {}: bad header: {e}", path.display())))
}
