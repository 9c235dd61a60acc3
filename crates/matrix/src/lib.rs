//! Square integer matrices stored as a 2D tiling of square sub-blocks, each
//! sub-block one page. Block-shaped where tables are row-shaped; operators
//! address whole blocks through the buffer pool and hold at most two at a
//! time.


use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use buffer::BufferPool;
use common::{Config, DbError, DbResult, Row};
use storage::PageStore;
use tracing::debug;

/// Metadata of one named square matrix of order `n`, tiled into
/// `blocks_per_row x blocks_per_row` sub-blocks of side `block_side`
/// (edge blocks are ragged).
#[derive(Clone, Debug)]
pub struct Matrix {
    pub name: String,
    pub order: usize,
    pub block_side: usize,
    pub blocks_per_row: usize,
    pub source_file: PathBuf,
}

impl Matrix {
    /// A matrix about to be loaded from `<data>/<name>.csv`.
    pub fn from_csv(name: &str, config: &Config) -> Self {
        Self {
            name: name.to_string(),
            order: 0,
            block_side: config.matrix_block_side(),
            blocks_per_row: 0,
            source_file: config.csv_path(name),
        }
    }

    pub fn is_permanent(&self, config: &Config) -> bool {
        self.source_file.parent() == Some(config.data_dir.as_path())
    }

    /// Page index of sub-block `(i, j)`.
    fn block_page(&self, i: usize, j: usize) -> usize {
        i * self.blocks_per_row + j
    }

    /// Side length of the `index`-th block band (ragged at the edge).
    fn band_len(&self, index: usize) -> usize {
        self.block_side.min(self.order - index * self.block_side)
    }

    pub fn block_count(&self) -> usize {
        self.blocks_per_row * self.blocks_per_row
    }

    /// Load the source CSV, tiling it into sub-blocks one band (one row of
    /// blocks) at a time through the write-through path.
    pub fn load(&mut self, pool: &mut BufferPool) -> DbResult<()> {
        debug!(matrix = %self.name, "load");
        let file = File::open(&self.source_file).map_err(|e| {
            DbError::Storage(format!("open {}: {e}", self.source_file.display()))
        })?;
        let mut rows_seen = 0usize;
        let mut band = 0usize;
        let mut staging: Vec<Vec<Row>> = Vec::new();

        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let row = parse_matrix_row(&line, &self.name)?;

            if rows_seen == 0 {
                self.order = row.len();
                self.blocks_per_row = self.order.div_ceil(self.block_side);
                staging = vec![Vec::new(); self.blocks_per_row];
            }
            if rows_seen == self.order {
                return Err(DbError::Storage(format!(
                    "matrix '{}' is not square: more than {} rows",
                    self.name, self.order
                )));
            }
            if row.len() != self.order {
                return Err(DbError::Storage(format!(
                    "matrix '{}': row {} has {} values, expected {}",
                    self.name,
                    rows_seen + 1,
                    row.len(),
                    self.order
                )));
            }

            for (j, chunk) in row.chunks(self.block_side).enumerate() {
                staging[j].push(chunk.to_vec());
            }
            rows_seen += 1;

            if staging[0].len() == self.band_len(band) {
                self.flush_band(band, &mut staging, pool)?;
                band += 1;
            }
        }

        if rows_seen == 0 {
            return Err(DbError::Storage(format!(
                "matrix '{}' has no rows",
                self.name
            )));
        }
        if rows_seen != self.order {
            return Err(DbError::Storage(format!(
                "matrix '{}' is not square: {} rows of {} values",
                self.name, rows_seen, self.order
            )));
        }
        Ok(())
    }

    fn flush_band(
        &self,
        band: usize,
        staging: &mut [Vec<Row>],
        pool: &mut BufferPool,
    ) -> DbResult<()> {
        for (j, block) in staging.iter_mut().enumerate() {
            pool.write_page(&self.name, self.block_page(band, j), block)?;
            block.clear();
        }
        Ok(())
    }

    /// Assemble one full matrix row from its band of blocks.
    fn read_row(&self, row: usize, pool: &mut BufferPool) -> DbResult<Row> {
        let band = row / self.block_side;
        let within = row % self.block_side;
        let mut out = Row::with_capacity(self.order);
        for j in 0..self.blocks_per_row {
            let page = pool.get_page(&self.name, self.block_page(band, j))?;
            let block_row = page.row(within).ok_or_else(|| {
                DbError::Storage(format!(
                    "matrix '{}': block ({band},{j}) is missing row {within}",
                    self.name
                ))
            })?;
            out.extend_from_slice(block_row);
        }
        Ok(out)
    }

    /// The top-left window of the matrix, at most `print_count` rows and
    /// columns, rendered one line per row.
    pub fn print(&self, config: &Config, pool: &mut BufferPool) -> DbResult<String> {
        let shown = self.order.min(config.print_count);
        let mut out = String::new();
        for r in 0..shown {
            let row = self.read_row(r, pool)?;
            let line = row[..shown]
                .iter()
                .map(i64::to_string)
                .collect::<Vec<_>>()
                .join(" ");
            out.push_str(&line);
            out.push('\n');
        }
        out.push_str(&format!("Matrix order: {}", self.order));
        Ok(out)
    }

    /// Stream every row back to `<data>/<name>.csv` and make the matrix
    /// permanent.
    pub fn make_permanent(&mut self, config: &Config, pool: &mut BufferPool) -> DbResult<()> {
        debug!(matrix = %self.name, "make_permanent");
        if !self.is_permanent(config) && self.source_file.exists() {
            PageStore::delete_file(&self.source_file)?;
        }

        let target = config.csv_path(&self.name);
        let mut out = BufWriter::new(File::create(&target)?);
        for r in 0..self.order {
            let row = self.read_row(r, pool)?;
            let line = row.iter().map(i64::to_string).collect::<Vec<_>>().join(",");
            writeln!(out, "{line}")?;
        }
        out.flush()?;

        self.source_file = target;
        Ok(())
    }

    /// Transpose in place: diagonal blocks transpose where they stand,
    /// off-diagonal pairs `(i, j)` and `(j, i)` swap transposed. At most one
    /// buffered block is held besides the pool-resident one.
    pub fn transpose(&self, pool: &mut BufferPool) -> DbResult<()> {
        debug!(matrix = %self.name, "transpose");
        for i in 0..self.blocks_per_row {
            for j in i..self.blocks_per_row {
                if i == j {
                    let page = pool.get_page(&self.name, self.block_page(i, i))?;
                    let flipped = transpose_rows(page.rows());
                    pool.write_page(&self.name, self.block_page(i, i), &flipped)?;
                    pool.drop_page(&self.name, self.block_page(i, i));
                } else {
                    let upper = self.block_page(i, j);
                    let lower = self.block_page(j, i);
                    let held = pool.get_page(&self.name, upper)?.rows().to_vec();
                    let other = pool.get_page(&self.name, lower)?;
                    pool.write_page(&self.name, upper, &transpose_rows(other.rows()))?;
                    drop(other);
                    pool.write_page(&self.name, lower, &transpose_rows(&held))?;
                    pool.drop_page(&self.name, upper);
                    pool.drop_page(&self.name, lower);
                }
            }
        }
        Ok(())
    }

    /// Whether the matrix equals its transpose, comparing each `(i, j)`
    /// block against the transpose of `(j, i)` and short-circuiting on the
    /// first mismatch. Only two blocks reside simultaneously.
    pub fn check_symmetry(&self, pool: &mut BufferPool) -> DbResult<bool> {
        debug!(matrix = %self.name, "check_symmetry");
        for i in 0..self.blocks_per_row {
            for j in i..self.blocks_per_row {
                let a = pool.get_page(&self.name, self.block_page(i, j))?;
                let b = pool.get_page(&self.name, self.block_page(j, i))?;
                for (r, a_row) in a.rows().iter().enumerate() {
                    for (c, value) in a_row.iter().enumerate() {
                        if b.rows()[c][r] != *value {
                            return Ok(false);
                        }
                    }
                }
            }
        }
        Ok(true)
    }

    /// Rename every block file and take the new name.
    pub fn rename(&mut self, new_name: &str, pool: &mut BufferPool) -> DbResult<()> {
        debug!(matrix = %self.name, to = new_name, "rename");
        for block in 0..self.block_count() {
            pool.rename_page(&self.name, new_name, block)?;
        }
        self.name = new_name.to_string();
        Ok(())
    }

    /// Delete every block file; a temporary matrix's source CSV goes too.
    pub fn unload(&self, config: &Config, pool: &mut BufferPool) -> DbResult<()> {
        debug!(matrix = %self.name, "unload");
        for block in 0..self.block_count() {
            pool.delete_page(&self.name, block)?;
        }
        if !self.is_permanent(config) && self.source_file.exists() {
            PageStore::delete_file(&self.source_file)?;
        }
        Ok(())
    }
}

fn transpose_rows(rows: &[Row]) -> Vec<Row> {
    let cols = rows.first().map_or(0, Vec::len);
    let mut out = vec![Row::with_capacity(rows.len()); cols];
    for row in rows {
        for (c, value) in row.iter().enumerate() {
            out[c].push(*value);
        }
    }
    out
}

fn parse_matrix_row(line: &str, matrix: &str) -> DbResult<Row> {
    line.split(',')
        .map(|field| {
            field.trim().parse::<i64>().map_err(|e| {
                DbError::Storage(format!(
                    "matrix '{matrix}': bad integer '{}': {e}",
                    field.trim()
                ))
            })
        })
        .collect()
}
