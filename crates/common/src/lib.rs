#[cfg(test)]
mod tests;

pub mod pretty;

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::mem::size_of;
use std::{io, path::PathBuf};
use thiserror::Error;

/// Positional row of an integer table. Every stored value is an `i64`.
/// Examples:
/// - `let row: Row = vec![1, 10];`
/// - `let wide: Row = vec![3, -7, 42, 0];`
pub type Row = Vec<i64>;

/// Canonical error type shared across engine subsystems.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("parse: {0}")]
    Parser(String),
    #[error("catalog: {0}")]
    Catalog(String),
    #[error("storage: {0}")]
    Storage(String),
    #[error("exec: {0}")]
    Executor(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result alias that carries a `DbError`.
pub type DbResult<T> = Result<T, DbError>;

/// Runtime configuration for the engine.
///
/// # Example
/// ```
/// use common::Config;
/// use std::path::PathBuf;
///
/// let config = Config::builder()
///     .data_dir(PathBuf::from("./my_data"))
///     .block_size(1000)
///     .pool_capacity(4)
///     .build();
/// ```
#[derive(Clone, Debug, Serialize, Deserialize, bon::Builder)]
pub struct Config {
    /// Directory holding permanent CSV files; pages and temporary CSVs live
    /// under its `temp/` subdirectory.
    #[builder(default = PathBuf::from("./data"))]
    pub data_dir: PathBuf,
    /// Capacity of one page in bytes.
    #[builder(default = 1000)]
    pub block_size: usize,
    /// Number of pages the buffer pool keeps resident.
    #[builder(default = 10)]
    pub pool_capacity: usize,
    /// Rows shown by PRINT.
    #[builder(default = 20)]
    pub print_count: usize,
}

impl Config {
    /// Directory for page files and temporary-table CSVs.
    pub fn temp_dir(&self) -> PathBuf {
        self.data_dir.join("temp")
    }

    /// Path of the permanent CSV for a relation name.
    pub fn csv_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{name}.csv"))
    }

    /// Path of the temporary CSV for a materialized result.
    pub fn temp_csv_path(&self, name: &str) -> PathBuf {
        self.temp_dir().join(format!("{name}.csv"))
    }

    /// Path of a query script replayed by SOURCE.
    pub fn script_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{name}.ra"))
    }

    /// Rows that fit in one page of a table with the given column count.
    pub fn max_rows_per_block(&self, column_count: usize) -> usize {
        self.block_size / (size_of::<i64>() * column_count)
    }

    /// Side length of a square matrix sub-block.
    pub fn matrix_block_side(&self) -> usize {
        let per_block = self.block_size / size_of::<i64>();
        ((per_block as f64).sqrt() as usize).max(1)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            block_size: 1000,
            pool_capacity: 10,
            print_count: 20,
        }
    }
}

/// Comparison operator used by SELECT, JOIN and HAVING clauses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOperator {
    Equal,
    NotEqual,
    Less,
    Leq,
    Greater,
    Geq,
}

impl BinaryOperator {
    pub fn eval(self, lhs: i64, rhs: i64) -> bool {
        match self {
            Self::Equal => lhs == rhs,
            Self::NotEqual => lhs != rhs,
            Self::Less => lhs < rhs,
            Self::Leq => lhs <= rhs,
            Self::Greater => lhs > rhs,
            Self::Geq => lhs >= rhs,
        }
    }
}

impl std::fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let token = match self {
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Less => "<",
            Self::Leq => "<=",
            Self::Greater => ">",
            Self::Geq => ">=",
        };
        f.write_str(token)
    }
}

/// Sort direction of a single sort key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// One column of a composite sort specification.
#[derive(Clone, Copy, Debug)]
pub struct SortKey {
    pub column: usize,
    pub direction: SortDirection,
}

/// Compare two rows by a composite key, lexicographically over the keys.
pub fn compare_rows(a: &[i64], b: &[i64], keys: &[SortKey]) -> Ordering {
    for key in keys {
        let ordering = a[key.column].cmp(&b[key.column]);
        let directed = match key.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        };
        if directed != Ordering::Equal {
            return directed;
        }
    }
    Ordering::Equal
}

/// Aggregate functions available to GROUP queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggregateFn {
    Min,
    Max,
    Sum,
    Avg,
    Count,
}

impl std::fmt::Display for AggregateFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Count => "COUNT",
        };
        f.write_str(name)
    }
}

/// Running state of one aggregate over one group.
///
/// MIN and MAX keep an explicit unset extreme so no finite sentinel can
/// collide with stored values. SUM wraps on overflow; AVG divides the
/// wrapped sum with integer division at finalization.
#[derive(Clone, Debug)]
pub struct Accumulator {
    func: AggregateFn,
    sum: i64,
    count: i64,
    extreme: Option<i64>,
}

impl Accumulator {
    pub fn new(func: AggregateFn) -> Self {
        Self {
            func,
            sum: 0,
            count: 0,
            extreme: None,
        }
    }

    pub fn push(&mut self, value: i64) {
        self.count += 1;
        match self.func {
            AggregateFn::Min => {
                self.extreme = Some(self.extreme.map_or(value, |e| e.min(value)));
            }
            AggregateFn::Max => {
                self.extreme = Some(self.extreme.map_or(value, |e| e.max(value)));
            }
            AggregateFn::Sum | AggregateFn::Avg => {
                self.sum = self.sum.wrapping_add(value);
            }
            AggregateFn::Count => {}
        }
    }

    /// Final value of the aggregate. An empty group finalizes to 0.
    pub fn finish(&self) -> i64 {
        match self.func {
            AggregateFn::Sum => self.sum,
            AggregateFn::Count => self.count,
            AggregateFn::Avg => {
                if self.count == 0 {
                    0
                } else {
                    self.sum / self.count
                }
            }
            AggregateFn::Min | AggregateFn::Max => self.extreme.unwrap_or(0),
        }
    }

    /// Clear the state for the next group.
    pub fn reset(&mut self) {
        self.sum = 0;
        self.count = 0;
        self.extreme = None;
    }
}

/// Convenient re-exports for downstream crates.
pub mod prelude {
    pub use crate::{
        compare_rows, Accumulator, AggregateFn, BinaryOperator, Config, DbError, DbResult, Row,
        SortDirection, SortKey,
    };
}
