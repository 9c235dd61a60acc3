//! Test support for the engine workspace: an isolated engine fixture with
//! temporary storage plus CSV fixture helpers.
//!
//! # Example
//!
//! ```no_run
//! use testsupport::TestDb;
//!
//! let mut db = TestDb::new();
//! db.write_csv("t", "id,val", &["1,10", "2,20"]);
//! db.run("LOAD t").unwrap();
//! assert_eq!(db.table_rows("t").len(), 2);
//! ```

use std::fs;

use common::{Config, DbResult, Row};
use executor::{execute, ExecutionContext};
use tempfile::TempDir;

/// An engine over a temporary data directory, cleaned up on drop.
pub struct TestDb {
    pub ctx: ExecutionContext,
    _dir: TempDir,
}

impl TestDb {
    /// Default layout: 1000-byte pages, pool of 10.
    pub fn new() -> Self {
        Self::with_layout(1000, 10)
    }

    /// Shrink the page size or pool to force multi-page tables and evictions.
    pub fn with_layout(block_size: usize, pool_capacity: usize) -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let config = Config::builder()
            .data_dir(dir.path().join("data"))
            .block_size(block_size)
            .pool_capacity(pool_capacity)
            .build();
        let ctx = ExecutionContext::new(config).expect("create engine context");
        Self { ctx, _dir: dir }
    }

    /// Write a CSV fixture into the data directory.
    pub fn write_csv(&self, name: &str, header: &str, rows: &[&str]) {
        let mut content = String::from(header);
        content.push('\n');
        for row in rows {
            content.push_str(row);
            content.push('\n');
        }
        fs::write(self.ctx.config.csv_path(name), content).expect("write csv fixture");
    }

    /// Write a `.ra` script replayable through SOURCE.
    pub fn write_script(&self, name: &str, lines: &[&str]) {
        let content = lines.join("\n");
        fs::write(self.ctx.config.script_path(name), content).expect("write script fixture");
    }

    /// Parse and execute one command line.
    pub fn run(&mut self, line: &str) -> DbResult<Option<String>> {
        execute(&mut self.ctx, parser::parse(line)?)
    }

    /// All rows of a registered table, in stored page order.
    pub fn table_rows(&mut self, name: &str) -> Vec<Row> {
        let table = self.ctx.tables.get(name).expect("table registered");
        let mut cursor = table.cursor(&mut self.ctx.pool).expect("open cursor");
        let mut rows = Vec::new();
        while let Some(row) = cursor.next_row(&mut self.ctx.pool).expect("read row") {
            rows.push(row);
        }
        rows
    }
}

impl Default for TestDb {
    fn default() -> Self {
        Self::new()
    }
}
