//! Name-keyed registries owning the live tables and matrices of one engine.
//! Both catalogues live for the engine's lifetime; only the executor adds or
//! removes entries, and removal happens strictly after a successful unload.


use ahash::RandomState;
use common::{DbError, DbResult};
use hashbrown::HashMap;
use matrix::Matrix;
use table::Table;

type Map<K, V> = HashMap<K, V, RandomState>;

#[derive(Debug, Default)]
pub struct TableCatalogue {
    tables: Map<String, Table>,
}

impl TableCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table under its own name; the name must be free.
    pub fn insert(&mut self, table: Table) -> DbResult<()> {
        if self.tables.contains_key(&table.name) {
            return Err(DbError::Catalog(format!(
                "table '{}' already exists",
                table.name
            )));
        }
        self.tables.insert(table.name.clone(), table);
        Ok(())
    }

    pub fn get(&self, name: &str) -> DbResult<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| DbError::Catalog(format!("unknown table '{name}'")))
    }

    pub fn get_mut(&mut self, name: &str) -> DbResult<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| DbError::Catalog(format!("unknown table '{name}'")))
    }

    pub fn remove(&mut self, name: &str) -> DbResult<Table> {
        self.tables
            .remove(name)
            .ok_or_else(|| DbError::Catalog(format!("unknown table '{name}'")))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Registered table names, sorted for stable listings.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Identical in shape to [`TableCatalogue`], keyed by matrix name.
#[derive(Debug, Default)]
pub struct MatrixCatalogue {
    matrices: Map<String, Matrix>,
}

impl MatrixCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, matrix: Matrix) -> DbResult<()> {
        if self.matrices.contains_key(&matrix.name) {
            return Err(DbError::Catalog(format!(
                "matrix '{}' already exists",
                matrix.name
            )));
        }
        self.matrices.insert(matrix.name.clone(), matrix);
        Ok(())
    }

    pub fn get(&self, name: &str) -> DbResult<&Matrix> {
        self.matrices
            .get(name)
            .ok_or_else(|| DbError::Catalog(format!("unknown matrix '{name}'")))
    }

    pub fn get_mut(&mut self, name: &str) -> DbResult<&mut Matrix> {
        self.matrices
            .get_mut(name)
            .ok_or_else(|| DbError::Catalog(format!("unknown matrix '{name}'")))
    }

    pub fn remove(&mut self, name: &str) -> DbResult<Matrix> {
        self.matrices
            .remove(name)
            .ok_or_else(|| DbError::Catalog(format!("unknown matrix '{name}'")))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.matrices.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.matrices.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }
}
