use serde::Serialize;
use tracing::info;

use crate::db_types::Column;
use crate::difference::{difference, TableDifference};
use crate::error::{DbError, Result};
use crate::store::IdStore;
use crate::table::Table;

/// A named collection of tables. Table names need not be unique; tables are
/// addressed by id.
#[derive(Debug, Clone, Serialize)]
pub struct Database {
    name: String,
    tables: IdStore<Table>,
}

impl Database {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: IdStore::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn add_table(&mut self, name: impl Into<String>, columns: Vec<Column>) -> &mut Table {
        let name = name.into();
        let table = self.tables.insert_with(|id| Table::new(id, name, columns));
        info!(database = %self.name, table = table.id(), name = table.name(), "table created");
        table
    }

    pub fn remove_table(&mut self, id: u64) {
        if self.tables.remove(id).is_some() {
            info!(database = %self.name, table = id, "table removed");
        }
    }

    pub fn get_table(&self, id: u64) -> Result<&Table> {
        self.tables.get(id).ok_or_else(|| self.missing_table(id))
    }

    pub fn get_table_mut(&mut self, id: u64) -> Result<&mut Table> {
        match self.tables.get_mut(id) {
            Some(table) => Ok(table),
            None => Err(DbError::NotFound(format!(
                "database '{}' doesn't contain table #{}",
                self.name, id
            ))),
        }
    }

    pub fn table_difference(&self, left: u64, right: u64) -> Result<TableDifference> {
        difference(self.get_table(left)?, self.get_table(right)?)
    }

    fn missing_table(&self, id: u64) -> DbError {
        DbError::NotFound(format!("database '{}' doesn't contain table #{}", self.name, id))
    }
}
