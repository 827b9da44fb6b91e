use serde::Serialize;
use tracing::debug;

use crate::db_types::{Column, Row, Value};
use crate::error::{DbError, Result};
use crate::store::IdStore;

/// A named collection of rows under a fixed column schema.
#[derive(Debug, Clone, Serialize)]
pub struct Table {
    id: u64,
    name: String,
    columns: Vec<Column>,
    rows: IdStore<Row>,
}

impl Table {
    pub fn new(id: u64, name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            id,
            name: name.into(),
            columns,
            rows: IdStore::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Rows in insertion order.
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Validates every cell before anything is stored, so a rejected row
    /// leaves the table untouched.
    pub fn add_row(&mut self, cells: Vec<Value>) -> Result<&Row> {
        if cells.len() != self.columns.len() {
            return Err(DbError::SchemaMismatch(format!(
                "row has {} cells but table '{}' has {} columns",
                cells.len(),
                self.name,
                self.columns.len()
            )));
        }

        for (column, value) in self.columns.iter().zip(&cells) {
            column.validate(value)?;
        }

        let row = self.rows.insert_with(|id| Row { id, cells });
        debug!(table = self.id, row = row.id, "row added");
        Ok(row)
    }

    pub fn remove_row(&mut self, id: u64) {
        if self.rows.remove(id).is_some() {
            debug!(table = self.id, row = id, "row removed");
        }
    }

    pub fn get_row(&self, id: u64) -> Result<&Row> {
        self.rows.get(id).ok_or_else(|| {
            DbError::NotFound(format!("table #{} doesn't contain row #{}", self.id, id))
        })
    }

    /// Replaces one cell after checking it against that cell's column.
    /// Checks run row, then column, then value.
    pub fn update_cell(&mut self, row_id: u64, column: usize, value: Value) -> Result<&Row> {
        let table_id = self.id;
        let row = self.rows.get_mut(row_id).ok_or_else(|| {
            DbError::NotFound(format!("table #{} doesn't contain row #{}", table_id, row_id))
        })?;
        let Some(col) = self.columns.get(column) else {
            return Err(DbError::NotFound(format!(
                "table #{} doesn't contain column #{}",
                table_id, column
            )));
        };
        col.validate(&value)?;

        row.cells[column] = value;
        Ok(row)
    }

    /// True if some stored row has the same cells, ids ignored.
    pub fn contains_row_by_value(&self, row: &Row) -> bool {
        self.rows.iter().any(|stored| stored.cells == row.cells)
    }
}
