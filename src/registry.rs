//! The root store: every database known to the process, keyed by name.
//!
//! A `Registry` is constructed once at startup and handed to the service task
//! that owns it. Nothing else holds a reference to it.

use std::collections::HashMap;

use tracing::info;

use crate::db::Database;
use crate::error::{DbError, Result};

#[derive(Debug, Default)]
pub struct Registry {
    databases: Vec<Database>,
    by_name: HashMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Databases in creation order.
    pub fn databases(&self) -> &[Database] {
        &self.databases
    }

    pub fn get(&self, name: &str) -> Option<&Database> {
        self.by_name.get(name).map(|&index| &self.databases[index])
    }

    pub fn database(&self, name: &str) -> Result<&Database> {
        self.get(name).ok_or_else(|| missing(name))
    }

    pub fn database_mut(&mut self, name: &str) -> Result<&mut Database> {
        match self.by_name.get(name) {
            Some(&index) => Ok(&mut self.databases[index]),
            None => Err(missing(name)),
        }
    }

    pub fn create(&mut self, name: &str) -> Result<&Database> {
        if self.by_name.contains_key(name) {
            return Err(DbError::DuplicateName(name.to_string()));
        }

        let index = self.databases.len();
        self.databases.push(Database::new(name));
        self.by_name.insert(name.to_string(), index);
        info!(database = name, "database created");
        Ok(&self.databases[index])
    }

    pub fn delete(&mut self, name: &str) -> Result<()> {
        let index = self.by_name.remove(name).ok_or_else(|| missing(name))?;
        self.databases.remove(index);
        for slot in self.by_name.values_mut() {
            if *slot > index {
                *slot -= 1;
            }
        }
        info!(database = name, "database deleted");
        Ok(())
    }
}

fn missing(name: &str) -> DbError {
    DbError::NotFound(format!("cannot find database '{}'", name))
}
