use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db::Database;
use crate::db_types::{Column, ColumnDef, Row, Value};
use crate::difference::TableDifference;
use crate::error::Result;
use crate::registry::Registry;
use crate::table::Table;

/// A client request. Tagged by `"type"` on the wire.
#[derive(Debug, Clone, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "camelCase",
    rename_all_fields = "camelCase",
    deny_unknown_fields
)]
pub enum DbCommand {
    ListDatabases,
    GetDatabase {
        database_name: String,
    },
    GetTable {
        database_name: String,
        table_id: u64,
    },
    GetRow {
        database_name: String,
        table_id: u64,
        row_id: u64,
    },
    CreateDatabase {
        database_name: String,
    },
    DeleteDatabase {
        database_name: String,
    },
    CreateTable {
        database_name: String,
        table_name: String,
        columns: Vec<ColumnDef>,
    },
    DeleteTable {
        database_name: String,
        table_id: u64,
    },
    CreateRow {
        database_name: String,
        table_id: u64,
        cells: Vec<Value>,
    },
    DeleteRow {
        database_name: String,
        table_id: u64,
        row_id: u64,
    },
    UpdateCell {
        database_name: String,
        table_id: u64,
        row_id: u64,
        column_id: usize,
        value: Value,
    },
    TableDifference {
        database_name: String,
        left_table_id: u64,
        right_table_id: u64,
    },
}

impl DbCommand {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            DbCommand::ListDatabases => "listDatabases",
            DbCommand::GetDatabase { .. } => "getDatabase",
            DbCommand::GetTable { .. } => "getTable",
            DbCommand::GetRow { .. } => "getRow",
            DbCommand::CreateDatabase { .. } => "createDatabase",
            DbCommand::DeleteDatabase { .. } => "deleteDatabase",
            DbCommand::CreateTable { .. } => "createTable",
            DbCommand::DeleteTable { .. } => "deleteTable",
            DbCommand::CreateRow { .. } => "createRow",
            DbCommand::DeleteRow { .. } => "deleteRow",
            DbCommand::UpdateCell { .. } => "updateCell",
            DbCommand::TableDifference { .. } => "tableDifference",
        }
    }
}

/// Successful outcome of a command. Snapshots are owned so they can leave the
/// task that owns the registry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DbResult {
    Databases(Vec<Database>),
    Database(Option<Database>),
    Table(Table),
    Row(Row),
    Deleted(bool),
    Difference(TableDifference),
}

impl Registry {
    pub fn execute(&mut self, cmd: DbCommand) -> Result<DbResult> {
        debug!(command = cmd.name(), "executing");
        match cmd {
            DbCommand::ListDatabases => Ok(DbResult::Databases(self.databases().to_vec())),

            DbCommand::GetDatabase { database_name } => {
                Ok(DbResult::Database(self.get(&database_name).cloned()))
            }

            DbCommand::GetTable { database_name, table_id } => {
                let table = self.database(&database_name)?.get_table(table_id)?;
                Ok(DbResult::Table(table.clone()))
            }

            DbCommand::GetRow { database_name, table_id, row_id } => {
                let row = self
                    .database(&database_name)?
                    .get_table(table_id)?
                    .get_row(row_id)?;
                Ok(DbResult::Row(row.clone()))
            }

            DbCommand::CreateDatabase { database_name } => {
                let db = self.create(&database_name)?;
                Ok(DbResult::Database(Some(db.clone())))
            }

            DbCommand::DeleteDatabase { database_name } => {
                self.delete(&database_name)?;
                Ok(DbResult::Deleted(true))
            }

            DbCommand::CreateTable { database_name, table_name, columns } => {
                let db = self.database_mut(&database_name)?;
                let columns = columns
                    .into_iter()
                    .map(ColumnDef::build)
                    .collect::<Result<Vec<Column>>>()?;
                Ok(DbResult::Table(db.add_table(table_name, columns).clone()))
            }

            DbCommand::DeleteTable { database_name, table_id } => {
                let db = self.database_mut(&database_name)?;
                db.get_table(table_id)?;
                db.remove_table(table_id);
                Ok(DbResult::Deleted(true))
            }

            DbCommand::CreateRow { database_name, table_id, cells } => {
                let table = self.database_mut(&database_name)?.get_table_mut(table_id)?;
                Ok(DbResult::Row(table.add_row(cells)?.clone()))
            }

            DbCommand::DeleteRow { database_name, table_id, row_id } => {
                let table = self.database_mut(&database_name)?.get_table_mut(table_id)?;
                table.get_row(row_id)?;
                table.remove_row(row_id);
                Ok(DbResult::Deleted(true))
            }

            DbCommand::UpdateCell { database_name, table_id, row_id, column_id, value } => {
                let table = self.database_mut(&database_name)?.get_table_mut(table_id)?;
                table.get_row(row_id)?;
                Ok(DbResult::Row(table.update_cell(row_id, column_id, value)?.clone()))
            }

            DbCommand::TableDifference { database_name, left_table_id, right_table_id } => {
                let diff = self
                    .database(&database_name)?
                    .table_difference(left_table_id, right_table_id)?;
                Ok(DbResult::Difference(diff))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(registry: &mut Registry, request: serde_json::Value) -> Result<DbResult> {
        let cmd: DbCommand = serde_json::from_value(request).unwrap();
        registry.execute(cmd)
    }

    fn seeded() -> Registry {
        let mut registry = Registry::new();
        run(&mut registry, json!({"type": "createDatabase", "databaseName": "shop"})).unwrap();
        run(
            &mut registry,
            json!({
                "type": "createTable",
                "databaseName": "shop",
                "tableName": "items",
                "columns": [
                    {"name": "qty", "type": "Integer"},
                    {"name": "label", "type": "String"}
                ]
            }),
        )
        .unwrap();
        registry
    }

    #[test]
    fn create_database_twice_fails() {
        let mut registry = seeded();
        let err = run(&mut registry, json!({"type": "createDatabase", "databaseName": "shop"}))
            .unwrap_err();
        assert_eq!(err.kind(), "duplicate_name");
    }

    #[test]
    fn get_database_absent_is_none() {
        let mut registry = seeded();
        let result = run(&mut registry, json!({"type": "getDatabase", "databaseName": "nope"}));
        assert!(matches!(result, Ok(DbResult::Database(None))));
    }

    #[test]
    fn create_table_with_bad_range_is_config_error() {
        let mut registry = seeded();
        let err = run(
            &mut registry,
            json!({
                "type": "createTable",
                "databaseName": "shop",
                "tableName": "paint",
                "columns": [{"name": "c", "type": "ColorInvl", "r_min": 0, "r_max": 10}]
            }),
        )
        .unwrap_err();
        assert_eq!(err.kind(), "config_error");
        assert_eq!(registry.database("shop").unwrap().table_count(), 1);
    }

    #[test]
    fn create_and_update_rows() {
        let mut registry = seeded();
        let created = run(
            &mut registry,
            json!({
                "type": "createRow", "databaseName": "shop", "tableId": 0,
                "cells": [{"integer": 3}, {"string": "bolt"}]
            }),
        )
        .unwrap();
        let DbResult::Row(row) = created else { panic!("expected a row") };
        assert_eq!(row.id, 0);

        let updated = run(
            &mut registry,
            json!({
                "type": "updateCell", "databaseName": "shop", "tableId": 0,
                "rowId": 0, "columnId": 0, "value": {"integer": 4}
            }),
        )
        .unwrap();
        let DbResult::Row(row) = updated else { panic!("expected a row") };
        assert_eq!(row.cells[0], Value::Integer(4));

        let err = run(
            &mut registry,
            json!({
                "type": "updateCell", "databaseName": "shop", "tableId": 0,
                "rowId": 0, "columnId": 5, "value": {"integer": 4}
            }),
        )
        .unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn delete_missing_entities_reports_not_found() {
        let mut registry = seeded();
        let err = run(
            &mut registry,
            json!({"type": "deleteRow", "databaseName": "shop", "tableId": 0, "rowId": 9}),
        )
        .unwrap_err();
        assert_eq!(err.kind(), "not_found");

        run(&mut registry, json!({"type": "deleteTable", "databaseName": "shop", "tableId": 0}))
            .unwrap();
        let err = run(
            &mut registry,
            json!({"type": "deleteTable", "databaseName": "shop", "tableId": 0}),
        )
        .unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn result_serializes_with_variant_key() {
        let mut registry = seeded();
        let result = run(&mut registry, json!({"type": "getTable", "databaseName": "shop", "tableId": 0}))
            .unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["table"]["id"], 0);
        assert_eq!(json["table"]["name"], "items");
        assert_eq!(json["table"]["columns"][1]["type"], "String");
        assert_eq!(json["table"]["rows"], json!([]));
    }

    #[test]
    fn unknown_request_fields_fail_to_parse() {
        let request = json!({"type": "getTable", "databaseName": "shop", "tableId": 0, "tabelId": 1});
        assert!(serde_json::from_value::<DbCommand>(request).is_err());

        let request = json!({
            "type": "createTable", "databaseName": "shop", "tableName": "t",
            "columns": [{"name": "c", "type": "Integer", "rmin": 5}]
        });
        assert!(serde_json::from_value::<DbCommand>(request).is_err());
    }

    #[test]
    fn malformed_value_fails_to_parse() {
        let request = json!({
            "type": "createRow", "databaseName": "shop", "tableId": 0,
            "cells": [{"integer": 3, "real": 1.0}, {"string": "bolt"}]
        });
        assert!(serde_json::from_value::<DbCommand>(request).is_err());
    }
}
