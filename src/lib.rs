//! In-memory, schema-typed table store.
//!
//! Databases hold tables with a fixed typed schema; tables hold rows checked
//! against that schema. Two tables with matching column signatures can be
//! diffed (left-anti). The store is driven through [`commands::DbCommand`]
//! requests, applied one at a time by the task started in [`service`].

pub mod commands;
pub mod config;
pub mod db;
pub mod db_types;
pub mod difference;
pub mod error;
pub mod listener;
pub mod protocol;
pub mod registry;
pub mod service;
pub mod store;
pub mod table;
pub mod web;

pub use commands::{DbCommand, DbResult};
pub use db::Database;
pub use db_types::{ColorRange, Column, ColumnDef, ColumnType, Row, Value};
pub use difference::{difference, TableDifference};
pub use error::DbError;
pub use registry::Registry;
pub use table::Table;
