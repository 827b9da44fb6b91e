//! Left-anti difference between two tables with matching column signatures.

use serde::Serialize;

use crate::db_types::{Column, Row};
use crate::error::{DbError, Result};
use crate::table::Table;

/// Rows of `left` without a value-equal counterpart in `right`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDifference {
    pub left_table: Table,
    pub right_table: Table,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

/// Computes `left - right`. Rows unique to `right` never show up in the
/// result. Fails before looking at any row if the schemas are incompatible.
pub fn difference(left: &Table, right: &Table) -> Result<TableDifference> {
    if left.columns().len() != right.columns().len() {
        return Err(DbError::SchemaMismatch(format!(
            "tables have different column counts ({} vs {})",
            left.columns().len(),
            right.columns().len()
        )));
    }

    let pairs = left.columns().iter().zip(right.columns());
    if let Some(index) = pairs.clone().position(|(l, r)| !l.same_signature(r)) {
        let (l, r) = (&left.columns()[index], &right.columns()[index]);
        return Err(DbError::SchemaMismatch(format!(
            "tables have different column types at #{}: {} vs {}",
            index,
            l.describe_schema(),
            r.describe_schema()
        )));
    }

    let columns = pairs
        .map(|(l, r)| {
            if l.name() == r.name() {
                l.project(l.name())
            } else {
                l.project(format!("{} / {}", l.name(), r.name()))
            }
        })
        .collect();

    let rows = left
        .rows()
        .filter(|row| !right.contains_row_by_value(row))
        .cloned()
        .collect();

    Ok(TableDifference {
        left_table: left.clone(),
        right_table: right.clone(),
        columns,
        rows,
    })
}
