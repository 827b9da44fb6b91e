//! Error types for the table store.

use thiserror::Error;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, DbError>;

/// Errors raised by the core (values, columns, tables, databases, registry).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DbError {
    /// Invalid column or range definition.
    #[error("invalid column definition: {0}")]
    Config(String),

    /// Row width or column signatures do not line up.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A value was rejected by a column's validator.
    #[error("{expected} expected but {found} found")]
    TypeMismatch {
        /// Description of what the column accepts.
        expected: String,
        /// Description of the offending value.
        found: String,
    },

    /// Unknown database, table, row or column.
    #[error("{0}")]
    NotFound(String),

    /// A database with this name already exists.
    #[error("database '{0}' already exists")]
    DuplicateName(String),
}

impl DbError {
    /// Stable identifier reported to clients next to the message.
    pub fn kind(&self) -> &'static str {
        match self {
            DbError::Config(_) => "config_error",
            DbError::SchemaMismatch(_) => "schema_mismatch",
            DbError::TypeMismatch { .. } => "type_mismatch",
            DbError::NotFound(_) => "not_found",
            DbError::DuplicateName(_) => "duplicate_name",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_mismatch_message() {
        let err = DbError::TypeMismatch {
            expected: "Char".into(),
            found: "String value 'ab'".into(),
        };
        assert_eq!(err.to_string(), "Char expected but String value 'ab' found");
        assert_eq!(err.kind(), "type_mismatch");
    }
}
