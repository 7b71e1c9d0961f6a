//! Error handling for framesql
//!
//! This module defines the error type shared by the whole library. Each variant
//! corresponds to one failure mode of the statement container, the dataframe
//! helpers or a database manager, so callers can match on what went wrong
//! without parsing messages.
//!
//! The module uses thiserror to keep the boilerplate down.

use thiserror::Error;

/// FrameSqlError represents all errors raised by framesql
///
/// The variants fall into two families:
/// - input and dataframe errors (invalid arguments, missing statements, bad dtypes)
/// - database manager errors (engine creation, statement execution, load and save)
///
/// [`FrameSqlError::is_database_manager_error`] tells the two apart.
#[derive(Error, Debug)]
pub enum FrameSqlError {
    /// Invalid input to a function or method
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A statement name that is not stored in a container
    #[error("Statement '{0}' not found in container")]
    StatementNotFound(String),

    /// A table name that is not a single word
    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    /// Column names that are not part of a dataframe
    #[error("Invalid column names: {0}")]
    InvalidColumnName(String),

    /// Error while executing a SQL statement
    #[error("Error executing statement: {0}")]
    ExecuteStatement(String),

    /// Error when creating the database engine
    #[error("Could not create engine: {0}")]
    CreateEngine(String),

    /// Error when building or parsing a connection URL
    #[error("Could not create connection URL: {0}")]
    CreateConnectionUrl(String),

    /// A database file that must exist but does not
    #[error("Database file not found: {0}")]
    DatabaseFileNotFound(String),

    /// Error when deleting records from a table
    #[error("Could not delete records from table: {0}")]
    DeleteFromTable(String),

    /// Error when writing a dataframe to a table
    #[error("Could not save dataframe: {0}")]
    SaveDataFrame(String),

    /// The target table exists and the caller asked to fail in that case
    #[error("Table '{0}' already exists")]
    TableExists(String),

    /// Error when loading a table or query result into a dataframe
    #[error("Could not load table: {0}")]
    LoadTable(String),

    /// Error when setting the index of a dataframe
    #[error("Cannot set index: {0}")]
    SetIndex(String),

    /// Error when converting the data type of dataframe columns
    #[error("Data type conversion error: {0}")]
    DataTypeConversion(String),

    /// A statement kind the SQL dialect does not support
    #[error("SQL statement not supported: {0}")]
    SqlStatementNotSupported(String),

    /// Error during file system operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error while reading or writing delimited files
    #[error("File parsing error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error reported by SQLite outside statement execution
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
}

impl FrameSqlError {
    /// Whether the error originates from a database manager
    ///
    /// Mirrors the manager-error family: everything that happens while creating
    /// engines or talking to the database, as opposed to invalid input.
    pub fn is_database_manager_error(&self) -> bool {
        matches!(
            self,
            FrameSqlError::InvalidTableName(_)
                | FrameSqlError::InvalidColumnName(_)
                | FrameSqlError::ExecuteStatement(_)
                | FrameSqlError::CreateEngine(_)
                | FrameSqlError::CreateConnectionUrl(_)
                | FrameSqlError::DatabaseFileNotFound(_)
                | FrameSqlError::DeleteFromTable(_)
                | FrameSqlError::SaveDataFrame(_)
                | FrameSqlError::TableExists(_)
                | FrameSqlError::LoadTable(_)
                | FrameSqlError::SetIndex(_)
                | FrameSqlError::DataTypeConversion(_)
                | FrameSqlError::SqlStatementNotSupported(_)
                | FrameSqlError::SqliteError(_)
        )
    }
}

/// Result type alias for operations that can produce a FrameSqlError
pub type FrameSqlResult<T> = std::result::Result<T, FrameSqlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_families() {
        assert!(!FrameSqlError::InvalidInput("x".into()).is_database_manager_error());
        assert!(!FrameSqlError::StatementNotFound("x".into()).is_database_manager_error());
        assert!(FrameSqlError::TableExists("Item".into()).is_database_manager_error());
        assert!(FrameSqlError::ExecuteStatement("x".into()).is_database_manager_error());
    }

    #[test]
    fn test_error_messages() {
        let err = FrameSqlError::TableExists("Item".to_string());
        assert_eq!(err.to_string(), "Table 'Item' already exists");
    }
}
