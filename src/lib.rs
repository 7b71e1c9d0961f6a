//! framesql library crate
//!
//! This is the library component of framesql. It moves dataframes between memory
//! and relational databases using plain SQL text. The library provides:
//!
//! - A container of named SQL statements, loadable from SQL files
//! - Replacement of `:name` placeholders with bind parameters, including
//!   expansion of sequences for `IN` clauses
//! - Database managers for SQLite and Oracle behind one [`DatabaseManager`] trait
//! - Saving dataframes to tables and loading tables or queries into dataframes,
//!   with date parsing, type conversion and time zone localization
//! - UPDATE-then-INSERT upserts and MERGE statements generated from a dataframe
//! - Loading and writing delimited files for the `framesql` command-line tool
//!
//! ```
//! use framesql::{DataFrame, DatabaseManager, LoadOptions, SaveOptions, SqliteDb};
//!
//! let db = SqliteDb::memory().unwrap();
//! let mut conn = db.connect().unwrap();
//!
//! let df = DataFrame::from_rows(
//!     vec!["ItemId", "ItemName"],
//!     vec![vec![1.into(), "Pot".into()], vec![2.into(), "Rake".into()]],
//! )
//! .unwrap();
//! db.save_df(&df, "Item", conn.as_mut(), &SaveOptions::default()).unwrap();
//!
//! let loaded = db
//!     .load_table("SELECT * FROM Item", conn.as_mut(), None, &LoadOptions::default())
//!     .unwrap();
//! assert_eq!(loaded.row_count(), 2);
//! ```

pub mod cli;
pub mod config;
pub mod connection;
pub mod csv_handler;
pub mod dataframe;
pub mod datetime;
pub mod dialect;
pub mod dtype;
pub mod error;
pub mod manager;
pub mod oracle;
pub mod sql_container;
pub mod sql_kind;
pub mod sqlite;
pub mod url;
pub mod value;

pub use connection::{Connection, Engine, EngineConfig, Params, Transaction};
pub use dataframe::DataFrame;
pub use dtype::DataType;
pub use error::{FrameSqlError, FrameSqlResult};
pub use manager::{
    ColumnSelection, DatabaseManager, IfExists, InsertMethod, LoadOptions, MergeOptions,
    MergeResult, SaveOptions, StatementResult, UpsertOptions, UpsertResult,
};
pub use oracle::{OracleDb, OracleParams};
pub use sql_container::{replace_placeholders, Placeholder, Replacement, SqlContainer};
pub use sqlite::SqliteDb;
pub use url::DbUrl;
pub use value::Value;
