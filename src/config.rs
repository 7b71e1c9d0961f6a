//! Configuration module for framesql
//!
//! This module provides the configuration of the `framesql` binary. It is built
//! once from the command-line arguments and validated, so the rest of the
//! program works with typed settings instead of raw strings.

use crate::cli::FrameSqlArgs;
use crate::csv_handler::{self, FileSpec};
use crate::error::FrameSqlResult;
use crate::manager::IfExists;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Whether to show verbose output
    verbose: bool,

    /// SQLite database file
    db: String,

    /// Whether the database file must already exist
    must_exist: bool,

    /// Field separator of input and output
    delimiter: u8,

    /// Files to load and their target tables
    files: Vec<FileSpec>,

    /// What to do with tables that already exist
    if_exists: IfExists,

    /// Index columns of query results
    index_col: Vec<String>,
}

impl AppConfig {
    /// Create a configuration from parsed command-line arguments
    ///
    /// # Returns
    /// * `Err(InvalidInput)` if the field separator, a file specification or
    ///   the `--if-exists` value is invalid
    pub fn from_args(args: &FrameSqlArgs) -> FrameSqlResult<Self> {
        let files = args
            .files
            .iter()
            .map(|spec| csv_handler::parse_file_spec(spec))
            .collect::<FrameSqlResult<Vec<_>>>()?;

        Ok(Self {
            verbose: args.verbose,
            db: args.db.clone(),
            must_exist: args.must_exist,
            delimiter: csv_handler::parse_delimiter(args.field_separator.as_deref())?,
            files,
            if_exists: args.if_exists.parse()?,
            index_col: args.index_col.clone(),
        })
    }

    /// Get the verbose flag
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Get the database file
    pub fn db(&self) -> &str {
        &self.db
    }

    /// Get whether the database file must exist
    pub fn must_exist(&self) -> bool {
        self.must_exist
    }

    /// Get the field separator
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Get the files to load
    pub fn files(&self) -> &[FileSpec] {
        &self.files
    }

    /// Get the behavior for existing tables
    pub fn if_exists(&self) -> IfExists {
        self.if_exists
    }

    /// Get the index columns of query results
    pub fn index_col(&self) -> &[String] {
        &self.index_col
    }
}
