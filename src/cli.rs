//! CLI argument parsing module for framesql
//!
//! This module handles parsing command-line arguments using the clap crate.
//! It defines the command-line interface of the `framesql` binary, which loads
//! delimited files into a SQLite database and runs SQL statements against it.
//!
//! Key features of the CLI:
//! - Support for multiple SQL statements in a single invocation
//! - Named statements read from a SQL file with `-- name:` headers
//! - Flexible file specification with optional table name overrides
//! - Control over what happens when a target table already exists
//! - Diagnostic output control via the --verbose flag

use anyhow::Result;
use clap::Parser;

/// Command-line arguments for framesql
///
/// This struct is populated by clap based on the provided arguments.
#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about = "Load delimited files into a SQLite database and query them with SQL"
)]
pub struct FrameSqlArgs {
    /// SQLite database file, an in-memory database by default
    #[clap(long, default_value = ":memory:", help = "SQLite database file")]
    pub db: String,

    /// Fail instead of creating the database file when it does not exist
    #[clap(long, help = "Require the database file to exist")]
    pub must_exist: bool,

    /// SQL statements to execute
    ///
    /// Multiple SQL statements can be provided and they are executed in sequence
    /// after all files have been loaded.
    /// Example: -s "SELECT * FROM data" -s "DELETE FROM data WHERE id = 1"
    #[clap(short, long, help = "SQL statement to execute")]
    pub sql: Vec<String>,

    /// File with named SQL statements
    ///
    /// Each statement starts with a `-- name: <name>` line. Statements are
    /// selected for execution with --run.
    #[clap(long, help = "File with named SQL statements")]
    pub sql_file: Option<String>,

    /// Names of statements from --sql-file to execute
    #[clap(short, long, requires = "sql_file", help = "Named statement to execute")]
    pub run: Vec<String>,

    /// Input files to load - format: [table_name=]file_path
    ///
    /// If no table name is specified, the base filename (without extension)
    /// is used as the table name.
    /// Example: users=data/people.csv or just data/products.csv
    #[clap(help = "Input files to load as [table_name=]file_path")]
    pub files: Vec<String>,

    /// Specify field separator character
    ///
    /// Sets the field separator for all input files and the output.
    /// Examples: -F ';' for semicolon-separated files, -F '\t' for tabs.
    #[clap(short = 'F', help = "Field separator character")]
    pub field_separator: Option<String>,

    /// What to do when a target table already exists
    #[clap(
        long,
        default_value = "append",
        help = "Behavior for existing tables: append, replace or fail"
    )]
    pub if_exists: String,

    /// Columns to set as the index of query results, in order
    #[clap(long, value_delimiter = ',', help = "Index columns of query results")]
    pub index_col: Vec<String>,

    /// Enable verbose diagnostic output
    #[clap(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

/// Parse command-line arguments into the FrameSqlArgs structure
///
/// # Returns
/// * `Ok(FrameSqlArgs)` - Command-line arguments successfully parsed
/// * `Err` - Error during argument parsing (handled by clap, usually results in help text display)
pub fn parse_args() -> Result<FrameSqlArgs> {
    Ok(FrameSqlArgs::parse())
}
