//! framesql - load delimited files into SQLite and query them with SQL
//!
//! This tool reads CSV and other delimiter-separated files into dataframes,
//! saves them as tables of a SQLite database and runs SQL statements against
//! that database, printing query results as delimited text.
//!
//! # Program Flow
//!
//! 1. Parse command-line arguments
//! 2. Open the database
//! 3. Save every input file to its table within one transaction
//! 4. Execute SQL statements in sequence
//! 5. Print query results to stdout

use std::io;

use anyhow::{Context, Result};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use framesql::cli;
use framesql::config::AppConfig;
use framesql::connection::Transaction;
use framesql::csv_handler;
use framesql::manager::{DatabaseManager, SaveOptions, StatementResult};
use framesql::sql_container::SqlContainer;
use framesql::sqlite::SqliteDb;

/// Main entry point for the framesql utility
///
/// # Returns
/// * `Ok(())` if all operations completed successfully
/// * `Err` with context if any step fails
fn main() -> Result<()> {
    // Step 1: Parse command-line arguments and validate them into a configuration
    let args = cli::parse_args()?;
    let config = AppConfig::from_args(&args).context("Invalid arguments")?;

    // Logs go to stderr so query output on stdout stays clean.
    // RUST_LOG takes precedence over -v.
    let default_level = if config.verbose() { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
    debug!("Arguments: {:?}", args);

    // Step 2: Open the database, with named statements when a SQL file is given
    let mut builder = SqliteDb::builder(config.db()).must_exist(config.must_exist());
    if let Some(sql_file) = &args.sql_file {
        let container = SqlContainer::from_sql_file(sql_file)
            .with_context(|| format!("Failed to read SQL file: {sql_file}"))?;
        container
            .require(&args.run)
            .with_context(|| format!("Missing statements in SQL file: {sql_file}"))?;
        builder = builder.container(container);
    }
    let db = builder.build().context("Failed to open database")?;
    info!("Using database {}", db);

    let mut conn = db.connect().context("Failed to connect to database")?;

    // Step 3: Save all files, so a failing file leaves the database untouched
    let save_options = SaveOptions {
        if_exists: config.if_exists(),
        index: false,
        ..SaveOptions::default()
    };
    {
        let mut tx = Transaction::begin(conn.as_mut()).context("Failed to begin transaction")?;
        for spec in config.files() {
            let df = csv_handler::read_csv(&spec.path, config.delimiter())
                .with_context(|| format!("Failed to load file: {}", spec.path.display()))?;
            db.save_df(&df, &spec.table, &mut *tx, &save_options)
                .with_context(|| format!("Failed to save table: {}", spec.table))?;
        }
        tx.commit().context("Failed to commit loaded files")?;
    }

    // Step 4: Execute the statements given with -s, then the named ones
    let mut statements: Vec<&str> = args.sql.iter().map(String::as_str).collect();
    for name in &args.run {
        statements.push(db.statement(name)?);
    }

    for sql in statements {
        let result = db
            .execute(sql, conn.as_mut(), None)
            .with_context(|| format!("Failed to execute SQL: {sql}"))?;

        // Step 5: Print row results as delimited text
        match result {
            StatementResult::Rows(mut df) => {
                if !config.index_col().is_empty() {
                    df.set_index(config.index_col())
                        .with_context(|| format!("Failed to set index of result: {sql}"))?;
                }
                csv_handler::write_csv(&df, io::stdout().lock(), config.delimiter())
                    .context("Failed to write query result")?;
            }
            StatementResult::Affected(count) => {
                debug!("{} rows affected", count);
            }
        }
    }

    Ok(())
}
