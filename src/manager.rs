//! Database manager interface
//!
//! [`DatabaseManager`] is implemented once per SQL dialect. An implementation
//! only supplies its [`Dialect`], its [`Engine`] and an optional
//! [`SqlContainer`]; the dataframe operations are provided by the trait:
//!
//! - [`DatabaseManager::execute`] runs a statement and returns rows or an affected row count
//! - [`DatabaseManager::save_df`] writes a dataframe to a table
//! - [`DatabaseManager::load_table`] reads a table or query result into a dataframe
//! - [`DatabaseManager::upsert_table`] updates existing rows and inserts new ones
//! - [`DatabaseManager::merge_df`] does the same with a single MERGE statement
//!
//! Every operation runs on a caller supplied connection, so the caller decides
//! the transaction scope with [`Transaction`](crate::connection::Transaction).

use std::fmt;
use std::str::FromStr;

use tracing::{debug, error, info, warn};

use crate::connection::{Connection, Engine, Params};
use crate::dataframe::DataFrame;
use crate::datetime::{
    convert_datetime_columns, datetime_columns_to_timezone, parse_date_columns, DatetimeDtype,
    ParseDates, DEFAULT_DATETIME_FORMAT,
};
use crate::dialect::Dialect;
use crate::dtype::DataType;
use crate::error::{FrameSqlError, FrameSqlResult};
use crate::sql_container::SqlContainer;
use crate::sql_kind;

/// Result of [`DatabaseManager::execute`]
#[derive(Debug, Clone, PartialEq)]
pub enum StatementResult {
    /// Rows returned by a query
    Rows(DataFrame),
    /// Number of rows affected by any other statement
    Affected(usize),
}

impl StatementResult {
    /// The returned rows, if the statement was a query
    pub fn rows(&self) -> Option<&DataFrame> {
        match self {
            StatementResult::Rows(df) => Some(df),
            StatementResult::Affected(_) => None,
        }
    }

    /// Consume the result, keeping the rows of a query
    pub fn into_rows(self) -> Option<DataFrame> {
        match self {
            StatementResult::Rows(df) => Some(df),
            StatementResult::Affected(_) => None,
        }
    }

    /// The affected row count, if the statement was not a query
    pub fn affected(&self) -> Option<usize> {
        match self {
            StatementResult::Rows(_) => None,
            StatementResult::Affected(n) => Some(*n),
        }
    }
}

/// What [`DatabaseManager::save_df`] does when the table already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IfExists {
    /// Add the rows to the existing table
    #[default]
    Append,
    /// Delete all existing records, then recreate the table from the dataframe
    Replace,
    /// Fail with [`FrameSqlError::TableExists`]
    Fail,
}

impl FromStr for IfExists {
    type Err = FrameSqlError;

    fn from_str(s: &str) -> FrameSqlResult<Self> {
        match s {
            "append" => Ok(IfExists::Append),
            "replace" => Ok(IfExists::Replace),
            "fail" => Ok(IfExists::Fail),
            _ => Err(FrameSqlError::InvalidInput(format!(
                "Invalid input if_exists = {}. Expected 'append', 'replace' or 'fail'.",
                s
            ))),
        }
    }
}

impl fmt::Display for IfExists {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IfExists::Append => "append",
            IfExists::Replace => "replace",
            IfExists::Fail => "fail",
        };
        write!(f, "{}", name)
    }
}

/// How [`DatabaseManager::save_df`] inserts rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertMethod {
    /// One INSERT statement executed per row
    #[default]
    Single,
    /// One INSERT statement with multiple VALUES per chunk
    Multi,
}

/// Options of [`DatabaseManager::save_df`]
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOptions {
    pub if_exists: IfExists,
    /// Write the index columns of the dataframe as table columns
    pub index: bool,
    /// Column names to use for the index columns
    pub index_label: Option<Vec<String>>,
    /// Number of rows written per batch, all rows at once if `None`
    pub chunksize: Option<usize>,
    /// Schema of the table
    pub schema: Option<String>,
    /// SQL types of columns when the table is created, inferred if not given
    pub dtype: Vec<(String, String)>,
    pub method: InsertMethod,
}

impl Default for SaveOptions {
    fn default() -> Self {
        SaveOptions {
            if_exists: IfExists::Append,
            index: true,
            index_label: None,
            chunksize: None,
            schema: None,
            dtype: Vec::new(),
            method: InsertMethod::Single,
        }
    }
}

/// Options of [`DatabaseManager::load_table`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadOptions {
    /// Columns to set as the index of the dataframe
    pub index_col: Vec<String>,
    /// Columns to select when loading a table by name, all if empty
    pub columns: Vec<String>,
    /// Columns to parse as datetimes
    pub parse_dates: ParseDates,
    /// Time zone to localize naive datetime columns to
    pub localize_tz: Option<String>,
    /// Time zone to convert datetime columns to after localization
    pub target_tz: Option<String>,
    /// Data types to convert columns into
    pub dtypes: Vec<(String, DataType)>,
}

/// Selection of columns for UPDATE, INSERT and MERGE statements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSelection {
    /// Every column
    All,
    /// The named columns, none if empty
    Named(Vec<String>),
}

impl ColumnSelection {
    /// Select no columns
    pub fn none() -> Self {
        ColumnSelection::Named(Vec::new())
    }
}

/// Options of [`DatabaseManager::upsert_table`]
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertOptions {
    /// Columns identifying the rows to update
    pub where_cols: Vec<String>,
    /// Data columns to update and insert
    pub update_cols: ColumnSelection,
    /// Index columns to update and insert
    pub update_index_cols: ColumnSelection,
    /// Only update existing rows, do not insert new ones
    pub update_only: bool,
    /// Convert NaN values to NULL
    pub nan_to_none: bool,
    /// Convert datetime columns to strings or epoch seconds before writing
    pub datetime_cols_dtype: Option<DatetimeDtype>,
    /// Format of datetime columns converted to strings
    pub datetime_format: String,
    /// Only generate the statements
    pub dry_run: bool,
}

impl Default for UpsertOptions {
    fn default() -> Self {
        UpsertOptions {
            where_cols: Vec::new(),
            update_cols: ColumnSelection::All,
            update_index_cols: ColumnSelection::none(),
            update_only: false,
            nan_to_none: true,
            datetime_cols_dtype: None,
            datetime_format: DEFAULT_DATETIME_FORMAT.to_string(),
            dry_run: false,
        }
    }
}

/// Result of [`DatabaseManager::upsert_table`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertResult {
    /// The statements that would have been executed
    DryRun {
        update_stmt: String,
        insert_stmt: Option<String>,
    },
    /// Affected row counts of the UPDATE and the INSERT
    Executed {
        updated: usize,
        inserted: Option<usize>,
    },
}

/// Options of [`DatabaseManager::merge_df`]
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOptions {
    /// Columns to match target rows with source rows on
    pub on_cols: Vec<String>,
    /// Data columns to update and insert
    pub merge_cols: ColumnSelection,
    /// Index columns to update and insert
    pub merge_index_cols: ColumnSelection,
    /// Update matched rows even when no column changed
    pub omit_update_where_clause: bool,
    /// Convert NaN values to NULL
    pub nan_to_none: bool,
    /// Convert datetime columns to strings or epoch seconds before writing
    pub datetime_cols_dtype: Option<DatetimeDtype>,
    /// Format of datetime columns converted to strings
    pub datetime_format: String,
    /// Only generate the statement
    pub dry_run: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        MergeOptions {
            on_cols: Vec::new(),
            merge_cols: ColumnSelection::All,
            merge_index_cols: ColumnSelection::none(),
            omit_update_where_clause: true,
            nan_to_none: true,
            datetime_cols_dtype: None,
            datetime_format: DEFAULT_DATETIME_FORMAT.to_string(),
            dry_run: false,
        }
    }
}

/// Result of [`DatabaseManager::merge_df`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeResult {
    /// The statement that would have been executed
    DryRun(String),
    /// Number of merged rows
    Executed(usize),
}

impl MergeResult {
    /// The generated statement of a dry run
    pub fn statement(&self) -> Option<&str> {
        match self {
            MergeResult::DryRun(stmt) => Some(stmt),
            MergeResult::Executed(_) => None,
        }
    }
}

/// Quote an identifier for use in generated SQL
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Interface to a database of one SQL dialect
pub trait DatabaseManager: fmt::Display {
    /// Statement templates of the database
    fn dialect(&self) -> &Dialect;

    /// The engine connecting to the database
    fn engine(&self) -> FrameSqlResult<&dyn Engine>;

    /// Statements stored with the manager
    fn container(&self) -> Option<&SqlContainer>;

    /// Open a connection to the database
    fn connect(&self) -> FrameSqlResult<Box<dyn Connection>> {
        self.engine()?.connect()
    }

    /// Get a statement from the manager's container
    ///
    /// # Returns
    /// * `Err(StatementNotFound)` if there is no container or no such statement
    fn statement(&self, name: &str) -> FrameSqlResult<&str> {
        self.container()
            .ok_or_else(|| FrameSqlError::StatementNotFound(name.to_string()))?
            .get(name)
    }

    /// Manage how the database handles foreign key constraints
    ///
    /// Does nothing unless the database needs foreign key checks enabled
    /// explicitly.
    fn manage_foreign_keys(&self, _conn: &mut dyn Connection, _action: &str) -> FrameSqlResult<()> {
        Ok(())
    }

    /// Check that a table name is a single word
    ///
    /// # Returns
    /// * `Err(InvalidTableName)` if the name is empty or contains whitespace
    fn is_valid_table_name(&self, table: &str) -> FrameSqlResult<()> {
        let words = table.split_whitespace().count();
        if words == 1 {
            return Ok(());
        }
        if words == 0 {
            return Err(FrameSqlError::InvalidTableName(
                "The table name must not be empty".to_string(),
            ));
        }
        Err(FrameSqlError::InvalidTableName(format!(
            "Table name contains spaces ({})! The table name must be a single word.\ntable = {}",
            words - 1,
            table
        )))
    }

    /// Execute a SQL statement
    ///
    /// # Arguments
    /// * `sql` - The statement, with `:name` placeholders for parameters
    /// * `conn` - An open connection to the database
    /// * `params` - Values of the placeholders
    ///
    /// # Returns
    /// * The rows of a query, or the affected row count of any other statement
    /// * `Err(ExecuteStatement)` if the execution fails
    fn execute(
        &self,
        sql: &str,
        conn: &mut dyn Connection,
        params: Option<&Params>,
    ) -> FrameSqlResult<StatementResult> {
        let empty = Params::new();
        let params = params.unwrap_or(&empty);
        debug!("Executing statement:\n{}\nparams = {:?}", sql, params);

        let result = if sql_kind::returns_rows(sql) {
            conn.query(sql, params).map(StatementResult::Rows)
        } else {
            conn.execute(sql, params).map(StatementResult::Affected)
        };
        result.map_err(into_execute_error)
    }

    /// Execute a SQL statement once per parameter record
    ///
    /// # Returns
    /// * The total number of affected rows
    /// * `Err(ExecuteStatement)` if an execution fails
    fn execute_many(
        &self,
        sql: &str,
        conn: &mut dyn Connection,
        params: &[Params],
    ) -> FrameSqlResult<usize> {
        debug!("Executing statement for {} records:\n{}", params.len(), sql);
        conn.execute_many(sql, params).map_err(into_execute_error)
    }

    /// Delete all records from a table
    ///
    /// # Returns
    /// * `Err(InvalidTableName)` if the table name is invalid
    /// * `Err(DeleteFromTable)` if the records cannot be deleted
    fn delete_all_records_from_table(
        &self,
        table: &str,
        conn: &mut dyn Connection,
    ) -> FrameSqlResult<()> {
        self.is_valid_table_name(table)?;
        let sql = self.dialect().delete_from_table_statement(table);

        conn.execute(&sql, &Params::new()).map_err(|e| {
            FrameSqlError::DeleteFromTable(format!(
                "Could not delete records from table: {}: {}",
                table, e
            ))
        })?;
        debug!("Successfully deleted existing data from table {}.", table);
        Ok(())
    }

    /// Save a dataframe to a table
    ///
    /// A missing table is created with column types inferred from the data,
    /// unless given in `options.dtype`. With `IfExists::Replace` the records
    /// are deleted and the table is dropped and created again from `df`. The
    /// caller controls the transaction.
    ///
    /// # Returns
    /// * `Err(TableExists)` if the table exists and `if_exists` is `Fail`
    /// * `Err(DeleteFromTable)` if existing records cannot be replaced
    /// * `Err(SaveDataFrame)` if the table cannot be created or written
    fn save_df(
        &self,
        df: &DataFrame,
        table: &str,
        conn: &mut dyn Connection,
        options: &SaveOptions,
    ) -> FrameSqlResult<()> {
        match options.if_exists {
            IfExists::Replace => self.delete_all_records_from_table(table, conn)?,
            _ => self.is_valid_table_name(table)?,
        }

        let output = frame_for_save(df, options)?;
        let save_error =
            |e: FrameSqlError| FrameSqlError::SaveDataFrame(format!("table {}: {}", table, e));

        let mut exists = conn.table_exists(table).map_err(save_error)?;
        if exists && options.if_exists == IfExists::Fail {
            return Err(FrameSqlError::TableExists(table.to_string()));
        }

        let target = match &options.schema {
            Some(schema) => format!("{}.{}", quote_identifier(schema), quote_identifier(table)),
            None => quote_identifier(table),
        };

        // Replaced tables take the columns of the dataframe
        if exists && options.if_exists == IfExists::Replace {
            conn.execute(&format!("DROP TABLE {}", target), &Params::new())
                .map_err(save_error)?;
            debug!("Dropped table {} to recreate it.", table);
            exists = false;
        }

        if !exists {
            let sql = create_table_statement(&output, &target, &options.dtype)?;
            debug!("Creating table {}:\n{}", table, sql);
            conn.execute(&sql, &Params::new()).map_err(save_error)?;
        }

        let columns: Vec<String> = output.columns().iter().map(|c| quote_identifier(c)).collect();
        for chunk in output.chunks(options.chunksize.unwrap_or(0)) {
            if chunk.is_empty() {
                continue;
            }
            match options.method {
                InsertMethod::Single => {
                    let slots: Vec<String> = (0..columns.len()).map(|j| format!(":p{}", j)).collect();
                    let sql = format!(
                        "INSERT INTO {} ({}) VALUES ({})",
                        target,
                        columns.join(", "),
                        slots.join(", ")
                    );
                    let records: Vec<Params> = chunk
                        .rows()
                        .iter()
                        .map(|row| {
                            row.iter()
                                .enumerate()
                                .map(|(j, v)| (format!("p{}", j), v.clone()))
                                .collect()
                        })
                        .collect();
                    conn.execute_many(&sql, &records).map_err(save_error)?;
                }
                InsertMethod::Multi => {
                    let mut params = Params::new();
                    let mut values = Vec::with_capacity(chunk.row_count());
                    for (i, row) in chunk.rows().iter().enumerate() {
                        let mut slots = Vec::with_capacity(row.len());
                        for (j, value) in row.iter().enumerate() {
                            let name = format!("r{}_c{}", i, j);
                            slots.push(format!(":{}", name));
                            params.insert(name, value.clone());
                        }
                        values.push(format!("({})", slots.join(", ")));
                    }
                    let sql = format!(
                        "INSERT INTO {} ({}) VALUES {}",
                        target,
                        columns.join(", "),
                        values.join(", ")
                    );
                    conn.execute(&sql, &params).map_err(save_error)?;
                }
            }
        }

        info!(
            "Successfully wrote {} rows over {} columns to table {}.",
            output.row_count(),
            output.column_count(),
            table
        );
        Ok(())
    }

    /// Load a table or the result of a query into a dataframe
    ///
    /// # Arguments
    /// * `sql` - A table name or a query
    /// * `conn` - An open connection to the database
    /// * `params` - Values of the placeholders of a query
    /// * `options` - Columns, index, data type and time zone settings
    ///
    /// # Returns
    /// * `Err(LoadTable)` if the query fails
    /// * `Err(DataTypeConversion)` if a data type conversion fails
    /// * `Err(SetIndex)` if the index cannot be set
    fn load_table(
        &self,
        sql: &str,
        conn: &mut dyn Connection,
        params: Option<&Params>,
        options: &LoadOptions,
    ) -> FrameSqlResult<DataFrame> {
        let mut df = query_frame(sql, conn, params, options)?;

        if df.is_empty() {
            warn!("No rows were returned from the query.");
        }

        if !options.dtypes.is_empty() {
            debug!("Convert columns to desired data types.");
            df = df.astype(&options.dtypes)?;
        }

        if let Some(localize_tz) = &options.localize_tz {
            datetime_columns_to_timezone(&mut df, localize_tz, options.target_tz.as_deref())?;
        }

        let (rows, cols) = (df.row_count(), df.all_columns().len());
        if !options.index_col.is_empty() {
            df.set_index(&options.index_col)?;
        }

        info!("Successfully loaded {} rows and {} columns.", rows, cols);
        Ok(df)
    }

    /// Load a table or query result in chunks of at most `chunksize` rows
    ///
    /// Dates are parsed and the index is set on every chunk. Data type and
    /// time zone options are not applied.
    fn load_table_chunks(
        &self,
        sql: &str,
        conn: &mut dyn Connection,
        params: Option<&Params>,
        options: &LoadOptions,
        chunksize: usize,
    ) -> FrameSqlResult<std::vec::IntoIter<DataFrame>> {
        if chunksize == 0 {
            return Err(FrameSqlError::InvalidInput(
                "chunksize must be greater than 0".to_string(),
            ));
        }
        let df = query_frame(sql, conn, params, options)?;

        let mut chunks = df.chunks(chunksize);
        if !options.index_col.is_empty() {
            for chunk in &mut chunks {
                chunk.set_index(&options.index_col)?;
            }
        }
        Ok(chunks.into_iter())
    }

    /// Update a table with the rows of a dataframe and insert new rows
    ///
    /// Rows are matched on `options.where_cols`. The UPDATE runs for all rows
    /// first, then, unless `update_only` is set, an INSERT adds the rows that
    /// match no existing row.
    ///
    /// # Returns
    /// * The generated statements if `dry_run` is set, otherwise the affected row counts
    /// * `Err(InvalidTableName)` if the table name is invalid
    /// * `Err(InvalidColumnName)` if a column is not part of the dataframe
    /// * `Err(ExecuteStatement)` if a statement fails
    fn upsert_table(
        &self,
        df: &DataFrame,
        table: &str,
        conn: &mut dyn Connection,
        options: &UpsertOptions,
    ) -> FrameSqlResult<UpsertResult> {
        self.is_valid_table_name(table)?;

        let (df_upsert, update_cols, insert_cols) = prepare_input_data_for_modify_statements(
            df,
            &options.update_cols,
            &options.update_index_cols,
            &options.where_cols,
        )?;

        let dialect = self.dialect();
        let update_stmt = dialect.update_statement(table, &update_cols, &options.where_cols);
        let insert_stmt = (!options.update_only).then(|| {
            dialect.insert_into_where_not_exists_statement(table, &insert_cols, &options.where_cols)
        });

        if options.dry_run {
            return Ok(UpsertResult::DryRun {
                update_stmt,
                insert_stmt,
            });
        }

        let records = prepare_records(
            df_upsert,
            options.datetime_cols_dtype,
            &options.datetime_format,
            options.nan_to_none,
        )?;

        let result = conn.execute_many(&update_stmt, &records).and_then(|updated| {
            let inserted = match &insert_stmt {
                Some(stmt) => Some(conn.execute_many(stmt, &records)?),
                None => None,
            };
            Ok((updated, inserted))
        });

        let failed = result.is_err();
        log_statement(failed, &format!("UPDATE statement for table {}:\n{}\n", table, update_stmt));
        log_statement(failed, &format!("update_only={}", options.update_only));
        log_statement(
            failed,
            &format!(
                "INSERT statement for table {}:\n{}",
                table,
                insert_stmt.as_deref().unwrap_or("None")
            ),
        );
        log_statement(failed, &format_params(&records));

        let (updated, inserted) = result.map_err(into_execute_error)?;
        Ok(UpsertResult::Executed { updated, inserted })
    }

    /// Merge the rows of a dataframe into a table with a MERGE statement
    ///
    /// # Returns
    /// * The generated statement if `dry_run` is set, otherwise the merged row count
    /// * `Err(SqlStatementNotSupported)` if the dialect has no MERGE statement
    /// * `Err(InvalidColumnName)` if a column is not part of the dataframe
    /// * `Err(ExecuteStatement)` if the statement fails
    fn merge_df(
        &self,
        df: &DataFrame,
        table: &str,
        conn: &mut dyn Connection,
        options: &MergeOptions,
    ) -> FrameSqlResult<MergeResult> {
        self.is_valid_table_name(table)?;
        if !self.dialect().supports_merge() {
            return Err(FrameSqlError::SqlStatementNotSupported(format!(
                "{} does not support the MERGE statement. Try the similar upsert_table method instead.",
                self
            )));
        }

        let (df_merge, update_cols, insert_cols) = prepare_input_data_for_modify_statements(
            df,
            &options.merge_cols,
            &options.merge_index_cols,
            &options.on_cols,
        )?;

        let merge_stmt = self.dialect().merge_statement(
            table,
            &insert_cols,
            &options.on_cols,
            &update_cols,
            options.omit_update_where_clause,
        )?;

        if options.dry_run {
            return Ok(MergeResult::DryRun(merge_stmt));
        }

        let records = prepare_records(
            df_merge,
            options.datetime_cols_dtype,
            &options.datetime_format,
            options.nan_to_none,
        )?;

        let result = conn.execute_many(&merge_stmt, &records);

        let failed = result.is_err();
        log_statement(failed, &format!("MERGE statement for table {}:\n{}\n", table, merge_stmt));
        log_statement(failed, &format_params(&records));

        Ok(MergeResult::Executed(result.map_err(into_execute_error)?))
    }
}

fn into_execute_error(e: FrameSqlError) -> FrameSqlError {
    match e {
        FrameSqlError::ExecuteStatement(_) => e,
        other => FrameSqlError::ExecuteStatement(other.to_string()),
    }
}

fn log_statement(failed: bool, message: &str) {
    if failed {
        error!("{}", message);
    } else {
        debug!("{}", message);
    }
}

fn format_params(records: &[Params]) -> String {
    let rows: Vec<String> = records.iter().map(|r| format!("{:?}", r)).collect();
    format!("params:\n{}", rows.join("\n"))
}

/// Columns and rows written by `save_df`: index first unless excluded
fn frame_for_save(df: &DataFrame, options: &SaveOptions) -> FrameSqlResult<DataFrame> {
    if !options.index {
        return df.select(df.columns());
    }

    let mut output = df.clone();
    if let Some(labels) = &options.index_label {
        let names = output.index_names().to_vec();
        if labels.len() != names.len() {
            return Err(FrameSqlError::InvalidInput(format!(
                "index_label has {} names, but the index has {} columns",
                labels.len(),
                names.len()
            )));
        }
        let renames: Vec<(String, String)> = names.into_iter().zip(labels.iter().cloned()).collect();
        output.rename(&renames)?;
    }
    output.reset_index();
    Ok(output)
}

fn create_table_statement(
    df: &DataFrame,
    target: &str,
    dtype: &[(String, String)],
) -> FrameSqlResult<String> {
    if let Some((name, _)) = dtype.iter().find(|(name, _)| df.column_index(name).is_none()) {
        return Err(FrameSqlError::InvalidColumnName(format!(
            "dtype given for '{}', which is not a column. Columns: {:?}",
            name,
            df.columns()
        )));
    }

    let definitions: Vec<String> = df
        .columns()
        .iter()
        .map(|column| {
            let sql_type = dtype
                .iter()
                .find(|(name, _)| name == column)
                .map(|(_, sql_type)| sql_type.clone())
                .unwrap_or_else(|| {
                    let values = df.column(column).unwrap_or_default();
                    DataType::infer(values).sql_type().to_string()
                });
            format!("{} {}", quote_identifier(column), sql_type)
        })
        .collect();

    Ok(format!("CREATE TABLE {} ({})", target, definitions.join(", ")))
}

/// Run the query of `load_table` and parse its date columns
fn query_frame(
    sql: &str,
    conn: &mut dyn Connection,
    params: Option<&Params>,
    options: &LoadOptions,
) -> FrameSqlResult<DataFrame> {
    let query = if sql_kind::is_table_name(sql) {
        let columns = if options.columns.is_empty() {
            "*".to_string()
        } else {
            options
                .columns
                .iter()
                .map(|c| quote_identifier(c))
                .collect::<Vec<_>>()
                .join(", ")
        };
        format!("SELECT {} FROM {}", columns, sql.trim())
    } else {
        sql.to_string()
    };

    let empty = Params::new();
    let params = params.unwrap_or(&empty);
    debug!("Loading with query:\n{}", query);

    let mut df = conn.query(&query, params).map_err(|e| {
        FrameSqlError::LoadTable(format!(
            "{}\nsql={}\nparams={:?}\ncolumns={:?}",
            e, sql, params, options.columns
        ))
    })?;

    if !options.parse_dates.is_empty() {
        parse_date_columns(&mut df, &options.parse_dates)?;
    }
    Ok(df)
}

/// Select the columns and data used by UPDATE, INSERT and MERGE statements
///
/// # Returns
/// * The dataframe with only the affected columns and no index
/// * The columns to update, which exclude `where_cols`
/// * The columns to insert
fn prepare_input_data_for_modify_statements(
    df: &DataFrame,
    update_cols: &ColumnSelection,
    update_index_cols: &ColumnSelection,
    where_cols: &[String],
) -> FrameSqlResult<(DataFrame, Vec<String>, Vec<String>)> {
    let mut update: Vec<String> = match update_cols {
        ColumnSelection::All => df.columns().to_vec(),
        ColumnSelection::Named(cols) => cols.clone(),
    };
    match update_index_cols {
        ColumnSelection::All => update.extend(df.index_names().iter().cloned()),
        ColumnSelection::Named(cols) => update.extend(cols.iter().cloned()),
    }

    let insert = update.clone();
    let update: Vec<String> = update
        .into_iter()
        .filter(|col| !where_cols.contains(col))
        .collect();

    let mut cols_in_stmts: Vec<String> = Vec::new();
    for col in update.iter().chain(&insert).chain(where_cols) {
        if !cols_in_stmts.contains(col) {
            cols_in_stmts.push(col.clone());
        }
    }

    let mut output = df.clone();
    output.reset_index();
    let output = output.select(&cols_in_stmts)?;

    Ok((output, update, insert))
}

/// Convert datetimes and missing values and turn the rows into records
fn prepare_records(
    df: DataFrame,
    datetime_cols_dtype: Option<DatetimeDtype>,
    datetime_format: &str,
    nan_to_none: bool,
) -> FrameSqlResult<Vec<Params>> {
    let mut df = match datetime_cols_dtype {
        Some(dtype) => convert_datetime_columns(&df, dtype, datetime_format)?,
        None => df,
    };
    if nan_to_none && df.has_missing() {
        df = df.convert_nan_to_none();
    }
    Ok(df.to_records())
}
