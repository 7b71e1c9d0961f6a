//! SQLite backend for framesql
//!
//! This module provides:
//!
//! - [`SqliteEngine`], an [`Engine`] handing out rusqlite connections to a
//!   database file or to an in-memory database
//! - [`SqliteConnection`], which binds named parameters from [`Params`] and
//!   collects query results into dataframes
//! - [`SqliteDb`], the SQLite [`DatabaseManager`]

use std::fmt;
use std::path::Path;
use std::process;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{OpenFlags, ToSql};
use tracing::debug;

use crate::connection::{Connection, Engine, EngineConfig, Params};
use crate::dataframe::DataFrame;
use crate::dialect::Dialect;
use crate::error::{FrameSqlError, FrameSqlResult};
use crate::manager::DatabaseManager;
use crate::sql_container::SqlContainer;
use crate::url::DbUrl;
use crate::value::Value;

/// File name that selects an in-memory database
pub const MEMORY: &str = ":memory:";

/// Number of in-memory databases created by this process
static MEMORY_DATABASES: AtomicUsize = AtomicUsize::new(0);

/// Binds framesql values to SQLite parameters
///
/// Booleans are stored as 0/1 and datetimes as ISO 8601 text.
impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Integer(i) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*i)),
            Value::Float(f) => ToSqlOutput::Owned(rusqlite::types::Value::Real(*f)),
            Value::String(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Boolean(b) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(i64::from(*b))),
            Value::DateTime(_) | Value::DateTimeTz(_) => {
                ToSqlOutput::Owned(rusqlite::types::Value::Text(self.to_string()))
            }
        })
    }
}

fn from_value_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(t) | ValueRef::Blob(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
    }
}

fn execute_error(sql: &str, e: rusqlite::Error) -> FrameSqlError {
    FrameSqlError::ExecuteStatement(format!("{}\nsql = {}", e, sql))
}

/// A connection to a SQLite database
pub struct SqliteConnection {
    conn: rusqlite::Connection,
}

impl SqliteConnection {
    /// Wrap an open rusqlite connection
    pub fn new(conn: rusqlite::Connection) -> Self {
        SqliteConnection { conn }
    }

    /// The underlying rusqlite connection
    pub fn inner(&self) -> &rusqlite::Connection {
        &self.conn
    }

    /// Prepare a statement and bind the parameters it references
    fn prepare_bound<'c>(
        conn: &'c rusqlite::Connection,
        sql: &str,
        params: &Params,
    ) -> FrameSqlResult<rusqlite::Statement<'c>> {
        let mut stmt = conn.prepare(sql).map_err(|e| execute_error(sql, e))?;

        for i in 1..=stmt.parameter_count() {
            let name = stmt
                .parameter_name(i)
                .map(|n| n.trim_start_matches([':', '@', '$']).to_string())
                .ok_or_else(|| {
                    FrameSqlError::ExecuteStatement(format!(
                        "positional parameter {} is not supported, use named parameters\nsql = {}",
                        i, sql
                    ))
                })?;
            let value = params.get(&name).ok_or_else(|| {
                FrameSqlError::ExecuteStatement(format!(
                    "no value supplied for parameter :{}\nsql = {}",
                    name, sql
                ))
            })?;
            stmt.raw_bind_parameter(i, value)
                .map_err(|e| execute_error(sql, e))?;
        }
        Ok(stmt)
    }
}

impl fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SqliteConnection({:?})", self.conn.path())
    }
}

impl Connection for SqliteConnection {
    fn execute(&mut self, sql: &str, params: &Params) -> FrameSqlResult<usize> {
        let mut stmt = Self::prepare_bound(&self.conn, sql, params)?;

        // Statements such as PRAGMA may return rows, step through them
        if stmt.column_count() > 0 {
            let mut rows = stmt.raw_query();
            while rows.next().map_err(|e| execute_error(sql, e))?.is_some() {}
            return Ok(0);
        }
        stmt.raw_execute().map_err(|e| execute_error(sql, e))
    }

    fn query(&mut self, sql: &str, params: &Params) -> FrameSqlResult<DataFrame> {
        let mut stmt = Self::prepare_bound(&self.conn, sql, params)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();
        let mut df = DataFrame::new(columns);

        let mut rows = stmt.raw_query();
        while let Some(row) = rows.next().map_err(|e| execute_error(sql, e))? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(from_value_ref(row.get_ref(i)?));
            }
            df.add_row(values)?;
        }
        Ok(df)
    }

    fn table_exists(&mut self, table: &str) -> FrameSqlResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT count(*) FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?1",
            [table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

/// Engine for a SQLite database file or an in-memory database
///
/// An in-memory database lives as long as the engine and is shared by all
/// connections the engine opens.
pub struct SqliteEngine {
    url: DbUrl,
    target: String,
    flags: OpenFlags,
    config: EngineConfig,

    /// Keeps an in-memory database alive between connections
    anchor: Mutex<Option<rusqlite::Connection>>,
}

impl SqliteEngine {
    /// Create an engine for `file`, or for an in-memory database if `file` is `:memory:`
    pub fn new(file: &str, config: EngineConfig) -> FrameSqlResult<Self> {
        let mut flags = OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if config.read_only {
            flags |= OpenFlags::SQLITE_OPEN_READ_ONLY;
        } else {
            flags |= OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE;
        }

        let mut url = DbUrl::new("sqlite");
        let (target, anchor) = if file == MEMORY {
            let n = MEMORY_DATABASES.fetch_add(1, Ordering::SeqCst);
            let target = format!(
                "file:framesql_mem_{}_{}?mode=memory&cache=shared",
                process::id(),
                n
            );
            let anchor = rusqlite::Connection::open_with_flags(&target, flags)
                .map_err(|e| FrameSqlError::CreateEngine(e.to_string()))?;
            (target, Some(anchor))
        } else {
            url.database = Some(file.to_string());
            (file.to_string(), None)
        };

        debug!("Successfully created database engine from url: {}.", url);
        Ok(SqliteEngine {
            url,
            target,
            flags,
            config,
            anchor: Mutex::new(anchor),
        })
    }

    /// Open a rusqlite connection configured by the engine settings
    pub fn open(&self) -> FrameSqlResult<SqliteConnection> {
        let conn = rusqlite::Connection::open_with_flags(&self.target, self.flags)
            .map_err(|e| FrameSqlError::CreateEngine(format!("{}: {}", self.url, e)))?;
        if let Some(timeout) = self.config.busy_timeout {
            conn.busy_timeout(timeout)?;
        }
        Ok(SqliteConnection::new(conn))
    }

    /// Whether the engine serves an in-memory database
    pub fn is_memory(&self) -> bool {
        self.anchor.lock().map(|a| a.is_some()).unwrap_or(true)
    }
}

impl fmt::Debug for SqliteEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Engine({})", self.url)
    }
}

impl Engine for SqliteEngine {
    fn url(&self) -> &DbUrl {
        &self.url
    }

    fn connect(&self) -> FrameSqlResult<Box<dyn Connection>> {
        Ok(Box::new(self.open()?))
    }
}

/// A SQLite database manager
///
/// ```
/// use framesql::{DatabaseManager, SqliteDb};
///
/// let db = SqliteDb::memory().unwrap();
/// let mut conn = db.connect().unwrap();
/// db.execute("CREATE TABLE Item (ItemId INTEGER PRIMARY KEY)", conn.as_mut(), None)
///     .unwrap();
/// assert_eq!(db.to_string(), "SqliteDb(file=':memory:', must_exist=false)");
/// ```
pub struct SqliteDb {
    file: String,
    must_exist: bool,
    container: Option<SqlContainer>,
    engine: SqliteEngine,
}

impl SqliteDb {
    /// Create a manager for the database `file` with default options
    pub fn new<P: AsRef<Path>>(file: P) -> FrameSqlResult<Self> {
        SqliteDb::builder(file).build()
    }

    /// Create a manager for a new in-memory database
    pub fn memory() -> FrameSqlResult<Self> {
        SqliteDb::builder(MEMORY).build()
    }

    /// Start building a manager for the database `file`
    pub fn builder<P: AsRef<Path>>(file: P) -> SqliteDbBuilder {
        SqliteDbBuilder {
            file: file.as_ref().to_string_lossy().into_owned(),
            must_exist: false,
            container: None,
            engine_config: EngineConfig::default(),
        }
    }

    /// Path of the database file, or `:memory:`
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Whether the database file had to exist when the manager was created
    pub fn must_exist(&self) -> bool {
        self.must_exist
    }

    /// The engine of the manager
    pub fn sqlite_engine(&self) -> &SqliteEngine {
        &self.engine
    }
}

/// Builder for [`SqliteDb`]
#[derive(Debug, Clone)]
pub struct SqliteDbBuilder {
    file: String,
    must_exist: bool,
    container: Option<SqlContainer>,
    engine_config: EngineConfig,
}

impl SqliteDbBuilder {
    /// Require the database file to exist
    pub fn must_exist(mut self, must_exist: bool) -> Self {
        self.must_exist = must_exist;
        self
    }

    /// Statements the manager can use
    pub fn container(mut self, container: SqlContainer) -> Self {
        self.container = Some(container);
        self
    }

    /// Settings applied to every connection
    pub fn engine_config(mut self, config: EngineConfig) -> Self {
        self.engine_config = config;
        self
    }

    /// Create the manager and its engine
    ///
    /// # Returns
    /// * `Err(DatabaseFileNotFound)` if `must_exist` is set and the file does not exist
    /// * `Err(CreateEngine)` if the engine cannot be created
    pub fn build(self) -> FrameSqlResult<SqliteDb> {
        if self.file != MEMORY && self.must_exist && !Path::new(&self.file).exists() {
            return Err(FrameSqlError::DatabaseFileNotFound(format!(
                "file='{}' does not exist and must_exist={}. \
                 Cannot instantiate the SQLite DatabaseManager.",
                self.file, self.must_exist
            )));
        }

        let engine = SqliteEngine::new(&self.file, self.engine_config)?;
        Ok(SqliteDb {
            file: self.file,
            must_exist: self.must_exist,
            container: self.container,
            engine,
        })
    }
}

impl fmt::Display for SqliteDb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SqliteDb(file='{}', must_exist={})",
            self.file, self.must_exist
        )
    }
}

impl fmt::Debug for SqliteDb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteDb")
            .field("file", &self.file)
            .field("must_exist", &self.must_exist)
            .field("container", &self.container)
            .field("engine_config", &self.engine.config)
            .field("url", &self.engine.url)
            .finish()
    }
}

impl DatabaseManager for SqliteDb {
    fn dialect(&self) -> &Dialect {
        &Dialect::SQLITE
    }

    fn engine(&self) -> FrameSqlResult<&dyn Engine> {
        Ok(&self.engine)
    }

    fn container(&self) -> Option<&SqlContainer> {
        self.container.as_ref()
    }

    /// Enable (`ON`) or disable (`OFF`) the check of foreign key constraints
    ///
    /// SQLite does not check foreign keys unless enabled per connection.
    fn manage_foreign_keys(&self, conn: &mut dyn Connection, action: &str) -> FrameSqlResult<()> {
        if !matches!(action, "ON" | "OFF") {
            return Err(FrameSqlError::InvalidInput(format!(
                "Invalid input action = {}. Allowed values: ON, OFF",
                action
            )));
        }
        conn.execute(&format!("PRAGMA foreign_keys = {};", action), &Params::new())?;
        Ok(())
    }
}
