//! Common connection interface for framesql
//!
//! This module defines the seam between the database managers and the
//! underlying database toolkit. An [`Engine`] hands out [`Connection`]s;
//! a connection executes SQL text with named parameters and returns query
//! results as dataframes. Any backend that implements these two traits can
//! be driven by a [`DatabaseManager`](crate::manager::DatabaseManager).

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::time::Duration;

use tracing::warn;

use crate::dataframe::DataFrame;
use crate::error::FrameSqlResult;
use crate::url::DbUrl;
use crate::value::Value;

/// Named parameters bound to a SQL statement
///
/// Keys are parameter names without the leading colon: the statement
/// `WHERE ItemId = :ItemId` is bound with `{"ItemId": ...}`.
pub type Params = BTreeMap<String, Value>;

/// Common interface for database connections
///
/// Statements use named parameters prefixed with a colon (`:name`).
/// Parameters that a statement does not reference are ignored, so one record
/// can be bound to several statements.
pub trait Connection {
    /// Execute a statement and return the number of affected rows
    fn execute(&mut self, sql: &str, params: &Params) -> FrameSqlResult<usize>;

    /// Execute a statement once per parameter record
    ///
    /// # Returns
    /// * The total number of affected rows
    fn execute_many(&mut self, sql: &str, params: &[Params]) -> FrameSqlResult<usize> {
        let mut affected = 0;
        for record in params {
            affected += self.execute(sql, record)?;
        }
        Ok(affected)
    }

    /// Run a query and collect its result set into a dataframe
    fn query(&mut self, sql: &str, params: &Params) -> FrameSqlResult<DataFrame>;

    /// Whether a table with the given name exists
    fn table_exists(&mut self, table: &str) -> FrameSqlResult<bool>;

    /// Start a transaction
    fn begin(&mut self) -> FrameSqlResult<()> {
        self.execute("BEGIN", &Params::new()).map(|_| ())
    }

    /// Commit the current transaction
    fn commit(&mut self) -> FrameSqlResult<()> {
        self.execute("COMMIT", &Params::new()).map(|_| ())
    }

    /// Roll back the current transaction
    fn rollback(&mut self) -> FrameSqlResult<()> {
        self.execute("ROLLBACK", &Params::new()).map(|_| ())
    }
}

/// A transaction on a borrowed connection
///
/// The transaction begins when the guard is created and must be finished with
/// [`Transaction::commit`]. Dropping an unfinished guard rolls the
/// transaction back.
pub struct Transaction<'c> {
    conn: &'c mut dyn Connection,
    finished: bool,
}

impl<'c> Transaction<'c> {
    /// Begin a transaction on `conn`
    pub fn begin(conn: &'c mut dyn Connection) -> FrameSqlResult<Self> {
        conn.begin()?;
        Ok(Transaction {
            conn,
            finished: false,
        })
    }

    /// Commit the transaction
    pub fn commit(mut self) -> FrameSqlResult<()> {
        self.finished = true;
        self.conn.commit()
    }

    /// Roll the transaction back
    pub fn rollback(mut self) -> FrameSqlResult<()> {
        self.finished = true;
        self.conn.rollback()
    }
}

impl<'c> Deref for Transaction<'c> {
    type Target = dyn Connection + 'c;

    fn deref(&self) -> &Self::Target {
        self.conn
    }
}

impl<'c> DerefMut for Transaction<'c> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.conn
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.conn.rollback() {
                warn!("Rollback of unfinished transaction failed: {}", e);
            }
        }
    }
}

/// Settings applied by an engine to every connection it opens
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineConfig {
    /// How long to wait for a locked database before failing
    pub busy_timeout: Option<Duration>,

    /// Open connections in read-only mode
    pub read_only: bool,
}

/// A source of connections to one database
pub trait Engine: fmt::Debug + Send + Sync {
    /// The URL of the database the engine connects to
    fn url(&self) -> &DbUrl;

    /// Open a new connection
    fn connect(&self) -> FrameSqlResult<Box<dyn Connection>>;
}
