//! SQL statement container for framesql
//!
//! This module provides [`SqlContainer`], a store of named SQL statements that
//! application code hands to a database manager, and [`replace_placeholders`],
//! which expands placeholders in a statement before it is executed.
//!
//! A placeholder in a SQL statement is always prefixed by a colon, e.g.
//! `:placeholder`. Replacing a placeholder with several values is the usual way
//! to parametrize an `IN` clause whose number of values is not known in advance:
//!
//! ```
//! use framesql::sql_container::{replace_placeholders, Placeholder};
//!
//! let stmt = "SELECT * FROM Item WHERE ItemId IN (:itemid)";
//! let (stmt, params) =
//!     replace_placeholders(stmt, &[Placeholder::new(":itemid", vec![1, 2, 3])]).unwrap();
//!
//! assert_eq!(stmt, "SELECT * FROM Item WHERE ItemId IN (:v0, :v1, :v2)");
//! assert_eq!(params.len(), 3);
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use regex::{NoExpand, Regex};
use tracing::debug;

use crate::connection::Params;
use crate::error::{FrameSqlError, FrameSqlResult};
use crate::value::Value;

/// Replacement value(s) of a placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum Replacement {
    /// A single value
    Single(Value),
    /// A sequence of values, joined with `", "` in the statement
    Many(Vec<Value>),
}

impl From<Value> for Replacement {
    fn from(value: Value) -> Self {
        Replacement::Single(value)
    }
}

impl From<i64> for Replacement {
    fn from(value: i64) -> Self {
        Replacement::Single(value.into())
    }
}

impl From<i32> for Replacement {
    fn from(value: i32) -> Self {
        Replacement::Single(value.into())
    }
}

impl From<f64> for Replacement {
    fn from(value: f64) -> Self {
        Replacement::Single(value.into())
    }
}

impl From<bool> for Replacement {
    fn from(value: bool) -> Self {
        Replacement::Single(value.into())
    }
}

impl From<&str> for Replacement {
    fn from(value: &str) -> Self {
        Replacement::Single(value.into())
    }
}

impl From<String> for Replacement {
    fn from(value: String) -> Self {
        Replacement::Single(value.into())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Replacement {
    fn from(values: Vec<T>) -> Self {
        Replacement::Many(values.into_iter().map(Into::into).collect())
    }
}

/// A placeholder in a SQL statement and its replacement value(s)
#[derive(Debug, Clone, PartialEq)]
pub struct Placeholder {
    /// The placeholder to replace, including the leading colon
    pub key: String,

    /// The value(s) to replace the placeholder with
    pub values: Replacement,

    /// Whether the values become new placeholders (`:v0`, `:v1`, ...) bound as
    /// parameters, or are written into the statement as literal text
    pub new_key: bool,
}

impl Placeholder {
    /// Create a placeholder whose values become new parameter placeholders
    pub fn new(key: impl Into<String>, values: impl Into<Replacement>) -> Self {
        Placeholder {
            key: key.into(),
            values: values.into(),
            new_key: true,
        }
    }

    /// Choose whether the values become new placeholders or literal text
    pub fn with_new_key(mut self, new_key: bool) -> Self {
        self.new_key = new_key;
        self
    }

    /// Pattern matching the key as a whole token
    ///
    /// A key ending in an identifier character must not be followed by one, so
    /// `:id` does not match inside `:idx`.
    fn pattern(&self) -> FrameSqlResult<Regex> {
        if self.key.is_empty() || !self.key.starts_with(':') {
            return Err(FrameSqlError::InvalidInput(format!(
                "placeholder key must start with ':'. Got '{}'",
                self.key
            )));
        }

        let mut pattern = regex::escape(&self.key);
        if self
            .key
            .chars()
            .last()
            .map_or(false, |c| c.is_alphanumeric() || c == '_')
        {
            pattern.push_str(r"\b");
        }
        Regex::new(&pattern).map_err(|e| FrameSqlError::InvalidInput(e.to_string()))
    }
}

/// Replace placeholders in a SQL statement
///
/// Each placeholder key found in `stmt` is replaced with its value(s). When
/// `new_key` is set, every value becomes a new placeholder `:v{n}` and is
/// returned in the parameters; the counter is shared by all placeholders of
/// the call so the new placeholders are unique. Otherwise the values are
/// written into the statement as text.
///
/// # Arguments
/// * `stmt` - The SQL statement in which to replace placeholders
/// * `placeholders` - The placeholders and their replacement values
///
/// # Returns
/// * The statement after replacement and the parameters of the new placeholders
/// * `Err(InvalidInput)` if a key is empty or does not start with a colon
pub fn replace_placeholders(
    stmt: &str,
    placeholders: &[Placeholder],
) -> FrameSqlResult<(String, Params)> {
    let mut stmt = stmt.to_string();
    let mut params = Params::new();
    let mut counter = 0;

    for placeholder in placeholders {
        let pattern = placeholder.pattern()?;

        let mut replace_one = |value: &Value| {
            if placeholder.new_key {
                let name = format!("v{}", counter);
                counter += 1;
                let repl = format!(":{}", name);
                params.insert(name, value.clone());
                repl
            } else {
                value.to_string()
            }
        };

        let repl = match &placeholder.values {
            Replacement::Single(value) => replace_one(value),
            Replacement::Many(values) => values
                .iter()
                .map(&mut replace_one)
                .collect::<Vec<_>>()
                .join(", "),
        };

        stmt = pattern.replace_all(&stmt, NoExpand(&repl)).into_owned();
        debug!("stmt = {}", stmt);
        debug!("params = {:?}", params);
    }

    Ok((stmt, params))
}

/// A container of named SQL statements
///
/// Statements are kept in name order. A container typically holds all the
/// statements an application runs against one database, and can be loaded
/// from a SQL file where each statement is introduced by a `-- name: <name>`
/// comment line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlContainer {
    statements: BTreeMap<String, String>,
}

impl SqlContainer {
    /// Create an empty container
    pub fn new() -> Self {
        SqlContainer::default()
    }

    /// Add a statement, replacing any statement with the same name
    ///
    /// # Returns
    /// * The statement previously stored under `name`, if any
    pub fn add(&mut self, name: impl Into<String>, sql: impl Into<String>) -> Option<String> {
        self.statements.insert(name.into(), sql.into())
    }

    /// Builder form of [`SqlContainer::add`]
    pub fn with(mut self, name: impl Into<String>, sql: impl Into<String>) -> Self {
        self.add(name, sql);
        self
    }

    /// Get a statement by name
    ///
    /// # Returns
    /// * `Err(StatementNotFound)` if no statement is stored under `name`
    pub fn get(&self, name: &str) -> FrameSqlResult<&str> {
        self.statements
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| FrameSqlError::StatementNotFound(name.to_string()))
    }

    /// Remove a statement by name
    ///
    /// # Returns
    /// * `Err(StatementNotFound)` if no statement is stored under `name`
    pub fn remove(&mut self, name: &str) -> FrameSqlResult<String> {
        self.statements
            .remove(name)
            .ok_or_else(|| FrameSqlError::StatementNotFound(name.to_string()))
    }

    /// Names of the stored statements, in order
    pub fn names(&self) -> Vec<&str> {
        self.statements.keys().map(String::as_str).collect()
    }

    /// Number of stored statements
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Whether the container holds no statements
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Check that all the named statements are present
    ///
    /// # Returns
    /// * `Err(StatementNotFound)` listing every missing name
    pub fn require<S: AsRef<str>>(&self, names: &[S]) -> FrameSqlResult<()> {
        let missing: Vec<&str> = names
            .iter()
            .map(AsRef::as_ref)
            .filter(|name| !self.statements.contains_key(*name))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(FrameSqlError::StatementNotFound(missing.join(", ")))
        }
    }

    /// Placeholders of a statement, in order of first appearance
    pub fn placeholders(&self, name: &str) -> FrameSqlResult<Vec<String>> {
        let sql = self.get(name)?;
        let re = Regex::new(r":[A-Za-z_]\w*").map_err(|e| FrameSqlError::InvalidInput(e.to_string()))?;

        let mut found: Vec<String> = Vec::new();
        for m in re.find_iter(sql) {
            // Skip casts such as `value::TEXT`
            if m.start() > 0 && sql.as_bytes()[m.start() - 1] == b':' {
                continue;
            }
            if !found.iter().any(|p| p == m.as_str()) {
                found.push(m.as_str().to_string());
            }
        }
        Ok(found)
    }

    /// Parse statements from SQL text
    ///
    /// Each statement starts with a `-- name: <name>` line and runs until the
    /// next one. Text before the first name line is ignored, and whitespace
    /// around each statement is trimmed.
    ///
    /// # Returns
    /// * `Err(InvalidInput)` if a name line has no name
    pub fn from_sql_str(text: &str) -> FrameSqlResult<Self> {
        let mut container = SqlContainer::new();
        let mut current: Option<(String, Vec<&str>)> = None;

        for line in text.lines() {
            let name = line
                .trim_start()
                .strip_prefix("--")
                .map(str::trim_start)
                .and_then(|rest| rest.strip_prefix("name:"));

            match name {
                Some(name) => {
                    let name = name.trim();
                    if name.is_empty() {
                        return Err(FrameSqlError::InvalidInput(format!(
                            "statement name missing in line '{}'",
                            line
                        )));
                    }
                    if let Some((previous, lines)) = current.take() {
                        container.add(previous, lines.join("\n").trim());
                    }
                    current = Some((name.to_string(), Vec::new()));
                }
                None => {
                    if let Some((_, lines)) = current.as_mut() {
                        lines.push(line);
                    }
                }
            }
        }
        if let Some((name, lines)) = current {
            container.add(name, lines.join("\n").trim());
        }

        debug!("Parsed {} statements: {:?}", container.len(), container.names());
        Ok(container)
    }

    /// Load statements from a SQL file, see [`SqlContainer::from_sql_str`]
    pub fn from_sql_file<P: AsRef<Path>>(path: P) -> FrameSqlResult<Self> {
        let text = fs::read_to_string(path)?;
        SqlContainer::from_sql_str(&text)
    }
}
