//! Test helpers for framesql integration tests
//!
//! This module provides helper functions and structs to simplify writing
//! tests against the library and the `framesql` binary.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

use framesql::{DataFrame, SqliteDb};

/// Represents a test case for the framesql binary
pub struct FrameSqlTestCase {
    /// The SQL statements to execute
    pub sql: Vec<String>,
    /// Additional command line arguments
    pub args: Vec<String>,
    /// Table name to use (optional)
    pub table_name: Option<String>,
    /// Expected strings in stdout
    pub expected_stdout: Vec<String>,
    /// Strings that must not appear in stdout
    pub unexpected_stdout: Vec<String>,
    /// Expected strings in stderr
    pub expected_stderr: Vec<String>,
    /// Whether the command is expected to succeed
    pub should_succeed: bool,
}

impl Default for FrameSqlTestCase {
    fn default() -> Self {
        FrameSqlTestCase {
            sql: Vec::new(),
            args: Vec::new(),
            table_name: None,
            expected_stdout: Vec::new(),
            unexpected_stdout: Vec::new(),
            expected_stderr: Vec::new(),
            should_succeed: true,
        }
    }
}

/// Run a test case against a freshly written people.csv file
pub fn run_test_case(test_case: FrameSqlTestCase) -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = create_temp_dir()?;
    let test_file = prepare_test_file(temp_dir.path())?;

    let mut cmd = Command::cargo_bin("framesql")?;
    for sql in &test_case.sql {
        cmd.arg("-s").arg(sql);
    }
    for arg in &test_case.args {
        cmd.arg(arg);
    }

    // Add table name mapping if specified, otherwise use the default file
    match &test_case.table_name {
        Some(table_name) => cmd.arg(format!("{}={}", table_name, test_file.display())),
        None => cmd.arg(&test_file),
    };

    let mut assert = cmd.assert();
    assert = if test_case.should_succeed {
        assert.success()
    } else {
        assert.failure()
    };

    for expected in test_case.expected_stdout {
        assert = assert.stdout(predicate::str::contains(expected));
    }
    for unexpected in test_case.unexpected_stdout {
        assert = assert.stdout(predicate::str::contains(unexpected).not());
    }
    for expected in test_case.expected_stderr {
        assert = assert.stderr(predicate::str::contains(expected));
    }

    Ok(())
}

/// Helper function to create a temp directory for tests, respecting CARGO_TARGET_TMPDIR if set
pub fn create_temp_dir() -> Result<TempDir, Box<dyn std::error::Error>> {
    if let Ok(cargo_target_tmpdir) = env::var("CARGO_TARGET_TMPDIR") {
        fs::create_dir_all(&cargo_target_tmpdir)?;
        Ok(TempDir::new_in(cargo_target_tmpdir)?)
    } else {
        Ok(TempDir::new()?)
    }
}

/// Helper function to create a standard test CSV file with people data
pub fn prepare_test_file(dir: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    create_custom_csv(
        dir,
        "people.csv",
        "id,name,age\n1,Alice,30\n2,Bob,25\n3,Charlie,35\n",
    )
}

/// Helper function to create a test CSV file with custom data
pub fn create_custom_csv(
    dir: &Path,
    filename: &str,
    content: &str,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// A SQLite database manager backed by a file in `dir`
pub fn file_db(dir: &Path) -> SqliteDb {
    SqliteDb::new(dir.join("shop.db")).unwrap()
}

/// Items of a garden shop, indexed by ItemId
pub fn items() -> DataFrame {
    let mut df = DataFrame::from_rows(
        vec!["ItemId", "ItemName", "Price"],
        vec![
            vec![1.into(), "Pot".into(), 1.5.into()],
            vec![2.into(), "Rake".into(), 12.0.into()],
            vec![3.into(), "Shovel".into(), 18.25.into()],
        ],
    )
    .unwrap();
    df.set_index(&["ItemId"]).unwrap();
    df
}
