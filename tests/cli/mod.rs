//! Tests of the framesql binary built from test cases

use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;

use crate::helpers::{
    create_custom_csv, create_temp_dir, prepare_test_file, run_test_case, FrameSqlTestCase,
};

#[test]
fn test_select_with_table_name() -> Result<(), Box<dyn std::error::Error>> {
    run_test_case(FrameSqlTestCase {
        sql: vec!["SELECT name FROM staff WHERE age > 28 ORDER BY id".to_string()],
        table_name: Some("staff".to_string()),
        expected_stdout: vec!["name\nAlice\nCharlie\n".to_string()],
        unexpected_stdout: vec!["Bob".to_string()],
        ..FrameSqlTestCase::default()
    })
}

#[test]
fn test_statements_run_in_order() -> Result<(), Box<dyn std::error::Error>> {
    run_test_case(FrameSqlTestCase {
        sql: vec![
            "DELETE FROM people WHERE age < 30".to_string(),
            "UPDATE people SET age = 31 WHERE name = 'Alice'".to_string(),
            "SELECT id, age FROM people ORDER BY id".to_string(),
        ],
        expected_stdout: vec!["id,age\n1,31\n3,35\n".to_string()],
        ..FrameSqlTestCase::default()
    })
}

#[test]
fn test_index_col_comes_first() -> Result<(), Box<dyn std::error::Error>> {
    run_test_case(FrameSqlTestCase {
        sql: vec!["SELECT name, id FROM people WHERE id = 2".to_string()],
        args: vec!["--index-col".to_string(), "id".to_string()],
        expected_stdout: vec!["id,name\n2,Bob\n".to_string()],
        ..FrameSqlTestCase::default()
    })
}

#[test]
fn test_invalid_if_exists_value() -> Result<(), Box<dyn std::error::Error>> {
    run_test_case(FrameSqlTestCase {
        sql: vec!["SELECT 1".to_string()],
        args: vec!["--if-exists".to_string(), "overwrite".to_string()],
        expected_stderr: vec!["Invalid arguments".to_string()],
        should_succeed: false,
        ..FrameSqlTestCase::default()
    })
}

#[test]
fn test_named_statements_from_sql_file() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = create_temp_dir()?;
    let test_file = prepare_test_file(temp_dir.path())?;
    let sql_file = create_custom_csv(
        temp_dir.path(),
        "queries.sql",
        "-- name: youngest\nSELECT name FROM people ORDER BY age LIMIT 1;\n\n\
         -- name: oldest\nSELECT name FROM people ORDER BY age DESC LIMIT 1;\n",
    )?;

    let mut cmd = Command::cargo_bin("framesql")?;
    cmd.arg("--sql-file")
        .arg(&sql_file)
        .arg("--run")
        .arg("oldest")
        .arg(&test_file);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Charlie"))
        .stdout(predicate::str::contains("Bob").not());

    let mut cmd = Command::cargo_bin("framesql")?;
    cmd.arg("--sql-file")
        .arg(&sql_file)
        .arg("--run")
        .arg("median")
        .arg(&test_file);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("median"));

    Ok(())
}
