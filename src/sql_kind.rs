//! Classification of SQL statements
//!
//! Decides whether a statement produces a result set, so a manager can
//! return rows for queries and an affected row count for everything else.

use sqlparser::ast::Statement;
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;

/// Keywords starting statements that return rows
const ROW_KEYWORDS: &[&str] = &["SELECT", "WITH", "VALUES", "EXPLAIN", "SHOW", "DESCRIBE"];

/// Whether executing `sql` returns rows
///
/// The statement is parsed with sqlparser. INSERT, UPDATE and DELETE return
/// rows only with a RETURNING clause. Statements it cannot parse, such as
/// vendor specific syntax, are classified by their leading keyword.
pub fn returns_rows(sql: &str) -> bool {
    match Parser::parse_sql(&SQLiteDialect {}, sql) {
        Ok(statements) => match statements.last() {
            Some(Statement::Query(_))
            | Some(Statement::Explain { .. })
            | Some(Statement::ExplainTable { .. }) => true,
            Some(Statement::Insert { returning, .. })
            | Some(Statement::Update { returning, .. })
            | Some(Statement::Delete { returning, .. }) => returning.is_some(),
            Some(_) => false,
            None => false,
        },
        Err(_) => returns_rows_by_keyword(sql) || has_returning_clause(sql),
    }
}

fn returns_rows_by_keyword(sql: &str) -> bool {
    let upper = sql.trim_start().to_uppercase();
    let keyword = upper
        .split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .next()
        .unwrap_or("");

    if keyword == "PRAGMA" {
        return !upper.contains('=');
    }
    ROW_KEYWORDS.contains(&keyword)
}

fn has_returning_clause(sql: &str) -> bool {
    sql.split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .any(|word| word.eq_ignore_ascii_case("RETURNING"))
}

/// Whether `sql` is a plain table name rather than a statement
pub fn is_table_name(sql: &str) -> bool {
    let sql = sql.trim();
    !sql.is_empty()
        && sql
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '.' || c == '$')
}
