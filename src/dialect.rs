//! SQL dialects and statement templates
//!
//! A [`Dialect`] holds the statement templates a database manager uses to
//! modify tables from dataframe data: deleting all records, updating rows,
//! inserting rows that do not exist yet and merging. The templates contain
//! `:name` slots that the builders fill with the table name and the column
//! lists. Column placeholders in the generated statements (`:ItemId`) are
//! bound from the dataframe records when the statement is executed.

use crate::error::{FrameSqlError, FrameSqlResult};

/// Indentation unit of the generated statements
const STMT_SPACE: &str = "    ";

/// Alias of the target table in a MERGE statement
const MERGE_TARGET: &str = "t";

/// Alias of the source data in a MERGE statement
const MERGE_SOURCE: &str = "s";

const DELETE_FROM_TABLE: &str = "DELETE FROM :table";

const UPDATE_TABLE: &str = "UPDATE :table
SET
    :update_cols
WHERE
    :where_cols";

const INSERT_INTO_WHERE_NOT_EXISTS: &str = "INSERT INTO :table (
    :insert_cols
)
    SELECT
        :select_values
    WHERE
        NOT EXISTS (
            SELECT
                1
            FROM :table
            WHERE
                :where_cols
        )";

const ORACLE_INSERT_INTO_WHERE_NOT_EXISTS: &str = "INSERT INTO :table (
    :insert_cols
)
    SELECT
        :select_values
    FROM DUAL
    WHERE
        NOT EXISTS (
            SELECT
                1
            FROM :table
            WHERE
                :where_cols
        )";

const ORACLE_MERGE: &str = "MERGE INTO :table :target

USING (
    SELECT
        :select_values
    FROM DUAL
) :source

ON (
    :on
)

WHEN MATCHED THEN
    UPDATE
    SET
        :update_cols
    WHERE
        :update_where_cols

WHEN NOT MATCHED THEN
    INSERT (
        :insert_cols
    )
    VALUES (
        :insert_values
    )";

/// Statement templates of one SQL dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    /// Name of the dialect
    pub name: &'static str,

    delete_from_table: &'static str,
    update_table: &'static str,
    insert_into_where_not_exists: &'static str,

    /// MERGE template, `None` when the database has no MERGE statement
    merge: Option<&'static str>,
}

impl Dialect {
    /// SQLite: no MERGE statement
    pub const SQLITE: Dialect = Dialect {
        name: "sqlite",
        delete_from_table: DELETE_FROM_TABLE,
        update_table: UPDATE_TABLE,
        insert_into_where_not_exists: INSERT_INTO_WHERE_NOT_EXISTS,
        merge: None,
    };

    /// Oracle: selects from DUAL and supports MERGE
    pub const ORACLE: Dialect = Dialect {
        name: "oracle",
        delete_from_table: DELETE_FROM_TABLE,
        update_table: UPDATE_TABLE,
        insert_into_where_not_exists: ORACLE_INSERT_INTO_WHERE_NOT_EXISTS,
        merge: Some(ORACLE_MERGE),
    };

    /// Whether the dialect has a MERGE statement
    pub fn supports_merge(&self) -> bool {
        self.merge.is_some()
    }

    /// Statement deleting all records of `table`
    pub fn delete_from_table_statement(&self, table: &str) -> String {
        render(self.delete_from_table, &[("table", table.to_string())])
    }

    /// UPDATE statement setting `update_cols` on the rows matching `where_cols`
    ///
    /// Every column is compared with or set to the placeholder of the same name.
    pub fn update_statement<S: AsRef<str>>(
        &self,
        table: &str,
        update_cols: &[S],
        where_cols: &[S],
    ) -> String {
        render(
            self.update_table,
            &[
                ("table", table.to_string()),
                (
                    "update_cols",
                    join(update_cols, &format!(",\n{}", STMT_SPACE), |c| {
                        format!("{} = :{}", c, c)
                    }),
                ),
                (
                    "where_cols",
                    join(where_cols, &format!(" AND\n{}", STMT_SPACE), |c| {
                        format!("{} = :{}", c, c)
                    }),
                ),
            ],
        )
    }

    /// INSERT statement adding a row only if no row matches `where_cols`
    pub fn insert_into_where_not_exists_statement<S: AsRef<str>>(
        &self,
        table: &str,
        insert_cols: &[S],
        where_cols: &[S],
    ) -> String {
        render(
            self.insert_into_where_not_exists,
            &[
                ("table", table.to_string()),
                (
                    "insert_cols",
                    join(insert_cols, &format!(",\n{}", STMT_SPACE), |c| c.to_string()),
                ),
                (
                    "select_values",
                    join(insert_cols, &format!(",\n{}", STMT_SPACE.repeat(2)), |c| {
                        format!(":{}", c)
                    }),
                ),
                (
                    "where_cols",
                    join(where_cols, &format!(" AND\n{}", STMT_SPACE.repeat(4)), |c| {
                        format!("{} = :{}", c, c)
                    }),
                ),
            ],
        )
    }

    /// MERGE statement updating rows that match `on_cols` and inserting the others
    ///
    /// With `omit_update_where_clause` every matched row is updated. Otherwise
    /// only rows where at least one of `update_cols` differs are updated.
    ///
    /// # Returns
    /// * `Err(SqlStatementNotSupported)` if the dialect has no MERGE statement
    pub fn merge_statement<S: AsRef<str>>(
        &self,
        table: &str,
        insert_cols: &[S],
        on_cols: &[S],
        update_cols: &[S],
        omit_update_where_clause: bool,
    ) -> FrameSqlResult<String> {
        let template = self.merge.ok_or_else(|| {
            FrameSqlError::SqlStatementNotSupported(format!(
                "the {} dialect does not support the MERGE statement. \
                 Try the similar upsert_table method instead.",
                self.name
            ))
        })?;

        let (t, s) = (MERGE_TARGET, MERGE_SOURCE);
        let sep2 = format!(",\n{}", STMT_SPACE.repeat(2));

        let mut template = template.to_string();
        let mut values = vec![
            ("table", table.to_string()),
            ("target", t.to_string()),
            ("source", s.to_string()),
            (
                "select_values",
                join(insert_cols, &sep2, |c| format!(":{} AS {}", c, c)),
            ),
            (
                "on",
                join(on_cols, &format!(" AND\n{}", STMT_SPACE), |c| {
                    format!("{}.{} = {}.{}", t, c, s, c)
                }),
            ),
            (
                "update_cols",
                join(update_cols, &sep2, |c| format!("{}.{} = {}.{}", t, c, s, c)),
            ),
            (
                "insert_cols",
                join(insert_cols, &sep2, |c| format!("{}.{}", t, c)),
            ),
            (
                "insert_values",
                join(insert_cols, &sep2, |c| format!("{}.{}", s, c)),
            ),
        ];

        if omit_update_where_clause {
            let clause = format!("{}WHERE\n{}:update_where_cols\n", STMT_SPACE, STMT_SPACE.repeat(2));
            template = template.replace(&clause, "");
        } else {
            values.push((
                "update_where_cols",
                join(
                    update_cols,
                    &format!(" OR\n{}", STMT_SPACE.repeat(2)),
                    |c| format!("{}.{} <> {}.{}", t, c, s, c),
                ),
            ));
        }

        Ok(render(&template, &values))
    }
}

fn join<S: AsRef<str>>(cols: &[S], sep: &str, f: impl Fn(&str) -> String) -> String {
    cols.iter()
        .map(|c| f(c.as_ref()))
        .collect::<Vec<_>>()
        .join(sep)
}

/// Fill the `:name` slots of a template in a single pass
///
/// Slots without a value are left as they are.
fn render(template: &str, values: &[(&str, String)]) -> String {
    let mut output = String::with_capacity(template.len() * 2);
    let mut rest = template;

    while let Some(pos) = rest.find(':') {
        output.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let len = after
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        let name = &after[..len];

        match values.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => output.push_str(value),
            None => {
                output.push(':');
                output.push_str(name);
            }
        }
        rest = &after[len..];
    }
    output.push_str(rest);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_statement() {
        assert_eq!(
            Dialect::SQLITE.delete_from_table_statement("Customer"),
            "DELETE FROM Customer"
        );
    }

    #[test]
    fn test_update_statement() {
        let stmt = Dialect::SQLITE.update_statement(
            "Customer",
            &["CustomerName", "BirthDate"],
            &["CustomerId", "Residence"],
        );
        assert_eq!(
            stmt,
            "UPDATE Customer
SET
    CustomerName = :CustomerName,
    BirthDate = :BirthDate
WHERE
    CustomerId = :CustomerId AND
    Residence = :Residence"
        );
    }

    #[test]
    fn test_insert_statement_sqlite() {
        let stmt = Dialect::SQLITE.insert_into_where_not_exists_statement(
            "Customer",
            &["CustomerId", "CustomerName"],
            &["CustomerId"],
        );
        assert_eq!(
            stmt,
            "INSERT INTO Customer (
    CustomerId,
    CustomerName
)
    SELECT
        :CustomerId,
        :CustomerName
    WHERE
        NOT EXISTS (
            SELECT
                1
            FROM Customer
            WHERE
                CustomerId = :CustomerId
        )"
        );
    }

    #[test]
    fn test_insert_statement_oracle_selects_from_dual() {
        let stmt =
            Dialect::ORACLE.insert_into_where_not_exists_statement("Customer", &["a"], &["a"]);
        assert!(stmt.contains("        :a\n    FROM DUAL\n    WHERE\n"));
    }

    #[test]
    fn test_merge_statement() {
        let stmt = Dialect::ORACLE
            .merge_statement(
                "Customer",
                &["CustomerId", "CustomerName", "IsAdventurer"],
                &["CustomerId"],
                &["CustomerName", "IsAdventurer"],
                false,
            )
            .unwrap();
        assert_eq!(
            stmt,
            "MERGE INTO Customer t

USING (
    SELECT
        :CustomerId AS CustomerId,
        :CustomerName AS CustomerName,
        :IsAdventurer AS IsAdventurer
    FROM DUAL
) s

ON (
    t.CustomerId = s.CustomerId
)

WHEN MATCHED THEN
    UPDATE
    SET
        t.CustomerName = s.CustomerName,
        t.IsAdventurer = s.IsAdventurer
    WHERE
        t.CustomerName <> s.CustomerName OR
        t.IsAdventurer <> s.IsAdventurer

WHEN NOT MATCHED THEN
    INSERT (
        t.CustomerId,
        t.CustomerName,
        t.IsAdventurer
    )
    VALUES (
        s.CustomerId,
        s.CustomerName,
        s.IsAdventurer
    )"
        );
    }

    #[test]
    fn test_merge_omits_update_where_clause() {
        let stmt = Dialect::ORACLE
            .merge_statement("Customer", &["a", "b"], &["a"], &["b"], true)
            .unwrap();
        assert!(stmt.contains("    SET\n        t.b = s.b\n\nWHEN NOT MATCHED THEN"));
        assert!(!stmt.contains("<>"));
    }

    #[test]
    fn test_merge_not_supported() {
        assert!(!Dialect::SQLITE.supports_merge());
        assert!(matches!(
            Dialect::SQLITE.merge_statement("t", &["a"], &["a"], &["a"], true),
            Err(FrameSqlError::SqlStatementNotSupported(_))
        ));
    }

    #[test]
    fn test_render_keeps_column_placeholders() {
        // A column named like a template slot is not expanded again
        let stmt = Dialect::SQLITE.update_statement("t", &["where_cols"], &["id"]);
        assert_eq!(stmt, "UPDATE t\nSET\n    where_cols = :where_cols\nWHERE\n    id = :id");
    }
}
