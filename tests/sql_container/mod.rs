//! Tests of named statements and placeholder replacement against SQLite

use framesql::{
    replace_placeholders, DatabaseManager, FrameSqlError, LoadOptions, Placeholder, SaveOptions,
    SqlContainer, SqliteDb, Value,
};

use crate::helpers::{create_custom_csv, create_temp_dir, items};

const SHOP_SQL: &str = "\
-- Statements of the garden shop

-- name: items_by_id
SELECT ItemName
FROM Item
WHERE ItemId IN (:ItemId)
ORDER BY ItemId;

-- name: rename_item
UPDATE Item SET ItemName = :ItemName WHERE ItemId = :ItemId;
";

fn shop_db() -> SqliteDb {
    SqliteDb::builder(framesql::sqlite::MEMORY)
        .container(SqlContainer::from_sql_str(SHOP_SQL).unwrap())
        .build()
        .unwrap()
}

#[test]
fn test_container_from_file() {
    let dir = create_temp_dir().unwrap();
    let path = create_custom_csv(dir.path(), "shop.sql", SHOP_SQL).unwrap();

    let container = SqlContainer::from_sql_file(&path).unwrap();
    assert_eq!(container.names(), ["items_by_id", "rename_item"]);
    assert_eq!(
        container.placeholders("rename_item").unwrap(),
        [":ItemName", ":ItemId"]
    );
    assert!(container.require(&["items_by_id"]).is_ok());
    assert!(matches!(
        container.require(&["items_by_id", "delete_item"]),
        Err(FrameSqlError::StatementNotFound(missing)) if missing == "delete_item"
    ));
}

#[test]
fn test_expanded_in_clause_binds_values() {
    let db = shop_db();
    let mut conn = db.connect().unwrap();
    db.save_df(&items(), "Item", conn.as_mut(), &SaveOptions::default())
        .unwrap();

    let stmt = db.statement("items_by_id").unwrap();
    let (stmt, params) =
        replace_placeholders(stmt, &[Placeholder::new(":ItemId", vec![1, 3])]).unwrap();
    assert!(stmt.contains("WHERE ItemId IN (:v0, :v1)"));

    let df = db
        .load_table(&stmt, conn.as_mut(), Some(&params), &LoadOptions::default())
        .unwrap();
    assert_eq!(
        df.column("ItemName").unwrap(),
        [&Value::from("Pot"), &Value::from("Shovel")]
    );
}

#[test]
fn test_named_update_statement() {
    let db = shop_db();
    let mut conn = db.connect().unwrap();
    db.save_df(&items(), "Item", conn.as_mut(), &SaveOptions::default())
        .unwrap();

    let (stmt, params) = replace_placeholders(
        db.statement("rename_item").unwrap(),
        &[
            Placeholder::new(":ItemName", "Flower pot"),
            Placeholder::new(":ItemId", 1),
        ],
    )
    .unwrap();
    let updated = db.execute(&stmt, conn.as_mut(), Some(&params)).unwrap();
    assert_eq!(updated.affected(), Some(1));

    let df = db
        .load_table(
            "SELECT ItemName FROM Item WHERE ItemId = 1",
            conn.as_mut(),
            None,
            &LoadOptions::default(),
        )
        .unwrap();
    assert_eq!(df.value(0, "ItemName"), Some(&Value::from("Flower pot")));

    assert!(matches!(
        db.statement("delete_item"),
        Err(FrameSqlError::StatementNotFound(_))
    ));
}
