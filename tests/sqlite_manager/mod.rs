//! Tests of the SQLite database manager against database files

use chrono::NaiveDate;

use framesql::connection::Params;
use framesql::datetime::ParseDates;
use framesql::{
    ColumnSelection, DataFrame, DataType, DatabaseManager, FrameSqlError, IfExists, InsertMethod,
    LoadOptions, SaveOptions, StatementResult, Transaction, UpsertOptions, UpsertResult, Value,
};

use crate::helpers::{create_temp_dir, file_db, items};

fn load_items(db: &impl DatabaseManager, conn: &mut dyn framesql::Connection) -> DataFrame {
    db.load_table(
        "SELECT * FROM Item ORDER BY ItemId",
        conn,
        None,
        &LoadOptions::default(),
    )
    .unwrap()
}

#[test]
fn test_save_and_load_round_trip() {
    let dir = create_temp_dir().unwrap();
    let db = file_db(dir.path());
    let mut conn = db.connect().unwrap();

    db.save_df(&items(), "Item", conn.as_mut(), &SaveOptions::default())
        .unwrap();

    let options = LoadOptions {
        index_col: vec!["ItemId".to_string()],
        ..LoadOptions::default()
    };
    let loaded = db.load_table("Item", conn.as_mut(), None, &options).unwrap();

    assert_eq!(loaded.index_names(), ["ItemId"]);
    assert_eq!(loaded.columns(), ["ItemName", "Price"]);
    assert_eq!(loaded.rows(), items().rows());
}

#[test]
fn test_load_selected_columns_with_params() {
    let dir = create_temp_dir().unwrap();
    let db = file_db(dir.path());
    let mut conn = db.connect().unwrap();
    db.save_df(&items(), "Item", conn.as_mut(), &SaveOptions::default())
        .unwrap();

    let options = LoadOptions {
        columns: vec!["ItemName".to_string()],
        ..LoadOptions::default()
    };
    let names = db.load_table("Item", conn.as_mut(), None, &options).unwrap();
    assert_eq!(names.columns(), ["ItemName"]);
    assert_eq!(names.row_count(), 3);

    let mut params = Params::new();
    params.insert("min_price".to_string(), Value::Float(10.0));
    let expensive = db
        .load_table(
            "SELECT ItemName FROM Item WHERE Price > :min_price ORDER BY Price",
            conn.as_mut(),
            Some(&params),
            &LoadOptions::default(),
        )
        .unwrap();
    assert_eq!(
        expensive.column("ItemName").unwrap(),
        [&Value::from("Rake"), &Value::from("Shovel")]
    );

    let missing = db.load_table(
        "SELECT * FROM Customer",
        conn.as_mut(),
        None,
        &LoadOptions::default(),
    );
    assert!(matches!(missing, Err(FrameSqlError::LoadTable(_))));
}

#[test]
fn test_load_parses_dates_and_converts_types() {
    let dir = create_temp_dir().unwrap();
    let db = file_db(dir.path());
    let mut conn = db.connect().unwrap();

    let ordered = NaiveDate::from_ymd_opt(2023, 5, 17)
        .unwrap()
        .and_hms_opt(14, 30, 0)
        .unwrap();
    let orders = DataFrame::from_rows(
        vec!["OrderId", "OrderTimestamp", "Quantity"],
        vec![vec![1.into(), ordered.into(), "4".into()]],
    )
    .unwrap();
    let save = SaveOptions {
        index: false,
        ..SaveOptions::default()
    };
    db.save_df(&orders, "Orders", conn.as_mut(), &save).unwrap();

    let mut parse_dates = ParseDates::new();
    parse_dates.insert("OrderTimestamp".to_string(), None);
    let options = LoadOptions {
        parse_dates,
        dtypes: vec![("Quantity".to_string(), DataType::Integer)],
        ..LoadOptions::default()
    };
    let loaded = db
        .load_table("SELECT * FROM Orders", conn.as_mut(), None, &options)
        .unwrap();

    assert_eq!(loaded.value(0, "OrderTimestamp"), Some(&Value::DateTime(ordered)));
    assert_eq!(loaded.value(0, "Quantity"), Some(&Value::Integer(4)));
}

#[test]
fn test_load_converts_to_named_time_zone() {
    let dir = create_temp_dir().unwrap();
    let db = file_db(dir.path());
    let mut conn = db.connect().unwrap();

    let orders = DataFrame::from_rows(
        vec!["OrderId", "OrderTimestamp"],
        vec![
            vec![1.into(), "2023-01-17 14:30:00".into()],
            vec![2.into(), "2023-05-17 14:30:00".into()],
        ],
    )
    .unwrap();
    let save = SaveOptions {
        index: false,
        ..SaveOptions::default()
    };
    db.save_df(&orders, "Orders", conn.as_mut(), &save).unwrap();

    let mut parse_dates = ParseDates::new();
    parse_dates.insert("OrderTimestamp".to_string(), None);
    let options = LoadOptions {
        parse_dates,
        localize_tz: Some("UTC".to_string()),
        target_tz: Some("CET".to_string()),
        ..LoadOptions::default()
    };
    let loaded = db
        .load_table("SELECT * FROM Orders ORDER BY OrderId", conn.as_mut(), None, &options)
        .unwrap();

    let timestamps: Vec<String> = loaded
        .column("OrderTimestamp")
        .unwrap()
        .iter()
        .map(|v| v.to_string())
        .collect();
    assert_eq!(
        timestamps,
        ["2023-01-17 15:30:00+01:00", "2023-05-17 16:30:00+02:00"]
    );

    let unknown = LoadOptions {
        localize_tz: Some("Mars/Olympus".to_string()),
        ..options
    };
    assert!(db
        .load_table("Orders", conn.as_mut(), None, &unknown)
        .is_err());
}

#[test]
fn test_load_table_chunks() {
    let dir = create_temp_dir().unwrap();
    let db = file_db(dir.path());
    let mut conn = db.connect().unwrap();
    db.save_df(&items(), "Item", conn.as_mut(), &SaveOptions::default())
        .unwrap();

    let options = LoadOptions {
        index_col: vec!["ItemId".to_string()],
        ..LoadOptions::default()
    };
    let chunks: Vec<DataFrame> = db
        .load_table_chunks("Item", conn.as_mut(), None, &options, 2)
        .unwrap()
        .collect();
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].row_count(), 2);
    assert_eq!(chunks[1].index_names(), ["ItemId"]);
    assert_eq!(chunks[1].rows()[0][0], Value::Integer(3));
}

#[test]
fn test_save_if_exists() {
    let dir = create_temp_dir().unwrap();
    let db = file_db(dir.path());
    let mut conn = db.connect().unwrap();

    let replace = SaveOptions {
        if_exists: IfExists::Replace,
        ..SaveOptions::default()
    };
    assert!(matches!(
        db.save_df(&items(), "Item", conn.as_mut(), &replace),
        Err(FrameSqlError::DeleteFromTable(_))
    ));

    db.save_df(&items(), "Item", conn.as_mut(), &SaveOptions::default())
        .unwrap();
    db.save_df(&items(), "Item", conn.as_mut(), &SaveOptions::default())
        .unwrap();
    assert_eq!(load_items(&db, conn.as_mut()).row_count(), 6);

    db.save_df(&items(), "Item", conn.as_mut(), &replace).unwrap();
    assert_eq!(load_items(&db, conn.as_mut()).row_count(), 3);

    let fail = SaveOptions {
        if_exists: IfExists::Fail,
        ..SaveOptions::default()
    };
    assert!(matches!(
        db.save_df(&items(), "Item", conn.as_mut(), &fail),
        Err(FrameSqlError::TableExists(_))
    ));
}

#[test]
fn test_replace_recreates_table_with_new_columns() {
    let dir = create_temp_dir().unwrap();
    let db = file_db(dir.path());
    let mut conn = db.connect().unwrap();
    let save = SaveOptions {
        index: false,
        ..SaveOptions::default()
    };

    let first = DataFrame::from_rows(vec!["a", "b"], vec![vec![1.into(), "x".into()]]).unwrap();
    db.save_df(&first, "Pair", conn.as_mut(), &save).unwrap();

    let second = DataFrame::from_rows(
        vec!["a", "c"],
        vec![vec![2.into(), 2.5.into()], vec![3.into(), 3.5.into()]],
    )
    .unwrap();
    let replace = SaveOptions {
        if_exists: IfExists::Replace,
        ..save
    };
    db.save_df(&second, "Pair", conn.as_mut(), &replace).unwrap();

    let loaded = db
        .load_table("SELECT * FROM Pair ORDER BY a", conn.as_mut(), None, &LoadOptions::default())
        .unwrap();
    assert_eq!(loaded.columns(), ["a", "c"]);
    assert_eq!(loaded.row_count(), 2);
    assert_eq!(loaded.value(1, "c"), Some(&Value::Float(3.5)));
}

#[test]
fn test_save_multi_insert_in_chunks() {
    let dir = create_temp_dir().unwrap();
    let db = file_db(dir.path());
    let mut conn = db.connect().unwrap();

    let options = SaveOptions {
        method: InsertMethod::Multi,
        chunksize: Some(2),
        ..SaveOptions::default()
    };
    db.save_df(&items(), "Item", conn.as_mut(), &options).unwrap();
    let loaded = load_items(&db, conn.as_mut());
    assert_eq!(loaded.row_count(), 3);
    assert_eq!(loaded.value(2, "ItemName"), Some(&Value::from("Shovel")));
}

#[test]
fn test_save_rolled_back_with_transaction() {
    let dir = create_temp_dir().unwrap();
    let db = file_db(dir.path());
    let mut conn = db.connect().unwrap();

    {
        let mut tx = Transaction::begin(conn.as_mut()).unwrap();
        db.save_df(&items(), "Item", &mut *tx, &SaveOptions::default())
            .unwrap();
        assert!(tx.table_exists("Item").unwrap());
    }
    assert!(!conn.table_exists("Item").unwrap());

    let mut tx = Transaction::begin(conn.as_mut()).unwrap();
    db.save_df(&items(), "Item", &mut *tx, &SaveOptions::default())
        .unwrap();
    tx.commit().unwrap();
    assert!(conn.table_exists("Item").unwrap());
}

#[test]
fn test_upsert_updates_and_inserts() {
    let dir = create_temp_dir().unwrap();
    let db = file_db(dir.path());
    let mut conn = db.connect().unwrap();
    db.save_df(&items(), "Item", conn.as_mut(), &SaveOptions::default())
        .unwrap();

    let mut changes = DataFrame::from_rows(
        vec!["ItemId", "ItemName", "Price"],
        vec![
            vec![2.into(), "Rake".into(), 13.0.into()],
            vec![4.into(), "Hoe".into(), 9.5.into()],
        ],
    )
    .unwrap();
    changes.set_index(&["ItemId"]).unwrap();

    let options = UpsertOptions {
        where_cols: vec!["ItemId".to_string()],
        update_index_cols: ColumnSelection::All,
        ..UpsertOptions::default()
    };
    let result = db
        .upsert_table(&changes, "Item", conn.as_mut(), &options)
        .unwrap();
    assert_eq!(
        result,
        UpsertResult::Executed {
            updated: 1,
            inserted: Some(1)
        }
    );

    let loaded = load_items(&db, conn.as_mut());
    assert_eq!(loaded.row_count(), 4);
    assert_eq!(loaded.value(1, "Price"), Some(&Value::Float(13.0)));
    assert_eq!(loaded.value(3, "ItemName"), Some(&Value::from("Hoe")));
}

#[test]
fn test_upsert_update_only() {
    let dir = create_temp_dir().unwrap();
    let db = file_db(dir.path());
    let mut conn = db.connect().unwrap();
    db.save_df(&items(), "Item", conn.as_mut(), &SaveOptions::default())
        .unwrap();

    let mut changes = DataFrame::from_rows(
        vec!["ItemId", "Price"],
        vec![
            vec![1.into(), 2.0.into()],
            vec![5.into(), 7.0.into()],
        ],
    )
    .unwrap();
    changes.set_index(&["ItemId"]).unwrap();

    let options = UpsertOptions {
        where_cols: vec!["ItemId".to_string()],
        update_only: true,
        ..UpsertOptions::default()
    };
    let result = db
        .upsert_table(&changes, "Item", conn.as_mut(), &options)
        .unwrap();
    assert_eq!(
        result,
        UpsertResult::Executed {
            updated: 1,
            inserted: None
        }
    );

    let loaded = load_items(&db, conn.as_mut());
    assert_eq!(loaded.row_count(), 3);
    assert_eq!(loaded.value(0, "Price"), Some(&Value::Float(2.0)));
}

#[test]
fn test_execute_returns_rows_or_affected_count() {
    let dir = create_temp_dir().unwrap();
    let db = file_db(dir.path());
    let mut conn = db.connect().unwrap();
    db.save_df(&items(), "Item", conn.as_mut(), &SaveOptions::default())
        .unwrap();

    let deleted = db
        .execute("DELETE FROM Item WHERE Price < 15", conn.as_mut(), None)
        .unwrap();
    assert_eq!(deleted, StatementResult::Affected(2));

    let rows = db
        .execute("SELECT ItemName FROM Item", conn.as_mut(), None)
        .unwrap()
        .into_rows()
        .unwrap();
    assert_eq!(rows.value(0, "ItemName"), Some(&Value::from("Shovel")));

    db.delete_all_records_from_table("Item", conn.as_mut())
        .unwrap();
    assert!(load_items(&db, conn.as_mut()).is_empty());
}

#[test]
fn test_execute_insert_with_returning_word_in_literal() {
    let dir = create_temp_dir().unwrap();
    let db = file_db(dir.path());
    let mut conn = db.connect().unwrap();

    db.execute("CREATE TABLE Note (note TEXT)", conn.as_mut(), None)
        .unwrap();
    let inserted = db
        .execute(
            "INSERT INTO Note (note) VALUES ('returning customer')",
            conn.as_mut(),
            None,
        )
        .unwrap();
    assert_eq!(inserted, StatementResult::Affected(1));

    let returned = db
        .execute(
            "INSERT INTO Note (note) VALUES ('new customer') RETURNING note",
            conn.as_mut(),
            None,
        )
        .unwrap()
        .into_rows()
        .unwrap();
    assert_eq!(returned.value(0, "note"), Some(&Value::from("new customer")));
}
