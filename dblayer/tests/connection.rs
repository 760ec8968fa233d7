use dblayer::{
    config::ConnectParams,
    driver::DriverRegistry,
    error::{DbResult, Error},
    syntax::OrderBy,
    value::Value,
    Connection, RecordSet,
};

mod test_utils;

#[test]
fn test_unknown_driver() {
    test_utils::setup_tracing(None);

    let registry = DriverRegistry::with_defaults();
    let params = ConnectParams::new("oracle", "blog");
    match Connection::init(&registry, &params) {
        Err(Error::UnknownDriver(name)) => assert_eq!(name, "oracle"),
        Err(error) => panic!("unexpected error: {error}"),
        Ok(_) => panic!("connected with an unknown driver"),
    }
}

#[test]
fn test_connection_info() -> DbResult<()> {
    test_utils::setup_tracing(None);
    let db = test_utils::TestDb::new()?;

    assert_eq!(db.driver(), "sqlite");
    assert_eq!(db.syntax(), "sqlite");
    assert_eq!(db.database(), ":memory:");
    assert!(db.version().starts_with('3'));
    Ok(())
}

#[test]
fn test_error_polling() -> DbResult<()> {
    test_utils::setup_tracing(None);
    let db = test_utils::TestDb::new()?;
    assert_eq!(db.error(), None);

    assert!(db.execute("INSERT INTO nope VALUES (1)").is_err());
    let message = db.error().expect("error must be kept");
    assert!(message.contains("nope"), "{message}");

    assert!(db.select("SELEC 1").is_err());
    assert!(db.error().is_some());

    db.execute("UPDATE post SET post_status = 1")?;
    assert_eq!(db.error(), None);
    assert_eq!(db.changes(), 3);
    Ok(())
}

#[test]
fn test_transactions() -> DbResult<()> {
    test_utils::setup_tracing(None);
    let db = test_utils::TestDb::new()?;
    let count = |db: &Connection| -> DbResult<Option<i64>> {
        let rs = db.select("SELECT COUNT(*) AS n FROM post")?;
        Ok(rs.f("n").and_then(Value::as_int))
    };

    db.begin()?;
    db.execute("DELETE FROM post WHERE post_id = 3")?;
    assert_eq!(count(&db)?, Some(2));
    db.rollback()?;
    assert_eq!(count(&db)?, Some(3));

    db.begin()?;
    db.execute("DELETE FROM post WHERE post_id = 3")?;
    db.commit()?;
    assert_eq!(count(&db)?, Some(2));
    Ok(())
}

#[test]
fn test_lock_and_vacuum() -> DbResult<()> {
    test_utils::setup_tracing(None);
    let db = test_utils::TestDb::new()?;

    db.write_lock("post")?;
    db.execute("DELETE FROM post")?;
    db.unlock()?;
    db.vacuum("post")?;

    assert!(db.select("SELECT * FROM post")?.is_empty());
    Ok(())
}

#[test]
fn test_escaping() -> DbResult<()> {
    test_utils::setup_tracing(None);
    let db = test_utils::TestDb::new()?;

    assert_eq!(db.escape("It's"), "It''s");
    assert_eq!(db.escape_str("It's"), "'It''s'");
    assert_eq!(db.escape_all(&["a'b", "c"]), ["a''b", "c"]);
    assert_eq!(db.escape_system("post"), "\"post\"");

    let title = db.escape_str("It's me");
    let rs = db.select(&format!("SELECT post_id FROM post WHERE post_title = {title}"))?;
    assert_eq!(rs.f("post_id"), Some(&Value::Int(2)));
    Ok(())
}

#[test]
fn test_fragments() -> DbResult<()> {
    test_utils::setup_tracing(None);
    let db = test_utils::TestDb::new()?;

    assert_eq!(db.limit(10u64), " LIMIT 10 ");
    assert_eq!(db.limit((20u64, 10u64)), " LIMIT 10 OFFSET 20 ");
    assert_eq!(db.limit([20u64, 10]), " LIMIT 10 OFFSET 20 ");

    assert_eq!(db.in_values(vec![1i64, 2, 3]), " IN (1,2,3) ");
    assert_eq!(db.in_values(vec!["a", "b'c"]), " IN ('a','b''c') ");
    assert_eq!(db.in_values(7i64), " IN (7) ");
    assert_eq!(db.in_values(None::<i64>), " IN (NULL) ");

    assert_eq!(
        db.order_by(&[OrderBy::field("post_dt").desc(), OrderBy::field("post_title").collate()]),
        " ORDER BY post_dt DESC,LOWER(post_title) "
    );
    assert_eq!(db.order_by(&[]), "");
    assert_eq!(db.lex_fields(&["a", "b"]), "LOWER(a),LOWER(b)");
    assert_eq!(db.concat(&["a", "'-'", "b"]), "a || '-' || b");
    assert_eq!(db.date_format("post_dt", "%Y-%m"), "strftime('%Y-%m',post_dt)");

    let sql = format!(
        "SELECT post_id, {} AS month FROM post WHERE post_id {}{}{}",
        db.date_format("post_dt", "%Y-%m"),
        db.in_values(vec![1i64, 2, 3]),
        db.order_by(&[OrderBy::field("post_id").desc()]),
        db.limit((1u64, 1u64)),
    );
    let rs = db.select(&sql)?;
    assert_eq!(rs.count(), 1);
    assert_eq!(rs.f("post_id"), Some(&Value::Int(2)));
    assert_eq!(rs.f("month"), Some(&Value::from("2024-02")));
    Ok(())
}
