use dblayer::{error::DbResult, value::Value, RecordSet};

mod test_utils;

#[test]
fn test_select_metadata() -> DbResult<()> {
    test_utils::setup_tracing(None);
    let db = test_utils::TestDb::new()?;

    let rs = db.select("SELECT post_id, post_title, post_id * 2 AS twice FROM post")?;
    assert_eq!(rs.count(), 3);
    assert_eq!(rs.columns(), ["post_id", "post_title", "twice"]);
    assert_eq!(rs.column_types(), ["integer", "text", ""]);

    // The first row is readable before any fetch.
    assert_eq!(rs.index(), 0);
    assert_eq!(rs.f("post_title"), Some(&Value::from("Hello")));
    assert_eq!(rs.f(2usize), Some(&Value::Int(2)));
    assert_eq!(rs.f("nope"), None);
    Ok(())
}

#[test]
fn test_fetch_visits_every_row_in_order() -> DbResult<()> {
    test_utils::setup_tracing(None);
    let db = test_utils::TestDb::new()?;
    let mut rs = db.select("SELECT post_id FROM post ORDER BY post_id")?;

    let mut seen = Vec::new();
    while rs.fetch() {
        assert!(rs.valid());
        seen.push((rs.index(), rs.f("post_id").and_then(Value::as_int)));
    }
    assert_eq!(seen, [(0, Some(1)), (1, Some(2)), (2, Some(3))]);

    // The loop reset the record, so it can run again.
    assert_eq!(rs.index(), 0);
    assert!(!rs.valid());
    assert_eq!(rs.iter().count(), 3);
    Ok(())
}

#[test]
fn test_navigation_stays_in_bounds() -> DbResult<()> {
    test_utils::setup_tracing(None);
    let db = test_utils::TestDb::new()?;
    let mut rs = db.select("SELECT post_id FROM post ORDER BY post_id")?;

    assert!(rs.is_start());
    assert!(!rs.move_prev());
    assert!(rs.move_end());
    assert!(rs.is_end());
    assert_eq!(rs.f("post_id"), Some(&Value::Int(3)));

    assert!(!rs.move_next());
    assert!(!rs.seek(3));
    assert!(!rs.seek(-1));
    assert_eq!(rs.index(), 2);

    assert!(rs.seek(1));
    assert_eq!(rs.key(), 1);
    assert!(rs.move_start());
    assert_eq!(rs.f("post_id"), Some(&Value::Int(1)));
    Ok(())
}

#[test]
fn test_empty_result() -> DbResult<()> {
    test_utils::setup_tracing(None);
    let db = test_utils::TestDb::new()?;

    let mut rs = db.select("SELECT post_id FROM post WHERE post_id > 100")?;
    assert!(rs.is_empty());
    assert_eq!(rs.row(), None);
    assert!(!rs.fetch());
    assert!(!rs.exists("post_id"));

    let mut rs = db.null_record();
    assert!(rs.is_empty());
    assert!(rs.columns().is_empty());
    assert!(!rs.rewind());
    Ok(())
}

#[test]
fn test_null_and_quoted_values() -> DbResult<()> {
    test_utils::setup_tracing(None);
    let db = test_utils::TestDb::new()?;

    let mut rs = db.select("SELECT post_title, post_dt FROM post WHERE post_id IN (2, 3) ORDER BY post_id")?;
    assert_eq!(rs.f("post_title"), Some(&Value::from("It's me")));
    assert!(rs.move_next());
    assert!(rs.exists("post_dt"));
    assert_eq!(rs.f("post_dt"), Some(&Value::Null));
    Ok(())
}

#[test]
fn test_to_static_keeps_rows() -> DbResult<()> {
    test_utils::setup_tracing(None);
    let db = test_utils::TestDb::new()?;

    let mut rs = db.select("SELECT post_id, post_title FROM post ORDER BY post_id")?;
    rs.seek(2);
    let rows = rs.rows();
    assert_eq!(rows.len(), 3);
    assert_eq!(rs.f("post_id"), Some(&Value::Int(3)));

    let columns = rs.columns().to_vec();
    let mut seen = Vec::new();
    for i in 0..rs.count() {
        assert!(rs.seek(i as isize));
        seen.push(rs.row().cloned());
    }

    let st = rs.to_static();
    assert_eq!(st.rows(), rows);
    assert_eq!(st.columns(), columns);
    assert_eq!(st.index(), 0);
    for (i, row) in st.rows().iter().enumerate() {
        assert_eq!(seen[i].as_ref(), Some(row), "row {i}");
        for name in &columns {
            assert_eq!(seen[i].as_ref().and_then(|r| r.get(name)), Some(&row[name.as_str()]));
        }
    }
    Ok(())
}

#[test]
fn test_moves_inside_fetch_loop() -> DbResult<()> {
    test_utils::setup_tracing(None);
    let db = test_utils::TestDb::new()?;
    db.execute("INSERT INTO post (post_id, post_title) VALUES (4, 'Four')")?;
    let mut rs = db.select("SELECT post_id FROM post ORDER BY post_id")?;

    assert!(rs.fetch());
    assert_eq!(rs.index(), 0);
    assert!(rs.move_next());
    assert!(rs.fetch());
    assert_eq!(rs.index(), 2);
    assert_eq!(rs.f("post_id"), Some(&Value::Int(3)));

    assert!(rs.move_prev());
    assert!(rs.fetch());
    assert_eq!(rs.index(), 2);

    assert!(rs.fetch());
    assert_eq!(rs.index(), 3);
    assert!(!rs.fetch());
    assert_eq!(rs.index(), 0);
    Ok(())
}
