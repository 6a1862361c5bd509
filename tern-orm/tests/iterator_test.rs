use tern_orm::{params, Database, Error};

async fn setup(rows: i64) -> Result<Database, Box<dyn std::error::Error>> {
    let _ = env_logger::builder().is_test(true).try_init();
    let db = Database::builder().max_connections(1).connect("sqlite::memory:").await?;

    db.query("CREATE TABLE numbers (n INTEGER NOT NULL, label TEXT)").exec().await?;
    for n in 1..=rows {
        db.query("INSERT INTO numbers (n, label) VALUES (?, ?)").bind(n).bind(format!("#{n}")).exec().await?;
    }
    Ok(db)
}

#[tokio::test]
async fn test_exec_reports_rows_affected() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup(5).await?;

    let changed = db.query("UPDATE numbers SET label = ? WHERE n > ?").args(params!["big", 3]).exec().await?;
    assert_eq!(changed, 2);

    let changed = db.query("DELETE FROM numbers WHERE n > 100").exec().await?;
    assert_eq!(changed, 0);
    Ok(())
}

#[tokio::test]
async fn test_for_each_visits_every_row_in_order() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup(4).await?;

    let mut seen = Vec::new();
    db.query("SELECT n, label FROM numbers ORDER BY n")
        .for_each(|row| {
            seen.push((row.get::<i64>(0)?, row.get::<String>(1)?));
            Ok(())
        })
        .await?;

    assert_eq!(seen, vec![(1, "#1".into()), (2, "#2".into()), (3, "#3".into()), (4, "#4".into())]);

    // No rows is not an error.
    let mut calls = 0;
    db.query("SELECT n FROM numbers WHERE n < 0")
        .for_each(|_| {
            calls += 1;
            Ok(())
        })
        .await?;
    assert_eq!(calls, 0);
    Ok(())
}

#[tokio::test]
async fn test_stop_ends_iteration_without_error() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup(10).await?;

    let mut seen = Vec::new();
    db.query("SELECT n FROM numbers ORDER BY n")
        .for_each(|row| {
            seen.push(row.get::<i64>(0)?);
            if seen.len() == 3 { Err(Error::Stop) } else { Ok(()) }
        })
        .await?;

    assert_eq!(seen, vec![1, 2, 3]);
    Ok(())
}

#[tokio::test]
async fn test_visitor_error_propagates() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup(10).await?;

    let mut calls = 0;
    let result = db
        .query("SELECT n FROM numbers ORDER BY n")
        .for_each(|row| {
            calls += 1;
            if row.get::<i64>(0)? == 2 { Err(Error::Shape("boom".to_string())) } else { Ok(()) }
        })
        .await;

    assert!(matches!(result, Err(Error::Shape(msg)) if msg == "boom"));
    assert_eq!(calls, 2);
    Ok(())
}

#[tokio::test]
async fn test_bad_sql_is_a_database_error() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup(1).await?;

    let result = db.query("SELECT nope FROM missing_table").for_each(|_| Ok(())).await;
    assert!(matches!(result, Err(Error::Database(_))));
    Ok(())
}

#[tokio::test]
async fn test_scan_and_scalar() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup(3).await?;

    let mut label = String::new();
    db.query("SELECT label FROM numbers WHERE n = ?")
        .bind(2)
        .scan(|row| {
            label = row.get(0)?;
            Ok(())
        })
        .await?;
    assert_eq!(label, "#2");

    let missing = db.query("SELECT label FROM numbers WHERE n = ?").bind(99).scan(|_| Ok(())).await;
    assert!(missing.unwrap_err().is_not_found());

    let total: i64 = db.query("SELECT sum(n) FROM numbers").scalar().await?;
    assert_eq!(total, 6);

    // Stopping inside scan is not an error either.
    db.query("SELECT 1").scan(|_| Err(Error::Stop)).await?;

    // NULL reads as the zero value.
    let nothing: String = db.query("SELECT NULL").scalar().await?;
    assert_eq!(nothing, "");
    Ok(())
}

#[tokio::test]
async fn test_page_boundaries() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup(5).await?;

    // (limit, rows visited, more)
    let cases = [(3, 3, true), (5, 5, false), (8, 5, false), (0, 0, true)];
    for (limit, visited, more) in cases {
        let mut seen = Vec::new();
        let has_more = db
            .query("SELECT n FROM numbers ORDER BY n")
            .page(limit, |row| {
                seen.push(row.get::<i64>(0)?);
                Ok(())
            })
            .await?;

        assert_eq!(seen.len(), visited, "limit {limit}");
        assert_eq!(has_more, more, "limit {limit}");
        assert_eq!(seen, (1..=visited as i64).collect::<Vec<_>>());
    }
    Ok(())
}

#[tokio::test]
async fn test_page_stop_reports_remaining_rows() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup(5).await?;

    let has_more = db.query("SELECT n FROM numbers ORDER BY n").page(10, |_| Err(Error::Stop)).await?;
    assert!(has_more);

    let has_more = db
        .query("SELECT n FROM numbers ORDER BY n")
        .page(10, |row| if row.get::<i64>(0)? == 5 { Err(Error::Stop) } else { Ok(()) })
        .await?;
    assert!(!has_more);
    Ok(())
}
