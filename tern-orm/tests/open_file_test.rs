use tern_orm::{Database, Entity, Model};

#[derive(Debug, Clone, Default, Entity)]
#[orm(table = "notes")]
struct Note {
    model: Model,
    body: String,
    pinned: bool,
}

#[tokio::test]
async fn test_open_creates_file_in_wal_mode() -> Result<(), Box<dyn std::error::Error>> {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir()?;
    let data_dir = dir.path().join("nested").join("data");

    let db = Database::builder().data_dir(&data_dir).open("notes.db").await?;
    assert!(data_dir.join("notes.db").exists());

    let mode: String = db.query("PRAGMA journal_mode").scalar().await?;
    assert_eq!(mode.to_lowercase(), "wal");

    db.close().await;
    Ok(())
}

#[tokio::test]
async fn test_records_survive_reopen() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;

    let id = {
        let db = Database::builder().data_dir(dir.path()).open("notes.db").await?;
        let notes = db.manage::<Note>().await?;
        let note = notes.insert(Note { body: "buy bread".to_string(), pinned: true, ..Default::default() }).await?;
        db.close().await;
        note.model.id
    };

    let db = Database::builder().data_dir(dir.path()).open("notes.db").await?;
    let notes = db.manage::<Note>().await?;

    let note = notes.get(&id).await?;
    assert_eq!(note.body, "buy bread");
    assert!(note.pinned);
    assert_eq!(notes.count().await?, 1);

    db.close().await;
    println!("Reopen test passed!");
    Ok(())
}

#[tokio::test]
async fn test_connect_with_url() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("url.db").display());

    let db = Database::connect(&url).await?;
    let notes = db.manage::<Note>().await?;
    notes.insert(Note { body: "hello".to_string(), ..Default::default() }).await?;
    assert_eq!(notes.count().await?, 1);

    db.close().await;
    Ok(())
}
