use tern_orm::{ColumnKind, Database, Entity, Model};

#[derive(Debug, Clone, Default, PartialEq)]
struct Address {
    street: String,
}

#[derive(Debug, Clone, Default, PartialEq, Entity)]
struct Sample {
    model: Model,
    text: String,
    tiny: i8,
    small: i16,
    medium: i32,
    large: i64,
    native: isize,
    byte: u8,
    ushort: u16,
    uint: u32,
    ulong: u64,
    count: usize,
    ratio: f32,
    precise: f64,
    flag: bool,
    blob: Vec<u8>,
    letter: char,
    // Not persisted
    nickname: Option<String>,
    boxed: Box<i32>,
    address: Address,
    #[orm(skip)]
    scratch: String,
}

#[test]
fn test_column_layout() {
    let columns = Sample::columns();
    let names: Vec<_> = columns.iter().map(|c| c.name).collect();
    assert_eq!(
        names,
        vec![
            "text", "tiny", "small", "medium", "large", "native", "byte", "ushort", "uint", "ulong", "count", "ratio",
            "precise", "flag", "blob", "letter"
        ]
    );

    let kinds: Vec<_> = columns.iter().map(|c| c.kind).collect();
    assert_eq!(kinds[0], ColumnKind::Text);
    assert!(kinds[1..11].iter().all(|k| *k == ColumnKind::Integer));
    assert_eq!(kinds[11], ColumnKind::Real);
    assert_eq!(kinds[12], ColumnKind::Real);
    assert_eq!(kinds[13], ColumnKind::Boolean);
    assert_eq!(kinds[14], ColumnKind::Any);
    assert_eq!(kinds[15], ColumnKind::Text);

    assert_eq!(Sample::table(), "sample");
}

#[tokio::test]
async fn test_round_trip_every_kind() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::builder().max_connections(1).connect("sqlite::memory:").await?;
    let samples = db.manage::<Sample>().await?;

    let original = Sample {
        text: "quack 🦆".to_string(),
        tiny: i8::MIN,
        small: -1234,
        medium: 70_000,
        large: i64::MAX,
        native: -42,
        byte: u8::MAX,
        ushort: 65_000,
        uint: u32::MAX,
        ulong: u64::MAX,
        count: usize::MAX,
        ratio: 1.5,
        precise: std::f64::consts::PI,
        flag: true,
        blob: vec![0, 1, 2, 254, 255],
        letter: 'é',
        nickname: Some("not stored".to_string()),
        boxed: Box::new(9),
        address: Address { street: "Pond Lane".to_string() },
        scratch: "not stored".to_string(),
        ..Default::default()
    };

    let inserted = samples.insert(original.clone()).await?;
    let fetched = samples.get(&inserted.model.id).await?;

    assert_eq!(fetched.model, inserted.model);
    assert!(fetched.model.created_at.timestamp() > 0);
    assert!(fetched.model.created_at <= fetched.model.updated_at);

    assert_eq!(fetched.text, original.text);
    assert_eq!(fetched.tiny, original.tiny);
    assert_eq!(fetched.small, original.small);
    assert_eq!(fetched.medium, original.medium);
    assert_eq!(fetched.large, original.large);
    assert_eq!(fetched.native, original.native);
    assert_eq!(fetched.byte, original.byte);
    assert_eq!(fetched.ushort, original.ushort);
    assert_eq!(fetched.uint, original.uint);
    assert_eq!(fetched.ulong, original.ulong);
    assert_eq!(fetched.count, original.count);
    assert_eq!(fetched.ratio, original.ratio);
    assert_eq!(fetched.precise, original.precise);
    assert_eq!(fetched.flag, original.flag);
    assert_eq!(fetched.blob, original.blob);
    assert_eq!(fetched.letter, original.letter);

    // Skipped fields come back at their zero value.
    assert_eq!(fetched.nickname, None);
    assert_eq!(*fetched.boxed, 0);
    assert_eq!(fetched.address, Address::default());
    assert_eq!(fetched.scratch, "");

    assert_eq!(samples.count().await?, 1);

    println!("Round trip test passed!");
    Ok(())
}
