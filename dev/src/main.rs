use serde::{Deserialize, Serialize};
use tern_orm::{params, Database, Entity, Model, Pagination};

#[derive(Entity, Debug, Clone, Default, Serialize, Deserialize)]
#[orm(table = "ducks")]
struct Duck {
    model: Model,
    name: String,
    #[orm(default = "'mallard'")]
    breed: String,
    age: i32,
    #[serde(skip)]
    #[orm(skip)]
    mood: String,
}

#[derive(Entity, Debug, Clone, Default, Serialize, Deserialize)]
#[orm(table = "ponds")]
struct Pond {
    model: Model,
    label: String,
    depth: f64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let name = std::env::var("DATABASE_NAME").unwrap_or_else(|_| "ducks.db".to_string());

    // Open the database file and register every entity type
    let db = Database::open(&name).await?;
    db.migrator().register::<Duck>().register::<Pond>().run().await?;
    log::info!("registered {} entity types", db.registered().len());

    let ducks = db.manage::<Duck>().await?;
    let ponds = db.manage::<Pond>().await?;

    // Insert
    let donald = ducks
        .insert(Duck { name: "Donald".to_string(), breed: "pekin".to_string(), age: 7, ..Default::default() })
        .await?;
    println!("Inserted duck: {} ({})", donald.name, donald.model.id);

    let pond = ponds.insert(Pond { label: "north".to_string(), depth: 2.5, ..Default::default() }).await?;
    println!("Inserted pond: {}", pond.label);

    // Query
    let pekins = ducks.search("WHERE breed = ? ORDER BY name", params!["pekin"]).await?;
    for duck in &pekins {
        println!("Pekin: {}", serde_json::to_string(duck).unwrap_or_default());
    }

    let mut found = ducks.find("WHERE name = ?", params!["Donald"]).await?;
    println!("Found duck: {:?}", found);

    // Update
    found.age += 1;
    ducks.update(&mut found).await?;
    println!("Updated duck at {}", found.model.updated_at);

    let page = Pagination::new(0, 10).paginate(&ducks, "ORDER BY name", params![]).await?;
    println!("{} ducks on the first page, more: {}", page.data.len(), page.more);

    // Delete
    let removed = ducks.delete(&found).await?;
    println!("Deleted {} duck(s), {} left", removed, ducks.count().await?);

    db.close().await;
    Ok(())
}
