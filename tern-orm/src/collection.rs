use std::marker::PhantomData;

use chrono::{SubsecRound, Utc};
use uuid::Uuid;

use crate::{store::Cursor, Database, Entity, Error, Result, Value};

/// Typed CRUD access to the table of one entity type.
///
/// A collection only remembers the database it is bound to; it holds no rows
/// and caches nothing, so it is cheap to clone and meant to live as long as the
/// application.
///
/// # Example
///
/// ```rust,ignore
/// let ducks = db.manage::<Duck>().await?;
///
/// let duck = ducks.insert(Duck { name: "Donald".into(), ..Default::default() }).await?;
/// let found = ducks.find("WHERE name = ?", params!["Donald"]).await?;
/// assert_eq!(found.model.id, duck.model.id);
/// ```
pub struct Collection<E> {
    db: Database,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Collection<E> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), _entity: PhantomData }
    }
}

impl<E> std::fmt::Debug for Collection<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection").field("entity", &std::any::type_name::<E>()).finish()
    }
}

impl<E: Entity> Collection<E> {
    /// Registers `E` with `db` and returns its collection.
    pub async fn manage(db: &Database) -> Result<Self> {
        db.register::<E>().await?;
        Ok(Self::bind(db))
    }

    /// Returns a collection without touching the schema. The table must have
    /// been registered already.
    pub fn bind(db: &Database) -> Self {
        Self { db: db.clone(), _entity: PhantomData }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// A zero-valued record; nothing is persisted.
    #[allow(clippy::new_ret_no_self)]
    pub fn new(&self) -> E {
        E::default()
    }

    /// Number of rows in the table.
    pub async fn count(&self) -> Result<i64> {
        self.db.query(format!("SELECT count(*) FROM {}", crate::schema::quote(E::table()))).scalar::<i64>().await
    }

    /// The record with identifier `id`, or [`Error::NotFound`].
    pub async fn get(&self, id: &str) -> Result<E> {
        let mut ent = self.new();
        self.db.get(id, &mut ent).await?;
        Ok(ent)
    }

    /// Inserts `ent` and returns it as stored.
    ///
    /// A record without an identifier gets a fresh UUID and both timestamps set
    /// to the current instant. A record that already carries an identifier is
    /// inserted unchanged, leaving unset timestamps to the table defaults.
    pub async fn insert(&self, mut ent: E) -> Result<E> {
        let model = ent.model_mut();
        if model.id.is_empty() {
            let now = Utc::now().trunc_subsecs(3);
            model.id = Uuid::new_v4().to_string();
            model.created_at = now;
            model.updated_at = now;
        }

        self.db.insert(&mut ent).await?;
        Ok(ent)
    }

    pub async fn update(&self, ent: &mut E) -> Result<()> {
        self.db.update(ent).await
    }

    pub async fn delete(&self, ent: &E) -> Result<u64> {
        self.db.delete(ent).await
    }

    /// A cursor over the rows matching `clause`.
    pub fn cursor(&self, clause: &str, args: Vec<Value>) -> Cursor<'_, E> {
        self.db.cursor::<E>(clause, args)
    }

    /// Every record matching `clause`, in result order. An empty clause matches
    /// the whole table.
    pub async fn search(&self, clause: &str, args: Vec<Value>) -> Result<Vec<E>> {
        let mut found = Vec::new();
        self.cursor(clause, args)
            .iter(|ent| {
                found.push(ent);
                Ok(())
            })
            .await?;
        Ok(found)
    }

    /// The first record matching `clause`, or [`Error::NotFound`]. Only the
    /// first row is read.
    pub async fn find(&self, clause: &str, args: Vec<Value>) -> Result<E> {
        let mut found = None;
        self.cursor(clause, args)
            .iter(|ent| {
                found = Some(ent);
                Err(Error::Stop)
            })
            .await?;
        found.ok_or(Error::NotFound)
    }

    /// Up to `limit` records matching `clause`, plus whether more matched.
    pub async fn page(&self, clause: &str, args: Vec<Value>, limit: usize) -> Result<(Vec<E>, bool)> {
        let mut found = Vec::new();
        let more = self
            .cursor(clause, args)
            .page(limit, |ent| {
                found.push(ent);
                Ok(())
            })
            .await?;
        Ok((found, more))
    }
}
