use crate::{database::Database, model::Entity, Result};
use futures::future::BoxFuture;

/// Type alias for registration tasks queued on a [`Migrator`].
///
/// These tasks are closures that take a `Database` connection and return a future.
pub type MigrationTask = Box<dyn Fn(Database) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Startup registration of entity types.
///
/// Queues one registration per entity type and runs them in order, so an
/// application can bootstrap every table in one place and decide for itself
/// whether a failure aborts startup.
pub struct Migrator<'a> {
    pub(crate) db: &'a Database,
    pub(crate) tasks: Vec<MigrationTask>,
}

impl<'a> Migrator<'a> {
    /// Creates a new Migrator instance associated with a Database.
    pub fn new(db: &'a Database) -> Self {
        Self { db, tasks: Vec::new() }
    }

    /// Queues the registration of `T`.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// db.migrator()
    ///   .register::<User>()
    ///   .register::<Duck>()
    ///   .run()
    ///   .await?;
    /// ```
    pub fn register<T: Entity>(mut self) -> Self {
        let task = Box::new(|db: Database| -> BoxFuture<'static, Result<()>> {
            Box::pin(async move { db.register::<T>().await })
        });
        self.tasks.push(task);
        self
    }

    /// Number of queued registrations.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Runs every queued registration in order, stopping at the first failure.
    pub async fn run(self) -> Result<Database> {
        for task in self.tasks {
            (task)(self.db.clone()).await?;
        }
        Ok(self.db.clone())
    }
}
