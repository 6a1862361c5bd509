use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{schema::Column, value::Row, Result};

/// The identity block every entity embeds.
///
/// `id` stays empty until the first insert. Both timestamps are maintained by
/// the store; values set by the caller are only used when inserting a record
/// that already carries an identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Identifier of the row this value was last read from or written to.
    #[serde(skip)]
    stored_id: Option<String>,
}

impl Model {
    /// Creates an identity block with a caller-chosen identifier and both
    /// timestamps set to `now`.
    pub fn with_id(id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self { id: id.into(), created_at: now, updated_at: now, stored_id: None }
    }

    /// Returns `true` once the record is backed by a row.
    pub fn is_persisted(&self) -> bool {
        self.stored_id.is_some()
    }

    pub(crate) fn stored_id(&self) -> Option<&str> {
        self.stored_id.as_deref()
    }

    pub(crate) fn mark_stored(&mut self) {
        self.stored_id = Some(self.id.clone());
    }

    /// Reads `ID`, `CreatedAt` and `UpdatedAt` from the first three columns.
    pub(crate) fn load(&mut self, row: &Row<'_>) -> Result<()> {
        self.id = row.get(0)?;
        self.created_at = row.timestamp(1)?;
        self.updated_at = row.timestamp(2)?;
        self.mark_stored();
        Ok(())
    }
}

/// Returns `true` for the zero instant a fresh [`Model`] starts with.
pub(crate) fn is_unset(t: &DateTime<Utc>) -> bool {
    *t == DateTime::<Utc>::default()
}

/// The contract a record type satisfies to be stored by Tern ORM.
///
/// This trait is normally implemented with `#[derive(Entity)]`, which reads the
/// struct's fields at compile time and produces the column list, the value list
/// and the positional loader in declaration order.
///
/// # Example
///
/// ```rust,ignore
/// use tern_orm::{Entity, Model};
///
/// #[derive(Debug, Default, Entity)]
/// #[orm(table = "ducks")]
/// struct Duck {
///     model: Model,
///     name: String,
///     #[orm(default = "'mallard'")]
///     breed: String,
/// }
/// ```
pub trait Entity: Default + Send + Sync + Unpin + 'static {
    /// Name of the backing table.
    fn table() -> &'static str;

    fn model(&self) -> &Model;

    fn model_mut(&mut self) -> &mut Model;

    /// Persisted scalar fields, in declaration order.
    fn columns() -> Vec<Column>;

    /// Current field values, in the order of [`Entity::columns`].
    fn values(&self) -> Vec<crate::Value>;

    /// Loads the persisted fields from `row`, starting at column `offset`.
    fn load(&mut self, row: &Row<'_>, offset: usize) -> Result<()>;
}
