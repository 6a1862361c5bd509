//! # Error Module
//!
//! Every fallible operation in Tern ORM returns [`Error`]. The variants follow the
//! failure classes callers actually branch on: a missing row, a badly shaped
//! entity, a failed schema change and everything the storage engine reports.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A lookup matched zero rows.
    #[error("record not found")]
    NotFound,

    /// The entity descriptor cannot be mapped onto a table.
    #[error("invalid entity shape: {0}")]
    Shape(String),

    /// Creating or evolving a table failed.
    #[error("failed to migrate table {table}: {source}")]
    Schema {
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// `update` was called on a record whose identifier no longer matches the
    /// row it was loaded from.
    #[error("identifier of {table} record changed from {stored:?} to {current:?}")]
    IdentityChanged { table: &'static str, stored: String, current: String },

    /// The data directory could not be prepared.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other error reported by the driver or the storage engine.
    #[error(transparent)]
    Database(sqlx::Error),

    /// Returned by a visitor to end iteration early. Iteration drivers swallow
    /// it, so it never reaches the caller of a query.
    #[error("stop iteration")]
    Stop,
}

impl Error {
    /// Returns `true` when the error means "no such row".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound)
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound,
            other => Error::Database(other),
        }
    }
}
