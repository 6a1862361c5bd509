//! # Tern ORM
//!
//! A dynamic entity-mapping layer over a single SQLite file. Record types derive
//! [`Entity`]; registering one creates its table and adds any column the table
//! is missing, after which a typed [`Collection`] provides insert, lookup,
//! update, delete, search and pagination without hand-written SQL mapping.
//!
//! ```rust,ignore
//! use tern_orm::{params, Database, Entity, Model};
//!
//! #[derive(Debug, Default, Entity)]
//! #[orm(table = "tasks")]
//! struct Task {
//!     model: Model,
//!     title: String,
//!     done: bool,
//! }
//!
//! let db = Database::open("app.db").await?;
//! let tasks = db.manage::<Task>().await?;
//!
//! let task = tasks.insert(Task { title: "write docs".into(), ..Default::default() }).await?;
//! let open = tasks.search("WHERE done = ?", params![false]).await?;
//! ```

extern crate self as tern_orm;

pub mod collection;
pub mod database;
pub mod error;
pub mod migration;
pub mod model;
pub mod pagination;
pub mod query;
pub mod schema;
pub mod store;
pub mod value;

pub use collection::Collection;
pub use database::{data_dir, Database, DatabaseBuilder, Registration};
pub use error::{Error, Result};
pub use migration::Migrator;
pub use model::{Entity, Model};
pub use pagination::{Paginated, Pagination};
pub use query::Query;
pub use schema::{Column, ColumnKind};
pub use store::Cursor;
pub use tern_orm_macro::Entity;
pub use value::{Row, Scalar, Value};
