//! # Store Module
//!
//! Generic table bootstrap and CRUD for any [`Entity`]. Every statement is built
//! from the entity's fixed field list (identity columns first, then the persisted
//! fields in declaration order) and runs as a single autocommit statement.

use std::marker::PhantomData;

use crate::{
    database::Registration,
    model::is_unset,
    schema::{self, quote, CREATED_AT, ID, IDENTITY_COLUMNS, NOW, UPDATED_AT},
    value::Row,
    Database, Entity, Error, Result, Value,
};

/// Loads a full row (identity columns, then fields) into `ent`.
fn load_entity<E: Entity>(ent: &mut E, row: &Row<'_>) -> Result<()> {
    ent.model_mut().load(row)?;
    ent.load(row, IDENTITY_COLUMNS.len())
}

/// The qualified SELECT list for `E`.
fn select_list<E: Entity>() -> String {
    schema::qualified(E::table(), &schema::field_names::<E>()).join(", ")
}

fn schema_error(table: &'static str, err: Error) -> Error {
    match err {
        Error::Database(source) => Error::Schema { table, source },
        other => other,
    }
}

fn is_duplicate_column(err: &Error) -> bool {
    matches!(err, Error::Database(sqlx::Error::Database(db)) if db.message().contains("duplicate column name"))
}

impl Database {
    /// Creates the table for `E` if needed and adds any column the table lacks.
    ///
    /// Safe to call repeatedly: existing columns are left untouched and new
    /// columns are added with their default, so rows written before the column
    /// existed read back the default. Each call is also appended to
    /// [`Database::registered`].
    pub async fn register<E: Entity>(&self) -> Result<()> {
        schema::validate::<E>()?;

        let table = E::table();
        log::debug!("registering entity table {}", table);

        self.query(schema::create_table_sql(table)).exec().await.map_err(|e| schema_error(table, e))?;

        let existing = self.table_columns(table).await?;
        let columns = E::columns();
        for column in &columns {
            if existing.iter().any(|c| c.eq_ignore_ascii_case(column.name)) {
                continue;
            }

            match self.query(schema::add_column_sql(table, column)).exec().await {
                Ok(_) => log::debug!("added column {}.{} {}", table, column.name, column.sql_type()),
                // Another connection added it between our read and our ALTER.
                Err(e) if is_duplicate_column(&e) => log::debug!("column {}.{} already exists", table, column.name),
                Err(e) => return Err(schema_error(table, e)),
            }
        }

        self.record_registration(Registration { table, columns });
        Ok(())
    }

    /// Names of the columns `table` currently has.
    pub async fn table_columns(&self, table: &str) -> Result<Vec<String>> {
        let mut columns = Vec::new();
        self.query(format!("PRAGMA table_info({})", quote(table)))
            .for_each(|row| {
                columns.push(row.get::<String>(1)?);
                Ok(())
            })
            .await?;
        Ok(columns)
    }

    /// Inserts `ent` and reads the stored row back into it.
    ///
    /// Timestamps still at their zero value are left to the table defaults. The
    /// identifier is written as-is; generating one is the collection's job.
    pub async fn insert<E: Entity>(&self, ent: &mut E) -> Result<()> {
        schema::validate::<E>()?;

        let created_unset = is_unset(&ent.model().created_at);
        let updated_unset = is_unset(&ent.model().updated_at);
        let (names, values) = schema::reflect(ent);

        let mut columns = Vec::with_capacity(names.len());
        let mut args = Vec::with_capacity(values.len());
        for (name, value) in names.iter().zip(values) {
            if (*name == CREATED_AT && created_unset) || (*name == UPDATED_AT && updated_unset) {
                continue;
            }
            columns.push(quote(name));
            args.push(value);
        }

        let places = vec!["?"; columns.len()].join(", ");
        let returning = names.iter().map(|n| quote(n)).collect::<Vec<_>>().join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            quote(E::table()),
            columns.join(", "),
            places,
            returning
        );

        self.query(sql).args(args).scan(|row| load_entity(ent, row)).await
    }

    /// Loads the row with identifier `id` into `ent`.
    ///
    /// Fails with [`Error::NotFound`] when no such row exists.
    pub async fn get<E: Entity>(&self, id: &str, ent: &mut E) -> Result<()> {
        let sql = format!("SELECT {} FROM {} WHERE {} = ?", select_list::<E>(), quote(E::table()), quote(ID));
        self.query(sql).bind(id).scan(|row| load_entity(ent, row)).await
    }

    /// Writes every persisted field of `ent` and refreshes its `updated_at`.
    ///
    /// The row is addressed by the identifier the record was loaded with;
    /// changing `id` on a stored record is rejected with
    /// [`Error::IdentityChanged`]. `created_at` is never rewritten.
    pub async fn update<E: Entity>(&self, ent: &mut E) -> Result<()> {
        let table = E::table();
        let model = ent.model();
        if let Some(stored) = model.stored_id() {
            if stored != model.id {
                return Err(Error::IdentityChanged { table, stored: stored.to_string(), current: model.id.clone() });
            }
        }
        let id = model.id.clone();

        let mut sets: Vec<String> = E::columns().iter().map(|c| format!("{} = ?", quote(c.name))).collect();
        sets.push(format!("{} = {NOW}", quote(UPDATED_AT)));
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ? RETURNING {}",
            quote(table),
            sets.join(", "),
            quote(ID),
            quote(UPDATED_AT)
        );

        let mut args = ent.values();
        args.push(Value::Text(id));

        self.query(sql)
            .args(args)
            .scan(|row| {
                let model = ent.model_mut();
                model.updated_at = row.timestamp(0)?;
                model.mark_stored();
                Ok(())
            })
            .await
    }

    /// Deletes the row backing `ent` and returns how many rows were removed.
    /// Deleting a record that has no row is not an error.
    pub async fn delete<E: Entity>(&self, ent: &E) -> Result<u64> {
        let sql = format!("DELETE FROM {} WHERE {} = ?", quote(E::table()), quote(ID));
        self.query(sql).bind(ent.model().id.as_str()).exec().await
    }

    /// Opens a cursor over the rows of `E` selected by `clause`.
    ///
    /// `clause` is appended verbatim after `SELECT .. FROM <table>` and usually
    /// starts with `WHERE` or `ORDER BY`; only `args` are bound as parameters.
    pub fn cursor<E: Entity>(&self, clause: impl Into<String>, args: Vec<Value>) -> Cursor<'_, E> {
        Cursor { db: self, clause: clause.into(), args, _entity: PhantomData }
    }
}

// ============================================================================
// Cursor
// ============================================================================

/// A query over one entity type, resolved either row by row or as one record.
#[derive(Debug)]
pub struct Cursor<'a, E> {
    db: &'a Database,
    clause: String,
    args: Vec<Value>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Cursor<'_, E> {
    fn select(&self) -> String {
        format!("SELECT {} FROM {} {}", select_list::<E>(), quote(E::table()), self.clause)
    }

    /// Hands a freshly loaded record to `visit` for every matching row.
    ///
    /// Returning [`Error::Stop`] from `visit` ends the iteration without error.
    pub async fn iter<F>(self, mut visit: F) -> Result<()>
    where
        F: FnMut(E) -> Result<()>,
    {
        let sql = self.select();
        self.db
            .query(sql)
            .args(self.args)
            .for_each(|row| {
                let mut ent = E::default();
                load_entity(&mut ent, row)?;
                visit(ent)
            })
            .await
    }

    /// Like [`Cursor::iter`], visiting at most `limit` records. Returns `true`
    /// when more rows matched.
    pub async fn page<F>(self, limit: usize, mut visit: F) -> Result<bool>
    where
        F: FnMut(E) -> Result<()>,
    {
        let sql = self.select();
        self.db
            .query(sql)
            .args(self.args)
            .page(limit, |row| {
                let mut ent = E::default();
                load_entity(&mut ent, row)?;
                visit(ent)
            })
            .await
    }

    /// The first matching record, or [`Error::NotFound`].
    pub async fn one(self) -> Result<E> {
        let sql = self.select();
        let mut ent = E::default();
        self.db.query(sql).args(self.args).scan(|row| load_entity(&mut ent, row)).await?;
        Ok(ent)
    }
}
