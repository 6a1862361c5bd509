//! # Query Module
//!
//! Executes parameterized SQL against the pool and exposes the result through
//! four access patterns: `exec` for statements without rows, `scan` for a single
//! row, `for_each` for row-at-a-time visiting and `page` for capped visiting.
//! Every higher layer of the crate is built on these.

use futures::TryStreamExt;
use sqlx::{sqlite::SqliteArguments, SqlitePool};

use crate::{
    value::{Row, Scalar},
    Error, Result, Value,
};

/// A SQL statement with positional arguments, not yet executed.
///
/// # Example
///
/// ```rust,ignore
/// let mut names: Vec<String> = Vec::new();
/// db.query("SELECT name FROM ducks WHERE breed = ?")
///     .bind("mallard")
///     .for_each(|row| {
///         names.push(row.get(0)?);
///         Ok(())
///     })
///     .await?;
/// ```
#[derive(Debug)]
pub struct Query<'a> {
    pool: &'a SqlitePool,
    sql: String,
    args: Vec<Value>,
}

impl<'a> Query<'a> {
    pub(crate) fn new(pool: &'a SqlitePool, sql: impl Into<String>) -> Self {
        Self { pool, sql: sql.into(), args: Vec::new() }
    }

    /// Appends one positional argument.
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Appends a list of positional arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = Value>) -> Self {
        self.args.extend(args);
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    fn arguments<'q>(args: Vec<Value>) -> Result<SqliteArguments<'q>> {
        let mut out = SqliteArguments::default();
        for value in args {
            value.bind(&mut out)?;
        }
        Ok(out)
    }

    /// Runs a statement that produces no rows and returns the number of rows it
    /// changed.
    pub async fn exec(self) -> Result<u64> {
        log::debug!("{}", self.sql);
        let args = Self::arguments(self.args)?;
        let result = sqlx::query_with(&self.sql, args).execute(self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Runs a statement expected to produce at most one row and hands that row
    /// to `dest`, which copies the columns it needs.
    ///
    /// Fails with [`Error::NotFound`] when the statement produced no row. A
    /// `dest` returning [`Error::Stop`] counts as success.
    pub async fn scan<F>(self, dest: F) -> Result<()>
    where
        F: FnOnce(&Row<'_>) -> Result<()>,
    {
        log::debug!("{}", self.sql);
        let args = Self::arguments(self.args)?;
        let row = sqlx::query_with(&self.sql, args).fetch_optional(self.pool).await?.ok_or(Error::NotFound)?;
        match dest(&Row::new(&row)) {
            Err(Error::Stop) => Ok(()),
            other => other,
        }
    }

    /// Scans the first column of the single result row.
    pub async fn scalar<T: Scalar>(self) -> Result<T> {
        let mut out = None;
        self.scan(|row| {
            out = Some(row.get::<T>(0)?);
            Ok(())
        })
        .await?;
        out.ok_or(Error::NotFound)
    }

    /// Calls `visit` for every result row.
    ///
    /// A visitor returning [`Error::Stop`] ends the iteration successfully; any
    /// other error aborts it and is returned. No rows at all is not an error.
    pub async fn for_each<F>(self, mut visit: F) -> Result<()>
    where
        F: FnMut(&Row<'_>) -> Result<()>,
    {
        log::debug!("{}", self.sql);
        let args = Self::arguments(self.args)?;
        let mut rows = sqlx::query_with(&self.sql, args).fetch(self.pool);

        while let Some(row) = rows.try_next().await? {
            match visit(&Row::new(&row)) {
                Ok(()) => {}
                Err(Error::Stop) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Like [`Query::for_each`], but visits at most `limit` rows. Returns `true`
    /// when the result had rows beyond the ones visited.
    pub async fn page<F>(self, limit: usize, mut visit: F) -> Result<bool>
    where
        F: FnMut(&Row<'_>) -> Result<()>,
    {
        log::debug!("{}", self.sql);
        let args = Self::arguments(self.args)?;
        let mut rows = sqlx::query_with(&self.sql, args).fetch(self.pool);

        let mut seen = 0;
        while let Some(row) = rows.try_next().await? {
            if seen == limit {
                return Ok(true);
            }
            seen += 1;

            match visit(&Row::new(&row)) {
                Ok(()) => {}
                Err(Error::Stop) => return Ok(rows.try_next().await?.is_some()),
                Err(e) => return Err(e),
            }
        }
        Ok(false)
    }
}
