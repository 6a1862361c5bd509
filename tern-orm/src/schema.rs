//! # Schema Module
//!
//! Derives table layouts from an entity's column descriptors: the storage type
//! and default of each field, the fixed field order shared by every statement,
//! and the DDL used to create and evolve tables.
//!
//! Column order is significant. The three identity columns always come first,
//! followed by the persisted fields in declaration order; inserts, selects and
//! the positional loaders all rely on that correspondence.

use std::collections::HashSet;

use crate::{Entity, Error, Result, Value};

/// Identifier column.
pub const ID: &str = "ID";
/// Creation timestamp column.
pub const CREATED_AT: &str = "CreatedAt";
/// Last-update timestamp column.
pub const UPDATED_AT: &str = "UpdatedAt";

/// The identity columns, in table order.
pub const IDENTITY_COLUMNS: [&str; 3] = [ID, CREATED_AT, UPDATED_AT];

/// SQL expression for the current instant, in the same text layout the crate
/// binds timestamps with.
pub const NOW: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

// ============================================================================
// Column Descriptors
// ============================================================================

/// Storage type of a persisted field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Text,
    Integer,
    Real,
    Boolean,
    /// Permissive fallback for values with no narrower mapping (byte strings).
    Any,
}

impl ColumnKind {
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnKind::Text => "TEXT",
            ColumnKind::Integer => "INTEGER",
            ColumnKind::Real => "REAL",
            ColumnKind::Boolean => "BOOLEAN",
            ColumnKind::Any => "ANY",
        }
    }

    /// Default used when a field carries no `default` annotation, so adding the
    /// column to a populated table never leaves NULLs behind.
    pub fn zero_default(self) -> &'static str {
        match self {
            ColumnKind::Text => "''",
            ColumnKind::Integer | ColumnKind::Real => "0",
            ColumnKind::Boolean => "FALSE",
            ColumnKind::Any => "NULL",
        }
    }
}

/// A persisted field: name, storage type and default literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
    /// Literal from `#[orm(default = "...")]`, inserted verbatim into DDL.
    pub default: Option<&'static str>,
}

impl Column {
    pub const fn new(name: &'static str, kind: ColumnKind) -> Self {
        Self { name, kind, default: None }
    }

    pub const fn with_default(mut self, literal: &'static str) -> Self {
        self.default = Some(literal);
        self
    }

    pub fn sql_type(&self) -> &'static str {
        self.kind.sql_type()
    }

    pub fn default_literal(&self) -> &'static str {
        self.default.unwrap_or_else(|| self.kind.zero_default())
    }
}

// ============================================================================
// Reflection
// ============================================================================

/// Column descriptors of every persisted field of `E`.
pub fn fields<E: Entity>() -> Vec<Column> {
    E::columns()
}

/// The full field list: identity columns followed by the persisted fields.
pub fn field_names<E: Entity>() -> Vec<&'static str> {
    let columns = E::columns();
    let mut names = Vec::with_capacity(IDENTITY_COLUMNS.len() + columns.len());
    names.extend(IDENTITY_COLUMNS);
    names.extend(columns.iter().map(|c| c.name));
    names
}

/// Names and current values of the full field list, in table order.
pub fn reflect<E: Entity>(ent: &E) -> (Vec<&'static str>, Vec<Value>) {
    let model = ent.model();
    let mut values = vec![
        Value::Text(model.id.clone()),
        Value::Timestamp(model.created_at),
        Value::Timestamp(model.updated_at),
    ];
    values.extend(ent.values());
    (field_names::<E>(), values)
}

/// Double-quotes an identifier.
pub fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Table-qualified column references for a SELECT list. Only the projection is
/// qualified; caller-supplied filter text is left as written.
pub fn qualified(table: &str, fields: &[&str]) -> Vec<String> {
    let table = quote(table);
    fields.iter().map(|f| format!("{}.{}", table, quote(f))).collect()
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Checks that `E` can be mapped onto a table.
pub fn validate<E: Entity>() -> Result<()> {
    let table = E::table();
    if !is_identifier(table) {
        return Err(Error::Shape(format!("table name {table:?} is not a plain identifier")));
    }

    let mut seen: HashSet<String> = IDENTITY_COLUMNS.iter().map(|c| c.to_ascii_lowercase()).collect();
    for col in E::columns() {
        if !is_identifier(col.name) {
            return Err(Error::Shape(format!("{table}: column name {:?} is not a plain identifier", col.name)));
        }
        // SQLite compares column names case-insensitively.
        if !seen.insert(col.name.to_ascii_lowercase()) {
            return Err(Error::Shape(format!("{table}: column {:?} is declared twice or shadows an identity column", col.name)));
        }
    }
    Ok(())
}

// ============================================================================
// DDL
// ============================================================================

pub fn create_table_sql(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({} TEXT PRIMARY KEY, {} TIMESTAMP DEFAULT ({NOW}), {} TIMESTAMP DEFAULT ({NOW}))",
        quote(table),
        quote(ID),
        quote(CREATED_AT),
        quote(UPDATED_AT),
    )
}

pub fn add_column_sql(table: &str, column: &Column) -> String {
    format!(
        "ALTER TABLE {} ADD COLUMN {} {} DEFAULT {}",
        quote(table),
        quote(column.name),
        column.sql_type(),
        column.default_literal()
    )
}
