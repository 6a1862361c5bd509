//! # Value Module
//!
//! Scalar values exchanged with the storage engine. Outgoing values are collected
//! into [`Value`]s and bound positionally; incoming values are decoded column by
//! column through the [`Scalar`] trait, which is also what fixes the storage type
//! of every persisted field.

// ============================================================================
// External Crate Imports
// ============================================================================

use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{
    sqlite::{SqliteArguments, SqliteRow},
    Arguments, Row as _, Sqlite,
};

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{schema::ColumnKind, Error, Result};

/// Format used for every timestamp written by the crate. It matches the text
/// produced by [`crate::schema::NOW`] so stored values sort chronologically.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

// ============================================================================
// Value Enum
// ============================================================================

/// A single positional query parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Integer(i64),
    Real(f64),
    Boolean(bool),
    Blob(Vec<u8>),
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Appends the value to an argument list.
    pub(crate) fn bind<'q>(self, args: &mut SqliteArguments<'q>) -> Result<()> {
        let res = match self {
            Value::Null => args.add(Option::<String>::None),
            Value::Text(s) => args.add(s),
            Value::Integer(i) => args.add(i),
            Value::Real(f) => args.add(f),
            Value::Boolean(b) => args.add(b),
            Value::Blob(b) => args.add(b),
            Value::Timestamp(t) => args.add(format_timestamp(&t)),
        };
        res.map_err(|e| Error::Database(sqlx::Error::Encode(e)))
    }
}

/// Renders a timestamp in the stored text format (millisecond precision).
pub fn format_timestamp(t: &DateTime<Utc>) -> String {
    t.format(TIMESTAMP_FORMAT).to_string()
}

/// Parses a stored timestamp. Accepts RFC 3339 as well as SQLite's
/// `CURRENT_TIMESTAMP` layout, which carries no zone and is UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Builds a `Vec<Value>` from heterogeneous arguments.
///
/// ```rust,ignore
/// ducks.search("WHERE breed = ? AND age > ?", params!["mallard", 2]).await?;
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($v:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::from($v)),+]
    };
}

// ============================================================================
// Row View
// ============================================================================

/// A borrowed result row, read positionally.
pub struct Row<'r> {
    inner: &'r SqliteRow,
}

impl<'r> Row<'r> {
    pub(crate) fn new(inner: &'r SqliteRow) -> Self {
        Self { inner }
    }

    /// Number of columns in the row.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Decodes column `idx` as `T`.
    pub fn get<T: Scalar>(&self, idx: usize) -> Result<T> {
        T::decode(self, idx)
    }

    /// Decodes column `idx` as a timestamp. NULL reads as the zero instant.
    pub fn timestamp(&self, idx: usize) -> Result<DateTime<Utc>> {
        match self.raw::<String>(idx)? {
            None => Ok(DateTime::<Utc>::default()),
            Some(s) => parse_timestamp(&s).ok_or_else(|| decode_error(idx, format!("invalid timestamp {s:?}"))),
        }
    }

    /// Reads a column with SQLite's own type conversions. Columns are matched by
    /// position, so the declared column type is not checked against `T`.
    fn raw<T>(&self, idx: usize) -> Result<Option<T>>
    where
        T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
    {
        Ok(self.inner.try_get_unchecked::<Option<T>, usize>(idx)?)
    }
}

fn decode_error(idx: usize, msg: String) -> Error {
    Error::Database(sqlx::Error::ColumnDecode { index: idx.to_string(), source: msg.into() })
}

// ============================================================================
// Scalar Trait
// ============================================================================

/// A Rust type that maps onto exactly one storage column.
///
/// The derive macro persists a field only when its type is one of the
/// implementors below; every implementor reads NULL as its zero value so rows
/// written before a column existed still load.
pub trait Scalar: Sized {
    /// Storage type of the column.
    const KIND: ColumnKind;

    fn to_value(&self) -> Value;

    fn decode(row: &Row<'_>, idx: usize) -> Result<Self>;
}

impl Scalar for String {
    const KIND: ColumnKind = ColumnKind::Text;

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn decode(row: &Row<'_>, idx: usize) -> Result<Self> {
        Ok(row.raw::<String>(idx)?.unwrap_or_default())
    }
}

impl Scalar for bool {
    const KIND: ColumnKind = ColumnKind::Boolean;

    fn to_value(&self) -> Value {
        Value::Boolean(*self)
    }

    fn decode(row: &Row<'_>, idx: usize) -> Result<Self> {
        Ok(row.raw::<bool>(idx)?.unwrap_or_default())
    }
}

impl Scalar for Vec<u8> {
    const KIND: ColumnKind = ColumnKind::Any;

    fn to_value(&self) -> Value {
        Value::Blob(self.clone())
    }

    fn decode(row: &Row<'_>, idx: usize) -> Result<Self> {
        Ok(row.raw::<Vec<u8>>(idx)?.unwrap_or_default())
    }
}

macro_rules! impl_scalar_int {
    ($($t:ty),*) => {
        $(
            impl Scalar for $t {
                const KIND: ColumnKind = ColumnKind::Integer;

                fn to_value(&self) -> Value {
                    Value::Integer(*self as i64)
                }

                fn decode(row: &Row<'_>, idx: usize) -> Result<Self> {
                    let v = row.raw::<i64>(idx)?.unwrap_or_default();
                    <$t>::try_from(v).map_err(|e| decode_error(idx, e.to_string()))
                }
            }

            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    v.to_value()
                }
            }
        )*
    };
}

impl_scalar_int!(i8, i16, i32, i64, isize, u8, u16, u32);

// Unsigned 64-bit widths are stored as their two's-complement i64 and
// round-trip exactly.
macro_rules! impl_scalar_wide {
    ($($t:ty),*) => {
        $(
            impl Scalar for $t {
                const KIND: ColumnKind = ColumnKind::Integer;

                fn to_value(&self) -> Value {
                    Value::Integer(*self as u64 as i64)
                }

                fn decode(row: &Row<'_>, idx: usize) -> Result<Self> {
                    Ok(row.raw::<i64>(idx)?.unwrap_or_default() as u64 as $t)
                }
            }

            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    v.to_value()
                }
            }
        )*
    };
}

impl_scalar_wide!(u64, usize);

impl Scalar for char {
    const KIND: ColumnKind = ColumnKind::Text;

    fn to_value(&self) -> Value {
        Value::Text(self.to_string())
    }

    fn decode(row: &Row<'_>, idx: usize) -> Result<Self> {
        let s = row.raw::<String>(idx)?.unwrap_or_default();
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (None, _) => Ok('\0'),
            (Some(c), None) => Ok(c),
            _ => Err(decode_error(idx, format!("expected a single character, found {s:?}"))),
        }
    }
}

impl Scalar for f64 {
    const KIND: ColumnKind = ColumnKind::Real;

    fn to_value(&self) -> Value {
        Value::Real(*self)
    }

    fn decode(row: &Row<'_>, idx: usize) -> Result<Self> {
        Ok(row.raw::<f64>(idx)?.unwrap_or_default())
    }
}

impl Scalar for f32 {
    const KIND: ColumnKind = ColumnKind::Real;

    fn to_value(&self) -> Value {
        Value::Real(f64::from(*self))
    }

    fn decode(row: &Row<'_>, idx: usize) -> Result<Self> {
        Ok(row.raw::<f64>(idx)?.unwrap_or_default() as f32)
    }
}

macro_rules! impl_value_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    v.to_value()
                }
            }
        )*
    };
}

impl_value_from!(String, bool, Vec<u8>, char, f64, f32);

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_use_millisecond_rfc3339() {
        let t = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap() + chrono::Duration::microseconds(123_456);
        assert_eq!(format_timestamp(&t), "2024-03-09T14:05:07.123Z");
        assert_eq!(
            parse_timestamp("2024-03-09T14:05:07.123Z"),
            Some(Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap() + chrono::Duration::milliseconds(123))
        );
    }

    #[test]
    fn parses_sqlite_current_timestamp() {
        assert_eq!(parse_timestamp("2024-03-09 14:05:07"), Some(Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn params_macro_converts_each_argument() {
        let args = params!["mallard", 3, true, 1.5, None::<String>];
        assert_eq!(
            args,
            vec![
                Value::Text("mallard".to_string()),
                Value::Integer(3),
                Value::Boolean(true),
                Value::Real(1.5),
                Value::Null,
            ]
        );
        assert!(params![].is_empty());
    }

    #[test]
    fn unsigned_wide_values_keep_their_bits() {
        assert_eq!(usize::MAX.to_value(), Value::Integer(-1));
        assert_eq!(u64::MAX.to_value(), Value::Integer(-1));
        assert_eq!('q'.to_value(), Value::Text("q".to_string()));
    }
}
