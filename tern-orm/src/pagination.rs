//! # Pagination Module
//!
//! Page/offset pagination over a [`Collection`]. Pages are read through the
//! capped iteration protocol, so finding out whether a next page exists costs
//! one extra row instead of a `COUNT(*)` query.

// ============================================================================
// External Crate Imports
// ============================================================================

use serde::{Deserialize, Serialize};

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{Collection, Entity, Result, Value};

// ============================================================================
// Pagination Structs
// ============================================================================

/// One page of records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// The records on this page
    pub data: Vec<T>,
    /// The page number (zero-based)
    pub page: usize,
    /// The number of records per page
    pub limit: usize,
    /// Whether a following page has at least one record
    pub more: bool,
}

/// Pagination settings, typically deserialized from a request's query string.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pagination {
    /// Zero-based page index
    pub page: usize,
    /// Number of records per page
    pub limit: usize,
    /// Maximum allowed records per page
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
}

/// Largest value SQLite accepts for `LIMIT` and `OFFSET`.
const SQL_INT_MAX: usize = i64::MAX as usize;

fn default_max_limit() -> usize {
    100
}

impl Pagination {
    /// Creates a new Pagination instance with a custom safety limit. A `limit`
    /// of zero or above `max_limit` falls back to 10.
    pub fn new_with_limit(page: usize, limit: usize, max_limit: usize) -> Self {
        let mut f_limit = limit;
        if f_limit == 0 || f_limit > max_limit {
            f_limit = 10;
        }
        Self { page, limit: f_limit, max_limit }
    }

    /// Creates a new Pagination instance with a default safety limit of 100.
    pub fn new(page: usize, limit: usize) -> Self {
        Self::new_with_limit(page, limit, default_max_limit())
    }

    /// Appends `LIMIT`/`OFFSET` for this page to `clause`. One row beyond the
    /// page is requested so the next page can be detected.
    ///
    /// Both numbers saturate at SQLite's largest integer, so a page number far
    /// past the end reads an empty page.
    pub fn apply(&self, clause: &str) -> String {
        let limit = self.effective_limit();
        let fetch = limit.saturating_add(1).min(SQL_INT_MAX);
        let offset = self.page.saturating_mul(limit).min(SQL_INT_MAX);
        format!("{} LIMIT {} OFFSET {}", clause.trim_end(), fetch, offset)
    }

    fn effective_limit(&self) -> usize {
        if self.limit == 0 || self.limit > self.max_limit { 10 } else { self.limit.min(SQL_INT_MAX - 1) }
    }

    /// Reads this page of the records matching `clause`.
    ///
    /// `clause` must not carry its own `LIMIT`; put any `ORDER BY` in it to make
    /// pages stable.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let p = Pagination::new(0, 20);
    /// let res = p.paginate(&ducks, "ORDER BY name", params![]).await?;
    ///
    /// for duck in res.data {
    ///     println!("Duck: {}", duck.name);
    /// }
    /// ```
    pub async fn paginate<E: Entity>(self, collection: &Collection<E>, clause: &str, args: Vec<Value>) -> Result<Paginated<E>> {
        let limit = self.effective_limit();
        let (data, more) = collection.page(&self.apply(clause), args, limit).await?;
        Ok(Paginated { data, page: self.page, limit, more })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn over_limit_falls_back_to_ten() {
        let p = Pagination::new(2, 500);
        assert_eq!(p.limit, 10);
        assert_eq!(Pagination::new(0, 25).limit, 25);
    }

    #[test]
    fn apply_requests_one_extra_row() {
        let p = Pagination::new(2, 5);
        assert_eq!(p.apply("ORDER BY name "), "ORDER BY name LIMIT 6 OFFSET 10");
        assert_eq!(p.apply(""), " LIMIT 6 OFFSET 10");
    }

    #[test]
    fn zero_limit_falls_back_to_ten() {
        assert_eq!(Pagination::new(0, 0).limit, 10);

        let p = Pagination { page: 1, limit: 0, max_limit: 100 };
        assert_eq!(p.apply(""), " LIMIT 11 OFFSET 10");
    }

    #[test]
    fn huge_page_numbers_saturate() {
        let p = Pagination::new(usize::MAX, 20);
        assert_eq!(p.apply(""), format!(" LIMIT 21 OFFSET {}", i64::MAX));

        let p = Pagination { page: usize::MAX, limit: usize::MAX, max_limit: usize::MAX };
        assert_eq!(p.apply(""), format!(" LIMIT {} OFFSET {}", i64::MAX, i64::MAX));
    }
}
