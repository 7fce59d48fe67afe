//! Offset-based pagination.

use serde::{Deserialize, Serialize};

/// Requested window of a list.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct Pagination {
    /// 1-based number of the requested page.
    pub page: u32,

    /// Maximum number of items on a page.
    pub limit: u32,
}

impl Pagination {
    /// Default number of items on a page.
    pub const DEFAULT_LIMIT: u32 = 12;

    /// Upper bound for [`Pagination::limit`].
    pub const MAX_LIMIT: u32 = 100;

    /// Creates a new [`Pagination`], clamping the values into the valid
    /// ranges.
    #[must_use]
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, Self::MAX_LIMIT),
        }
    }

    /// Returns the number of items to skip before this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        let Self { page, limit } = Self::new(self.page, self.limit);
        u64::from(page - 1) * u64::from(limit)
    }

    /// Returns the clamped number of items on this page.
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit.clamp(1, Self::MAX_LIMIT)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_LIMIT)
    }
}

/// Page of a list.
#[derive(Clone, Debug, Serialize)]
pub struct Page<T> {
    /// Items on this [`Page`].
    pub items: Vec<T>,

    /// 1-based number of this [`Page`].
    pub page: u32,

    /// Maximum number of items on this [`Page`].
    pub limit: u32,

    /// Total number of items in the whole list.
    pub total: u64,
}

impl<T> Page<T> {
    /// Creates a new [`Page`] out of the provided items.
    #[must_use]
    pub fn new(pagination: Pagination, items: Vec<T>, total: u64) -> Self {
        let Pagination { page, limit } =
            Pagination::new(pagination.page, pagination.limit);
        Self {
            items,
            page,
            limit,
            total,
        }
    }

    /// Returns the total number of pages in the whole list.
    #[must_use]
    pub fn pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.limit.max(1)))
    }

    /// Maps the items of this [`Page`].
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total: self.total,
        }
    }
}
