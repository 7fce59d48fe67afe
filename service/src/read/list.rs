//! Generic paginated list definitions.

use common::Pagination;

use crate::domain::agent;
#[cfg(doc)]
use crate::domain::{Agent, Entity};

/// Selector of a page of [`Entity`] list.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Selector {
    /// Requested [`Pagination`].
    pub pagination: Pagination,

    /// [`Agent`] the listed rows must be owned by, if restricted.
    pub owner: Option<agent::Id>,
}
