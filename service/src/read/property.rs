//! [`Property`]-related read definitions.

use common::Pagination;

use crate::domain::{agent, property};
#[cfg(doc)]
use crate::domain::{Agent, Listing, Property};

/// Filter of a [`Property`] list.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Filter {
    /// [`property::Status`] to match.
    pub status: Option<property::Status>,

    /// [`property::Kind`] to match.
    pub kind: Option<property::Kind>,

    /// [`Agent`] holding a [`Listing`] of the [`Property`].
    pub listed_by: Option<agent::Id>,
}

/// Selector of a page of [`Property`] list.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Selector {
    /// Requested [`Pagination`].
    pub pagination: Pagination,

    /// [`Filter`] to apply.
    pub filter: Filter,
}

/// Fuzzy search of [`Property`]s by address.
///
/// Matches addresses containing any word of the [`Search::query`], the
/// closest ones first.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Search {
    /// Search input.
    pub query: String,

    /// Requested [`Pagination`].
    pub pagination: Pagination,
}
