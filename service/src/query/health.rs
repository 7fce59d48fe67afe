//! [`Query`] checking the storage health.

use common::operations::By;

use crate::read::health;
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a storage round-trip.
pub type Alive = DatabaseQuery<By<health::Alive, ()>>;
