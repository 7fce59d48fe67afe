//! Domain definitions.

pub mod agent;
pub mod brokerage;
pub mod client;
pub mod client_role;
pub mod contract;
pub mod listing;
pub mod person;
pub mod principal;
pub mod property;
pub mod property_image;
pub mod showing;
pub mod transaction;
pub mod user;

use std::{fmt, hash::Hash};

use derive_more::{Display, Error};

pub use self::{
    agent::Agent, brokerage::Brokerage, client::Client,
    client_role::ClientRole, contract::Contract, listing::Listing,
    principal::Principal, property::Property,
    property_image::PropertyImage, showing::Showing,
    transaction::Transaction, user::User,
};

/// Persisted entity managed by the generic CRUD operations.
pub trait Entity: Clone + fmt::Debug + Send + Sync + 'static {
    /// ID of this [`Entity`].
    type Id: Copy + fmt::Debug + fmt::Display + Eq + Hash + Send + Sync + 'static;

    /// Human-readable name of this [`Entity`] kind.
    const NAME: &'static str;

    /// Returns the ID of this [`Entity`].
    fn id(&self) -> Self::Id;

    /// Returns the [`Agent`] owning this [`Entity`], if it's agent-owned.
    fn owner(&self) -> Option<agent::Id> {
        None
    }

    /// Checks invariants spanning several fields of this [`Entity`].
    ///
    /// # Errors
    ///
    /// With [`Invalid`] describing the first violated invariant.
    fn validate(&self) -> Result<(), Invalid> {
        Ok(())
    }

    /// Restores the fields which cannot change after creation from the
    /// `existing` version of this [`Entity`].
    fn retain_immutable(&mut self, existing: &Self);
}

/// Violated invariant of an [`Entity`].
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
#[display("{_0}")]
pub struct Invalid(#[error(not(source))] pub &'static str);

/// Set of rows an operation is allowed to touch.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Scope {
    /// Every row.
    Admin,

    /// Only rows owned by the [`Agent`] with the given ID.
    Agent(agent::Id),
}

impl Scope {
    /// Checks whether this [`Scope`] allows touching a row owned by the
    /// provided `owner`.
    #[must_use]
    pub fn permits(self, owner: Option<agent::Id>) -> bool {
        match self {
            Self::Admin => true,
            Self::Agent(id) => owner == Some(id),
        }
    }

    /// Returns the [`Agent`] this [`Scope`] is restricted to, if any.
    #[must_use]
    pub fn agent(self) -> Option<agent::Id> {
        match self {
            Self::Admin => None,
            Self::Agent(id) => Some(id),
        }
    }
}

/// Defines a UUID-based `Id` of an entity in the current module.
macro_rules! define_id {
    ($entity:literal) => {
        #[doc = concat!("ID of a [`", $entity, "`].")]
        #[derive(
            Clone,
            Copy,
            Debug,
            Default,
            ::serde::Deserialize,
            ::derive_more::Display,
            Eq,
            ::derive_more::From,
            Hash,
            ::derive_more::Into,
            Ord,
            PartialEq,
            PartialOrd,
            ::serde::Serialize,
        )]
        #[cfg_attr(
            feature = "postgres",
            derive(::postgres_types::FromSql, ::postgres_types::ToSql),
            postgres(transparent)
        )]
        pub struct Id(::uuid::Uuid);

        impl Id {
            /// Creates a new random [`Id`].
            #[must_use]
            pub fn new() -> Self {
                Self(::uuid::Uuid::new_v4())
            }
        }

        impl ::core::str::FromStr for Id {
            type Err = ::uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }
    };
}
pub(crate) use define_id;

#[cfg(test)]
mod spec {
    use super::{agent, Scope};

    #[test]
    fn admin_scope_permits_everything() {
        assert!(Scope::Admin.permits(None));
        assert!(Scope::Admin.permits(Some(agent::Id::new())));
    }

    #[test]
    fn agent_scope_permits_only_own_rows() {
        let own = agent::Id::new();
        let scope = Scope::Agent(own);

        assert!(scope.permits(Some(own)));
        assert!(!scope.permits(Some(agent::Id::new())));
        assert!(!scope.permits(None));
        assert_eq!(scope.agent(), Some(own));
    }
}
