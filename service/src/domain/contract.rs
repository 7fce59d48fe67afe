//! [`Contract`] definitions.

use common::{define_kind, define_text, unit, Date, DateTimeOf};
use serde::Serialize;

use super::{agent, client, define_id, property, Entity, Invalid};

define_id!("Contract");

define_kind! {
    #[doc = "Kind of a [`Contract`]."]
    enum Kind {
        #[doc = "Agreement to list a property."]
        Listing = 1,

        #[doc = "Agreement to show properties."]
        Showing = 2,
    }
}

define_text! {
    #[doc = "Free-form terms of a [`Contract`]."]
    struct Terms(max = 10000);
}

/// Agreement between a [`Client`] and an [`Agent`] about a [`Property`].
///
/// [`Agent`]: super::Agent
/// [`Client`]: super::Client
/// [`Property`]: super::Property
#[derive(Clone, Debug, Serialize)]
pub struct Contract {
    /// ID of this [`Contract`].
    pub id: Id,

    /// ID of the [`Property`] this [`Contract`] is about.
    ///
    /// [`Property`]: super::Property
    pub property_id: property::Id,

    /// ID of the contracting [`Client`].
    ///
    /// [`Client`]: super::Client
    pub client_id: client::Id,

    /// ID of the contracting [`Agent`].
    ///
    /// [`Agent`]: super::Agent
    pub agent_id: agent::Id,

    /// [`Kind`] of this [`Contract`].
    #[serde(rename = "contract_type")]
    pub kind: Kind,

    /// First day this [`Contract`] is in effect.
    pub start_date: Date,

    /// Last day this [`Contract`] is in effect, if limited.
    pub end_date: Option<Date>,

    /// [`Terms`] of this [`Contract`].
    pub terms: Option<Terms>,

    /// [`DateTime`] when this [`Contract`] was created.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: CreationDateTime,
}

impl Entity for Contract {
    type Id = Id;

    const NAME: &'static str = "Contract";

    fn id(&self) -> Id {
        self.id
    }

    fn owner(&self) -> Option<agent::Id> {
        Some(self.agent_id)
    }

    fn validate(&self) -> Result<(), Invalid> {
        if self.end_date.is_some_and(|end| end < self.start_date) {
            return Err(Invalid("end date precedes start date"));
        }
        Ok(())
    }

    fn retain_immutable(&mut self, existing: &Self) {
        self.created_at = existing.created_at;
    }
}

/// [`DateTime`] when a [`Contract`] was created.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<(Contract, unit::Creation)>;
