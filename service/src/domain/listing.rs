//! [`Listing`] definitions.

use common::{unit, Date, DateTimeOf, Money};
use serde::Serialize;

use super::{agent, client, define_id, property, Entity, Invalid};

define_id!("Listing");

/// [`Property`] listed by an [`Agent`] on behalf of a [`Client`].
///
/// [`Agent`]: super::Agent
/// [`Client`]: super::Client
/// [`Property`]: super::Property
#[derive(Clone, Debug, Serialize)]
pub struct Listing {
    /// ID of this [`Listing`].
    pub id: Id,

    /// ID of the listed [`Property`].
    ///
    /// [`Property`]: super::Property
    pub property_id: property::Id,

    /// ID of the listing [`Agent`].
    ///
    /// [`Agent`]: super::Agent
    pub agent_id: agent::Id,

    /// ID of the represented [`Client`].
    ///
    /// [`Client`]: super::Client
    pub client_id: client::Id,

    /// [`agent::Role`] in this [`Listing`].
    pub agent_role: agent::Role,

    /// Day this [`Listing`] starts.
    pub listing_date: Date,

    /// Last day of this [`Listing`], if limited.
    pub expiration_date: Option<Date>,

    /// Indicator whether this [`Listing`] is exclusive.
    pub exclusive: bool,

    /// Asking price.
    pub asking_price: Money,

    /// [`DateTime`] when this [`Listing`] was created.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: CreationDateTime,
}

impl Entity for Listing {
    type Id = Id;

    const NAME: &'static str = "Listing";

    fn id(&self) -> Id {
        self.id
    }

    fn owner(&self) -> Option<agent::Id> {
        Some(self.agent_id)
    }

    fn validate(&self) -> Result<(), Invalid> {
        if self.expiration_date.is_some_and(|exp| exp < self.listing_date) {
            return Err(Invalid("expiration date precedes listing date"));
        }
        Ok(())
    }

    fn retain_immutable(&mut self, existing: &Self) {
        self.created_at = existing.created_at;
    }
}

/// [`DateTime`] when a [`Listing`] was created.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<(Listing, unit::Creation)>;
