//! [`Listing`] resource.

use common::{Date, DateTimeOf, Money};
use serde::Deserialize;
use service::{
    command::{CreateEntity, DeleteEntity},
    domain::{agent, client, listing, property, Listing, Scope},
};

use crate::Error;

use super::{owner, Resource};

/// Payload of a [`Listing`].
#[derive(Debug, Deserialize)]
pub struct ListingInput {
    /// ID of the listed [`Property`].
    ///
    /// [`Property`]: service::domain::Property
    pub property_id: property::Id,

    /// ID of the listing [`Agent`], defaulting to the calling agent.
    ///
    /// [`Agent`]: service::domain::Agent
    #[serde(default)]
    pub agent_id: Option<agent::Id>,

    /// ID of the represented [`Client`].
    ///
    /// [`Client`]: service::domain::Client
    pub client_id: client::Id,

    /// [`agent::Role`] in the [`Listing`].
    pub agent_role: agent::Role,

    /// Day the [`Listing`] starts, defaulting to today.
    #[serde(default)]
    pub listing_date: Option<Date>,

    /// Last day of the [`Listing`], if limited.
    #[serde(default)]
    pub expiration_date: Option<Date>,

    /// Indicator whether the [`Listing`] is exclusive.
    #[serde(default)]
    pub exclusive: bool,

    /// Asking price.
    pub asking_price: Money,
}

impl Resource for Listing {
    const PATH: &'static str = "listings";

    type Input = ListingInput;
    type Create = CreateEntity<Self>;
    type Delete = DeleteEntity<Self>;

    fn from_input(
        id: Option<listing::Id>,
        input: ListingInput,
        scope: Scope,
    ) -> Result<Self, Error> {
        let ListingInput {
            property_id,
            agent_id,
            client_id,
            agent_role,
            listing_date,
            expiration_date,
            exclusive,
            asking_price,
        } = input;
        Ok(Self {
            id: id.unwrap_or_else(listing::Id::new),
            property_id,
            agent_id: owner(agent_id, scope)?,
            client_id,
            agent_role,
            listing_date: listing_date.unwrap_or_else(Date::today),
            expiration_date,
            exclusive,
            asking_price,
            created_at: DateTimeOf::now(),
        })
    }

    fn create(self, scope: Scope) -> CreateEntity<Self> {
        CreateEntity {
            entity: self,
            scope,
        }
    }

    fn delete(id: listing::Id, scope: Scope) -> DeleteEntity<Self> {
        DeleteEntity { id, scope }
    }
}
