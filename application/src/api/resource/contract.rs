//! [`Contract`] resource.

use common::{Date, DateTimeOf};
use serde::Deserialize;
use service::{
    command::{CreateEntity, DeleteEntity},
    domain::{agent, client, contract, property, Contract, Scope},
};

use crate::Error;

use super::{owner, Resource};

/// Payload of a [`Contract`].
#[derive(Debug, Deserialize)]
pub struct ContractInput {
    /// ID of the [`Property`] the [`Contract`] is about.
    ///
    /// [`Property`]: service::domain::Property
    pub property_id: property::Id,

    /// ID of the contracting [`Client`].
    ///
    /// [`Client`]: service::domain::Client
    pub client_id: client::Id,

    /// ID of the contracting [`Agent`], defaulting to the calling agent.
    ///
    /// [`Agent`]: service::domain::Agent
    #[serde(default)]
    pub agent_id: Option<agent::Id>,

    /// [`contract::Kind`] of the agreement.
    #[serde(rename = "contract_type")]
    pub kind: contract::Kind,

    /// First day of the [`Contract`].
    pub start_date: Date,

    /// Last day of the [`Contract`], if limited.
    #[serde(default)]
    pub end_date: Option<Date>,

    /// Free-form terms.
    #[serde(default)]
    pub terms: Option<contract::Terms>,
}

impl Resource for Contract {
    const PATH: &'static str = "contracts";

    type Input = ContractInput;
    type Create = CreateEntity<Self>;
    type Delete = DeleteEntity<Self>;

    fn from_input(
        id: Option<contract::Id>,
        input: ContractInput,
        scope: Scope,
    ) -> Result<Self, Error> {
        let ContractInput {
            property_id,
            client_id,
            agent_id,
            kind,
            start_date,
            end_date,
            terms,
        } = input;
        Ok(Self {
            id: id.unwrap_or_else(contract::Id::new),
            property_id,
            client_id,
            agent_id: owner(agent_id, scope)?,
            kind,
            start_date,
            end_date,
            terms,
            created_at: DateTimeOf::now(),
        })
    }

    fn create(self, scope: Scope) -> CreateEntity<Self> {
        CreateEntity {
            entity: self,
            scope,
        }
    }

    fn delete(id: contract::Id, scope: Scope) -> DeleteEntity<Self> {
        DeleteEntity { id, scope }
    }
}
