//! [`Brokerage`] resource.

use common::DateTimeOf;
use serde::Deserialize;
use service::{
    command::{CreateEntity, DeleteEntity},
    domain::{
        brokerage,
        person::{Address, Email, Name, Phone},
        Brokerage, Scope,
    },
};

use crate::Error;

use super::Resource;

/// Payload of a [`Brokerage`].
#[derive(Debug, Deserialize)]
pub struct BrokerageInput {
    /// Name of the [`Brokerage`].
    pub name: Name,

    /// Office address.
    #[serde(default)]
    pub address: Option<Address>,

    /// Contact phone.
    #[serde(default)]
    pub phone: Option<Phone>,

    /// Contact email.
    #[serde(default)]
    pub email: Option<Email>,

    /// State license of the [`Brokerage`].
    pub license: brokerage::License,
}

impl Resource for Brokerage {
    const PATH: &'static str = "brokerages";

    type Input = BrokerageInput;
    type Create = CreateEntity<Self>;
    type Delete = DeleteEntity<Self>;

    fn from_input(
        id: Option<brokerage::Id>,
        input: BrokerageInput,
        _: Scope,
    ) -> Result<Self, Error> {
        let BrokerageInput {
            name,
            address,
            phone,
            email,
            license,
        } = input;
        Ok(Self {
            id: id.unwrap_or_else(brokerage::Id::new),
            name,
            address,
            phone,
            email,
            license,
            created_at: DateTimeOf::now(),
        })
    }

    fn create(self, scope: Scope) -> CreateEntity<Self> {
        CreateEntity {
            entity: self,
            scope,
        }
    }

    fn delete(id: brokerage::Id, scope: Scope) -> DeleteEntity<Self> {
        DeleteEntity { id, scope }
    }
}
