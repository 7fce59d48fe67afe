//! [`Client`] resource.

use common::DateTimeOf;
use serde::Deserialize;
use service::{
    command::{CreateEntity, DeleteClient},
    domain::{
        client,
        person::{Address, Email, Name, Phone, Ssn},
        Client, Scope,
    },
};

use crate::Error;

use super::Resource;

/// Payload of a [`Client`].
#[derive(Debug, Deserialize)]
pub struct ClientInput {
    /// Full name of the [`Client`].
    pub name: Name,

    /// Social security number of the [`Client`].
    pub ssn: Ssn,

    /// Address to send mail to.
    #[serde(default)]
    pub mailing_address: Option<Address>,

    /// Contact phone.
    #[serde(default)]
    pub phone: Option<Phone>,

    /// Contact email.
    #[serde(default)]
    pub email: Option<Email>,
}

/// Deleting a [`Client`] removes the deals it takes part in as well.
impl Resource for Client {
    const PATH: &'static str = "clients";

    type Input = ClientInput;
    type Create = CreateEntity<Self>;
    type Delete = DeleteClient;

    fn from_input(
        id: Option<client::Id>,
        input: ClientInput,
        _: Scope,
    ) -> Result<Self, Error> {
        let ClientInput {
            name,
            ssn,
            mailing_address,
            phone,
            email,
        } = input;
        Ok(Self {
            id: id.unwrap_or_else(client::Id::new),
            name,
            ssn,
            mailing_address,
            phone,
            email,
            created_at: DateTimeOf::now(),
        })
    }

    fn create(self, scope: Scope) -> CreateEntity<Self> {
        CreateEntity {
            entity: self,
            scope,
        }
    }

    fn delete(id: client::Id, _: Scope) -> DeleteClient {
        DeleteClient { id }
    }
}
