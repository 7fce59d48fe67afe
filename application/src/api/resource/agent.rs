//! [`Agent`] resource.

use common::{Date, DateTimeOf};
use serde::Deserialize;
use service::{
    command::{CreateEntity, DeleteAgent},
    domain::{
        agent, brokerage,
        person::{Email, Name, Phone, Ssn},
        Agent, Scope,
    },
};

use crate::Error;

use super::Resource;

/// Payload of an [`Agent`].
#[derive(Debug, Deserialize)]
pub struct AgentInput {
    /// ID of the employing [`Brokerage`].
    ///
    /// [`Brokerage`]: service::domain::Brokerage
    pub brokerage_id: brokerage::Id,

    /// NRDS number of the [`Agent`].
    pub nrds: agent::Nrds,

    /// Full name of the [`Agent`].
    pub name: Name,

    /// Contact phone.
    #[serde(default)]
    pub phone: Option<Phone>,

    /// Contact email.
    #[serde(default)]
    pub email: Option<Email>,

    /// Social security number of the [`Agent`].
    pub ssn: Ssn,

    /// State license number of the [`Agent`].
    pub license_number: agent::LicenseNumber,

    /// Last day the license is valid, if limited.
    #[serde(default)]
    pub license_expiration: Option<Date>,
}

/// Deleting an [`Agent`] removes the rows it owns and its user accounts as
/// well.
impl Resource for Agent {
    const PATH: &'static str = "agents";

    type Input = AgentInput;
    type Create = CreateEntity<Self>;
    type Delete = DeleteAgent;

    fn from_input(
        id: Option<agent::Id>,
        input: AgentInput,
        _: Scope,
    ) -> Result<Self, Error> {
        let AgentInput {
            brokerage_id,
            nrds,
            name,
            phone,
            email,
            ssn,
            license_number,
            license_expiration,
        } = input;
        Ok(Self {
            id: id.unwrap_or_else(agent::Id::new),
            brokerage_id,
            nrds,
            name,
            phone,
            email,
            ssn,
            license_number,
            license_expiration,
            created_at: DateTimeOf::now(),
        })
    }

    fn create(self, scope: Scope) -> CreateEntity<Self> {
        CreateEntity {
            entity: self,
            scope,
        }
    }

    fn delete(id: agent::Id, _: Scope) -> DeleteAgent {
        DeleteAgent { id }
    }
}
