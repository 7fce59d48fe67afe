//! [`Showing`] resource.

use common::{Date, DateTimeOf};
use serde::Deserialize;
use service::{
    command::{CreateEntity, DeleteEntity},
    domain::{agent, client, property, showing, Scope, Showing},
};

use crate::Error;

use super::{owner, Resource};

/// Payload of a [`Showing`].
#[derive(Debug, Deserialize)]
pub struct ShowingInput {
    /// ID of the shown [`Property`].
    ///
    /// [`Property`]: service::domain::Property
    pub property_id: property::Id,

    /// ID of the showing [`Agent`], defaulting to the calling agent.
    ///
    /// [`Agent`]: service::domain::Agent
    #[serde(default)]
    pub agent_id: Option<agent::Id>,

    /// ID of the [`Client`] the [`Property`] is shown to.
    ///
    /// [`Client`]: service::domain::Client
    /// [`Property`]: service::domain::Property
    pub client_id: client::Id,

    /// [`agent::Role`] in the [`Showing`].
    pub agent_role: agent::Role,

    /// Day of the [`Showing`].
    pub showing_date: Date,

    /// Feedback of the [`Client`].
    ///
    /// [`Client`]: service::domain::Client
    #[serde(default)]
    pub feedback: Option<showing::Feedback>,
}

impl Resource for Showing {
    const PATH: &'static str = "showings";

    type Input = ShowingInput;
    type Create = CreateEntity<Self>;
    type Delete = DeleteEntity<Self>;

    fn from_input(
        id: Option<showing::Id>,
        input: ShowingInput,
        scope: Scope,
    ) -> Result<Self, Error> {
        let ShowingInput {
            property_id,
            agent_id,
            client_id,
            agent_role,
            showing_date,
            feedback,
        } = input;
        Ok(Self {
            id: id.unwrap_or_else(showing::Id::new),
            property_id,
            agent_id: owner(agent_id, scope)?,
            client_id,
            agent_role,
            showing_date,
            feedback,
            created_at: DateTimeOf::now(),
        })
    }

    fn create(self, scope: Scope) -> CreateEntity<Self> {
        CreateEntity {
            entity: self,
            scope,
        }
    }

    fn delete(id: showing::Id, scope: Scope) -> DeleteEntity<Self> {
        DeleteEntity { id, scope }
    }
}
