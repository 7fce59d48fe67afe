//! [`ClientRole`] resource.

use common::DateTimeOf;
use serde::Deserialize;
use service::{
    command::{CreateEntity, DeleteEntity},
    domain::{client, client_role, ClientRole, Scope},
};

use crate::Error;

use super::Resource;

/// Payload of a [`ClientRole`].
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct ClientRoleInput {
    /// ID of the tagged [`Client`].
    ///
    /// [`Client`]: service::domain::Client
    pub client_id: client::Id,

    /// Assigned [`client::Role`].
    pub role: client::Role,
}

impl Resource for ClientRole {
    const PATH: &'static str = "client-roles";

    type Input = ClientRoleInput;
    type Create = CreateEntity<Self>;
    type Delete = DeleteEntity<Self>;

    fn from_input(
        id: Option<client_role::Id>,
        input: ClientRoleInput,
        _: Scope,
    ) -> Result<Self, Error> {
        Ok(Self {
            id: id.unwrap_or_else(client_role::Id::new),
            client_id: input.client_id,
            role: input.role,
            assigned_at: DateTimeOf::now(),
        })
    }

    fn create(self, scope: Scope) -> CreateEntity<Self> {
        CreateEntity {
            entity: self,
            scope,
        }
    }

    fn delete(id: client_role::Id, scope: Scope) -> DeleteEntity<Self> {
        DeleteEntity { id, scope }
    }
}
