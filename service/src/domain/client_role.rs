//! [`ClientRole`] definitions.

use common::{unit, DateTimeOf};
use serde::Serialize;

use super::{client, define_id, Entity};

define_id!("ClientRole");

/// Assignment of a [`client::Role`] to a [`Client`].
///
/// A [`Client`] may hold several roles over time, each one being a separate
/// [`ClientRole`].
///
/// [`Client`]: super::Client
#[derive(Clone, Debug, Serialize)]
pub struct ClientRole {
    /// ID of this [`ClientRole`].
    pub id: Id,

    /// ID of the [`Client`] holding the role.
    ///
    /// [`Client`]: super::Client
    pub client_id: client::Id,

    /// Assigned [`client::Role`].
    pub role: client::Role,

    /// [`DateTime`] when the role was assigned.
    ///
    /// [`DateTime`]: common::DateTime
    pub assigned_at: AssignmentDateTime,
}

impl Entity for ClientRole {
    type Id = Id;

    const NAME: &'static str = "ClientRole";

    fn id(&self) -> Id {
        self.id
    }

    fn retain_immutable(&mut self, existing: &Self) {
        self.client_id = existing.client_id;
        self.assigned_at = existing.assigned_at;
    }
}

/// [`DateTime`] when a [`ClientRole`] was assigned.
///
/// [`DateTime`]: common::DateTime
pub type AssignmentDateTime = DateTimeOf<(ClientRole, unit::Creation)>;
