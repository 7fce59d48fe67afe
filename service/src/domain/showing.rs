//! [`Showing`] definitions.

use common::{define_text, unit, Date, DateTimeOf};
use serde::Serialize;

use super::{agent, client, define_id, property, Entity};

define_id!("Showing");

define_text! {
    #[doc = "Feedback of a [`Client`] after a [`Showing`].\n\n[`Client`]: super::Client"]
    struct Feedback(max = 5000);
}

/// [`Property`] shown by an [`Agent`] to a [`Client`].
///
/// [`Agent`]: super::Agent
/// [`Client`]: super::Client
/// [`Property`]: super::Property
#[derive(Clone, Debug, Serialize)]
pub struct Showing {
    /// ID of this [`Showing`].
    pub id: Id,

    /// ID of the shown [`Property`].
    ///
    /// [`Property`]: super::Property
    pub property_id: property::Id,

    /// ID of the showing [`Agent`].
    ///
    /// [`Agent`]: super::Agent
    pub agent_id: agent::Id,

    /// ID of the [`Client`] the [`Property`] is shown to.
    ///
    /// [`Client`]: super::Client
    /// [`Property`]: super::Property
    pub client_id: client::Id,

    /// [`agent::Role`] in this [`Showing`].
    pub agent_role: agent::Role,

    /// Day of this [`Showing`].
    pub showing_date: Date,

    /// [`Feedback`] of the [`Client`].
    ///
    /// [`Client`]: super::Client
    pub feedback: Option<Feedback>,

    /// [`DateTime`] when this [`Showing`] was created.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: CreationDateTime,
}

impl Entity for Showing {
    type Id = Id;

    const NAME: &'static str = "Showing";

    fn id(&self) -> Id {
        self.id
    }

    fn owner(&self) -> Option<agent::Id> {
        Some(self.agent_id)
    }

    fn retain_immutable(&mut self, existing: &Self) {
        self.created_at = existing.created_at;
    }
}

/// [`DateTime`] when a [`Showing`] was created.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<(Showing, unit::Creation)>;
