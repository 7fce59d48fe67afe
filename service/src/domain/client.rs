//! [`Client`] definitions.

use common::{define_kind, unit, DateTimeOf};
use serde::Serialize;

use super::{
    define_id,
    person::{Address, Email, Name, Phone, Ssn},
    Entity,
};

define_id!("Client");

define_kind! {
    #[doc = "Role a [`Client`] may be tagged with."]
    enum Role {
        #[doc = "Buys properties."]
        Buyer = 1,

        #[doc = "Sells properties."]
        Seller = 2,

        #[doc = "Leases properties."]
        Lessee = 3,
    }
}

/// Client of the brokerage.
#[derive(Clone, Debug, Serialize)]
pub struct Client {
    /// ID of this [`Client`].
    pub id: Id,

    /// Full name of this [`Client`].
    pub name: Name,

    /// Unique [`Ssn`] of this [`Client`].
    pub ssn: Ssn,

    /// Mailing address of this [`Client`].
    pub mailing_address: Option<Address>,

    /// Phone of this [`Client`].
    pub phone: Option<Phone>,

    /// Email of this [`Client`].
    pub email: Option<Email>,

    /// [`DateTime`] when this [`Client`] was created.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: CreationDateTime,
}

impl Entity for Client {
    type Id = Id;

    const NAME: &'static str = "Client";

    fn id(&self) -> Id {
        self.id
    }

    fn retain_immutable(&mut self, existing: &Self) {
        self.created_at = existing.created_at;
    }
}

/// [`DateTime`] when a [`Client`] was created.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<(Client, unit::Creation)>;
