//! [`Brokerage`] definitions.

use common::{define_text, unit, DateTimeOf};
use serde::Serialize;

use super::{
    define_id,
    person::{Address, Email, Name, Phone},
    Entity,
};

define_id!("Brokerage");

define_text! {
    #[doc = "State license of a [`Brokerage`]."]
    struct License(max = 50);
}

/// Real-estate brokerage employing [`Agent`]s.
///
/// [`Agent`]: super::Agent
#[derive(Clone, Debug, Serialize)]
pub struct Brokerage {
    /// ID of this [`Brokerage`].
    pub id: Id,

    /// Name of this [`Brokerage`].
    pub name: Name,

    /// Office address of this [`Brokerage`].
    pub address: Option<Address>,

    /// Office phone of this [`Brokerage`].
    pub phone: Option<Phone>,

    /// Contact email of this [`Brokerage`].
    pub email: Option<Email>,

    /// Unique [`License`] of this [`Brokerage`].
    pub license: License,

    /// [`DateTime`] when this [`Brokerage`] was created.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: CreationDateTime,
}

impl Entity for Brokerage {
    type Id = Id;

    const NAME: &'static str = "Brokerage";

    fn id(&self) -> Id {
        self.id
    }

    fn retain_immutable(&mut self, existing: &Self) {
        self.created_at = existing.created_at;
    }
}

/// [`DateTime`] when a [`Brokerage`] was created.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<(Brokerage, unit::Creation)>;
