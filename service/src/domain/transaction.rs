//! [`Transaction`] definitions.

use common::{define_kind, unit, Date, DateTimeOf, Money};
use serde::Serialize;

use super::{agent, client, define_id, property, Entity, Invalid};

define_id!("Transaction");

define_kind! {
    #[doc = "Kind of a [`Transaction`]."]
    enum Kind {
        #[doc = "Ownership transfer."]
        Sale = 1,

        #[doc = "Lease agreement."]
        Lease = 2,
    }
}

impl Kind {
    /// Returns the terminal [`property::Status`] a [`Transaction`] of this
    /// [`Kind`] moves its [`Property`] to.
    ///
    /// [`Property`]: super::Property
    #[must_use]
    pub fn closing_status(self) -> property::Status {
        match self {
            Self::Sale => property::Status::Sold,
            Self::Lease => property::Status::Leased,
        }
    }
}

/// Closed deal on a [`Property`].
///
/// [`Property`]: super::Property
#[derive(Clone, Debug, Serialize)]
pub struct Transaction {
    /// ID of this [`Transaction`].
    pub id: Id,

    /// ID of the [`Property`] changing hands.
    ///
    /// [`Property`]: super::Property
    pub property_id: property::Id,

    /// ID of the selling [`Client`].
    ///
    /// [`Client`]: super::Client
    pub seller_id: client::Id,

    /// ID of the buying [`Client`].
    ///
    /// [`Client`]: super::Client
    pub buyer_id: client::Id,

    /// ID of the [`Agent`] closing this [`Transaction`].
    ///
    /// [`Agent`]: super::Agent
    pub agent_id: agent::Id,

    /// Amount of this [`Transaction`].
    pub amount: Money,

    /// Commission of the [`Agent`].
    ///
    /// [`Agent`]: super::Agent
    pub commission: Option<Money>,

    /// Day this [`Transaction`] happened.
    pub transaction_date: Date,

    /// Day this [`Transaction`] closes.
    pub closing_date: Option<Date>,

    /// [`Kind`] of this [`Transaction`].
    #[serde(rename = "transaction_type")]
    pub kind: Kind,

    /// [`DateTime`] when this [`Transaction`] was created.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: CreationDateTime,
}

impl Entity for Transaction {
    type Id = Id;

    const NAME: &'static str = "Transaction";

    fn id(&self) -> Id {
        self.id
    }

    fn owner(&self) -> Option<agent::Id> {
        Some(self.agent_id)
    }

    fn validate(&self) -> Result<(), Invalid> {
        if self.seller_id == self.buyer_id {
            return Err(Invalid("seller and buyer must differ"));
        }
        if self.commission.is_some_and(|c| c > self.amount) {
            return Err(Invalid("commission exceeds amount"));
        }
        if self
            .closing_date
            .is_some_and(|closing| closing < self.transaction_date)
        {
            return Err(Invalid("closing date precedes transaction date"));
        }
        Ok(())
    }

    fn retain_immutable(&mut self, existing: &Self) {
        self.property_id = existing.property_id;
        self.kind = existing.kind;
        self.created_at = existing.created_at;
    }
}

/// [`DateTime`] when a [`Transaction`] was created.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<(Transaction, unit::Creation)>;
