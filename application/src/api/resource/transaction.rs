//! [`Transaction`] resource.

use common::{Date, DateTimeOf, Money};
use serde::Deserialize;
use service::{
    command::{CreateTransaction, DeleteEntity},
    domain::{agent, client, property, transaction, Scope, Transaction},
};

use crate::Error;

use super::{owner, Resource};

/// Payload of a [`Transaction`].
#[derive(Debug, Deserialize)]
pub struct TransactionInput {
    /// ID of the [`Property`] changing hands.
    ///
    /// [`Property`]: service::domain::Property
    pub property_id: property::Id,

    /// ID of the selling [`Client`].
    ///
    /// [`Client`]: service::domain::Client
    pub seller_id: client::Id,

    /// ID of the buying [`Client`].
    ///
    /// [`Client`]: service::domain::Client
    pub buyer_id: client::Id,

    /// ID of the closing [`Agent`], defaulting to the calling agent.
    ///
    /// [`Agent`]: service::domain::Agent
    #[serde(default)]
    pub agent_id: Option<agent::Id>,

    /// Deal amount.
    pub amount: Money,

    /// Commission of the [`Agent`].
    ///
    /// [`Agent`]: service::domain::Agent
    #[serde(default)]
    pub commission: Option<Money>,

    /// Day of the deal, defaulting to today.
    #[serde(default)]
    pub transaction_date: Option<Date>,

    /// Day of the closing, if closed.
    #[serde(default)]
    pub closing_date: Option<Date>,

    /// [`transaction::Kind`] of the deal.
    #[serde(rename = "transaction_type")]
    pub kind: transaction::Kind,
}

/// Recording a [`Transaction`] closes its [`Property`] in the same
/// database transaction.
///
/// [`Property`]: service::domain::Property
impl Resource for Transaction {
    const PATH: &'static str = "transactions";

    type Input = TransactionInput;
    type Create = CreateTransaction;
    type Delete = DeleteEntity<Self>;

    fn from_input(
        id: Option<transaction::Id>,
        input: TransactionInput,
        scope: Scope,
    ) -> Result<Self, Error> {
        let TransactionInput {
            property_id,
            seller_id,
            buyer_id,
            agent_id,
            amount,
            commission,
            transaction_date,
            closing_date,
            kind,
        } = input;
        Ok(Self {
            id: id.unwrap_or_else(transaction::Id::new),
            property_id,
            seller_id,
            buyer_id,
            agent_id: owner(agent_id, scope)?,
            amount,
            commission,
            transaction_date: transaction_date.unwrap_or_else(Date::today),
            closing_date,
            kind,
            created_at: DateTimeOf::now(),
        })
    }

    fn create(self, scope: Scope) -> CreateTransaction {
        CreateTransaction {
            transaction: self,
            scope,
        }
    }

    fn delete(id: transaction::Id, scope: Scope) -> DeleteEntity<Self> {
        DeleteEntity { id, scope }
    }
}
