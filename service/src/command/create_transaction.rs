//! [`Command`] for recording a new [`Transaction`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{property, Entity as _, Invalid, Property, Scope, Transaction},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for recording a new [`Transaction`], closing its [`Property`]
/// with the [`property::Status`] of the [`Transaction`] kind.
#[derive(Clone, Debug)]
pub struct CreateTransaction {
    /// [`Transaction`] to record.
    pub transaction: Transaction,

    /// [`Scope`] the [`Transaction`] must be recorded within.
    pub scope: Scope,
}

impl<Db> Command<CreateTransaction> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<Insert<Transaction>, Err = Traced<database::Error>>
        + Database<Update<Property>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Transaction;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateTransaction,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateTransaction { transaction, scope } = cmd;

        if !scope.permits(transaction.owner()) {
            return Err(tracerr::new!(E::Forbidden));
        }
        transaction
            .validate()
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut property = tx
            .execute(Select(By::<Option<Property>, _>::new(
                transaction.property_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| {
                tracerr::new!(E::PropertyNotExists(transaction.property_id))
            })?;
        property.status = property
            .status
            .transition(transaction.kind.closing_status())
            .map_err(tracerr::from_and_wrap!(=> E))?;
        property.updated_at = DateTime::now().coerce();

        tx.execute(Insert(transaction.clone()))
            .await
            .map_err(|e| {
                if e.as_ref().is_unique_violation() {
                    tracerr::new!(E::AlreadyExists)
                } else if e.as_ref().is_foreign_key_violation() {
                    tracerr::new!(E::ReferenceNotExists)
                } else {
                    tracerr::map_from(e)
                }
            })
            .map(drop)?;
        tx.execute(Update(property.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tracing::info!(
            transaction_id = %transaction.id,
            property_id = %property.id,
            status = %property.status,
            "transaction recorded",
        );

        Ok(transaction)
    }
}

/// Error of [`CreateTransaction`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Transaction`] violates an invariant, or its [`Property`] has been
    /// closed already.
    #[display("Invalid `Transaction`: {_0}")]
    Invalid(Invalid),

    /// [`Transaction`] with the same ID already exists.
    #[display("`Transaction` already exists")]
    AlreadyExists,

    /// [`Transaction`] refers to an agent or a client which does not exist.
    #[display("`Transaction` refers to a missing agent or client")]
    ReferenceNotExists,

    /// [`Transaction`] is out of the allowed [`Scope`].
    #[display("`Transaction` is out of the allowed scope")]
    Forbidden,

    /// [`Property`] of the [`Transaction`] does not exist.
    #[display("`Property(id: {_0})` does not exist")]
    #[from(ignore)]
    PropertyNotExists(#[error(not(source))] property::Id),
}
