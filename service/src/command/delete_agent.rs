//! [`Command`] for deleting an [`Agent`].

use common::operations::{By, Commit, Delete, Select, Transact, Transacted};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        agent,
        user::{self, Session},
        Agent, Contract, Listing, Showing, Transaction, User,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for deleting an [`Agent`] along with everything the [`Agent`]
/// owns and the [`User`]s signing in as it.
#[derive(Clone, Copy, Debug, From)]
pub struct DeleteAgent {
    /// ID of the [`Agent`] to delete.
    pub id: agent::Id,
}

impl<Db> Command<DeleteAgent> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Vec<User>, agent::Id>>,
            Ok = Vec<User>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Listing, agent::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Showing, agent::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Contract, agent::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Transaction, agent::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Session, user::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<User, agent::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Agent, agent::Id>>,
            Ok = u64,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeleteAgent) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteAgent { id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Delete(By::<Listing, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Delete(By::<Showing, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Delete(By::<Contract, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Delete(By::<Transaction, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let users = tx
            .execute(Select(By::<Vec<User>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        for user in &users {
            tx.execute(Delete(By::<Session, _>::new(user.id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }
        tx.execute(Delete(By::<User, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let deleted = tx
            .execute(Delete(By::<Agent, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if deleted == 0 {
            return Err(tracerr::new!(E::NotExists(id)));
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tracing::info!(agent_id = %id, users = users.len(), "agent deleted");

        Ok(())
    }
}

/// Error of [`DeleteAgent`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Agent`] with the provided ID does not exist.
    #[display("`Agent(id: {_0})` does not exist")]
    #[from(ignore)]
    NotExists(#[error(not(source))] agent::Id),
}
