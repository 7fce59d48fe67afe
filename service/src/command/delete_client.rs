//! [`Command`] for deleting a [`Client`].

use common::operations::{By, Commit, Delete, Transact, Transacted};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        client, Client, ClientRole, Contract, Listing, Showing, Transaction,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`Client`] along with its [`ClientRole`]s and
/// every [`Listing`], [`Showing`], [`Contract`] and [`Transaction`] it takes
/// part in.
#[derive(Clone, Copy, Debug, From)]
pub struct DeleteClient {
    /// ID of the [`Client`] to delete.
    pub id: client::Id,
}

impl<Db> Command<DeleteClient> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Delete<By<ClientRole, client::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Listing, client::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Showing, client::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Contract, client::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Transaction, client::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Client, client::Id>>,
            Ok = u64,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeleteClient) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteClient { id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Delete(By::<ClientRole, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
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
        // Both as seller and as buyer.
        tx.execute(Delete(By::<Transaction, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let deleted = tx
            .execute(Delete(By::<Client, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if deleted == 0 {
            return Err(tracerr::new!(E::NotExists(id)));
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tracing::info!(client_id = %id, "client deleted");

        Ok(())
    }
}

/// Error of [`DeleteClient`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Client`] with the provided ID does not exist.
    #[display("`Client(id: {_0})` does not exist")]
    #[from(ignore)]
    NotExists(#[error(not(source))] client::Id),
}

#[cfg(test)]
mod spec {
    use common::DateTimeOf;

    use crate::{
        domain::{client, client_role, ClientRole},
        fixture, Command as _,
    };

    use super::{DeleteClient, ExecutionError};

    #[tokio::test]
    async fn deletes_client_with_roles_and_deals() {
        let svc = fixture::service();
        let brokerage = fixture::brokerage();
        let agent = fixture::agent(brokerage.id);
        let buyer = fixture::client();
        let seller = fixture::client();
        let property = fixture::property("1 Main St");
        fixture::insert(&svc, brokerage).await;
        fixture::insert(&svc, agent.clone()).await;
        fixture::insert(&svc, buyer.clone()).await;
        fixture::insert(&svc, seller.clone()).await;
        fixture::insert(&svc, property.clone()).await;
        let (p, a) = (property.id, agent.id);
        fixture::insert(
            &svc,
            ClientRole {
                id: client_role::Id::new(),
                client_id: buyer.id,
                role: client::Role::Buyer,
                assigned_at: DateTimeOf::now(),
            },
        )
        .await;
        fixture::insert(&svc, fixture::listing(p, a, seller.id)).await;
        fixture::insert(&svc, fixture::showing(p, a, buyer.id)).await;
        fixture::insert(&svc, fixture::contract(p, a, buyer.id)).await;
        fixture::insert(&svc, fixture::transaction(p, a, seller.id, buyer.id))
            .await;

        svc.execute(DeleteClient::from(buyer.id)).await.unwrap();

        let tables = svc.database().tables();
        assert_eq!(tables.clients.keys().collect::<Vec<_>>(), [&seller.id]);
        assert!(tables.client_roles.is_empty());
        assert!(tables.showings.is_empty());
        assert!(tables.contracts.is_empty());
        assert!(tables.transactions.is_empty());
        assert_eq!(tables.listings.len(), 1);
    }

    #[tokio::test]
    async fn fails_on_unknown_client() {
        let svc = fixture::service();

        let err = svc
            .execute(DeleteClient::from(client::Id::new()))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotExists(_)));
    }
}
