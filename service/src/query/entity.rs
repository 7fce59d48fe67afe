//! Generic [`Query`] collection related to any [`Entity`].

use common::{
    operations::{By, Select},
    Page,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{Entity, Scope},
    infra::{database, Database},
    read, Service,
};

use super::{DatabaseQuery, Query};

/// Queries an [`Entity`] by its ID.
pub type ById<T> = DatabaseQuery<By<Option<T>, <T as Entity>::Id>>;

/// Queries a [`Page`] of [`Entity`] list.
pub type List<T> = DatabaseQuery<By<Page<T>, read::list::Selector>>;

/// [`Query`] of an [`Entity`] by its ID, restricted to the provided
/// [`Scope`].
#[derive(Clone, Debug)]
pub struct Owned<T: Entity> {
    /// ID of the [`Entity`].
    pub id: T::Id,

    /// [`Scope`] the [`Entity`] must be within.
    pub scope: Scope,
}

impl<Db, T> Query<Owned<T>> for Service<Db>
where
    Db: Database<
        Select<By<Option<T>, T::Id>>,
        Ok = Option<T>,
        Err = Traced<database::Error>,
    >,
    T: Entity,
{
    type Ok = Option<T>;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, query: Owned<T>) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let Owned { id, scope } = query;

        let Some(entity) = self
            .database()
            .execute(Select(By::<Option<T>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
        else {
            return Ok(None);
        };
        if !scope.permits(entity.owner()) {
            return Err(tracerr::new!(E::Forbidden));
        }

        Ok(Some(entity))
    }
}

/// Error of [`Owned`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Entity`] is out of the allowed [`Scope`].
    #[display("Out of the allowed scope")]
    Forbidden,
}

#[cfg(test)]
mod spec {
    use common::Pagination;

    use crate::{
        domain::{Listing, Scope},
        fixture, read, Query as _,
    };

    use super::{ExecutionError, List, Owned};

    #[tokio::test]
    async fn agent_reads_only_own_rows() {
        let svc = fixture::service();
        let brokerage = fixture::brokerage();
        let client = fixture::client();
        let property = fixture::property("1 Main St");
        let (a, b) = (fixture::agent(brokerage.id), fixture::agent(brokerage.id));
        let own = fixture::listing(property.id, a.id, client.id);
        let foreign = fixture::listing(property.id, b.id, client.id);
        fixture::insert(&svc, brokerage).await;
        fixture::insert(&svc, a.clone()).await;
        fixture::insert(&svc, b.clone()).await;
        fixture::insert(&svc, client).await;
        fixture::insert(&svc, property).await;
        fixture::insert(&svc, own.clone()).await;
        fixture::insert(&svc, foreign.clone()).await;

        let found = svc
            .execute(Owned::<Listing> {
                id: own.id,
                scope: Scope::Agent(a.id),
            })
            .await
            .unwrap();
        assert_eq!(found.map(|l| l.id), Some(own.id));

        let err = svc
            .execute(Owned::<Listing> {
                id: foreign.id,
                scope: Scope::Agent(a.id),
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::Forbidden));

        let page = svc
            .execute(List::<Listing>::by(read::list::Selector {
                pagination: Pagination::default(),
                owner: Some(a.id),
            }))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, own.id);

        let page = svc
            .execute(List::<Listing>::by(read::list::Selector::default()))
            .await
            .unwrap();
        assert_eq!(page.total, 2);
    }
}
