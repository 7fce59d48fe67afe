//! Generic [`Command`]s managing any [`Entity`].

use common::operations::{
    By, Commit, Delete, Insert, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{Entity, Invalid, Scope},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Entity`].
#[derive(Clone, Debug)]
pub struct CreateEntity<T> {
    /// [`Entity`] to create.
    pub entity: T,

    /// [`Scope`] the [`Entity`] must be created within.
    pub scope: Scope,
}

/// [`Command`] for replacing an existing [`Entity`].
///
/// Fields which cannot change after creation are kept as stored.
#[derive(Clone, Debug)]
pub struct UpdateEntity<T> {
    /// New version of the [`Entity`].
    pub entity: T,

    /// [`Scope`] both the stored and the new version must be within.
    pub scope: Scope,
}

/// [`Command`] for deleting an existing [`Entity`].
#[derive(Clone, Debug)]
pub struct DeleteEntity<T: Entity> {
    /// ID of the [`Entity`] to delete.
    pub id: T::Id,

    /// [`Scope`] the [`Entity`] must be within.
    pub scope: Scope,
}

impl<Db, T> Command<CreateEntity<T>> for Service<Db>
where
    Db: Database<Insert<T>, Err = Traced<database::Error>>,
    T: Entity,
{
    type Ok = T;
    type Err = Traced<ExecutionError<T>>;

    async fn execute(
        &self,
        cmd: CreateEntity<T>,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateEntity { entity, scope } = cmd;

        if !scope.permits(entity.owner()) {
            return Err(tracerr::new!(E::Forbidden));
        }
        entity.validate().map_err(tracerr::from_and_wrap!(=> E<_>))?;

        self.database()
            .execute(Insert(entity.clone()))
            .await
            .map_err(write_error)
            .map(drop)?;

        Ok(entity)
    }
}

impl<Db, T> Command<UpdateEntity<T>> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<T>, T::Id>>,
            Ok = Option<T>,
            Err = Traced<database::Error>,
        > + Database<Update<T>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    T: Entity,
{
    type Ok = T;
    type Err = Traced<ExecutionError<T>>;

    async fn execute(
        &self,
        cmd: UpdateEntity<T>,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateEntity { mut entity, scope } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E<_>))?;

        let existing = tx
            .execute(Select(By::new(entity.id())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E<_>))?
            .ok_or_else(|| tracerr::new!(E::NotExists(entity.id())))?;
        if !scope.permits(existing.owner()) || !scope.permits(entity.owner()) {
            return Err(tracerr::new!(E::Forbidden));
        }

        entity.retain_immutable(&existing);
        entity.validate().map_err(tracerr::from_and_wrap!(=> E<_>))?;

        tx.execute(Update(entity.clone()))
            .await
            .map_err(write_error)
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E<_>))
            .map(drop)?;

        Ok(entity)
    }
}

impl<Db, T> Command<DeleteEntity<T>> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<T>, T::Id>>,
            Ok = Option<T>,
            Err = Traced<database::Error>,
        > + Database<Delete<By<T, T::Id>>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    T: Entity,
{
    type Ok = ();
    type Err = Traced<ExecutionError<T>>;

    async fn execute(
        &self,
        cmd: DeleteEntity<T>,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteEntity { id, scope } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E<_>))?;

        let existing = tx
            .execute(Select(By::<Option<T>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E<_>))?
            .ok_or_else(|| tracerr::new!(E::NotExists(id)))?;
        if !scope.permits(existing.owner()) {
            return Err(tracerr::new!(E::Forbidden));
        }

        tx.execute(Delete(By::<T, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E<_>))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E<_>))
            .map(drop)?;

        Ok(())
    }
}

/// Converts a failed write of an [`Entity`] into an [`ExecutionError`].
fn write_error<T: Entity>(
    e: Traced<database::Error>,
) -> Traced<ExecutionError<T>> {
    if e.as_ref().is_unique_violation() {
        tracerr::new!(ExecutionError::AlreadyExists)
    } else if e.as_ref().is_foreign_key_violation() {
        tracerr::new!(ExecutionError::ReferenceNotExists)
    } else {
        tracerr::map_from(e)
    }
}

/// Error of [`CreateEntity`], [`UpdateEntity`] or [`DeleteEntity`]
/// [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError<T: Entity> {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Entity`] violates an invariant.
    #[display("Invalid `{}`: {_0}", T::NAME)]
    Invalid(Invalid),

    /// [`Entity`] with the same unique values already exists.
    #[display("`{}` with the same unique values already exists", T::NAME)]
    AlreadyExists,

    /// [`Entity`] refers to another one which does not exist.
    #[display("`{}` refers to a missing entity", T::NAME)]
    ReferenceNotExists,

    /// [`Entity`] is out of the allowed [`Scope`].
    #[display("`{}` is out of the allowed scope", T::NAME)]
    Forbidden,

    /// [`Entity`] with the provided ID does not exist.
    #[display("`{}(id: {_0})` does not exist", T::NAME)]
    #[from(ignore)]
    NotExists(#[error(not(source))] T::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{agent, client, property, Listing, Scope},
        fixture,
        infra::database::memory::Memory,
        Command as _, Service,
    };

    use super::{CreateEntity, DeleteEntity, ExecutionError, UpdateEntity};

    /// Seeds two [`agent`]s with a listing each.
    async fn seed(svc: &Service<Memory>) -> [(agent::Id, Listing); 2] {
        let brokerage = fixture::brokerage();
        let client = fixture::client();
        let property = fixture::property("1 Main St");
        let brokerage_id = brokerage.id;
        fixture::insert(svc, brokerage).await;
        fixture::insert(svc, client.clone()).await;
        fixture::insert(svc, property.clone()).await;

        let mut seeded = vec![];
        for _ in 0..2 {
            let agent = fixture::agent(brokerage_id);
            let listing = fixture::listing(property.id, agent.id, client.id);
            fixture::insert(svc, agent.clone()).await;
            fixture::insert(svc, listing.clone()).await;
            seeded.push((agent.id, listing));
        }
        seeded.try_into().unwrap()
    }

    #[tokio::test]
    async fn creates_within_scope() {
        let svc = fixture::service();
        let [(a, own), (b, _)] = seed(&svc).await;
        let fresh = fixture::listing(own.property_id, a, own.client_id);

        let created = svc
            .execute(CreateEntity {
                entity: fresh.clone(),
                scope: Scope::Agent(a),
            })
            .await
            .unwrap();
        assert_eq!(created.id, fresh.id);

        let foreign = fixture::listing(own.property_id, b, own.client_id);
        let err = svc
            .execute(CreateEntity {
                entity: foreign,
                scope: Scope::Agent(a),
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::Forbidden));
    }

    #[tokio::test]
    async fn rejects_invalid_entities() {
        let svc = fixture::service();
        let [(a, own), _] = seed(&svc).await;
        let mut listing = fixture::listing(own.property_id, a, own.client_id);
        listing.expiration_date = common::Date::from_ymd(2000, 1, 1);

        let err = svc
            .execute(CreateEntity {
                entity: listing,
                scope: Scope::Admin,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::Invalid(_)));
    }

    #[tokio::test]
    async fn rejects_dangling_references() {
        let svc = fixture::service();
        let [(a, own), _] = seed(&svc).await;
        let orphan = fixture::listing(property::Id::new(), a, own.client_id);

        let err = svc
            .execute(CreateEntity {
                entity: orphan.clone(),
                scope: Scope::Agent(a),
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::ReferenceNotExists));
        assert!(!svc.database().tables().listings.contains_key(&orphan.id));

        let mut changed = own.clone();
        changed.client_id = client::Id::new();
        let err = svc
            .execute(UpdateEntity {
                entity: changed,
                scope: Scope::Agent(a),
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::ReferenceNotExists));
        assert_eq!(
            svc.database().tables().listings[&own.id].client_id,
            own.client_id,
        );
    }

    #[tokio::test]
    async fn reports_duplicates() {
        let svc = fixture::service();
        let brokerage = fixture::brokerage();
        fixture::insert(&svc, brokerage.clone()).await;
        let mut duplicate = fixture::brokerage();
        duplicate.license = brokerage.license.clone();

        let err = svc
            .execute(CreateEntity {
                entity: duplicate,
                scope: Scope::Admin,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::AlreadyExists));
    }

    #[tokio::test]
    async fn agent_cannot_touch_foreign_listing() {
        let svc = fixture::service();
        let [(a, _), (_, foreign)] = seed(&svc).await;

        let mut changed = foreign.clone();
        changed.exclusive = !foreign.exclusive;
        let err = svc
            .execute(UpdateEntity {
                entity: changed,
                scope: Scope::Agent(a),
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::Forbidden));

        let err = svc
            .execute(DeleteEntity::<Listing> {
                id: foreign.id,
                scope: Scope::Agent(a),
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::Forbidden));

        let stored = svc.database().tables().listings[&foreign.id].clone();
        assert_eq!(stored.exclusive, foreign.exclusive);
    }

    #[tokio::test]
    async fn agent_cannot_hand_over_own_listing() {
        let svc = fixture::service();
        let [(a, own), (b, _)] = seed(&svc).await;

        let mut changed = own.clone();
        changed.agent_id = b;
        let err = svc
            .execute(UpdateEntity {
                entity: changed,
                scope: Scope::Agent(a),
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::Forbidden));
        assert_eq!(svc.database().tables().listings[&own.id].agent_id, a);
    }

    #[tokio::test]
    async fn updates_and_deletes_own_listing() {
        let svc = fixture::service();
        let [(a, own), _] = seed(&svc).await;

        let mut changed = own.clone();
        changed.exclusive = true;
        changed.created_at = common::DateTimeOf::UNIX_EPOCH;
        let updated = svc
            .execute(UpdateEntity {
                entity: changed,
                scope: Scope::Agent(a),
            })
            .await
            .unwrap();
        assert!(updated.exclusive);
        assert_eq!(updated.created_at, own.created_at);

        svc.execute(DeleteEntity::<Listing> {
            id: own.id,
            scope: Scope::Agent(a),
        })
        .await
        .unwrap();
        assert!(!svc.database().tables().listings.contains_key(&own.id));

        let err = svc
            .execute(DeleteEntity::<Listing> {
                id: own.id,
                scope: Scope::Admin,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotExists(_)));
    }
}
