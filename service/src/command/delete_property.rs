//! [`Command`] for deleting a [`Property`].

use common::{
    operations::{By, Commit, Delete, Select, Transact, Transacted},
    Handler as _,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        property::{self, Commercial, Residential},
        Contract, Listing, Property, PropertyImage, Showing, Transaction,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`Property`] along with its details, gallery and
/// every [`Listing`], [`Showing`], [`Contract`] and [`Transaction`] on it.
#[derive(Clone, Copy, Debug, From)]
pub struct DeleteProperty {
    /// ID of the [`Property`] to delete.
    pub id: property::Id,
}

impl<Db> Command<DeleteProperty> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<PropertyImage>, property::Id>>,
            Ok = Vec<PropertyImage>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<PropertyImage, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Residential, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Commercial, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Listing, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Showing, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Contract, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Transaction, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Property, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeleteProperty,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteProperty { id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let property = tx
            .execute(Select(By::<Option<Property>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| tracerr::new!(E::NotExists(id)))?;
        let gallery = tx
            .execute(Select(By::<Vec<PropertyImage>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Delete(By::<PropertyImage, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Delete(By::<Residential, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Delete(By::<Commercial, _>::new(id)))
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
        tx.execute(Delete(By::<Transaction, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Delete(By::<Property, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let images = property
            .image
            .into_iter()
            .chain(gallery.into_iter().map(|i| i.image));
        for image in images {
            if let Err(e) = self.images().execute(Delete(image)).await {
                tracing::warn!("failed to remove `Property` image: {e}");
            }
        }

        tracing::info!(property_id = %id, "property deleted");

        Ok(())
    }
}

/// Error of [`DeleteProperty`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Property`] with the provided ID does not exist.
    #[display("`Property(id: {_0})` does not exist")]
    #[from(ignore)]
    NotExists(#[error(not(source))] property::Id),
}
