//! [`Command`] for adding an image to the gallery of a [`Property`].

use common::{
    operations::{
        By, Commit, Delete, Insert, Select, Store, Transact, Transacted, Update,
    },
    DateTimeOf, Handler as _,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{property, property_image, Listing, Property, PropertyImage, Scope},
    infra::{database, images, Database},
    Service,
};

use super::{reaches_property, Command};

/// [`Command`] for adding an image to the gallery of a [`Property`].
///
/// The first image of a gallery always becomes its primary one.
#[derive(Clone, Debug)]
pub struct AddPropertyImage {
    /// ID of the pictured [`Property`].
    pub property_id: property::Id,

    /// Uploaded [`property::Image`].
    pub image: property::Image,

    /// Indicator whether the image should become the primary one.
    pub is_primary: bool,

    /// [`Scope`] the [`Property`] must be within.
    pub scope: Scope,
}

impl<Db> Command<AddPropertyImage> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Listing>, property::Id>>,
            Ok = Vec<Listing>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<PropertyImage>, property::Id>>,
            Ok = Vec<PropertyImage>,
            Err = Traced<database::Error>,
        > + Database<Update<PropertyImage>, Err = Traced<database::Error>>
        + Database<Insert<PropertyImage>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = PropertyImage;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AddPropertyImage,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AddPropertyImage {
            property_id,
            image,
            is_primary,
            scope,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        _ = tx
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| tracerr::new!(E::NotExists(property_id)))?;
        if !reaches_property(&tx, scope, property_id)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
        {
            return Err(tracerr::new!(E::Forbidden));
        }

        let (stored, dimensions) = self
            .images()
            .execute(Store(image))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let mut added = PropertyImage {
            id: property_image::Id::new(),
            property_id,
            image: stored,
            dimensions,
            is_primary,
            created_at: DateTimeOf::now(),
        };

        let result: Result<_, Traced<E>> = async {
            let gallery = tx
                .execute(Select(By::<Vec<PropertyImage>, _>::new(property_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            added.is_primary |= gallery.iter().all(|i| !i.is_primary);
            if added.is_primary {
                for mut other in gallery.into_iter().filter(|i| i.is_primary) {
                    other.is_primary = false;
                    tx.execute(Update(other))
                        .await
                        .map_err(tracerr::map_from_and_wrap!(=> E))
                        .map(drop)?;
                }
            }

            tx.execute(Insert(added.clone()))
                .await
                .map_err(|e| {
                    if e.as_ref().is_foreign_key_violation() {
                        tracerr::new!(E::NotExists(property_id))
                    } else {
                        tracerr::map_from(e)
                    }
                })
                .map(drop)?;
            tx.execute(Commit)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)
        }
        .await;

        if let Err(e) = result {
            if let Err(e) = self.images().execute(Delete(added.image)).await {
                tracing::warn!("failed to remove orphaned image: {e}");
            }
            return Err(e);
        }

        tracing::info!(
            property_id = %property_id,
            image_id = %added.id,
            is_primary = added.is_primary,
            "property image added",
        );

        Ok(added)
    }
}

/// Error of [`AddPropertyImage`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`images::Images`] storage error.
    #[display("Image is not stored: {_0}")]
    Image(images::Error),

    /// [`Property`] is out of the allowed [`Scope`].
    #[display("`Property` is out of the allowed scope")]
    Forbidden,

    /// [`Property`] with the provided ID does not exist.
    #[display("`Property(id: {_0})` does not exist")]
    #[from(ignore)]
    NotExists(#[error(not(source))] property::Id),
}
