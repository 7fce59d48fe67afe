//! [`Command`] for deleting an image from the gallery of a [`Property`].
//!
//! [`Property`]: crate::domain::Property

use common::{
    operations::{By, Commit, Delete, Select, Transact, Transacted, Update},
    Handler as _,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{property, property_image, Listing, PropertyImage, Scope},
    infra::{database, Database},
    Service,
};

use super::{reaches_property, Command};

/// [`Command`] for deleting a [`PropertyImage`] along with its files.
///
/// If the primary [`PropertyImage`] is deleted, the oldest remaining one
/// becomes primary.
#[derive(Clone, Copy, Debug)]
pub struct DeletePropertyImage {
    /// ID of the [`PropertyImage`] to delete.
    pub id: property_image::Id,

    /// [`Scope`] the pictured [`Property`] must be within.
    ///
    /// [`Property`]: crate::domain::Property
    pub scope: Scope,
}

impl<Db> Command<DeletePropertyImage> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<PropertyImage>, property_image::Id>>,
            Ok = Option<PropertyImage>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Listing>, property::Id>>,
            Ok = Vec<Listing>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<PropertyImage>, property::Id>>,
            Ok = Vec<PropertyImage>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<PropertyImage, property_image::Id>>,
            Err = Traced<database::Error>,
        > + Database<Update<PropertyImage>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeletePropertyImage,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeletePropertyImage { id, scope } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let image = tx
            .execute(Select(By::<Option<PropertyImage>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| tracerr::new!(E::NotExists(id)))?;
        if !reaches_property(&tx, scope, image.property_id)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
        {
            return Err(tracerr::new!(E::Forbidden));
        }

        tx.execute(Delete(By::<PropertyImage, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if image.is_primary {
            let mut remaining = tx
                .execute(Select(By::<Vec<PropertyImage>, _>::new(
                    image.property_id,
                )))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            property_image::sort(&mut remaining);
            if let Some(mut next) = remaining.into_iter().next() {
                next.is_primary = true;
                tx.execute(Update(next))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
            }
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if let Err(e) = self.images().execute(Delete(image.image)).await {
            tracing::warn!("failed to remove `PropertyImage` files: {e}");
        }

        tracing::info!(
            property_id = %image.property_id,
            image_id = %id,
            "property image deleted",
        );

        Ok(())
    }
}

/// Error of [`DeletePropertyImage`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Pictured [`Property`] is out of the allowed [`Scope`].
    ///
    /// [`Property`]: crate::domain::Property
    #[display("`PropertyImage` is out of the allowed scope")]
    Forbidden,

    /// [`PropertyImage`] with the provided ID does not exist.
    #[display("`PropertyImage(id: {_0})` does not exist")]
    #[from(ignore)]
    NotExists(#[error(not(source))] property_image::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::AddPropertyImage,
        domain::{property, Scope},
        fixture, Command as _,
    };

    use super::{DeletePropertyImage, ExecutionError};

    #[tokio::test]
    async fn deletes_row_and_files() {
        let svc = fixture::service();
        let property = fixture::property("1 Main St");
        fixture::insert(&svc, property.clone()).await;
        let added = svc
            .execute(AddPropertyImage {
                property_id: property.id,
                image: property::Image {
                    file_name: "front.jpg".into(),
                    bytes: fixture::png(32, 32),
                },
                is_primary: false,
                scope: Scope::Admin,
            })
            .await
            .unwrap();
        let dir = svc.images().dir();
        assert!(dir.join(added.image.as_ref()).exists());

        svc.execute(DeletePropertyImage {
            id: added.id,
            scope: Scope::Admin,
        })
        .await
        .unwrap();

        assert!(svc.database().tables().property_images.is_empty());
        assert!(!dir.join(added.image.as_ref()).exists());
        assert!(!dir.join(added.image.thumbnail()).exists());
    }

    #[tokio::test]
    async fn promotes_oldest_remaining_image() {
        let svc = fixture::service();
        let property = fixture::property("1 Main St");
        let primary = fixture::property_image(property.id, true);
        let older = fixture::property_image(property.id, false);
        let mut newer = fixture::property_image(property.id, false);
        newer.created_at = older.created_at + std::time::Duration::from_secs(1);
        fixture::insert(&svc, property.clone()).await;
        fixture::insert(&svc, primary.clone()).await;
        fixture::insert(&svc, older.clone()).await;
        fixture::insert(&svc, newer.clone()).await;

        svc.execute(DeletePropertyImage {
            id: primary.id,
            scope: Scope::Admin,
        })
        .await
        .unwrap();

        let images = svc.database().tables().property_images;
        assert!(!images.contains_key(&primary.id));
        assert!(images[&older.id].is_primary);
        assert!(!images[&newer.id].is_primary);
    }

    #[tokio::test]
    async fn keeps_image_on_failure() {
        let svc = fixture::service();
        let property = fixture::property("1 Main St");
        let image = fixture::property_image(property.id, true);
        fixture::insert(&svc, property.clone()).await;
        fixture::insert(&svc, image.clone()).await;
        svc.database().fail_on("delete PropertyImage");

        let err = svc
            .execute(DeletePropertyImage {
                id: image.id,
                scope: Scope::Admin,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::Db(_)));
        assert!(svc
            .database()
            .tables()
            .property_images
            .contains_key(&image.id));
    }

    #[tokio::test]
    async fn denies_agent_without_listing() {
        let svc = fixture::service();
        let brokerage = fixture::brokerage();
        let agent = fixture::agent(brokerage.id);
        let property = fixture::property("1 Main St");
        let image = fixture::property_image(property.id, true);
        fixture::insert(&svc, brokerage).await;
        fixture::insert(&svc, agent.clone()).await;
        fixture::insert(&svc, property.clone()).await;
        fixture::insert(&svc, image.clone()).await;

        let err = svc
            .execute(DeletePropertyImage {
                id: image.id,
                scope: Scope::Agent(agent.id),
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::Forbidden));
        assert_eq!(svc.database().tables().property_images.len(), 1);
    }
}
