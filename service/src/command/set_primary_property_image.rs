//! [`Command`] for making an image the primary one of its [`Property`].
//!
//! [`Property`]: crate::domain::Property

use common::operations::{By, Commit, Select, Transact, Transacted, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{property, property_image, Listing, PropertyImage, Scope},
    infra::{database, Database},
    Service,
};

use super::{reaches_property, Command};

/// [`Command`] for making a [`PropertyImage`] the primary one of its
/// [`Property`], unsetting the previous one.
///
/// [`Property`]: crate::domain::Property
#[derive(Clone, Copy, Debug)]
pub struct SetPrimaryPropertyImage {
    /// ID of the [`PropertyImage`] to make primary.
    pub id: property_image::Id,

    /// [`Scope`] the pictured [`Property`] must be within.
    ///
    /// [`Property`]: crate::domain::Property
    pub scope: Scope,
}

impl<Db> Command<SetPrimaryPropertyImage> for Service<Db>
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
        > + Database<Update<PropertyImage>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = PropertyImage;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: SetPrimaryPropertyImage,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SetPrimaryPropertyImage { id, scope } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut image = tx
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
        if image.is_primary {
            return Ok(image);
        }

        // Previous primary goes first, so that at most one is ever primary.
        let previous = tx
            .execute(Select(By::<Vec<PropertyImage>, _>::new(
                image.property_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .into_iter()
            .filter(|i| i.is_primary);
        for mut other in previous {
            other.is_primary = false;
            tx.execute(Update(other))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }

        image.is_primary = true;
        tx.execute(Update(image.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tracing::info!(
            property_id = %image.property_id,
            image_id = %id,
            "primary property image changed",
        );

        Ok(image)
    }
}

/// Error of [`SetPrimaryPropertyImage`] [`Command`] execution.
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
