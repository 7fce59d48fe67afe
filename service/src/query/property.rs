//! [`Query`] collection related to [`Property`].

use common::{
    operations::{By, Select},
    Page,
};
use tracerr::Traced;

use crate::{
    domain::{property, property_image, Property, PropertyImage},
    infra::{database, Database},
    read, Service,
};

use super::{DatabaseQuery, Query};

/// Queries a [`Property`] by its [`property::Id`].
pub type ById = DatabaseQuery<By<Option<Property>, property::Id>>;

/// Queries a [`Property`] by its [`property::TaxId`].
pub type ByTaxId = DatabaseQuery<By<Option<Property>, property::TaxId>>;

/// Queries a [`Page`] of [`Property`] list.
pub type List =
    DatabaseQuery<By<Page<Property>, read::property::Selector>>;

/// Queries a [`Page`] of [`Property`]s matching an address search.
pub type Search = DatabaseQuery<By<Page<Property>, read::property::Search>>;

/// Queries the gallery of a [`Property`], the primary image first.
///
/// Resolves to [`None`] if the [`Property`] doesn't exist.
#[derive(Clone, Copy, Debug)]
pub struct Gallery(pub property::Id);

impl<Db> Query<Gallery> for Service<Db>
where
    Db: Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<PropertyImage>, property::Id>>,
            Ok = Vec<PropertyImage>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Option<Vec<PropertyImage>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Gallery(id): Gallery,
    ) -> Result<Self::Ok, Self::Err> {
        let exists = self
            .database()
            .execute(Select(By::<Option<Property>, _>::new(id)))
            .await
            .map_err(tracerr::wrap!())?
            .is_some();
        if !exists {
            return Ok(None);
        }

        let mut images = self
            .database()
            .execute(Select(By::<Vec<PropertyImage>, _>::new(id)))
            .await
            .map_err(tracerr::wrap!())?;
        property_image::sort(&mut images);
        Ok(Some(images))
    }
}
