//! [`Command`] for creating a new [`Property`].

use common::{
    operations::{By, Commit, Delete, Insert, Select, Store, Transact, Transacted},
    Handler as _,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{property, Entity as _, Invalid, Property},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Property`] with its [`property::Detail`]
/// and an optional [`property::Image`].
#[derive(Clone, Debug)]
pub struct CreateProperty {
    /// [`property::Draft`] of a new [`Property`].
    pub draft: property::Draft,

    /// Uploaded [`property::Image`] of a new [`Property`].
    ///
    /// Stored on a best-effort basis.
    pub image: Option<property::Image>,
}

impl CreateProperty {
    /// Maximum number of attempts to generate a unique [`property::TaxId`].
    pub const MAX_TAX_ID_ATTEMPTS: usize = 10;
}

/// Output of [`CreateProperty`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Created [`Property`].
    pub property: Property,

    /// Non-fatal failures happened along the way.
    pub warnings: Vec<PartialFailure>,
}

/// Non-fatal failure of a [`Command`].
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum PartialFailure {
    /// Uploaded [`property::Image`] could not be stored, so the [`Property`]
    /// has been created without it.
    #[display("Image could not be stored, the property was saved without it")]
    ImageNotStored,
}

impl<Db> Command<CreateProperty> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Property>, property::TaxId>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<Insert<Property>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateProperty,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateProperty { draft, image } = cmd;

        let mut property =
            Property::new(draft, property::TaxId::generate(), None);
        property
            .validate()
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let mut warnings = vec![];
        if let Some(image) = image {
            match self.images().execute(Store(image)).await {
                Ok((stored, _)) => property.image = Some(stored),
                Err(e) => {
                    tracing::warn!("failed to store `Property` image: {e}");
                    warnings.push(PartialFailure::ImageNotStored);
                }
            }
        }

        let result: Result<_, Traced<E>> = async {
            let tx = self
                .database()
                .execute(Transact)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;

            let mut unique = false;
            for _ in 0..CreateProperty::MAX_TAX_ID_ATTEMPTS {
                let taken = tx
                    .execute(Select(By::new(property.tax_id.clone())))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .is_some();
                if !taken {
                    unique = true;
                    break;
                }
                property.tax_id = property::TaxId::generate();
            }
            if !unique {
                return Err(tracerr::new!(E::TaxIdExhausted));
            }

            tx.execute(Insert(property.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
            tx.execute(Commit)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)
        }
        .await;

        if let Err(e) = result {
            if let Some(image) = property.image.take() {
                if let Err(e) = self.images().execute(Delete(image)).await {
                    tracing::warn!("failed to remove orphaned image: {e}");
                }
            }
            return Err(e);
        }

        tracing::info!(
            property_id = %property.id,
            tax_id = %property.tax_id,
            "property created",
        );

        Ok(Output { property, warnings })
    }
}

/// Error of [`CreateProperty`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Property`] violates an invariant.
    #[display("Invalid `Property`: {_0}")]
    Invalid(Invalid),

    /// No unique [`property::TaxId`] has been generated.
    #[display(
        "Failed to generate a unique `TaxId` in {} attempts",
        CreateProperty::MAX_TAX_ID_ATTEMPTS
    )]
    TaxIdExhausted,
}
