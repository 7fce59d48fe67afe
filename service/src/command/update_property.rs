//! [`Command`] for updating an existing [`Property`].

use common::{
    operations::{By, Commit, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{property, Entity as _, Invalid, Listing, Property, Scope},
    infra::{database, Database},
    Service,
};

use super::{reaches_property, Command};

/// [`Command`] for updating an existing [`Property`].
///
/// [`property::TaxId`], image and creation time are kept as stored.
#[derive(Clone, Debug)]
pub struct UpdateProperty {
    /// ID of the [`Property`] to update.
    pub id: property::Id,

    /// New editable fields of the [`Property`].
    pub draft: property::Draft,

    /// [`Scope`] the [`Property`] must be within.
    ///
    /// [`Scope::Agent`] only reaches [`Property`]s listed by the [`Agent`].
    ///
    /// [`Agent`]: crate::domain::Agent
    pub scope: Scope,
}

impl<Db> Command<UpdateProperty> for Service<Db>
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
        > + Database<Update<Property>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Property;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateProperty,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateProperty { id, draft, scope } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let existing = tx
            .execute(Select(By::<Option<Property>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| tracerr::new!(E::NotExists(id)))?;

        if !reaches_property(&tx, scope, id)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
        {
            return Err(tracerr::new!(E::Forbidden));
        }

        if draft.detail.kind() != existing.kind() {
            return Err(tracerr::new!(E::Invalid(Invalid(
                "`property_type` cannot change",
            ))));
        }
        let status = existing
            .status
            .transition(draft.status)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let mut property =
            Property::new(draft, existing.tax_id.clone(), existing.image.clone());
        property.id = existing.id;
        property.status = status;
        property.retain_immutable(&existing);
        property.updated_at = DateTime::now().coerce();
        property.validate().map_err(tracerr::from_and_wrap!(=> E))?;

        tx.execute(Update(property.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tracing::info!(property_id = %property.id, "property updated");

        Ok(property)
    }
}

/// Error of [`UpdateProperty`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Property`] violates an invariant.
    #[display("Invalid `Property`: {_0}")]
    Invalid(Invalid),

    /// [`Property`] is out of the allowed [`Scope`].
    #[display("`Property` is out of the allowed scope")]
    Forbidden,

    /// [`Property`] with the provided ID does not exist.
    #[display("`Property(id: {_0})` does not exist")]
    #[from(ignore)]
    NotExists(#[error(not(source))] property::Id),
}
