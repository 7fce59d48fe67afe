//! [`Command`] definition.

pub mod add_property_image;
pub mod authenticate;
pub mod authorize_admin;
pub mod authorize_agent;
pub mod create_property;
pub mod create_transaction;
pub mod create_user;
pub mod create_user_session;
pub mod delete_agent;
pub mod delete_client;
pub mod delete_property;
pub mod delete_property_image;
pub mod delete_user;
pub mod delete_user_session;
pub mod entity;
pub mod resolve_user_session;
pub mod set_primary_property_image;
pub mod update_property;

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{property, Listing, Scope},
    infra::{database, Database},
};

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    add_property_image::AddPropertyImage,
    authenticate::Authenticate,
    authorize_admin::AuthorizeAdmin,
    authorize_agent::AuthorizeAgent,
    create_property::CreateProperty,
    create_transaction::CreateTransaction,
    create_user::CreateUser,
    create_user_session::CreateUserSession,
    delete_agent::DeleteAgent,
    delete_client::DeleteClient,
    delete_property::DeleteProperty,
    delete_property_image::DeletePropertyImage,
    delete_user::DeleteUser,
    delete_user_session::DeleteUserSession,
    entity::{CreateEntity, DeleteEntity, UpdateEntity},
    resolve_user_session::ResolveUserSession,
    set_primary_property_image::SetPrimaryPropertyImage,
    update_property::UpdateProperty,
};

/// Checks whether the provided [`Scope`] reaches the [`Property`] with the
/// provided ID.
///
/// [`Scope::Agent`] only reaches [`Property`]s listed by the [`Agent`].
///
/// [`Agent`]: crate::domain::Agent
/// [`Property`]: crate::domain::Property
async fn reaches_property<Db>(
    db: &Db,
    scope: Scope,
    id: property::Id,
) -> Result<bool, Traced<database::Error>>
where
    Db: Database<
        Select<By<Vec<Listing>, property::Id>>,
        Ok = Vec<Listing>,
        Err = Traced<database::Error>,
    >,
{
    let Some(agent_id) = scope.agent() else {
        return Ok(true);
    };
    let listed = db
        .execute(Select(By::<Vec<Listing>, _>::new(id)))
        .await
        .map_err(tracerr::wrap!())?
        .iter()
        .any(|l| l.agent_id == agent_id);
    if !listed {
        tracing::warn!(
            property_id = %id,
            agent_id = %agent_id,
            "property access denied: not listed by agent",
        );
    }
    Ok(listed)
}
