//! Generic CRUD endpoints of [`Resource`]s.

mod agent;
mod brokerage;
mod client;
mod client_role;
mod contract;
mod listing;
mod showing;
mod transaction;

use std::fmt;

use axum::{routing::get, Router};
use common::{Page, Pagination};
use serde::{de::DeserializeOwned, Serialize};
use service::{
    command::{self, delete_agent, delete_client, create_transaction, entity},
    domain::{
        self, Agent, Brokerage, Client, ClientRole, Contract, Entity, Listing,
        Showing, Transaction,
    },
    infra::database,
    query, read, Command, Query as _,
};
use tracerr::Traced;

use crate::{
    api::{Json, Path, Query, RequestError},
    context::{self, AuthError, Guard},
    AsError, Context, Error, Service,
};

pub use self::{
    agent::AgentInput, brokerage::BrokerageInput, client::ClientInput,
    client_role::ClientRoleInput, contract::ContractInput,
    listing::ListingInput, showing::ShowingInput,
    transaction::TransactionInput,
};

/// [`Entity`] exposed through the generic CRUD endpoints.
pub trait Resource: Entity + Serialize {
    /// Path segment of this [`Resource`] collection.
    const PATH: &'static str;

    /// Request payload creating or replacing this [`Resource`].
    type Input: DeserializeOwned + Send + 'static;

    /// [`Command`] creating this [`Resource`].
    type Create;

    /// [`Command`] deleting this [`Resource`].
    type Delete;

    /// Builds this [`Resource`] out of the provided [`Resource::Input`].
    ///
    /// A new ID is generated if none is provided.
    ///
    /// # Errors
    ///
    /// If the [`Resource::Input`] is incomplete for the provided [`Scope`].
    ///
    /// [`Scope`]: domain::Scope
    fn from_input(
        id: Option<Self::Id>,
        input: Self::Input,
        scope: domain::Scope,
    ) -> Result<Self, Error>;

    /// Builds the [`Resource::Create`] [`Command`] for this [`Resource`].
    fn create(self, scope: domain::Scope) -> Self::Create;

    /// Builds the [`Resource::Delete`] [`Command`] for the [`Resource`] with
    /// the provided ID.
    fn delete(id: Self::Id, scope: domain::Scope) -> Self::Delete;
}

/// Registers the CRUD routes of every provided [`Resource`] behind the
/// provided [`Guard`].
macro_rules! routes {
    ($guard:ty => $($resource:ty),* $(,)?) => {
        Router::new()
            $(
                .route(
                    &format!("/{}", <$resource as Resource>::PATH),
                    get(list::<$resource, $guard>)
                        .post(create::<$resource, $guard>),
                )
                .route(
                    &format!("/{}/:id", <$resource as Resource>::PATH),
                    get(read_one::<$resource, $guard>)
                        .put(update::<$resource, $guard>)
                        .delete(delete::<$resource, $guard>),
                )
            )*
    };
}

/// Routes managing every [`Resource`] as an admin.
pub fn admin_routes() -> Router {
    routes!(context::Admin =>
        Brokerage,
        Agent,
        Client,
        ClientRole,
        Listing,
        Showing,
        Contract,
        Transaction,
    )
}

/// Routes managing the agent-owned [`Resource`]s of the calling agent.
pub fn agent_routes() -> Router {
    routes!(context::Agent => Listing, Showing, Contract, Transaction)
}

/// Returns the header announcing a change of `R` to HTMX clients.
fn changed<R: Resource>() -> [(&'static str, String); 1] {
    [("hx-trigger", format!("{}-changed", R::PATH))]
}

/// Resolves the [`Agent`] owning a new row.
///
/// Agents own what they create, while admins must name the owner.
fn owner(
    agent_id: Option<domain::agent::Id>,
    scope: domain::Scope,
) -> Result<domain::agent::Id, Error> {
    match (agent_id, scope) {
        (Some(id), _) | (None, domain::Scope::Agent(id)) => Ok(id),
        (None, domain::Scope::Admin) => {
            Err(Error::validation(&"`agent_id` is required"))
        }
    }
}

/// Lists `R`s page by page, restricted to the caller's own rows for agents.
async fn list<R, G>(
    ctx: Context,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Page<R>>, Error>
where
    R: Resource,
    G: Guard,
    Service: service::Query<
        query::entity::List<R>,
        Ok = Page<R>,
        Err = Traced<database::Error>,
    >,
{
    let owner = match G::authorize(&ctx).await? {
        domain::Scope::Admin => None,
        domain::Scope::Agent(id) => Some(id),
    };

    ctx.service()
        .execute(query::entity::List::<R>::by(read::list::Selector {
            pagination,
            owner,
        }))
        .await
        .map(Json)
        .map_err(AsError::into_error)
}

async fn create<R, G>(
    ctx: Context,
    Json(input): Json<R::Input>,
) -> Result<(http::StatusCode, [(&'static str, String); 1], Json<R>), Error>
where
    R: Resource,
    G: Guard,
    Service: Command<R::Create, Ok = R>,
    <Service as Command<R::Create>>::Err: AsError + fmt::Display,
{
    let scope = G::authorize(&ctx).await?;
    let resource = R::from_input(None, input, scope)?;

    let created = ctx
        .service()
        .execute(resource.create(scope))
        .await
        .map_err(AsError::into_error)?;

    Ok((http::StatusCode::CREATED, changed::<R>(), Json(created)))
}

async fn read_one<R, G>(
    ctx: Context,
    Path(id): Path<R::Id>,
) -> Result<Json<R>, Error>
where
    R: Resource,
    R::Id: DeserializeOwned,
    G: Guard,
    Service: service::Query<
        query::entity::Owned<R>,
        Ok = Option<R>,
        Err = Traced<query::entity::ExecutionError>,
    >,
{
    let scope = G::authorize(&ctx).await?;

    ctx.service()
        .execute(query::entity::Owned::<R> { id, scope })
        .await
        .map_err(AsError::into_error)?
        .map(Json)
        .ok_or_else(|| RequestError::NotFound.into())
}

async fn update<R, G>(
    ctx: Context,
    Path(id): Path<R::Id>,
    Json(input): Json<R::Input>,
) -> Result<([(&'static str, String); 1], Json<R>), Error>
where
    R: Resource,
    R::Id: DeserializeOwned,
    G: Guard,
    Service: Command<
        command::UpdateEntity<R>,
        Ok = R,
        Err = Traced<entity::ExecutionError<R>>,
    >,
{
    let scope = G::authorize(&ctx).await?;
    let entity = R::from_input(Some(id), input, scope)?;

    ctx.service()
        .execute(command::UpdateEntity { entity, scope })
        .await
        .map(|updated| (changed::<R>(), Json(updated)))
        .map_err(AsError::into_error)
}

async fn delete<R, G>(
    ctx: Context,
    Path(id): Path<R::Id>,
) -> Result<(http::StatusCode, [(&'static str, String); 1]), Error>
where
    R: Resource,
    R::Id: DeserializeOwned,
    G: Guard,
    Service: Command<R::Delete, Ok = ()>,
    <Service as Command<R::Delete>>::Err: AsError + fmt::Display,
{
    let scope = G::authorize(&ctx).await?;

    ctx.service()
        .execute(R::delete(id, scope))
        .await
        .map_err(AsError::into_error)?;

    Ok((http::StatusCode::NO_CONTENT, changed::<R>()))
}

impl<T: Entity> AsError for entity::ExecutionError<T> {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(_) => None,
            Self::Invalid(e) => e.try_as_error(),
            Self::AlreadyExists => Some(Error::validation(self)),
            Self::ReferenceNotExists => Some(Error::not_found(self)),
            Self::Forbidden => Some(AuthError::Forbidden.into()),
            Self::NotExists(_) => Some(RequestError::NotFound.into()),
        }
    }
}

impl AsError for query::entity::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(_) => None,
            Self::Forbidden => Some(AuthError::Forbidden.into()),
        }
    }
}

impl AsError for delete_agent::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(_) => None,
            Self::NotExists(_) => Some(RequestError::NotFound.into()),
        }
    }
}

impl AsError for delete_client::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(_) => None,
            Self::NotExists(_) => Some(RequestError::NotFound.into()),
        }
    }
}

impl AsError for create_transaction::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(_) => None,
            Self::Invalid(e) => e.try_as_error(),
            Self::AlreadyExists => Some(Error::validation(self)),
            Self::PropertyNotExists(_) | Self::ReferenceNotExists => {
                Some(Error::not_found(self))
            }
            Self::Forbidden => Some(AuthError::Forbidden.into()),
        }
    }
}

#[cfg(test)]
mod spec {
    use service::{
        command::entity::ExecutionError,
        domain::{agent, Listing, Scope},
    };

    use crate::AsError as _;

    use super::owner;

    #[test]
    fn agents_own_what_they_create() {
        let me = agent::Id::new();

        assert_eq!(owner(None, Scope::Agent(me)).unwrap(), me);
        assert_eq!(owner(Some(me), Scope::Admin).unwrap(), me);
    }

    #[test]
    fn admins_must_name_owner() {
        let err = owner(None, Scope::Admin).unwrap_err();

        assert_eq!(err.code, "VALIDATION_ERROR");
        assert_eq!(err.message, "`agent_id` is required");
    }

    #[test]
    fn maps_entity_errors() {
        let forbidden = ExecutionError::<Listing>::Forbidden.into_error();
        assert_eq!(forbidden.code, "FORBIDDEN");
        assert_eq!(forbidden.status_code, http::StatusCode::FORBIDDEN);

        let missing = ExecutionError::<Listing>::NotExists(Default::default())
            .into_error();
        assert_eq!(missing.code, "NOT_FOUND");

        let dangling =
            ExecutionError::<Listing>::ReferenceNotExists.into_error();
        assert_eq!(dangling.code, "NOT_FOUND");
        assert_eq!(dangling.status_code, http::StatusCode::NOT_FOUND);
        assert_eq!(dangling.message, "`Listing` refers to a missing entity");

        let duplicate = ExecutionError::<Listing>::AlreadyExists.into_error();
        assert_eq!(duplicate.code, "VALIDATION_ERROR");
        assert_eq!(
            duplicate.message,
            "`Listing` with the same unique values already exists",
        );
    }
}
