//! [`User`] account endpoints.

use axum::{
    routing::{delete, get},
    Router,
};
use common::{Page, Pagination};
use secrecy::SecretBox;
use serde::Deserialize;
use service::{
    command::{self, create_user, delete_user, Command as _},
    domain::{agent, user, User},
    query, read, Query as _,
};

use crate::{
    api::{Json, Path, Query, RequestError},
    AsError, Context, Error,
};

/// Routes managing [`User`]s as an admin.
pub fn routes() -> Router {
    Router::new()
        .route("/users", get(list).post(create))
        .route("/users/:id", delete(remove))
}

/// Account to create.
#[derive(Debug, Deserialize)]
pub struct NewUser {
    /// Unique [`user::Username`] to sign in with.
    pub username: user::Username,

    /// [`user::Password`] to sign in with.
    pub password: user::Password,

    /// [`user::Role`] of the [`User`].
    pub role: user::Role,

    /// [`Agent`] to link an agent [`User`] to.
    ///
    /// [`Agent`]: service::domain::Agent
    #[serde(default)]
    pub agent_id: Option<agent::Id>,
}

/// Lists [`User`]s page by page.
///
/// # Errors
///
/// If the caller is not an admin or the storage fails.
pub async fn list(
    ctx: Context,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Page<User>>, Error> {
    _ = ctx.admin().await?;

    ctx.service()
        .execute(query::entity::List::<User>::by(read::list::Selector {
            pagination,
            owner: None,
        }))
        .await
        .map(Json)
        .map_err(AsError::into_error)
}

/// Creates a new [`User`].
///
/// # Errors
///
/// If the caller is not an admin, the [`User`] is invalid or the storage
/// fails.
pub async fn create(
    ctx: Context,
    Json(new): Json<NewUser>,
) -> Result<(http::StatusCode, Json<User>), Error> {
    _ = ctx.admin().await?;
    let NewUser {
        username,
        password,
        role,
        agent_id,
    } = new;

    ctx.service()
        .execute(command::CreateUser {
            username,
            password: SecretBox::new(Box::new(password)),
            role,
            agent_id,
        })
        .await
        .map(|u| (http::StatusCode::CREATED, Json(u)))
        .map_err(AsError::into_error)
}

/// Deletes a [`User`] along with its sessions.
///
/// # Errors
///
/// If the caller is not an admin, the [`User`] doesn't exist or the storage
/// fails.
pub async fn remove(
    ctx: Context,
    Path(id): Path<user::Id>,
) -> Result<http::StatusCode, Error> {
    _ = ctx.admin().await?;

    ctx.service()
        .execute(command::DeleteUser { id })
        .await
        .map(|()| http::StatusCode::NO_CONTENT)
        .map_err(AsError::into_error)
}

impl AsError for create_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(_) | Self::Blocking(_) | Self::Hash(_) => None,
            Self::Invalid(e) => e.try_as_error(),
            Self::AgentNotExists(_) => Some(Error::not_found(self)),
            Self::UsernameOccupied(_) | Self::WeakPassword => {
                Some(Error::validation(self))
            }
        }
    }
}

impl AsError for delete_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(_) => None,
            Self::NotExists(_) => Some(RequestError::NotFound.into()),
        }
    }
}
