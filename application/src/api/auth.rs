//! Session handling endpoints.

use axum::{
    response::{AppendHeaders, Redirect},
    Extension,
};
use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    CookieJar,
};
use secrecy::SecretBox;
use serde::{Deserialize, Serialize};
use service::{
    command::{
        self, authenticate, create_user_session, delete_user_session,
        Command as _,
    },
    domain::{user, Principal},
};

use crate::{
    api::{Form, Json},
    context::{SessionCookie, LOGIN_PATH},
    define_error, AsError, Context, Error,
};

/// Credentials submitted by the login form.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    /// Username to sign in with.
    pub username: String,

    /// Password to sign in with.
    pub password: user::Password,
}

/// Successful login response.
#[derive(Debug, Serialize)]
pub struct LoggedIn {
    /// Signed-in [`Principal`].
    pub principal: Principal,

    /// When the created session expires.
    pub expires_at: user::session::ExpirationDateTime,
}

/// Authenticates the submitted [`Credentials`] and starts a session, setting
/// the session cookie.
///
/// HTMX callers are additionally told to navigate to their dashboard.
///
/// # Errors
///
/// If the credentials are invalid or the session cannot be persisted.
pub async fn login(
    ctx: Context,
    Extension(cookie): Extension<SessionCookie>,
    jar: CookieJar,
    headers: http::HeaderMap,
    Form(credentials): Form<Credentials>,
) -> Result<
    (
        CookieJar,
        AppendHeaders<Option<(&'static str, &'static str)>>,
        Json<LoggedIn>,
    ),
    Error,
> {
    let Credentials { username, password } = credentials;

    let principal = ctx
        .service()
        .execute(command::Authenticate {
            username,
            password: SecretBox::new(Box::new(password)),
        })
        .await
        .map_err(AsError::into_error)?;

    let create_user_session::Output { token, session } = ctx
        .service()
        .execute(command::CreateUserSession {
            principal: principal.clone(),
        })
        .await
        .map_err(AsError::into_error)?;

    let jar = jar.add(
        Cookie::build((cookie.name, token.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(cookie.secure)
            .expires(time::OffsetDateTime::from(session.expires_at)),
    );

    let home = match principal {
        Principal::Admin(_) => Some("/admin"),
        Principal::Agent(_) => Some("/agent"),
        Principal::Anonymous => None,
    };
    let redirect = home
        .filter(|_| headers.contains_key("hx-request"))
        .map(|home| ("hx-redirect", home));

    Ok((
        jar,
        AppendHeaders(redirect),
        Json(LoggedIn {
            principal,
            expires_at: session.expires_at,
        }),
    ))
}

/// Ends the current session, if any, clears the session cookie and sends the
/// caller to the login page.
///
/// # Errors
///
/// If the session cannot be deleted. The session cookie is kept then, as the
/// session remains valid.
pub async fn logout(
    ctx: Context,
    Extension(cookie): Extension<SessionCookie>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), Error> {
    if let Some(token) = ctx.token() {
        ctx.service()
            .execute(command::DeleteUserSession {
                token: token.clone(),
            })
            .await
            .map_err(AsError::into_error)?;
    }

    Ok((
        jar.remove(Cookie::build((cookie.name, "")).path("/")),
        Redirect::to(LOGIN_PATH),
    ))
}

impl AsError for authenticate::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(_) | Self::Blocking(_) => None,
            Self::InvalidCredentials => {
                Some(LoginError::InvalidCredentials.into())
            }
        }
    }
}

impl AsError for create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(_) | Self::JsonWebTokenEncodeError(_) | Self::Anonymous => {
                None
            }
        }
    }
}

impl AsError for delete_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(_) => None,
        }
    }
}

define_error! {
    enum LoginError {
        #[code = "INVALID_CREDENTIALS"]
        #[status = UNAUTHORIZED]
        #[message = "Invalid username or password"]
        InvalidCredentials,
    }
}
