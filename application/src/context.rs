//! [`Context`]-related definitions.

use std::future::Future;

use axum::{
    async_trait,
    extract::{FromRequestParts, MatchedPath, Request},
    middleware::Next,
    response::{IntoResponse as _, Redirect, Response},
};
use axum_extra::{
    extract::CookieJar,
    headers::{authorization::Bearer, Authorization, HeaderMapExt as _},
};
use service::{
    command::{self, authorize_admin, authorize_agent, Command as _},
    domain::{principal, user::session, Scope},
};

use crate::{define_error, AsError, Error, Service};

/// Path of the login page unauthorized browsers are sent to.
pub const LOGIN_PATH: &str = "/login";

/// Request context.
#[derive(Debug)]
pub struct Context {
    /// [`Service`] instance serving the request.
    service: Service,

    /// [`session::Token`] provided with the request, if any.
    token: Option<session::Token>,

    /// Route of the request, for logging access decisions.
    route: String,
}

impl Context {
    /// Returns [`Service`] instance of this [`Context`].
    #[must_use]
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Returns [`session::Token`] provided with the request, if any.
    #[must_use]
    pub fn token(&self) -> Option<&session::Token> {
        self.token.as_ref()
    }

    /// Authorizes the caller as an admin.
    ///
    /// # Errors
    ///
    /// Errors if the caller has no valid session or is not an admin.
    pub async fn admin(&self) -> Result<principal::Admin, Error> {
        let res = self
            .service
            .execute(command::AuthorizeAdmin {
                token: self.token.clone(),
            })
            .await;
        match &res {
            Ok(admin) => tracing::info!(
                username = %admin.username,
                role = "ADMIN",
                route = %self.route,
                "access granted",
            ),
            Err(e) => tracing::warn!(
                role = "ADMIN",
                route = %self.route,
                "access denied: {e}",
            ),
        }
        res.map_err(AsError::into_error)
    }

    /// Authorizes the caller as an agent with a valid license.
    ///
    /// # Errors
    ///
    /// Errors if the caller has no valid session, is not linked to an
    /// existing agent, or the agent's license has expired.
    pub async fn agent(&self) -> Result<authorize_agent::Output, Error> {
        let res = self
            .service
            .execute(command::AuthorizeAgent {
                token: self.token.clone(),
            })
            .await;
        match &res {
            Ok(out) => tracing::info!(
                username = %out.principal.username,
                role = "AGENT",
                agent_id = %out.agent.id,
                route = %self.route,
                "access granted",
            ),
            Err(e) => tracing::warn!(
                role = "AGENT",
                route = %self.route,
                "access denied: {e}",
            ),
        }
        res.map_err(AsError::into_error)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Context
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let service = parts
            .extensions
            .get::<Service>()
            .map(Service::for_request)
            .ok_or_else(|| Error::internal(&"missing `Service` extension"))?;
        let cookie =
            parts.extensions.get::<SessionCookie>().ok_or_else(|| {
                Error::internal(&"missing `SessionCookie` extension")
            })?;

        Ok(Self {
            service,
            token: token(&parts.headers, &cookie.name),
            route: parts.extensions.get::<MatchedPath>().map_or_else(
                || parts.uri.path().to_owned(),
                |p| p.as_str().to_owned(),
            ),
        })
    }
}

/// Extracts a [`session::Token`] from the session cookie, falling back to the
/// `Authorization: Bearer` header.
fn token(headers: &http::HeaderMap, cookie: &str) -> Option<session::Token> {
    CookieJar::from_headers(headers)
        .get(cookie)
        .map(|c| c.value().to_owned())
        .or_else(|| {
            headers
                .typed_get::<Authorization<Bearer>>()
                .map(|Authorization(bearer)| bearer.token().to_owned())
        })
        .filter(|t| !t.is_empty())
        .and_then(|t| t.parse().ok())
}

/// Settings of the session cookie.
#[derive(Clone, Debug)]
pub struct SessionCookie {
    /// Name of the cookie.
    pub name: String,

    /// Whether the cookie is sent over HTTPS only.
    pub secure: bool,
}

/// Access guard of a group of routes.
pub trait Guard {
    /// Authorizes the caller, returning the [`Scope`] of its operations.
    fn authorize(
        ctx: &Context,
    ) -> impl Future<Output = Result<Scope, Error>> + Send;
}

/// [`Guard`] admitting admins only.
#[derive(Clone, Copy, Debug)]
pub struct Admin;

impl Guard for Admin {
    async fn authorize(ctx: &Context) -> Result<Scope, Error> {
        ctx.admin().await.map(|_| Scope::Admin)
    }
}

/// [`Guard`] admitting agents with a valid license only.
#[derive(Clone, Copy, Debug)]
pub struct Agent;

impl Guard for Agent {
    async fn authorize(ctx: &Context) -> Result<Scope, Error> {
        ctx.agent().await.map(|out| out.scope())
    }
}

/// Middleware sending callers rejected as unauthorized to the login page.
///
/// Browser navigations get a `303 See Other`, HTMX requests get an
/// `HX-Redirect` header, and everything else gets the error untouched.
pub async fn redirect_to_login(req: Request, next: Next) -> Response {
    let htmx = req.headers().contains_key("hx-request");
    let html = req
        .headers()
        .get(http::header::ACCEPT)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|h| h.contains("text/html"));

    let mut res = next.run(req).await;
    if res.status() != http::StatusCode::UNAUTHORIZED {
        return res;
    }

    if htmx {
        _ = res.headers_mut().insert(
            "hx-redirect",
            http::HeaderValue::from_static(LOGIN_PATH),
        );
        res
    } else if html {
        Redirect::to(LOGIN_PATH).into_response()
    } else {
        res
    }
}

impl AsError for authorize_admin::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Resolve(_) => None,
            Self::Unauthorized => Some(AuthError::AuthorizationRequired.into()),
            Self::Forbidden => Some(AuthError::Forbidden.into()),
        }
    }
}

impl AsError for authorize_agent::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(_) | Self::Resolve(_) => None,
            Self::Unauthorized => Some(AuthError::AuthorizationRequired.into()),
            Self::Forbidden => Some(AuthError::Forbidden.into()),
            Self::LicenseExpired => Some(AuthError::LicenseExpired.into()),
        }
    }
}

define_error! {
    enum AuthError {
        #[code = "AUTHORIZATION_REQUIRED"]
        #[status = UNAUTHORIZED]
        #[message = "Authorization required"]
        AuthorizationRequired,

        #[code = "FORBIDDEN"]
        #[status = FORBIDDEN]
        #[message = "Access to this resource is forbidden"]
        Forbidden,

        #[code = "LICENSE_EXPIRED"]
        #[status = FORBIDDEN]
        #[message = "Agent license has expired"]
        LicenseExpired,
    }
}
