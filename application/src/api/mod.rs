//! HTTP API definitions.

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod property;
pub mod property_image;
pub mod resource;
pub mod user;

use axum::{
    extract::{FromRequest, FromRequestParts},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use service::domain::property::ImageRef;
use tower_http::services::ServeDir;

use crate::{context::redirect_to_login, define_error, Error};

/// Builds the [`Router`] of the whole HTTP API.
///
/// Expects [`Service`] and [`SessionCookie`] request extensions to be
/// provided by the outer layers.
///
/// [`Service`]: crate::Service
/// [`SessionCookie`]: crate::context::SessionCookie
pub fn router(images: &service::Images) -> Router {
    let admin = Router::new()
        .route("/", get(dashboard::admin))
        .merge(property::admin_routes(images.max_size()))
        .merge(property_image::admin_routes(images.max_size()))
        .merge(user::routes())
        .merge(resource::admin_routes())
        .layer(middleware::from_fn(redirect_to_login));

    let agent = Router::new()
        .route("/", get(dashboard::agent))
        .merge(property::agent_routes())
        .merge(property_image::agent_routes(images.max_size()))
        .merge(resource::agent_routes())
        .layer(middleware::from_fn(redirect_to_login));

    Router::new()
        .route("/login", post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/health", get(health::check))
        .merge(property::public_routes())
        .merge(property_image::public_routes())
        .nest("/admin", admin)
        .nest("/agent", agent)
        .nest_service(ImageRef::URL_PATH, ServeDir::new(images.dir()))
}

/// [`axum::Json`] rejecting with an [`Error`].
#[derive(Clone, Copy, Debug, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// [`axum::Form`] rejecting with an [`Error`].
#[derive(Clone, Copy, Debug, Default, FromRequest)]
#[from_request(via(axum::Form), rejection(Error))]
pub struct Form<T>(pub T);

/// [`axum::extract::Path`] rejecting with an [`Error`].
#[derive(Clone, Copy, Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(Error))]
pub struct Path<T>(pub T);

/// [`axum::extract::Query`] rejecting with an [`Error`].
#[derive(Clone, Copy, Debug, Default, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Error))]
pub struct Query<T>(pub T);

define_error! {
    enum RequestError {
        #[code = "NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "Requested resource does not exist"]
        NotFound,
    }
}
