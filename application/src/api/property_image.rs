//! [`PropertyImage`] gallery endpoints.

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart},
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use service::{
    command::{
        self, add_property_image, delete_property_image,
        set_primary_property_image, Command as _,
    },
    domain::{property, property_image, PropertyImage, Scope},
    infra::images,
    query, Query as _,
};

use crate::{
    api::{
        property::{read_image, UPLOAD_OVERHEAD},
        Json, Path, Query, RequestError,
    },
    context::AuthError,
    AsError, Context, Error,
};

/// Event announced to HTMX clients after a gallery has changed.
const CHANGED: [(&str, &str); 1] = [("hx-trigger", "property-images-changed")];

/// Routes browsing galleries without authorization.
pub fn public_routes() -> Router {
    Router::new().route("/properties/:id/images", get(list))
}

/// Routes managing galleries as an admin.
pub fn admin_routes(max_image_size: usize) -> Router {
    Router::new()
        .route(
            "/properties/:id/images",
            post(admin_add)
                .layer(DefaultBodyLimit::max(max_image_size + UPLOAD_OVERHEAD)),
        )
        .route("/property-images/:id/primary", put(admin_set_primary))
        .route("/property-images/:id", delete(admin_delete))
}

/// Routes managing galleries of [`property::Property`]s listed by the calling
/// agent.
pub fn agent_routes(max_image_size: usize) -> Router {
    Router::new()
        .route(
            "/properties/:id/images",
            post(agent_add)
                .layer(DefaultBodyLimit::max(max_image_size + UPLOAD_OVERHEAD)),
        )
        .route("/property-images/:id/primary", put(agent_set_primary))
        .route("/property-images/:id", delete(agent_delete))
}

/// [`PropertyImage`] along with the public URLs of its files.
#[derive(Debug, Serialize)]
pub struct View {
    /// Described [`PropertyImage`].
    #[serde(flatten)]
    pub image: PropertyImage,

    /// Public URL of the image.
    pub url: String,

    /// Public URL of the image thumbnail.
    pub thumbnail_url: String,
}

impl From<PropertyImage> for View {
    fn from(image: PropertyImage) -> Self {
        Self {
            url: image.image.url(),
            thumbnail_url: image.image.thumbnail_url(),
            image,
        }
    }
}

/// Query parameters of an image upload.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct UploadParams {
    /// Indicator whether the uploaded image should become the primary one.
    pub is_primary: bool,
}

/// Lists the gallery of a [`property::Property`], the primary image first.
///
/// # Errors
///
/// If the [`property::Property`] doesn't exist or the storage fails.
pub async fn list(
    ctx: Context,
    Path(id): Path<property::Id>,
) -> Result<Json<Vec<View>>, Error> {
    ctx.service()
        .execute(query::property::Gallery(id))
        .await
        .map_err(AsError::into_error)?
        .map(|images| Json(images.into_iter().map(View::from).collect()))
        .ok_or_else(|| RequestError::NotFound.into())
}

/// Adds an image to a gallery as an admin, out of a multipart upload with an
/// `image` file part.
///
/// # Errors
///
/// If the caller is not an admin, the upload is malformed or not a supported
/// image, the [`property::Property`] doesn't exist or the storage fails.
pub async fn admin_add(
    ctx: Context,
    Path(id): Path<property::Id>,
    Query(params): Query<UploadParams>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<
    (http::StatusCode, [(&'static str, &'static str); 1], Json<View>),
    Error,
> {
    _ = ctx.admin().await?;
    add(&ctx, id, params, multipart, Scope::Admin).await
}

/// Adds an image to the gallery of a [`property::Property`] the calling agent
/// holds a listing for.
///
/// # Errors
///
/// If the caller is not an agent or has no listing for the
/// [`property::Property`], the upload is malformed or not a supported image,
/// or the storage fails.
pub async fn agent_add(
    ctx: Context,
    Path(id): Path<property::Id>,
    Query(params): Query<UploadParams>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<
    (http::StatusCode, [(&'static str, &'static str); 1], Json<View>),
    Error,
> {
    let scope = ctx.agent().await?.scope();
    add(&ctx, id, params, multipart, scope).await
}

async fn add(
    ctx: &Context,
    property_id: property::Id,
    params: UploadParams,
    multipart: Result<Multipart, MultipartRejection>,
    scope: Scope,
) -> Result<
    (http::StatusCode, [(&'static str, &'static str); 1], Json<View>),
    Error,
> {
    let multipart = multipart.map_err(|e| Error::malformed(&e.body_text()))?;
    let image = upload(multipart).await?;

    ctx.service()
        .execute(command::AddPropertyImage {
            property_id,
            image,
            is_primary: params.is_primary,
            scope,
        })
        .await
        .map(|i| (http::StatusCode::CREATED, CHANGED, Json(View::from(i))))
        .map_err(AsError::into_error)
}

/// Reads the required `image` file part out of the provided [`Multipart`]
/// upload.
async fn upload(mut multipart: Multipart) -> Result<property::Image, Error> {
    let mut image = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::malformed(&e.body_text()))?
    {
        if field.name() == Some("image") {
            image = read_image(field).await?;
        }
    }
    image.ok_or_else(|| Error::malformed(&"missing `image` part"))
}

/// Makes a [`PropertyImage`] the primary one of its gallery, as an admin.
///
/// # Errors
///
/// If the caller is not an admin, the [`PropertyImage`] doesn't exist or the
/// storage fails.
pub async fn admin_set_primary(
    ctx: Context,
    Path(id): Path<property_image::Id>,
) -> Result<([(&'static str, &'static str); 1], Json<View>), Error> {
    _ = ctx.admin().await?;
    set_primary(&ctx, id, Scope::Admin).await
}

/// Makes a [`PropertyImage`] of a [`property::Property`] the calling agent
/// holds a listing for the primary one.
///
/// # Errors
///
/// If the caller is not an agent or has no listing for the pictured
/// [`property::Property`], the [`PropertyImage`] doesn't exist or the storage
/// fails.
pub async fn agent_set_primary(
    ctx: Context,
    Path(id): Path<property_image::Id>,
) -> Result<([(&'static str, &'static str); 1], Json<View>), Error> {
    let scope = ctx.agent().await?.scope();
    set_primary(&ctx, id, scope).await
}

async fn set_primary(
    ctx: &Context,
    id: property_image::Id,
    scope: Scope,
) -> Result<([(&'static str, &'static str); 1], Json<View>), Error> {
    ctx.service()
        .execute(command::SetPrimaryPropertyImage { id, scope })
        .await
        .map(|i| (CHANGED, Json(View::from(i))))
        .map_err(AsError::into_error)
}

/// Deletes a [`PropertyImage`] along with its files, as an admin.
///
/// # Errors
///
/// If the caller is not an admin, the [`PropertyImage`] doesn't exist or the
/// storage fails.
pub async fn admin_delete(
    ctx: Context,
    Path(id): Path<property_image::Id>,
) -> Result<(http::StatusCode, [(&'static str, &'static str); 1]), Error> {
    _ = ctx.admin().await?;
    remove(&ctx, id, Scope::Admin).await
}

/// Deletes a [`PropertyImage`] of a [`property::Property`] the calling agent
/// holds a listing for.
///
/// # Errors
///
/// If the caller is not an agent or has no listing for the pictured
/// [`property::Property`], the [`PropertyImage`] doesn't exist or the storage
/// fails.
pub async fn agent_delete(
    ctx: Context,
    Path(id): Path<property_image::Id>,
) -> Result<(http::StatusCode, [(&'static str, &'static str); 1]), Error> {
    let scope = ctx.agent().await?.scope();
    remove(&ctx, id, scope).await
}

async fn remove(
    ctx: &Context,
    id: property_image::Id,
    scope: Scope,
) -> Result<(http::StatusCode, [(&'static str, &'static str); 1]), Error> {
    ctx.service()
        .execute(command::DeletePropertyImage { id, scope })
        .await
        .map_err(AsError::into_error)?;

    Ok((http::StatusCode::NO_CONTENT, CHANGED))
}

impl AsError for images::Error {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Io(_) | Self::Blocking(_) | Self::InvalidRef(_) => None,
            Self::Undecodable(_)
            | Self::TooLarge { .. }
            | Self::UnsupportedFormat(_) => Some(Error::validation(self)),
        }
    }
}

impl AsError for add_property_image::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(_) => None,
            Self::Image(e) => e.try_as_error(),
            Self::Forbidden => Some(AuthError::Forbidden.into()),
            Self::NotExists(_) => Some(RequestError::NotFound.into()),
        }
    }
}

impl AsError for set_primary_property_image::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(_) => None,
            Self::Forbidden => Some(AuthError::Forbidden.into()),
            Self::NotExists(_) => Some(RequestError::NotFound.into()),
        }
    }
}

impl AsError for delete_property_image::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(_) => None,
            Self::Forbidden => Some(AuthError::Forbidden.into()),
            Self::NotExists(_) => Some(RequestError::NotFound.into()),
        }
    }
}
