//! [`Property`] endpoints.

use axum::{
    extract::{
        multipart::{Field, MultipartRejection},
        DefaultBodyLimit, Multipart,
    },
    routing::{get, put},
    Router,
};
use common::{Page, Pagination};
use serde::{Deserialize, Serialize};
use service::{
    command::{
        self, create_property, delete_property, update_property, Command as _,
    },
    domain::{
        agent,
        property::{self, Property},
        Scope,
    },
    query, read, Query as _,
};

use crate::{
    api::{Json, Path, Query, RequestError},
    context::AuthError,
    AsError, Context, Error,
};

/// Event announced to HTMX clients after a [`Property`] has changed.
const CHANGED: [(&str, &str); 1] = [("hx-trigger", "properties-changed")];

/// Extra body size allowed on top of the image for the rest of an upload.
pub(super) const UPLOAD_OVERHEAD: usize = 1024 * 1024;

/// Routes browsing [`Property`]s without authorization.
pub fn public_routes() -> Router {
    Router::new()
        .route("/properties", get(list))
        .route("/properties/search", get(search))
        .route("/properties/:id", get(read_by_id))
        .route("/properties/tax/:tax_id", get(read_by_tax_id))
}

/// Routes managing [`Property`]s as an admin.
pub fn admin_routes(max_image_size: usize) -> Router {
    Router::new()
        .route(
            "/properties",
            get(admin_list)
                .post(create)
                .layer(DefaultBodyLimit::max(max_image_size + UPLOAD_OVERHEAD)),
        )
        .route(
            "/properties/:id",
            get(admin_read).put(admin_update).delete(delete),
        )
}

/// Routes managing [`Property`]s listed by the calling agent.
pub fn agent_routes() -> Router {
    Router::new()
        .route("/properties", get(agent_list))
        .route("/properties/:id", put(agent_update))
}

/// Query parameters of a [`Property`] list.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListParams {
    /// 1-based number of the requested page.
    pub page: Option<u32>,

    /// Maximum number of [`Property`]s on a page.
    pub limit: Option<u32>,

    /// Only [`Property`]s with this [`property::Status`].
    pub status: Option<property::Status>,

    /// Only [`Property`]s of this [`property::Kind`].
    pub property_type: Option<property::Kind>,
}

impl ListParams {
    /// Builds a [`read::property::Selector`] out of these [`ListParams`].
    fn selector(
        self,
        listed_by: Option<agent::Id>,
    ) -> read::property::Selector {
        read::property::Selector {
            pagination: pagination(self.page, self.limit),
            filter: read::property::Filter {
                status: self.status,
                kind: self.property_type,
                listed_by,
            },
        }
    }
}

/// Query parameters of a [`Property`] search.
#[derive(Clone, Debug, Deserialize)]
pub struct SearchParams {
    /// Address to search for.
    pub q: String,

    /// 1-based number of the requested page.
    pub page: Option<u32>,

    /// Maximum number of [`Property`]s on a page.
    pub limit: Option<u32>,
}

fn pagination(page: Option<u32>, limit: Option<u32>) -> Pagination {
    Pagination::new(
        page.unwrap_or(1),
        limit.unwrap_or(Pagination::DEFAULT_LIMIT),
    )
}

/// Result of [`Property`] creation.
#[derive(Debug, Serialize)]
pub struct Created {
    /// Created [`Property`].
    pub property: Property,

    /// Non-fatal failures happened during the creation.
    pub warnings: Vec<String>,
}

/// Lists [`Property`]s page by page.
///
/// # Errors
///
/// If the storage fails.
pub async fn list(
    ctx: Context,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<Property>>, Error> {
    ctx.service()
        .execute(query::property::List::by(params.selector(None)))
        .await
        .map(Json)
        .map_err(AsError::into_error)
}

/// Searches [`Property`]s by address, the closest matches first.
///
/// # Errors
///
/// If the search query is blank or the storage fails.
pub async fn search(
    ctx: Context,
    Query(params): Query<SearchParams>,
) -> Result<Json<Page<Property>>, Error> {
    let SearchParams { q, page, limit } = params;
    let q = q.trim();
    if q.is_empty() {
        return Err(Error::validation(&"`q` must not be blank"));
    }

    ctx.service()
        .execute(query::property::Search::by(read::property::Search {
            query: q.to_owned(),
            pagination: pagination(page, limit),
        }))
        .await
        .map(Json)
        .map_err(AsError::into_error)
}

/// Returns a [`Property`] by its ID.
///
/// # Errors
///
/// If the [`Property`] doesn't exist or the storage fails.
pub async fn read_by_id(
    ctx: Context,
    Path(id): Path<property::Id>,
) -> Result<Json<Property>, Error> {
    ctx.service()
        .execute(query::property::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .map(Json)
        .ok_or_else(|| RequestError::NotFound.into())
}

/// Returns a [`Property`] by its [`property::TaxId`].
///
/// # Errors
///
/// If the [`Property`] doesn't exist or the storage fails.
pub async fn read_by_tax_id(
    ctx: Context,
    Path(tax_id): Path<String>,
) -> Result<Json<Property>, Error> {
    let Some(tax_id) = property::TaxId::new(tax_id) else {
        return Err(RequestError::NotFound.into());
    };

    ctx.service()
        .execute(query::property::ByTaxId::by(tax_id))
        .await
        .map_err(AsError::into_error)?
        .map(Json)
        .ok_or_else(|| RequestError::NotFound.into())
}

/// Lists [`Property`]s page by page, as an admin.
///
/// # Errors
///
/// If the caller is not an admin or the storage fails.
pub async fn admin_list(
    ctx: Context,
    params: Query<ListParams>,
) -> Result<Json<Page<Property>>, Error> {
    _ = ctx.admin().await?;
    list(ctx, params).await
}

/// Returns a [`Property`] by its ID, as an admin.
///
/// # Errors
///
/// If the caller is not an admin, the [`Property`] doesn't exist or the
/// storage fails.
pub async fn admin_read(
    ctx: Context,
    id: Path<property::Id>,
) -> Result<Json<Property>, Error> {
    _ = ctx.admin().await?;
    read_by_id(ctx, id).await
}

/// Creates a new [`Property`] out of a multipart upload with a `property`
/// JSON part and an optional `image` file part.
///
/// A failure to store the image doesn't fail the creation, and is reported
/// in [`Created::warnings`] instead.
///
/// # Errors
///
/// If the caller is not an admin, the upload is malformed, the [`Property`]
/// is invalid or the storage fails.
pub async fn create(
    ctx: Context,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<
    (http::StatusCode, [(&'static str, &'static str); 1], Json<Created>),
    Error,
> {
    _ = ctx.admin().await?;
    let multipart = multipart.map_err(|e| Error::malformed(&e.body_text()))?;
    let (draft, image) = upload(multipart).await?;

    let create_property::Output { property, warnings } = ctx
        .service()
        .execute(command::CreateProperty { draft, image })
        .await
        .map_err(AsError::into_error)?;

    Ok((
        http::StatusCode::CREATED,
        CHANGED,
        Json(Created {
            property,
            warnings: warnings.iter().map(ToString::to_string).collect(),
        }),
    ))
}

/// Reads a [`property::Draft`] and an optional [`property::Image`] out of
/// the provided [`Multipart`] upload.
async fn upload(
    mut multipart: Multipart,
) -> Result<(property::Draft, Option<property::Image>), Error> {
    let mut draft = None;
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::malformed(&e.body_text()))?
    {
        let name = field.name().map(ToOwned::to_owned);
        match name.as_deref() {
            Some("property") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| Error::malformed(&e.body_text()))?;
                draft = Some(serde_json::from_slice(&bytes).map_err(|e| {
                    if e.is_data() {
                        Error::validation(&e)
                    } else {
                        Error::malformed(&e)
                    }
                })?);
            }
            Some("image") => image = read_image(field).await?,
            Some(_) | None => {}
        }
    }

    let draft =
        draft.ok_or_else(|| Error::malformed(&"missing `property` part"))?;
    Ok((draft, image))
}

/// Reads a [`property::Image`] out of the provided file `field`, unless no
/// file is chosen.
pub(super) async fn read_image(
    field: Field<'_>,
) -> Result<Option<property::Image>, Error> {
    let file_name = field
        .file_name()
        .filter(|n| !n.is_empty())
        .map(ToOwned::to_owned);
    let bytes = field
        .bytes()
        .await
        .map_err(|e| Error::malformed(&e.body_text()))?;
    // Browsers send an empty part when no file is chosen.
    Ok(file_name
        .filter(|_| !bytes.is_empty())
        .map(|file_name| property::Image {
            file_name,
            bytes: bytes.to_vec(),
        }))
}

/// Updates a [`Property`] as an admin.
///
/// # Errors
///
/// If the caller is not an admin, the [`Property`] doesn't exist, the update
/// is invalid or the storage fails.
pub async fn admin_update(
    ctx: Context,
    Path(id): Path<property::Id>,
    Json(draft): Json<property::Draft>,
) -> Result<([(&'static str, &'static str); 1], Json<Property>), Error> {
    _ = ctx.admin().await?;
    update(&ctx, id, draft, Scope::Admin).await
}

/// Deletes a [`Property`] along with everything referencing it.
///
/// # Errors
///
/// If the caller is not an admin, the [`Property`] doesn't exist or the
/// storage fails.
pub async fn delete(
    ctx: Context,
    Path(id): Path<property::Id>,
) -> Result<(http::StatusCode, [(&'static str, &'static str); 1]), Error> {
    _ = ctx.admin().await?;

    ctx.service()
        .execute(command::DeleteProperty { id })
        .await
        .map_err(AsError::into_error)?;

    Ok((http::StatusCode::NO_CONTENT, CHANGED))
}

/// Lists [`Property`]s the calling agent holds a listing for.
///
/// # Errors
///
/// If the caller is not an agent or the storage fails.
pub async fn agent_list(
    ctx: Context,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<Property>>, Error> {
    let agent = ctx.agent().await?.agent;

    ctx.service()
        .execute(query::property::List::by(params.selector(Some(agent.id))))
        .await
        .map(Json)
        .map_err(AsError::into_error)
}

/// Updates a [`Property`] the calling agent holds a listing for.
///
/// # Errors
///
/// If the caller is not an agent, has no listing for the [`Property`], the
/// update is invalid or the storage fails.
pub async fn agent_update(
    ctx: Context,
    Path(id): Path<property::Id>,
    Json(draft): Json<property::Draft>,
) -> Result<([(&'static str, &'static str); 1], Json<Property>), Error> {
    let scope = ctx.agent().await?.scope();
    update(&ctx, id, draft, scope).await
}

async fn update(
    ctx: &Context,
    id: property::Id,
    draft: property::Draft,
    scope: Scope,
) -> Result<([(&'static str, &'static str); 1], Json<Property>), Error> {
    ctx.service()
        .execute(command::UpdateProperty { id, draft, scope })
        .await
        .map(|p| (CHANGED, Json(p)))
        .map_err(AsError::into_error)
}

impl AsError for create_property::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(_) | Self::TaxIdExhausted => None,
            Self::Invalid(e) => e.try_as_error(),
        }
    }
}

impl AsError for update_property::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(_) => None,
            Self::Invalid(e) => e.try_as_error(),
            Self::Forbidden => Some(AuthError::Forbidden.into()),
            Self::NotExists(_) => Some(RequestError::NotFound.into()),
        }
    }
}

impl AsError for delete_property::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(_) => None,
            Self::NotExists(_) => Some(RequestError::NotFound.into()),
        }
    }
}
