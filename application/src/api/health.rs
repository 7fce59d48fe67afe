//! Health check endpoint.

use serde::Serialize;
use service::{query, Query as _};

use crate::{api::Json, AsError, Context, Error};

/// Health check response.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Health {
    /// Always `ok`, as failures are reported as [`Error`]s.
    pub status: &'static str,
}

/// Checks that the storage answers a round-trip query.
///
/// # Errors
///
/// If the storage is unreachable.
pub async fn check(ctx: Context) -> Result<Json<Health>, Error> {
    _ = ctx
        .service()
        .execute(query::health::Alive::by(()))
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(Health { status: "ok" }))
}
