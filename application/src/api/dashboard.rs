//! Dashboard endpoints.

use serde::Serialize;
use service::{
    domain::Agent,
    query::{self, dashboard},
    Query as _,
};

use crate::{api::Json, AsError, Context, Error};

/// Dashboard of an agent.
#[derive(Debug, Serialize)]
pub struct AgentDashboard {
    /// [`Agent`] the dashboard belongs to.
    pub agent: Agent,

    /// Statistics of the [`Agent`].
    #[serde(flatten)]
    pub stats: dashboard::AgentOutput,
}

/// Returns the brokerage-wide dashboard.
///
/// # Errors
///
/// If the caller is not an admin or the statistics cannot be loaded.
pub async fn admin(
    ctx: Context,
) -> Result<Json<dashboard::AdminOutput>, Error> {
    _ = ctx.admin().await?;

    ctx.service()
        .execute(query::dashboard::Admin)
        .await
        .map(Json)
        .map_err(AsError::into_error)
}

/// Returns the dashboard of the calling agent.
///
/// # Errors
///
/// If the caller is not an agent or the statistics cannot be loaded.
pub async fn agent(ctx: Context) -> Result<Json<AgentDashboard>, Error> {
    let authorized = ctx.agent().await?;

    let stats = ctx
        .service()
        .execute(query::dashboard::Agent {
            id: authorized.agent.id,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(AgentDashboard {
        agent: authorized.agent,
        stats,
    }))
}
