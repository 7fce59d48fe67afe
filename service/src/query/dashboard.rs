//! Dashboard [`Query`]s, backed by named stored procedures.

use common::operations::{By, Call};
use serde::Serialize;
use tracerr::Traced;

use crate::{
    domain::agent,
    infra::{database, Database},
    read::dashboard::{AgentSummary, PropertySummary, SalesSummary},
    Query, Service,
};

/// [`Query`] of the brokerage-wide dashboard.
#[derive(Clone, Copy, Debug, Default)]
pub struct Admin;

/// Output of the [`Admin`] [`Query`].
#[derive(Clone, Debug, Serialize)]
pub struct AdminOutput {
    /// Inventory statistics.
    pub properties: PropertySummary,

    /// Sales statistics of every agent.
    pub sales: SalesSummary,
}

impl<Db> Query<Admin> for Service<Db>
where
    Db: Database<
            Call<By<PropertySummary, ()>>,
            Ok = PropertySummary,
            Err = Traced<database::Error>,
        > + Database<
            Call<By<SalesSummary, Option<agent::Id>>>,
            Ok = SalesSummary,
            Err = Traced<database::Error>,
        >,
{
    type Ok = AdminOutput;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Admin) -> Result<Self::Ok, Self::Err> {
        let properties = self
            .database()
            .execute(Call(By::<PropertySummary, _>::new(())))
            .await
            .map_err(tracerr::wrap!())?;
        let sales = self
            .database()
            .execute(Call(By::<SalesSummary, _>::new(None)))
            .await
            .map_err(tracerr::wrap!())?;

        Ok(AdminOutput { properties, sales })
    }
}

/// [`Query`] of the dashboard of a single agent.
#[derive(Clone, Copy, Debug)]
pub struct Agent {
    /// ID of the agent.
    pub id: agent::Id,
}

/// Output of the [`Agent`] [`Query`].
#[derive(Clone, Copy, Debug, Serialize)]
pub struct AgentOutput {
    /// Activity statistics of the agent.
    pub activity: AgentSummary,

    /// Sales statistics of the agent.
    pub sales: SalesSummary,
}

impl<Db> Query<Agent> for Service<Db>
where
    Db: Database<
            Call<By<AgentSummary, agent::Id>>,
            Ok = AgentSummary,
            Err = Traced<database::Error>,
        > + Database<
            Call<By<SalesSummary, Option<agent::Id>>>,
            Ok = SalesSummary,
            Err = Traced<database::Error>,
        >,
{
    type Ok = AgentOutput;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Agent { id }: Agent,
    ) -> Result<Self::Ok, Self::Err> {
        let activity = self
            .database()
            .execute(Call(By::<AgentSummary, _>::new(id)))
            .await
            .map_err(tracerr::wrap!())?;
        let sales = self
            .database()
            .execute(Call(By::<SalesSummary, _>::new(Some(id))))
            .await
            .map_err(tracerr::wrap!())?;

        Ok(AgentOutput { activity, sales })
    }
}
