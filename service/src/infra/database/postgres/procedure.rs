//! Named stored procedures and their typed results.

use common::operations::{By, Call};
use itertools::Itertools as _;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::agent,
    infra::{
        database::{self, Postgres},
        Database,
    },
    read::dashboard::{
        AgentSummary, PropertyStat, PropertySummary, SalesSummary,
    },
};

use super::{
    table::{borrow, Params},
    Connection,
};

/// Description of a stored procedure returning `Self`.
pub trait Procedure: Sized {
    /// Name of the procedure.
    const NAME: &'static str;

    /// Arguments of the procedure.
    type Args;

    /// Returns the positional parameters of the procedure call.
    fn params(args: &Self::Args) -> Params;

    /// Maps the resulting `rows` of the procedure call.
    ///
    /// # Errors
    ///
    /// If the `rows` don't match the expected shape.
    fn from_rows(rows: Vec<Row>) -> Result<Self, database::Error>;
}

impl<C, P> Database<Call<By<P, P::Args>>> for Postgres<C>
where
    C: Connection,
    P: Procedure,
    P::Args: Send,
{
    type Ok = P;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Call(by): Call<By<P, P::Args>>,
    ) -> Result<Self::Ok, Self::Err> {
        let params = P::params(by.as_inner());
        let sql = format!(
            "SELECT * FROM {}({})",
            P::NAME,
            (1..=params.len())
                .format_with(", ", |n, f| f(&format_args!("${n}"))),
        );
        let rows = self
            .query(&sql, &borrow(&params))
            .await
            .map_err(tracerr::wrap!())?;
        P::from_rows(rows).map_err(tracerr::wrap!())
    }
}

/// Reads a non-negative `INT8` count out of the provided `row`.
fn count(row: &Row, column: &str) -> Result<u64, database::Error> {
    u64::try_from(row.get::<_, i64>(column)).map_err(|_| {
        database::Error::Integrity(format!("negative `{column}`"))
    })
}

/// Returns the single row of a one-row procedure result.
fn single(rows: Vec<Row>, name: &str) -> Result<Row, database::Error> {
    rows.into_iter().exactly_one().map_err(|_| {
        database::Error::Integrity(format!("`{name}()` must return one row"))
    })
}

impl Procedure for PropertySummary {
    const NAME: &'static str = "property_summary";

    type Args = ();

    fn params((): &()) -> Params {
        vec![]
    }

    fn from_rows(rows: Vec<Row>) -> Result<Self, database::Error> {
        Ok(Self {
            stats: rows
                .iter()
                .map(|row| {
                    Ok::<_, database::Error>(PropertyStat {
                        status: row.get("status_id"),
                        kind: row.get("property_type_id"),
                        count: count(row, "property_count")?,
                        total_value: row.get("total_value"),
                    })
                })
                .collect::<Result<_, _>>()?,
        })
    }
}

impl Procedure for SalesSummary {
    const NAME: &'static str = "sales_summary";

    /// [`None`] summarizes every agent.
    type Args = Option<agent::Id>;

    fn params(agent: &Option<agent::Id>) -> Params {
        vec![Box::new(*agent)]
    }

    fn from_rows(rows: Vec<Row>) -> Result<Self, database::Error> {
        let row = single(rows, Self::NAME)?;
        Ok(Self {
            transactions: count(&row, "transaction_count")?,
            sales: count(&row, "sale_count")?,
            leases: count(&row, "lease_count")?,
            total_amount: row.get("total_amount"),
            total_commission: row.get("total_commission"),
        })
    }
}

impl Procedure for AgentSummary {
    const NAME: &'static str = "agent_summary";

    type Args = agent::Id;

    fn params(agent: &agent::Id) -> Params {
        vec![Box::new(*agent)]
    }

    fn from_rows(rows: Vec<Row>) -> Result<Self, database::Error> {
        let row = single(rows, Self::NAME)?;
        Ok(Self {
            listings: count(&row, "listing_count")?,
            active_listings: count(&row, "active_listing_count")?,
            showings: count(&row, "showing_count")?,
            contracts: count(&row, "contract_count")?,
            transactions: count(&row, "transaction_count")?,
        })
    }
}
