//! Dashboard read models, computed by named stored procedures.

use common::Money;
use serde::Serialize;

use crate::domain::property;

/// Inventory statistics of one [`property::Status`] and [`property::Kind`]
/// combination.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct PropertyStat {
    /// [`property::Status`] of the counted properties.
    pub status: property::Status,

    /// [`property::Kind`] of the counted properties.
    #[serde(rename = "property_type")]
    pub kind: property::Kind,

    /// Number of the counted properties.
    pub count: u64,

    /// Summary price of the counted properties.
    pub total_value: Money,
}

/// Inventory statistics of all properties (`property_summary()`).
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct PropertySummary {
    /// Statistics per status and kind, omitting empty combinations.
    pub stats: Vec<PropertyStat>,
}

impl PropertySummary {
    /// Returns the total number of properties.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.stats.iter().map(|s| s.count).sum()
    }

    /// Returns the number of properties with the provided `status`.
    #[must_use]
    pub fn count_by_status(&self, status: property::Status) -> u64 {
        self.stats
            .iter()
            .filter(|s| s.status == status)
            .map(|s| s.count)
            .sum()
    }
}

/// Sales statistics (`sales_summary(agent_id)`), of a single agent or the
/// whole brokerage.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct SalesSummary {
    /// Number of recorded transactions.
    pub transactions: u64,

    /// Number of sales among [`SalesSummary::transactions`].
    pub sales: u64,

    /// Number of leases among [`SalesSummary::transactions`].
    pub leases: u64,

    /// Summary amount of all the transactions.
    pub total_amount: Money,

    /// Summary commission of all the transactions.
    pub total_commission: Money,
}

/// Activity statistics of a single agent (`agent_summary(agent_id)`).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct AgentSummary {
    /// Number of listings.
    pub listings: u64,

    /// Number of listings not expired yet.
    pub active_listings: u64,

    /// Number of showings.
    pub showings: u64,

    /// Number of contracts.
    pub contracts: u64,

    /// Number of transactions.
    pub transactions: u64,
}
