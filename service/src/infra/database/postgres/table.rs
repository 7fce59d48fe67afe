//! Table descriptors of [`Entity`]s.

use tokio_postgres::{types::ToSql, Row};

use crate::{domain::Entity, infra::database};

/// Boxed parameters of a statement.
pub type Params = Vec<Box<dyn ToSql + Sync + Send>>;

/// Description of the table an [`Entity`] is stored in.
pub trait Table: Entity<Id: ToSql + Sync + Send> {
    /// Name of the table.
    const TABLE: &'static str;

    /// Columns of the table, the primary key first, in the order of
    /// [`Table::to_params()`].
    const COLUMNS: &'static [&'static str];

    /// Column referencing the owning [`Agent`], if any.
    ///
    /// [`Agent`]: crate::domain::Agent
    const OWNER: Option<&'static str> = None;

    /// `ORDER BY` clause of lists.
    const ORDER_BY: &'static str = "created_at DESC, id";

    /// Returns the values of [`Table::COLUMNS`] of this [`Entity`].
    fn to_params(&self) -> Params;

    /// Maps the provided `row` selected with [`Table::COLUMNS`].
    ///
    /// # Errors
    ///
    /// If the `row` holds values violating domain invariants.
    fn from_row(row: &Row) -> Result<Self, database::Error>;
}

/// Value of type `K` an [`Entity`] can be found by.
pub trait Key<K>: Table {
    /// Columns compared to the key value, any of them matching.
    const KEY_COLUMNS: &'static [&'static str];
}

/// Borrows the provided [`Params`] to pass them to a statement.
pub(crate) fn borrow(params: &Params) -> Vec<&(dyn ToSql + Sync)> {
    params
        .iter()
        .map(|p| -> &(dyn ToSql + Sync) { &**p })
        .collect()
}

/// Converts a stored `INT4` count into its domain representation.
pub(crate) fn count(row: &Row, column: &str) -> Result<u16, database::Error> {
    u16::try_from(row.get::<_, i32>(column)).map_err(|_| {
        database::Error::Integrity(format!("`{column}` is out of range"))
    })
}
