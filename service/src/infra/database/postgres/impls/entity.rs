//! [`Database`] implementations for every [`Table`]-described [`Entity`].
//!
//! [`Entity`]: crate::domain::Entity

use common::{
    operations::{By, Delete, Insert, Select, Update},
    Page,
};
use itertools::Itertools as _;
use tokio_postgres::types::ToSql;
use tracerr::Traced;

use crate::{
    infra::{
        database::{
            self,
            postgres::{
                table::{borrow, Params},
                Connection, Key, Table,
            },
            Postgres,
        },
        Database,
    },
    read,
};

/// Renders the comma-separated [`Table::COLUMNS`] of `E`.
fn columns<E: Table>() -> String {
    E::COLUMNS.iter().join(", ")
}

/// Renders a condition matching any of the [`Key::KEY_COLUMNS`] against the
/// `$n` parameter.
fn key_condition<E: Key<K>, K>(n: usize) -> String {
    format!(
        "({})",
        E::KEY_COLUMNS
            .iter()
            .format_with(" OR ", |c, f| f(&format_args!("{c} = ${n}"))),
    )
}

/// Maps the provided `rows` with [`Table::from_row()`].
fn from_rows<E: Table>(
    rows: &[tokio_postgres::Row],
) -> Result<Vec<E>, Traced<database::Error>> {
    rows.iter()
        .map(E::from_row)
        .collect::<Result<_, _>>()
        .map_err(tracerr::wrap!())
}

impl<C, E> Database<Insert<E>> for Postgres<C>
where
    C: Connection,
    E: Table,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(entity): Insert<E>,
    ) -> Result<Self::Ok, Self::Err> {
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            E::TABLE,
            columns::<E>(),
            (1..=E::COLUMNS.len())
                .format_with(", ", |n, f| f(&format_args!("${n}"))),
        );
        let params = entity.to_params();
        self.exec(&sql, &borrow(&params))
            .await
            .map(drop)
            .map_err(tracerr::wrap!())
    }
}

impl<C, E> Database<Update<E>> for Postgres<C>
where
    C: Connection,
    E: Table,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(entity): Update<E>,
    ) -> Result<Self::Ok, Self::Err> {
        let (id, rest) = E::COLUMNS.split_first().ok_or_else(|| {
            tracerr::new!(database::Error::Integrity(format!(
                "`{}` has no columns",
                E::TABLE,
            )))
        })?;
        let sql = format!(
            "UPDATE {} SET {} WHERE {id} = $1",
            E::TABLE,
            rest.iter().enumerate().format_with(", ", |(i, c), f| {
                f(&format_args!("{c} = ${}", i + 2))
            }),
        );
        let params = entity.to_params();
        self.exec(&sql, &borrow(&params))
            .await
            .map(drop)
            .map_err(tracerr::wrap!())
    }
}

impl<C, E, K> Database<Select<By<Option<E>, K>>> for Postgres<C>
where
    C: Connection,
    E: Key<K>,
    K: ToSql + Sync + Send,
{
    type Ok = Option<E>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<E>, K>>,
    ) -> Result<Self::Ok, Self::Err> {
        let key = by.into_inner();
        let sql = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY {} LIMIT 1",
            columns::<E>(),
            E::TABLE,
            key_condition::<E, K>(1),
            E::ORDER_BY,
        );
        self.query_opt(&sql, &[&key])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(E::from_row)
            .transpose()
            .map_err(tracerr::wrap!())
    }
}

impl<C, E, K> Database<Select<By<Vec<E>, K>>> for Postgres<C>
where
    C: Connection,
    E: Key<K>,
    K: ToSql + Sync + Send,
{
    type Ok = Vec<E>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<E>, K>>,
    ) -> Result<Self::Ok, Self::Err> {
        let key = by.into_inner();
        let sql = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY {}",
            columns::<E>(),
            E::TABLE,
            key_condition::<E, K>(1),
            E::ORDER_BY,
        );
        let rows = self
            .query(&sql, &[&key])
            .await
            .map_err(tracerr::wrap!())?;
        from_rows(&rows)
    }
}

impl<C, E> Database<Select<By<Page<E>, read::list::Selector>>> for Postgres<C>
where
    C: Connection,
    E: Table,
{
    type Ok = Page<E>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Page<E>, read::list::Selector>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::list::Selector { pagination, owner } = by.into_inner();

        let mut params: Params = Vec::new();
        let condition = match (owner, E::OWNER) {
            (None, _) => "TRUE".to_owned(),
            // Unowned rows are never visible to an owner-restricted list.
            (Some(_), None) => "FALSE".to_owned(),
            (Some(owner), Some(column)) => {
                params.push(Box::new(owner));
                format!("{column} = $1")
            }
        };

        let sql = format!(
            "SELECT COUNT(*) AS total FROM {} WHERE {condition}",
            E::TABLE,
        );
        let total = self
            .query_opt(&sql, &borrow(&params))
            .await
            .map_err(tracerr::wrap!())?
            .map_or(0, |row| row.get::<_, i64>("total"));

        let n = params.len();
        params.push(Box::new(i64::from(pagination.limit())));
        params.push(Box::new(
            i64::try_from(pagination.offset()).unwrap_or(i64::MAX),
        ));
        let sql = format!(
            "SELECT {} FROM {} WHERE {condition} ORDER BY {} \
             LIMIT ${} OFFSET ${}",
            columns::<E>(),
            E::TABLE,
            E::ORDER_BY,
            n + 1,
            n + 2,
        );
        let rows = self
            .query(&sql, &borrow(&params))
            .await
            .map_err(tracerr::wrap!())?;

        Ok(Page::new(
            pagination,
            from_rows(&rows)?,
            u64::try_from(total).unwrap_or_default(),
        ))
    }
}

impl<C, E, K> Database<Delete<By<E, K>>> for Postgres<C>
where
    C: Connection,
    E: Key<K>,
    K: ToSql + Sync + Send,
{
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<E, K>>,
    ) -> Result<Self::Ok, Self::Err> {
        let key = by.into_inner();
        let sql = format!(
            "DELETE FROM {} WHERE {}",
            E::TABLE,
            key_condition::<E, K>(1),
        );
        self.exec(&sql, &[&key]).await.map_err(tracerr::wrap!())
    }
}
