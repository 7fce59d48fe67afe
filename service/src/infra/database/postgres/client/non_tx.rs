//! [`NonTx`] client definitions.

use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard};
use tokio_postgres::{types::ToSql, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{self, connection, Connection},
};

/// Non-transactional Postgres database client.
///
/// Takes one pooled [`Connection`] on the first use and holds it until the
/// client is dropped or a transaction takes it over. Clones share the held
/// [`Connection`], while [`NonTx::fork()`] creates a client holding its own.
#[derive(Clone, Debug)]
pub struct NonTx {
    /// [`connection::Pool`] to take the [`Connection`] from.
    pub(crate) pool: connection::Pool,

    /// Held [`Connection`], if taken already.
    slot: Arc<RwLock<Option<connection::NonTx>>>,
}

impl NonTx {
    /// Creates a new [`NonTx`] client from the provided [`connection::Pool`].
    #[must_use]
    pub(crate) fn from_pool(pool: connection::Pool) -> Self {
        Self {
            pool,
            slot: Arc::new(RwLock::new(None)),
        }
    }

    /// Creates a new [`NonTx`] client sharing the [`connection::Pool`] of
    /// this one, but holding its own [`Connection`].
    #[must_use]
    pub fn fork(&self) -> Self {
        Self::from_pool(self.pool.clone())
    }

    /// Returns the held [`Connection`], taking one from the pool if needed.
    async fn connection(
        &self,
    ) -> Result<RwLockReadGuard<'_, connection::NonTx>, Traced<database::Error>>
    {
        {
            let slot = self.slot.read().await;
            if slot.is_some() {
                return Ok(RwLockReadGuard::map(slot, |c| {
                    c.as_ref().expect("checked above")
                }));
            }
        }

        let mut slot = self.slot.write().await;
        if slot.is_none() {
            let conn = self
                .pool
                .get()
                .await
                .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                .map_err(tracerr::map_from)?;
            *slot = Some(conn);
        }
        Ok(RwLockReadGuard::map(slot.downgrade(), |c| {
            c.as_ref().expect("connection cannot be dropped while guard is alive")
        }))
    }

    /// Takes the held [`Connection`] out of this [`NonTx`] client, or a new
    /// one from the pool if none is held.
    ///
    /// The next use of this [`NonTx`] client takes another [`Connection`].
    pub(crate) async fn take_connection(
        &self,
    ) -> Result<connection::NonTx, Traced<database::Error>> {
        if let Some(conn) = self.slot.write().await.take() {
            return Ok(conn);
        }
        self.pool
            .get()
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}

impl Connection for NonTx {
    async fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.connection()
            .await
            .map_err(tracerr::wrap!())?
            .query(stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn query_opt<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.connection()
            .await
            .map_err(tracerr::wrap!())?
            .query_opt(stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn exec<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.connection()
            .await
            .map_err(tracerr::wrap!())?
            .exec(stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }
}
