//! [`Tx`] client definitions.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_postgres::{types::ToSql, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{connection, Connection},
};

use super::NonTx;

/// Transactional Postgres database client.
///
/// Begins the transaction eagerly on the [`Connection`] taken from the
/// [`NonTx`] client it was created from. If the last clone is dropped
/// without [`Tx::commit()`], the transaction is rolled back and the
/// [`Connection`] returns to the pool.
#[derive(Clone, Debug)]
pub struct Tx {
    /// State shared between the clones.
    inner: Arc<Inner>,
}

/// Shared state of a [`Tx`] client.
#[derive(Debug)]
struct Inner {
    /// Open [`connection::Tx`], [`None`] once committed.
    tx: Mutex<Option<connection::Tx>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if self.tx.get_mut().is_some() {
            tracing::debug!("rolling back uncommitted transaction");
        }
    }
}

impl Tx {
    /// Begins a new [`Tx`] on the [`Connection`] of the provided [`NonTx`]
    /// client.
    ///
    /// # Errors
    ///
    /// If failed to take a [`Connection`] or to begin the transaction.
    pub async fn begin(client: &NonTx) -> Result<Self, Traced<database::Error>> {
        let conn = client
            .take_connection()
            .await
            .map_err(tracerr::wrap!())?;
        let tx = connection::Tx::begin(conn)
            .await
            .map_err(tracerr::wrap!())?;
        Ok(Self {
            inner: Arc::new(Inner {
                tx: Mutex::new(Some(tx)),
            }),
        })
    }

    /// Commits this [`Tx`] client.
    ///
    /// Committing an already committed [`Tx`] is a no-op.
    ///
    /// # Errors
    ///
    /// If failed to commit the transaction.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        let tx = self.inner.tx.lock().await.take();
        match tx {
            Some(tx) => tx.commit().await.map_err(tracerr::wrap!()),
            None => Ok(()),
        }
    }
}

/// Returns the open [`connection::Tx`] out of the provided slot.
fn open(
    slot: &Option<connection::Tx>,
) -> Result<&connection::Tx, Traced<database::Error>> {
    slot.as_ref().ok_or_else(|| {
        tracerr::new!(database::Error::Integrity(
            "transaction is already committed".into(),
        ))
    })
}

impl Connection for Tx {
    async fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let slot = self.inner.tx.lock().await;
        open(&slot)
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
        let slot = self.inner.tx.lock().await;
        open(&slot)
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
        let slot = self.inner.tx.lock().await;
        open(&slot)
            .map_err(tracerr::wrap!())?
            .exec(stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }
}
