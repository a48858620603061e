//! [`Tx`] client definitions.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};
use tokio_postgres::{types::ToSql, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{self, connection, Connection},
};

use super::NonTx;

/// Transactional Postgres database client.
///
/// The transaction begins lazily, on the first statement, so a [`Tx`] that
/// never touches the database never holds a pooled connection.
#[derive(Clone, Debug)]
pub struct Tx {
    /// [`connection::Pool`] to acquire the transaction connection from.
    pool: connection::Pool,

    /// Transaction, once begun.
    ///
    /// [`None`] again after it's committed.
    tx: Arc<Mutex<Option<connection::Tx>>>,
}

impl Tx {
    /// Creates a new [`Tx`] client using the [`connection::Pool`] of the
    /// provided [`NonTx`] client.
    #[must_use]
    pub fn from_non_tx(client: &NonTx) -> Self {
        Self {
            pool: client.pool.clone(),
            tx: Arc::default(),
        }
    }

    /// Returns the [`connection::Tx`] of this [`Tx`] client, beginning it on
    /// first use.
    ///
    /// Statements of the same transaction are serialized by the returned
    /// guard.
    async fn connection(
        &self,
    ) -> Result<MutexGuard<'_, Option<connection::Tx>>, Traced<database::Error>>
    {
        let mut tx = self.tx.lock().await;
        if tx.is_none() {
            let conn = self
                .pool
                .get()
                .await
                .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                .map_err(tracerr::map_from)?;
            *tx = Some(
                connection::Tx::begin(conn)
                    .await
                    .map_err(tracerr::wrap!())?,
            );
        }
        Ok(tx)
    }

    /// Commits this [`Tx`] client.
    ///
    /// Committing a [`Tx`] that has run no statements is a no-op.
    ///
    /// # Errors
    ///
    /// If failed to commit the transaction of this [`Tx`] client.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        let tx = self.tx.lock().await.take();
        match tx {
            Some(tx) => tx.commit().await.map_err(tracerr::wrap!()),
            None => Ok(()),
        }
    }
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
        let tx = self.connection().await.map_err(tracerr::wrap!())?;
        tx.as_ref()
            .expect("begun above")
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
        let tx = self.connection().await.map_err(tracerr::wrap!())?;
        tx.as_ref()
            .expect("begun above")
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
        let tx = self.connection().await.map_err(tracerr::wrap!())?;
        tx.as_ref()
            .expect("begun above")
            .exec(stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }
}
