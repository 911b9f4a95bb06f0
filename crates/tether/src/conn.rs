//! Connection plumbing.
//!
//! One connection per side, opened at startup and held for the whole run.
//! Every statement goes through [`TracedConn`], which logs the statement
//! text in a tracing debug span.

use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, GenericClient, NoTls, Row};
use tracing::Instrument;

use crate::{Endpoint, Result};

/// Open a connection to an endpoint.
///
/// The tokio-postgres connection driver is spawned onto the runtime; it
/// finishes when the returned client is dropped. A driver error after that
/// point is logged, not surfaced; by then the run has already ended.
pub async fn connect(endpoint: &Endpoint) -> Result<Client> {
    let (client, connection) = tokio_postgres::connect(&endpoint.conninfo(), NoTls).await?;

    let host = endpoint.host.clone();
    let database = endpoint.database.clone();
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!(host = %host, database = %database, "connection error: {e}");
        }
    });

    Ok(client)
}

/// A thin wrapper that logs every statement via tracing.
///
/// Generic over [`GenericClient`] so the same wrapper covers the source
/// [`Client`] and the destination [`tokio_postgres::Transaction`].
pub struct TracedConn<'a, C: GenericClient> {
    inner: &'a C,
}

impl<'a, C: GenericClient> TracedConn<'a, C> {
    pub fn new(inner: &'a C) -> Self {
        Self { inner }
    }

    /// Execute a statement, returning the number of rows affected.
    pub async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<u64> {
        let span = tracing::debug_span!(
            "db.execute",
            sql = %sql,
            affected = tracing::field::Empty,
        );
        let affected = self.inner.execute(sql, params).instrument(span.clone()).await?;
        span.record("affected", affected);
        Ok(affected)
    }

    /// Execute a query, returning all rows.
    pub async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Vec<Row>> {
        let span = tracing::debug_span!(
            "db.query",
            sql = %sql,
            rows = tracing::field::Empty,
        );
        let rows = self.inner.query(sql, params).instrument(span.clone()).await?;
        span.record("rows", rows.len());
        Ok(rows)
    }

    /// Execute a query, returning at most one row.
    pub async fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>> {
        let span = tracing::debug_span!(
            "db.query",
            sql = %sql,
            rows = tracing::field::Empty,
        );
        let row = self
            .inner
            .query_opt(sql, params)
            .instrument(span.clone())
            .await?;
        span.record("rows", if row.is_some() { 1u64 } else { 0u64 });
        Ok(row)
    }
}
