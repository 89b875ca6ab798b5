//! Graph query gateway.

use std::time::Duration;

use serde_json::Value as JsonValue;

use crate::error::AppError;
use crate::graph::traits::{GraphConnection, GraphConnector};

/// Submits opaque query strings to a graph database.
///
/// Every call opens its own connection through the injected connector and
/// closes it before returning. Results and errors from the driver are handed
/// back untouched: no validation, retry or classification happens here.
///
/// # Example
///
/// ```ignore
/// let gateway = QueryGateway::new(GremlinConnector::new(server));
/// let result = gateway.submit("g.V().count()").await?;
/// ```
pub struct QueryGateway<C: GraphConnector> {
    connector: C,
    timeout: Option<Duration>,
}

impl<C: GraphConnector> QueryGateway<C> {
    /// Creates a gateway without a per-query deadline.
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            timeout: None,
        }
    }

    /// Sets an optional per-query deadline.
    ///
    /// The deadline covers opening the connection and running the query.
    /// When it passes, the in-flight submission is dropped, which releases
    /// its connection, and [`AppError::Timeout`] is returned. Closing a
    /// connection after the query finished is not subject to the deadline.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns a reference to the underlying connector.
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Submits a query and returns the driver's result unchanged.
    pub async fn submit(&self, query: &str) -> Result<JsonValue, AppError> {
        tracing::debug!(query_len = query.len(), "Submitting graph query");

        let attempt = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.open_and_submit(query))
                .await
                .unwrap_or(Err(AppError::Timeout(limit))),
            None => self.open_and_submit(query).await,
        };
        let (connection, result) = attempt.inspect_err(|e| {
            tracing::debug!(error = %e, "Graph query did not complete");
        })?;

        connection.close().await;

        match &result {
            Ok(_) => tracing::debug!("Graph query completed"),
            Err(e) => tracing::debug!(error = %e, "Graph query failed"),
        }

        result
    }

    /// Opens a connection and runs the query on it. The connection is handed
    /// back with the driver's result so the caller can close it.
    async fn open_and_submit(
        &self,
        query: &str,
    ) -> Result<(C::Connection, Result<JsonValue, AppError>), AppError> {
        let mut connection = self.connector.connect().await.inspect_err(|e| {
            tracing::debug!(error = %e, "Failed to open graph connection");
        })?;

        let result = connection.submit(query).await;
        Ok((connection, result))
    }
}
