//! Core traits for the graph driver boundary.
//!
//! - [`GraphConnector`] - Produces a fresh connection per query
//! - [`GraphConnection`] - Submits a query and is closed afterwards

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::AppError;

/// A single driver connection to a graph database.
///
/// A connection is owned by exactly one query submission. Implementations
/// must release their underlying resources when dropped, so that a connection
/// abandoned by a cancelled future does not leak.
#[async_trait]
pub trait GraphConnection: Send {
    /// Submits a query and returns the driver's deserialized result.
    ///
    /// The query text is passed through verbatim.
    async fn submit(&mut self, query: &str) -> Result<JsonValue, AppError>;

    /// Closes the connection.
    ///
    /// Consumes the connection - it cannot be used after close.
    async fn close(self);
}

/// Factory for graph connections.
///
/// The gateway holds one of these and calls [`connect`](GraphConnector::connect)
/// once per submission.
#[async_trait]
pub trait GraphConnector: Send + Sync {
    /// The connection type produced by this connector.
    type Connection: GraphConnection;

    /// Opens a new connection.
    async fn connect(&self) -> Result<Self::Connection, AppError>;
}
