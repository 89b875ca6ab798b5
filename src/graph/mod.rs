//! Graph query gateway and driver boundary.
//!
//! # Architecture
//!
//! - [`GraphConnector`] - Opens a fresh connection per query
//! - [`GraphConnection`] - Submits one query, then is closed
//! - [`QueryGateway`] - Owns a connector and runs the connect/submit/close cycle
//!
//! # Usage
//!
//! ```ignore
//! use graphgate::graph::backends::gremlin::{GremlinConnector, GremlinServer};
//! use graphgate::graph::QueryGateway;
//!
//! let gateway = QueryGateway::new(GremlinConnector::new(server))
//!     .with_timeout(Some(Duration::from_secs(30)));
//!
//! let result = gateway.submit("g.V().hasLabel('person').values('name')").await?;
//! ```

mod gateway;
mod traits;

pub mod backends;
pub mod graphson;

// Re-export core types
pub use gateway::QueryGateway;
pub use traits::{GraphConnection, GraphConnector};
