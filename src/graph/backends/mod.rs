//! Backend implementations for graph databases.
//!
//! Each backend implements the traits from [`crate::graph`]:
//!
//! - [`GraphConnector`](crate::graph::GraphConnector) - Required
//! - [`GraphConnection`](crate::graph::GraphConnection) - Required
//!
//! # Available Backends
//!
//! | Backend | Module | Status |
//! |---------|--------|--------|
//! | Gremlin Server (Cosmos DB Gremlin API) | [`gremlin`] | Available |

pub mod gremlin;
