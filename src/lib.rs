//! graphgate - Gremlin query gateway and Cosmos DB document store bootstrapper
//!
//! Two pieces of data access against Azure Cosmos DB:
//!
//! - [`graph`]: submit opaque Gremlin queries, one connection per query
//! - [`document`]: create-if-absent bootstrap of databases and containers,
//!   plus typed document access through a [`document::StoreHandle`]

pub mod cli;
pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod graph;
