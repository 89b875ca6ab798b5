//! Backend implementations for document databases.
//!
//! | Backend | Module | Status |
//! |---------|--------|--------|
//! | Azure Cosmos DB (SQL API, REST) | [`cosmos`] | Available |

pub mod cosmos;
