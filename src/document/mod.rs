//! Document store bootstrapping and typed document access.
//!
//! - [`DocumentClient`] - Driver boundary (provisioning and item CRUD)
//! - [`bootstrap`] / [`initialize`] - Create-if-absent startup sequence
//! - [`StoreHandle`] - Handle bound to one database and container
//!
//! # Usage
//!
//! ```ignore
//! use graphgate::document::initialize;
//!
//! let store = initialize(&config.document()?, "MarvelCharactersResult").await?;
//! store.add_item(&character).await?;
//! let found: Option<Character> = store.get_item("1009610", "1009610").await?;
//! ```

mod bootstrap;
mod handle;
mod traits;

pub mod backends;

pub use bootstrap::{bootstrap, initialize};
pub use handle::{partition_key_of, StoreHandle};
pub use traits::{DocumentClient, Provisioned};

/// Partition key path of every bootstrapped container.
pub const PARTITION_KEY_PATH: &str = "/api_id";
