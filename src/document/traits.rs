//! Core traits for the document driver boundary.

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::AppError;

/// Outcome of a create-if-absent call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provisioned {
    /// Id of the database or container.
    pub id: String,
    /// `true` if this call created it, `false` if it already existed.
    pub created: bool,
}

impl Provisioned {
    pub fn created(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created: true,
        }
    }

    pub fn existing(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created: false,
        }
    }
}

/// A document database client.
///
/// Covers database/container provisioning and item CRUD. Implementations
/// must be safe to share across tasks, since one client backs a store handle
/// for the whole process.
#[async_trait]
pub trait DocumentClient: Send + Sync {
    /// Creates the database unless it already exists.
    async fn create_database_if_not_exists(&self, id: &str) -> Result<Provisioned, AppError>;

    /// Creates a container inside `database` unless it already exists.
    async fn create_container_if_not_exists(
        &self,
        database: &str,
        id: &str,
        partition_key_path: &str,
    ) -> Result<Provisioned, AppError>;

    /// Creates an item. Fails if an item with the same id exists.
    async fn create_item(
        &self,
        database: &str,
        container: &str,
        partition_key: &JsonValue,
        item: JsonValue,
    ) -> Result<JsonValue, AppError>;

    /// Creates or replaces an item.
    async fn upsert_item(
        &self,
        database: &str,
        container: &str,
        partition_key: &JsonValue,
        item: JsonValue,
    ) -> Result<JsonValue, AppError>;

    /// Reads an item, returning `None` if it does not exist.
    async fn read_item(
        &self,
        database: &str,
        container: &str,
        id: &str,
        partition_key: &JsonValue,
    ) -> Result<Option<JsonValue>, AppError>;

    async fn delete_item(
        &self,
        database: &str,
        container: &str,
        id: &str,
        partition_key: &JsonValue,
    ) -> Result<(), AppError>;

    /// Runs a SQL query across all partitions and returns every page.
    async fn query_items(
        &self,
        database: &str,
        container: &str,
        query: &str,
    ) -> Result<Vec<JsonValue>, AppError>;
}
