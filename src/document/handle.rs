//! Store handle bound to one database and container.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::document::traits::DocumentClient;
use crate::document::PARTITION_KEY_PATH;
use crate::error::AppError;

/// A ready-to-use document store for one container.
///
/// Produced by [`bootstrap`](crate::document::bootstrap) once the database
/// and container are known to exist. The client is shared read-only; this
/// type is cheap to clone.
pub struct StoreHandle<C> {
    client: Arc<C>,
    database_name: Arc<str>,
    container_name: Arc<str>,
}

impl<C> Clone for StoreHandle<C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            database_name: self.database_name.clone(),
            container_name: self.container_name.clone(),
        }
    }
}

impl<C: DocumentClient> StoreHandle<C> {
    pub(crate) fn new(client: Arc<C>, database_name: &str, container_name: &str) -> Self {
        Self {
            client,
            database_name: Arc::from(database_name),
            container_name: Arc::from(container_name),
        }
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    pub fn container_name(&self) -> &str {
        &self.container_name
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Creates an item. The partition key is read from the item itself.
    pub async fn add_item<T: Serialize + Sync>(&self, item: &T) -> Result<(), AppError> {
        let value = serde_json::to_value(item)?;
        let partition_key = partition_key_of(&value)?;
        self.client
            .create_item(&self.database_name, &self.container_name, &partition_key, value)
            .await?;
        Ok(())
    }

    /// Creates or replaces an item.
    pub async fn update_item<T: Serialize + Sync>(&self, item: &T) -> Result<(), AppError> {
        let value = serde_json::to_value(item)?;
        let partition_key = partition_key_of(&value)?;
        self.client
            .upsert_item(&self.database_name, &self.container_name, &partition_key, value)
            .await?;
        Ok(())
    }

    /// Reads an item by id.
    pub async fn get_item<T: DeserializeOwned>(
        &self,
        id: &str,
        partition_key: impl Into<JsonValue>,
    ) -> Result<Option<T>, AppError> {
        let partition_key = partition_key.into();
        let item = self
            .client
            .read_item(&self.database_name, &self.container_name, id, &partition_key)
            .await?;

        match item {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Runs a SQL query and deserializes every returned document.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let heroes: Vec<Character> = store.get_items("SELECT * FROM c").await?;
    /// ```
    pub async fn get_items<T: DeserializeOwned>(&self, query: &str) -> Result<Vec<T>, AppError> {
        self.client
            .query_items(&self.database_name, &self.container_name, query)
            .await?
            .into_iter()
            .map(|value| serde_json::from_value(value).map_err(AppError::from))
            .collect()
    }

    pub async fn delete_item(
        &self,
        id: &str,
        partition_key: impl Into<JsonValue>,
    ) -> Result<(), AppError> {
        let partition_key = partition_key.into();
        self.client
            .delete_item(&self.database_name, &self.container_name, id, &partition_key)
            .await
    }
}

/// Extracts the partition key value at [`PARTITION_KEY_PATH`].
///
/// The path is a JSON pointer, so nested paths work the same way.
pub fn partition_key_of(item: &JsonValue) -> Result<JsonValue, AppError> {
    match item.pointer(PARTITION_KEY_PATH) {
        Some(value) if !value.is_null() => Ok(value.clone()),
        _ => Err(AppError::Validation(format!(
            "item has no partition key value at '{}'",
            PARTITION_KEY_PATH
        ))),
    }
}
