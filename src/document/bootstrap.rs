//! Document store bootstrapping.

use std::sync::Arc;

use crate::config::DocumentConfig;
use crate::document::backends::cosmos::CosmosClient;
use crate::document::handle::StoreHandle;
use crate::document::traits::{DocumentClient, Provisioned};
use crate::document::PARTITION_KEY_PATH;
use crate::error::AppError;

/// Ensures the database and container exist, then returns a handle bound to
/// them.
///
/// The database is provisioned first; the container call only starts once
/// that has completed. Both calls are create-if-absent, so running this again
/// with the same names is harmless. Every failure is returned unchanged.
pub async fn bootstrap<C: DocumentClient>(
    client: Arc<C>,
    database_name: &str,
    container_name: &str,
) -> Result<StoreHandle<C>, AppError> {
    let database = client.create_database_if_not_exists(database_name).await?;
    log_provisioned("database", &database);

    let container = client
        .create_container_if_not_exists(&database.id, container_name, PARTITION_KEY_PATH)
        .await?;
    log_provisioned("container", &container);

    Ok(StoreHandle::new(client, &database.id, &container.id))
}

/// Builds a Cosmos DB client from `config` and bootstraps `container_name`.
///
/// Each call constructs its own client, so every container gets a dedicated
/// connection.
pub async fn initialize(
    config: &DocumentConfig,
    container_name: &str,
) -> Result<StoreHandle<CosmosClient>, AppError> {
    let client = CosmosClient::new(
        &config.account,
        &config.primary_key,
        config.request_timeout(),
    )?;
    tracing::info!(
        "Bootstrapping container '{}' in database '{}' at {}",
        container_name,
        config.database_name,
        client.endpoint()
    );

    bootstrap(Arc::new(client), &config.database_name, container_name).await
}

fn log_provisioned(kind: &str, resource: &Provisioned) {
    if resource.created {
        tracing::info!("Created {} '{}'", kind, resource.id);
    } else {
        tracing::info!("Using existing {} '{}'", kind, resource.id);
    }
}
