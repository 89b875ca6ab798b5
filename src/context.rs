//! Application context built by the startup phase.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::Config;
use crate::document::backends::cosmos::CosmosClient;
use crate::document::{initialize, StoreHandle};
use crate::error::AppError;
use crate::graph::backends::gremlin::{GremlinConnector, GremlinServer};
use crate::graph::QueryGateway;

/// Store handle backed by Cosmos DB.
pub type AppStore = StoreHandle<CosmosClient>;

/// Gateway backed by the Gremlin WebSocket driver.
pub type AppGateway = QueryGateway<GremlinConnector>;

/// Root application context.
///
/// Holds everything that lives for the whole process. It only exists once
/// every configured document container has been bootstrapped, so holding a
/// `Context` means the stores are ready.
#[derive(Clone)]
pub struct Context {
    /// Application configuration.
    pub config: Arc<Config>,
    /// Store handles keyed by container name.
    pub stores: Arc<HashMap<String, AppStore>>,
}

impl Context {
    /// Runs the startup phase: bootstraps every container listed under
    /// `[document]`, in order. The first failure aborts startup.
    pub async fn bootstrap(config: Config) -> Result<Self, AppError> {
        let mut stores = HashMap::new();

        if config.has_section("document") {
            let document = config.document()?;
            for container in &document.containers {
                let store = initialize(&document, container).await?;
                stores.insert(container.clone(), store);
            }
            tracing::info!("Bootstrapped {} document store(s)", stores.len());
        } else {
            tracing::info!("No [document] section configured, skipping bootstrap");
        }

        Ok(Self {
            config: Arc::new(config),
            stores: Arc::new(stores),
        })
    }

    /// Builds a query gateway from the `[graph]` section.
    pub fn gateway(&self) -> Result<AppGateway, AppError> {
        let graph = self.config.graph()?;
        let server = GremlinServer::from_config(&graph);
        Ok(QueryGateway::new(GremlinConnector::new(server)).with_timeout(graph.query_timeout()))
    }

    /// Looks up the store handle for a bootstrapped container.
    pub fn store(&self, container: &str) -> Option<&AppStore> {
        self.stores.get(container)
    }
}
