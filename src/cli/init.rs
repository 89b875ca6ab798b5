//! Init command handler.

use color_eyre::Result;

use crate::context::Context;

use super::App;

impl App {
    /// Run the startup phase and report the stores that are ready.
    pub async fn run_init(&self) -> Result<()> {
        let config = self.load_config()?;
        if !config.has_section("document") {
            tracing::warn!("No [document] section configured, nothing to initialize");
        }

        let ctx = Context::bootstrap(config).await.map_err(|e| {
            if e.is_driver_error() {
                tracing::error!(error = %e, "Document store rejected bootstrap");
            } else {
                tracing::error!(error = %e, "Bootstrap configuration is invalid");
            }
            color_eyre::eyre::eyre!("Bootstrap failed: {}", e)
        })?;

        for store in ctx.stores.values() {
            tracing::info!(
                "Store ready: {}/{}",
                store.database_name(),
                store.container_name()
            );
        }

        Ok(())
    }
}
