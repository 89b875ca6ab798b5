//! Documents command handler.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde_json::Value as JsonValue;

use crate::context::Context;

use super::App;

impl App {
    /// Query a bootstrapped container and print the documents.
    pub async fn run_documents(&self, container: &str, sql: &str) -> Result<()> {
        let config = self.load_config()?;
        let ctx = Context::bootstrap(config).await?;

        let store = ctx.store(container).ok_or_else(|| {
            eyre!(
                "Container '{}' is not listed under [document].containers",
                container
            )
        })?;

        let documents: Vec<JsonValue> = store.get_items(sql).await?;
        tracing::info!("{} document(s) returned", documents.len());

        println!("{}", serde_json::to_string_pretty(&documents)?);
        Ok(())
    }
}
