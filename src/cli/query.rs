//! Query command handler.

use color_eyre::Result;

use crate::context::Context;

use super::App;

impl App {
    /// Submit one Gremlin query and print the result.
    pub async fn run_query(&self, query: &str) -> Result<()> {
        let config = self.load_config()?;
        let ctx = Context::bootstrap(config).await?;
        let gateway = ctx.gateway()?;

        tracing::info!("Submitting query to {}", gateway.connector().server().host());
        let result = gateway.submit(query).await?;

        println!("{}", serde_json::to_string_pretty(&result)?);
        Ok(())
    }
}
