//! CLI module for graphgate.
//!
//! Subcommands:
//! - `init`: Bootstrap every configured document container
//! - `query`: Submit one Gremlin query
//! - `documents`: Run a SQL query against a bootstrapped container

mod documents;
mod init;
mod query;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;

/// graphgate - Gremlin query gateway and Cosmos DB store bootstrapper
#[derive(Parser)]
#[command(name = "graphgate")]
#[command(about = "Gremlin query gateway and Cosmos DB document store bootstrapper")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project config file (defaults to .graphgate.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the configured databases and containers if they are missing
    Init,

    /// Submit a Gremlin query and print the result as JSON
    Query {
        /// Query text, passed to the server verbatim
        query: String,
    },

    /// Run a SQL query against a document container and print the documents
    Documents {
        /// Container name (must be listed under [document].containers)
        container: String,

        /// SQL query text
        #[arg(default_value = "SELECT * FROM c")]
        sql: String,
    },
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> color_eyre::Result<()> {
        match self.command {
            Command::Init => self.run_init().await,
            Command::Query { ref query } => self.run_query(query).await,
            Command::Documents {
                ref container,
                ref sql,
            } => self.run_documents(container, sql).await,
        }
    }

    fn load_config(&self) -> color_eyre::Result<Config> {
        let config = match &self.config {
            Some(path) => Config::load_with(path)?,
            None => Config::load()?,
        };
        Ok(config)
    }
}
