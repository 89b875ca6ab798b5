//! Configuration with layered resolution using figment.
//!
//! Resolution order (highest priority last):
//! 1. User config: `~/.config/graphgate/config.toml` (XDG) or platform config dir
//! 2. Project config: `.graphgate.toml`, or the file passed with `--config`
//! 3. Environment variables: `GRAPHGATE_*`, sections separated by `__`
//!    (e.g. `GRAPHGATE_GRAPH__PRIMARY_KEY`)
//!
//! # Example
//!
//! ```toml
//! [graph]
//! endpoint = "myaccount.gremlin.cosmos.azure.com"
//! primary_key = "..."
//! database_name = "graphdb"
//! container_name = "people"
//!
//! [document]
//! account = "https://myaccount.documents.azure.com:443/"
//! primary_key = "..."
//! database_name = "appdb"
//! containers = ["MarvelCharactersResult"]
//! ```
//!
//! Sections are extracted when a command first asks for them, not at load
//! time. A missing section fails with [`AppError::MissingConfig`]; a section
//! with missing or mistyped keys fails with [`AppError::Config`].

use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::AppError;

/// Boxed wrapper for figment::Error to reduce Result size on the stack.
#[derive(Debug)]
pub struct ConfigError(Box<figment::Error>);

impl Deref for ConfigError {
    type Target = figment::Error;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self(Box::new(err))
    }
}

/// Root configuration: the merged providers, read section by section.
#[derive(Debug, Clone)]
pub struct Config {
    figment: Figment,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            figment: Figment::new(),
        }
    }
}

/// Gremlin (graph API) account configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    /// Gremlin endpoint host, e.g. `myaccount.gremlin.cosmos.azure.com`.
    pub endpoint: String,
    /// Account primary key, used as the Gremlin password.
    pub primary_key: String,
    pub database_name: String,
    pub container_name: String,
    #[serde(default = "default_graph_port")]
    pub port: u16,
    /// Per-query deadline. No deadline when absent.
    #[serde(default)]
    pub query_timeout_secs: Option<u64>,
}

/// Default Gremlin port for Cosmos DB.
pub const DEFAULT_GRAPH_PORT: u16 = 443;

fn default_graph_port() -> u16 {
    DEFAULT_GRAPH_PORT
}

impl GraphConfig {
    /// Gremlin username: `/dbs/<database>/colls/<container>`.
    pub fn username(&self) -> String {
        format!("/dbs/{}/colls/{}", self.database_name, self.container_name)
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout_secs.map(Duration::from_secs)
    }
}

/// Document (SQL API) account configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentConfig {
    /// Account endpoint, e.g. `https://myaccount.documents.azure.com:443/`.
    pub account: String,
    pub primary_key: String,
    pub database_name: String,
    /// Containers bootstrapped at startup, one store handle each.
    #[serde(default)]
    pub containers: Vec<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl DocumentConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl Config {
    /// Load config with layered resolution (user → project → env).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(Path::new(".graphgate.toml"))
    }

    /// Load config using `project_config` in place of `.graphgate.toml`.
    pub fn load_with(project_config: &Path) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            // Layer 1: User config (lowest priority)
            .merge(Toml::file(Self::user_config_path()))
            // Layer 2: Project config
            .merge(Toml::file(project_config))
            // Layer 3: Environment variables (highest priority)
            .merge(Env::prefixed("GRAPHGATE_").split("__"));

        Self::from_figment(figment)
    }

    /// Wrap an already assembled figment.
    ///
    /// Only syntax errors in the sources are reported here; section contents
    /// are checked by [`graph`](Self::graph) and [`document`](Self::document).
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        figment.extract::<figment::value::Dict>()?;
        Ok(Self { figment })
    }

    /// Returns true when any source sets a key under `section`.
    pub fn has_section(&self, section: &str) -> bool {
        self.figment.contains(section)
    }

    /// Extracts the `[graph]` section.
    pub fn graph(&self) -> Result<GraphConfig, AppError> {
        self.section("graph")
    }

    /// Extracts the `[document]` section.
    pub fn document(&self) -> Result<DocumentConfig, AppError> {
        self.section("document")
    }

    fn section<T: DeserializeOwned>(&self, name: &'static str) -> Result<T, AppError> {
        if !self.has_section(name) {
            return Err(AppError::MissingConfig(name));
        }
        Ok(self.figment.extract_inner(name).map_err(ConfigError::from)?)
    }

    /// User config path: ~/.config/graphgate/config.toml (XDG) or platform config dir.
    fn user_config_path() -> PathBuf {
        // Prefer XDG config location (~/.config) on all platforms
        if let Some(home) = dirs::home_dir() {
            let xdg_path = home.join(".config").join("graphgate").join("config.toml");
            if xdg_path.exists() {
                return xdg_path;
            }
        }
        // Fall back to platform-specific config dir
        dirs::config_dir()
            .map(|p| p.join("graphgate").join("config.toml"))
            .unwrap_or_default()
    }
}
