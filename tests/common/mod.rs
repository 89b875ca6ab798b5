//! In-memory fakes for the graph and document driver boundaries.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use graphgate::document::{DocumentClient, Provisioned};
use graphgate::error::AppError;
use graphgate::graph::{GraphConnection, GraphConnector};
use serde_json::Value as JsonValue;

// ----------------------------------------------------------------------------
// Graph driver fake
// ----------------------------------------------------------------------------

type Script = dyn Fn(&str) -> Result<JsonValue, AppError> + Send + Sync;

/// Connection lifecycle counters shared by a connector and its connections.
#[derive(Debug, Default)]
pub struct Counters {
    pub opened: AtomicUsize,
    pub submitted: AtomicUsize,
    pub closed: AtomicUsize,
    pub released: AtomicUsize,
}

impl Counters {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> usize {
        self.submitted.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

/// Connector whose connections answer queries from a script.
#[derive(Clone)]
pub struct FakeConnector {
    pub counters: Arc<Counters>,
    script: Arc<Script>,
    delay: Option<Duration>,
    close_delay: Option<Duration>,
    refuse: bool,
}

impl FakeConnector {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&str) -> Result<JsonValue, AppError> + Send + Sync + 'static,
    {
        Self {
            counters: Arc::new(Counters::default()),
            script: Arc::new(script),
            delay: None,
            close_delay: None,
            refuse: false,
        }
    }

    /// Every submission sleeps for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every close sleeps for `delay` before finishing.
    pub fn with_close_delay(mut self, delay: Duration) -> Self {
        self.close_delay = Some(delay);
        self
    }

    /// `connect` fails with a connection error.
    pub fn refusing(mut self) -> Self {
        self.refuse = true;
        self
    }
}

#[async_trait]
impl GraphConnector for FakeConnector {
    type Connection = FakeConnection;

    async fn connect(&self) -> Result<FakeConnection, AppError> {
        if self.refuse {
            return Err(AppError::Connection("connection refused".to_string()));
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(FakeConnection {
            counters: self.counters.clone(),
            script: self.script.clone(),
            delay: self.delay,
            close_delay: self.close_delay,
            used: false,
        })
    }
}

pub struct FakeConnection {
    counters: Arc<Counters>,
    script: Arc<Script>,
    delay: Option<Duration>,
    close_delay: Option<Duration>,
    used: bool,
}

#[async_trait]
impl GraphConnection for FakeConnection {
    async fn submit(&mut self, query: &str) -> Result<JsonValue, AppError> {
        assert!(!self.used, "connection reused for a second query");
        self.used = true;
        self.counters.submitted.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.script)(query)
    }

    async fn close(self) {
        if let Some(delay) = self.close_delay {
            tokio::time::sleep(delay).await;
        }
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
    }
}

impl Drop for FakeConnection {
    fn drop(&mut self) {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}

// ----------------------------------------------------------------------------
// Document driver fake
// ----------------------------------------------------------------------------

/// Provisioning events in the order the fake observed them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    DatabaseStarted(String),
    DatabaseCompleted(String),
    ContainerStarted(String),
    ContainerCompleted(String),
}

#[derive(Default)]
struct State {
    databases: HashSet<String>,
    containers: BTreeMap<(String, String), String>,
    items: BTreeMap<(String, String, String), JsonValue>,
    events: Vec<Event>,
    created: Vec<String>,
}

/// Document backend kept in memory.
///
/// Queries ignore their text and return every item in the container.
#[derive(Default)]
pub struct FakeDocumentStore {
    state: Mutex<State>,
    deny_databases: bool,
}

impl FakeDocumentStore {
    /// A backend that rejects database creation with `403`.
    pub fn denying_databases() -> Self {
        Self {
            deny_databases: true,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.lock().unwrap().events.clone()
    }

    /// Resources actually created, e.g. `database:db1`, `container:db1/c1`.
    pub fn created(&self) -> Vec<String> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn partition_key_path(&self, database: &str, container: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .containers
            .get(&(database.to_string(), container.to_string()))
            .cloned()
    }

    fn record(&self, event: Event) {
        self.state.lock().unwrap().events.push(event);
    }

    fn require_container(&self, database: &str, container: &str) -> Result<(), AppError> {
        let state = self.state.lock().unwrap();
        if state
            .containers
            .contains_key(&(database.to_string(), container.to_string()))
        {
            Ok(())
        } else {
            Err(not_found("container"))
        }
    }

    fn item_id(item: &JsonValue) -> Result<String, AppError> {
        item.get("id")
            .and_then(JsonValue::as_str)
            .map(str::to_string)
            .ok_or_else(|| AppError::DocumentStore {
                status: 400,
                message: "item has no id".to_string(),
            })
    }
}

fn not_found(what: &str) -> AppError {
    AppError::DocumentStore {
        status: 404,
        message: format!("{} not found", what),
    }
}

#[async_trait]
impl DocumentClient for FakeDocumentStore {
    async fn create_database_if_not_exists(&self, id: &str) -> Result<Provisioned, AppError> {
        self.record(Event::DatabaseStarted(id.to_string()));
        tokio::task::yield_now().await;

        if self.deny_databases {
            return Err(AppError::DocumentStore {
                status: 403,
                message: "forbidden".to_string(),
            });
        }

        let created = {
            let mut state = self.state.lock().unwrap();
            let created = state.databases.insert(id.to_string());
            if created {
                state.created.push(format!("database:{}", id));
            }
            created
        };

        self.record(Event::DatabaseCompleted(id.to_string()));
        Ok(Provisioned {
            id: id.to_string(),
            created,
        })
    }

    async fn create_container_if_not_exists(
        &self,
        database: &str,
        id: &str,
        partition_key_path: &str,
    ) -> Result<Provisioned, AppError> {
        self.record(Event::ContainerStarted(id.to_string()));
        tokio::task::yield_now().await;

        let created = {
            let mut state = self.state.lock().unwrap();
            if !state.databases.contains(database) {
                return Err(not_found("database"));
            }
            let key = (database.to_string(), id.to_string());
            let created = !state.containers.contains_key(&key);
            if created {
                state.containers.insert(key, partition_key_path.to_string());
                state.created.push(format!("container:{}/{}", database, id));
            }
            created
        };

        self.record(Event::ContainerCompleted(id.to_string()));
        Ok(Provisioned {
            id: id.to_string(),
            created,
        })
    }

    async fn create_item(
        &self,
        database: &str,
        container: &str,
        _partition_key: &JsonValue,
        item: JsonValue,
    ) -> Result<JsonValue, AppError> {
        self.require_container(database, container)?;
        let key = (database.to_string(), container.to_string(), Self::item_id(&item)?);

        let mut state = self.state.lock().unwrap();
        if state.items.contains_key(&key) {
            return Err(AppError::DocumentStore {
                status: 409,
                message: "item already exists".to_string(),
            });
        }
        state.items.insert(key, item.clone());
        Ok(item)
    }

    async fn upsert_item(
        &self,
        database: &str,
        container: &str,
        _partition_key: &JsonValue,
        item: JsonValue,
    ) -> Result<JsonValue, AppError> {
        self.require_container(database, container)?;
        let key = (database.to_string(), container.to_string(), Self::item_id(&item)?);
        self.state.lock().unwrap().items.insert(key, item.clone());
        Ok(item)
    }

    async fn read_item(
        &self,
        database: &str,
        container: &str,
        id: &str,
        _partition_key: &JsonValue,
    ) -> Result<Option<JsonValue>, AppError> {
        self.require_container(database, container)?;
        let key = (database.to_string(), container.to_string(), id.to_string());
        Ok(self.state.lock().unwrap().items.get(&key).cloned())
    }

    async fn delete_item(
        &self,
        database: &str,
        container: &str,
        id: &str,
        _partition_key: &JsonValue,
    ) -> Result<(), AppError> {
        self.require_container(database, container)?;
        let key = (database.to_string(), container.to_string(), id.to_string());
        match self.state.lock().unwrap().items.remove(&key) {
            Some(_) => Ok(()),
            None => Err(not_found("item")),
        }
    }

    async fn query_items(
        &self,
        database: &str,
        container: &str,
        _query: &str,
    ) -> Result<Vec<JsonValue>, AppError> {
        self.require_container(database, container)?;
        let state = self.state.lock().unwrap();
        Ok(state
            .items
            .iter()
            .filter(|((db, c, _), _)| db == database && c == container)
            .map(|(_, item)| item.clone())
            .collect())
    }
}
