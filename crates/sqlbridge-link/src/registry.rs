//! Engine constructors and named connection pools.
//!
//! The registry is an explicit object: build one at startup, hand it to
//! whatever creates adapters, and call [`EngineRegistry::teardown`] on
//! shutdown.

use crate::adapter::Adapter;
use crate::fetch::FetchDriver;
use crate::transport::{build_client, AuthProvider, HttpChunkSource, HttpEndpoint, HttpStatementApi, Transport};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::{debug, info, warn};
use parking_lot::Mutex;
use sqlbridge_commons::{
    BridgeConfig, BridgeError, BridgeTimeouts, EngineConfig, ExecutionSettings, HttpSettings, PollingSettings,
    Result,
};
use sqlbridge_dialect::{normalize_engine, DialectCatalog};
use std::sync::Arc;

/// A live or lazily established connection shared under a name.
pub trait ConnectionHandle: Send + Sync {
    fn close(&self) -> Result<()>;

    fn test_connection(&self) -> Result<()>;
}

/// An adapter shared as a pool entry; calls serialize on its lock.
impl ConnectionHandle for Mutex<Adapter> {
    fn close(&self) -> Result<()> {
        self.lock().close()
    }

    fn test_connection(&self) -> Result<()> {
        self.lock().test_connection()
    }
}

/// Builds a transport from an engine configuration.
pub type TransportConstructor = Arc<dyn Fn(&EngineConfig) -> Result<Transport> + Send + Sync>;

pub struct EngineRegistry {
    catalog: Arc<DialectCatalog>,
    settings: ExecutionSettings,
    constructors: DashMap<String, TransportConstructor>,
    pools: DashMap<String, Arc<dyn ConnectionHandle>>,
}

impl std::fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineRegistry")
            .field("engines", &self.engines())
            .field("pools", &self.pools.len())
            .finish()
    }
}

impl EngineRegistry {
    pub fn new(catalog: Arc<DialectCatalog>, settings: ExecutionSettings) -> Self {
        Self {
            catalog,
            settings,
            constructors: DashMap::new(),
            pools: DashMap::new(),
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        let catalog = DialectCatalog::from_config(&config.dialect)?;
        Ok(Self::new(Arc::new(catalog), config.execution.clone()))
    }

    pub fn catalog(&self) -> &Arc<DialectCatalog> {
        &self.catalog
    }

    /// Register (or replace) the constructor for an engine type.
    pub fn register<F>(&self, engine: &str, constructor: F)
    where
        F: Fn(&EngineConfig) -> Result<Transport> + Send + Sync + 'static,
    {
        let engine = normalize_engine(engine);
        debug!("[REGISTRY] Registered constructor for {}", engine);
        self.constructors.insert(engine, Arc::new(constructor));
    }

    pub fn is_registered(&self, engine: &str) -> bool {
        self.constructors.contains_key(&normalize_engine(engine))
    }

    /// Registered engine types, sorted.
    pub fn engines(&self) -> Vec<String> {
        let mut engines: Vec<String> = self.constructors.iter().map(|e| e.key().clone()).collect();
        engines.sort();
        engines
    }

    /// Build an adapter: the engine's dialect paired with a fresh transport.
    pub fn create_adapter(&self, config: &EngineConfig) -> Result<Adapter> {
        let engine = normalize_engine(&config.engine);
        // Clone the Arc so the shard lock is released before the constructor runs.
        let constructor = self
            .constructors
            .get(&engine)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| {
                BridgeError::ConfigurationError(format!("No constructor registered for engine '{}'", config.engine))
            })?;

        let dialect = self.catalog.dialect(&engine)?;
        let transport = constructor(config)?;
        info!(
            "[REGISTRY] Created {} adapter '{}' over {}",
            engine,
            config.name,
            transport.kind()
        );
        Ok(Adapter::new(dialect, transport).with_settings(self.settings.clone()))
    }

    /// Return the pool registered under `name`, creating it with `init` if
    /// absent. Concurrent callers for the same name run `init` at most once.
    ///
    /// `init` runs while the name's shard is locked and must not call back
    /// into this registry's pools.
    pub fn get_or_create_pool<F>(&self, name: &str, init: F) -> Result<Arc<dyn ConnectionHandle>>
    where
        F: FnOnce() -> Result<Arc<dyn ConnectionHandle>>,
    {
        match self.pools.entry(name.to_string()) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let handle = init()?;
                info!("[REGISTRY] Created connection pool '{}'", name);
                Ok(Arc::clone(entry.insert(handle).value()))
            },
        }
    }

    pub fn pool(&self, name: &str) -> Option<Arc<dyn ConnectionHandle>> {
        self.pools.get(name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn pool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.pools.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Remove and close a pool. Returns whether it existed.
    pub fn remove_pool(&self, name: &str) -> Result<bool> {
        match self.pools.remove(name) {
            Some((_, handle)) => {
                handle.close()?;
                info!("[REGISTRY] Closed connection pool '{}'", name);
                Ok(true)
            },
            None => Ok(false),
        }
    }

    /// Close every pool. All pools are removed even when some fail to close;
    /// the first failure is returned.
    pub fn teardown(&self) -> Result<()> {
        let mut first_error = None;
        for name in self.pool_names() {
            if let Some((_, handle)) = self.pools.remove(&name) {
                if let Err(e) = handle.close() {
                    warn!("[REGISTRY] Failed to close pool '{}': {}", name, e);
                    first_error.get_or_insert(e);
                }
            }
        }
        info!("[REGISTRY] Teardown complete");
        first_error.map_or(Ok(()), Err)
    }
}

/// Constructor for engines reached over HTTP.
///
/// Reads these options from the engine configuration:
/// - `url` (required): base URL
/// - `transport`: `statements` (default) or `chunked`
/// - `token`, or `user` and `password`: credentials
pub fn http_constructor(http: HttpSettings, polling: PollingSettings) -> TransportConstructor {
    Arc::new(move |config: &EngineConfig| {
        let url = config.option("url").ok_or_else(|| {
            BridgeError::ConfigurationError(format!("Engine '{}' requires a 'url' option", config.name))
        })?;

        let auth = match (config.option("token"), config.option("user"), config.option("password")) {
            (Some(token), _, _) => AuthProvider::bearer_token(token.to_string()),
            (None, Some(user), Some(password)) => AuthProvider::basic_auth(user.to_string(), password.to_string()),
            (None, Some(_), None) => {
                return Err(BridgeError::ConfigurationError(format!(
                    "Engine '{}' has a 'user' option but no 'password'",
                    config.name
                )))
            },
            _ => AuthProvider::none(),
        };

        let timeouts = BridgeTimeouts::from(&http);
        let client = build_client(&timeouts, &http.user_agent)?;
        let endpoint = HttpEndpoint::new(url, client, auth);

        match config.option("transport").unwrap_or("statements") {
            "chunked" => Ok(Transport::ChunkedHttp(Box::new(HttpChunkSource::new(endpoint)))),
            "statements" => {
                let driver = FetchDriver::new(Box::new(HttpStatementApi::new(endpoint)), &polling)
                    .with_poll_timeout(timeouts.poll_timeout);
                Ok(Transport::PagedHttp(driver))
            },
            other => Err(BridgeError::ConfigurationError(format!(
                "Unknown HTTP transport '{}' for engine '{}'",
                other, config.name
            ))),
        }
    })
}
