use std::collections::HashMap;
use std::sync::Arc;

use mpart_common::error::{MpartError, Result};
use tracing::debug;

use crate::{local::LocalClient, options::BackendOptions, traits::StoreClient};

pub const LOCAL_BACKEND: &str = "local";

/// Builds a configured backend from an options bag.
pub trait ClientFactory: Send + Sync {
    fn create(&self, options: &BackendOptions) -> Result<Arc<dyn StoreClient>>;
}

impl<F> ClientFactory for F
where
    F: Fn(&BackendOptions) -> Result<Arc<dyn StoreClient>> + Send + Sync,
{
    fn create(&self, options: &BackendOptions) -> Result<Arc<dyn StoreClient>> {
        self(options)
    }
}

/// Name-to-factory lookup, built once at startup and shared by reference.
/// Names are case-sensitive.
#[derive(Default)]
pub struct BackendRegistry {
    factories: HashMap<String, Box<dyn ClientFactory>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtin_backends() -> Self {
        let mut registry = Self::new();
        registry.register(
            LOCAL_BACKEND.to_string(),
            Box::new(|options: &BackendOptions| -> Result<Arc<dyn StoreClient>> {
                Ok(Arc::new(LocalClient::from_options(options)?))
            }),
        );
        registry
    }

    /// Adds a backend, replacing any previous factory with the same name.
    pub fn register(&mut self, name: String, factory: Box<dyn ClientFactory>) {
        self.factories.insert(name, factory);
    }

    pub fn create(&self, name: &str, options: &BackendOptions) -> Result<Arc<dyn StoreClient>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| MpartError::BackendNotFound(name.to_string()))?;
        debug!(backend = name, "configuring storage backend");
        factory.create(options)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
