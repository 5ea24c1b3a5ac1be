//! Scheme-based collection opening.
//!
//! The host builds one [`DriverRegistry`] at startup, registers an opener
//! per scheme and passes the registry to whatever opens collections.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use docstore_core::{Error, Result};

use crate::backend::Backend;
use crate::config::{CollectionConfig, DEFAULT_SCHEME};
use crate::table::Table;

/// Future returned by [`CollectionOpener::open_collection`].
pub type OpenFuture<'a> = Pin<Box<dyn Future<Output = Result<Table>> + Send + 'a>>;

/// Opens collections for one scheme.
pub trait CollectionOpener: Send + Sync {
    /// Open the collection described by `config`.
    fn open_collection<'a>(&'a self, config: &'a CollectionConfig) -> OpenFuture<'a>;
}

/// Opener for the wide-column driver over a shared backend.
pub struct TablestoreOpener {
    backend: Arc<dyn Backend>,
}

impl TablestoreOpener {
    /// Opener whose collections all use `backend`.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }
}

impl CollectionOpener for TablestoreOpener {
    fn open_collection<'a>(&'a self, config: &'a CollectionConfig) -> OpenFuture<'a> {
        Box::pin(Table::open(Arc::clone(&self.backend), config))
    }
}

/// Scheme to opener mapping.
#[derive(Default)]
pub struct DriverRegistry {
    openers: HashMap<String, Arc<dyn CollectionOpener>>,
}

impl DriverRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the wide-column driver under its default scheme.
    pub fn with_tablestore(backend: Arc<dyn Backend>) -> Self {
        let mut openers: HashMap<String, Arc<dyn CollectionOpener>> = HashMap::new();
        openers.insert(
            DEFAULT_SCHEME.to_string(),
            Arc::new(TablestoreOpener::new(backend)),
        );
        Self { openers }
    }

    /// Register `opener` for `scheme`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] if the scheme is empty or already taken.
    pub fn register(
        &mut self,
        scheme: impl Into<String>,
        opener: Arc<dyn CollectionOpener>,
    ) -> Result<()> {
        let scheme = scheme.into();
        if scheme.is_empty() {
            return Err(Error::invalid_input("scheme is empty"));
        }
        if self.openers.contains_key(&scheme) {
            return Err(Error::invalid_input(format!(
                "scheme {} is already registered",
                scheme
            )));
        }
        self.openers.insert(scheme, opener);
        Ok(())
    }

    /// Registered schemes, sorted.
    pub fn schemes(&self) -> Vec<&str> {
        let mut schemes: Vec<&str> = self.openers.keys().map(String::as_str).collect();
        schemes.sort_unstable();
        schemes
    }

    /// Open a collection with the opener registered for `config.scheme`.
    ///
    /// # Errors
    ///
    /// A configuration error for an invalid config or an unknown scheme;
    /// otherwise whatever the opener returns.
    pub async fn open_collection(&self, config: &CollectionConfig) -> Result<Table> {
        config.validate()?;
        let opener = self.openers.get(&config.scheme).ok_or_else(|| {
            Error::configuration(format!("no driver registered for scheme {}", config.scheme))
        })?;
        opener.open_collection(config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryBackend, PrimaryKeyType, TableMeta};

    fn backend() -> Arc<MemoryBackend> {
        let backend = MemoryBackend::new();
        backend.create_table(TableMeta::new("users").with_key("id", PrimaryKeyType::String));
        Arc::new(backend)
    }

    #[tokio::test]
    async fn test_open_by_scheme() {
        let registry = DriverRegistry::with_tablestore(backend());
        assert_eq!(registry.schemes(), vec!["tablestore"]);
        let table = registry
            .open_collection(&CollectionConfig::new("users", "id"))
            .await
            .unwrap();
        assert_eq!(table.name(), "users");
    }

    #[tokio::test]
    async fn test_unknown_scheme() {
        let registry = DriverRegistry::new();
        let err = registry
            .open_collection(&CollectionConfig::new("users", "id"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_duplicate_registration() {
        let backend = backend();
        let mut registry = DriverRegistry::new();
        registry
            .register("ots", Arc::new(TablestoreOpener::new(backend.clone())))
            .unwrap();
        let err = registry
            .register("ots", Arc::new(TablestoreOpener::new(backend.clone())))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));
        assert!(registry
            .register("", Arc::new(TablestoreOpener::new(backend)))
            .is_err());
        assert_eq!(registry.schemes(), vec!["ots"]);
    }
}
