use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use tracing::warn;

use super::repository::{GarnishmentRepository, RepositoryError};

/// Backend-agnostic connection configuration.
///
/// `backend` selects a registered [`RepositoryFactory`];
/// `connection_string` is handed to it untouched.
///
/// | backend    | connection_string examples              |
/// |------------|-----------------------------------------|
/// | `sqlite`   | `pfand.db`, `:memory:`, `sqlite:pfand.db?mode=rwc` |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// Lowercase identifier matching a registered factory (e.g. `"sqlite"`).
    pub backend: String,
    /// Backend-specific location of the database.
    pub connection_string: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: "pfand.db".to_string(),
        }
    }
}

impl DbConfig {
    /// A throwaway SQLite database, used by tests and one-off lookups.
    pub fn in_memory_sqlite() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: ":memory:".to_string(),
        }
    }

    /// True when the garnishment table will not outlive the process.
    pub fn is_in_memory(&self) -> bool {
        self.connection_string.contains(":memory:")
    }
}

impl fmt::Display for DbConfig {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        if self.is_in_memory() {
            write!(f, "in-memory {} table store", self.backend)
        } else {
            write!(f, "{} table store at '{}'", self.backend, self.connection_string)
        }
    }
}

/// Builds repositories for one database backend.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    /// Unique, lowercase identifier for this backend.
    fn backend_name(&self) -> &'static str;

    /// Opens (or creates) the database and returns a ready repository.
    /// Implementations run their migrations here.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn GarnishmentRepository>, RepositoryError>;
}

/// Factories keyed by backend name.
#[derive(Default)]
pub struct RepositoryRegistry {
    factories: HashMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory`, replacing any factory with the same backend name.
    pub fn register(
        &mut self,
        factory: Box<dyn RepositoryFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Registered backend names, sorted.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Creates a repository through the factory named by `config.backend`.
    ///
    /// # Errors
    /// * [`RepositoryError::Configuration`] if no such backend is registered.
    /// * Whatever the selected factory returns.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn GarnishmentRepository>, RepositoryError> {
        let Some(factory) = self.factories.get(config.backend.as_str()) else {
            return Err(RepositoryError::Configuration(format!(
                "cannot open {config}: backend '{}' is not registered (available: {})",
                config.backend,
                self.available_backends().join(", ")
            )));
        };

        if config.is_in_memory() {
            warn!("{config} is discarded on exit; refreshes will not persist");
        }
        factory.create(config).await
    }
}
