use async_trait::async_trait;
use pfand_core::db::repository::{GarnishmentRepository, RepositoryError};
use pfand_core::db::{DbConfig, RepositoryFactory};

use crate::repository::SqliteRepository;

/// [`RepositoryFactory`] for SQLite.
///
/// Register this with a [`pfand_core::db::RepositoryRegistry`] to make the
/// `"sqlite"` backend available:
///
/// ```rust,no_run
/// use pfand_core::db::RepositoryRegistry;
/// use pfand_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Opens `config.connection_string` and brings the schema up to date.
    ///
    /// A bare file path is created if it does not exist; `":memory:"` gives
    /// an ephemeral database. The table itself is left empty until the first
    /// refresh.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn GarnishmentRepository>, RepositoryError> {
        let repo = SqliteRepository::new(&config.connection_string).await?;
        repo.run_migrations().await?;
        Ok(Box::new(repo))
    }
}

#[cfg(test)]
mod tests {
    use pfand_core::db::{DbConfig, RepositoryFactory, RepositoryRegistry};

    use super::SqliteRepositoryFactory;

    #[test]
    fn backend_name_is_sqlite() {
        assert_eq!(SqliteRepositoryFactory.backend_name(), "sqlite");
    }

    #[tokio::test]
    async fn creates_migrated_in_memory_repository() {
        let repo = SqliteRepositoryFactory
            .create(&DbConfig::in_memory_sqlite())
            .await
            .expect("failed to create in-memory repository");

        assert_eq!(repo.count_rows().await, Ok(0));
        assert_eq!(repo.latest_refresh().await, Ok(None));
    }

    #[tokio::test]
    async fn registry_routes_to_sqlite() {
        let mut registry = RepositoryRegistry::new();
        registry.register(Box::new(SqliteRepositoryFactory));

        let repo = registry.create(&DbConfig::in_memory_sqlite()).await;

        assert!(repo.is_ok(), "registry should create a sqlite repository");
    }
}
