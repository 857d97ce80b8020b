use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{AnchorSet, GarnishmentRow, TableRefresh};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Storage for the generated garnishment table.
///
/// The table is only ever replaced as a whole; there is no row-level update.
#[async_trait]
pub trait GarnishmentRepository: Send + Sync {
    /// Deletes every stored row and inserts `rows` in one transaction, then
    /// records the refresh. On error the previous table stays intact.
    async fn replace_table(
        &self,
        rows: &[GarnishmentRow],
        anchors: &AnchorSet,
    ) -> Result<TableRefresh, RepositoryError>;

    /// First row with `income_min <= income <= income_max`.
    async fn find_row(
        &self,
        income: Decimal,
    ) -> Result<Option<GarnishmentRow>, RepositoryError>;

    /// All rows ordered by `income_min`.
    async fn list_rows(&self) -> Result<Vec<GarnishmentRow>, RepositoryError>;

    async fn count_rows(&self) -> Result<i64, RepositoryError>;

    /// Most recent successful refresh, if any.
    async fn latest_refresh(&self) -> Result<Option<TableRefresh>, RepositoryError>;
}
