use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pfand_core::{
    AnchorSet, DEPENDENT_COLUMNS, DependentCount, GarnishmentRepository, GarnishmentRow,
    RepositoryError, TableRefresh,
};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{debug, info};

use crate::decimal::{decimal_to_f64, get_cents};

const ROW_COLUMNS: &str = "income_min, income_max, pfand_0, pfand_1, pfand_2, pfand_3, pfand_4, pfand_5";

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Connects to `database_url`, creating the database file if needed.
    ///
    /// Accepts bare paths (`pfand.db`), `:memory:` and sqlx URLs
    /// (`sqlite:pfand.db?mode=rwc`). In-memory databases get a single
    /// connection so every query sees the same data.
    pub async fn new(database_url: &str) -> Result<Self, RepositoryError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| RepositoryError::Connection(e.to_string()))?
            .create_if_missing(true);

        let mut pool_options = SqlitePoolOptions::new();
        if database_url.contains(":memory:") {
            pool_options = pool_options.max_connections(1);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| {
                RepositoryError::Connection(format!(
                    "Failed to connect to database '{}': {}",
                    database_url, e
                ))
            })?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<(), RepositoryError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(format!("Failed to run migrations: {}", e)))?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn db_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn row_to_garnishment_row(row: &SqliteRow) -> Result<GarnishmentRow, RepositoryError> {
    let mut amounts = [Decimal::ZERO; DEPENDENT_COLUMNS];
    for d in DependentCount::all() {
        amounts[d.index()] = get_cents(row, d.column_name())?;
    }

    Ok(GarnishmentRow {
        income_min: get_cents(row, "income_min")?,
        income_max: get_cents(row, "income_max")?,
        amounts,
    })
}

fn row_to_table_refresh(row: &SqliteRow) -> Result<TableRefresh, RepositoryError> {
    Ok(TableRefresh {
        id: row.try_get("id").map_err(db_err)?,
        row_count: row.try_get("row_count").map_err(db_err)?,
        start_income: get_cents(row, "start_income")?,
        end_income: get_cents(row, "end_income")?,
        refreshed_at: row
            .try_get::<DateTime<Utc>, _>("refreshed_at")
            .map_err(|e| RepositoryError::Database(format!("Failed to get refreshed_at: {}", e)))?,
    })
}

#[async_trait]
impl GarnishmentRepository for SqliteRepository {
    async fn replace_table(
        &self,
        rows: &[GarnishmentRow],
        anchors: &AnchorSet,
    ) -> Result<TableRefresh, RepositoryError> {
        let refreshed_at = Utc::now();
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let deleted = sqlx::query("DELETE FROM garnishment_table")
            .execute(&mut *tx)
            .await
            .map_err(db_err)?
            .rows_affected();

        let insert = format!(
            "INSERT INTO garnishment_table ({ROW_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
        );
        for row in rows {
            let mut query = sqlx::query(&insert)
                .bind(decimal_to_f64(row.income_min))
                .bind(decimal_to_f64(row.income_max));
            for amount in row.amounts {
                query = query.bind(decimal_to_f64(amount));
            }
            query.execute(&mut *tx).await.map_err(db_err)?;
        }

        let row_count = rows.len() as i64;
        let id = sqlx::query(
            "INSERT INTO table_refresh (row_count, start_income, end_income, refreshed_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(row_count)
        .bind(decimal_to_f64(anchors.start_income))
        .bind(decimal_to_f64(anchors.end_income))
        .bind(refreshed_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?
        .last_insert_rowid();

        tx.commit().await.map_err(db_err)?;

        debug!(deleted, inserted = row_count, "replaced garnishment table");
        info!(
            refresh_id = id,
            rows = row_count,
            start = %anchors.start_income,
            end = %anchors.end_income,
            "garnishment table refreshed"
        );

        Ok(TableRefresh {
            id,
            row_count,
            start_income: anchors.start_income,
            end_income: anchors.end_income,
            refreshed_at,
        })
    }

    async fn find_row(
        &self,
        income: Decimal,
    ) -> Result<Option<GarnishmentRow>, RepositoryError> {
        // REAL bounds are compared in Decimal space; SQL only narrows to the
        // nearest band starting at or below `income`.
        let row = sqlx::query(&format!(
            "SELECT {ROW_COLUMNS} FROM garnishment_table
             WHERE income_min <= ?
             ORDER BY income_min DESC
             LIMIT 1"
        ))
        .bind(decimal_to_f64(income) + 0.001)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        match row {
            Some(row) => {
                let row = row_to_garnishment_row(&row)?;
                Ok(row.contains(income).then_some(row))
            }
            None => Ok(None),
        }
    }

    async fn list_rows(&self) -> Result<Vec<GarnishmentRow>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {ROW_COLUMNS} FROM garnishment_table ORDER BY income_min"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(row_to_garnishment_row).collect()
    }

    async fn count_rows(&self) -> Result<i64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM garnishment_table")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;

        row.try_get("count").map_err(db_err)
    }

    async fn latest_refresh(&self) -> Result<Option<TableRefresh>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, row_count, start_income, end_income, refreshed_at
             FROM table_refresh
             ORDER BY id DESC
             LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(row_to_table_refresh).transpose()
    }
}
