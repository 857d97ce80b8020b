use pfand_core::calculations::{AnchorResolver, TableGenerator};
use pfand_core::{
    AnchorSet, GarnishmentRepository, GarnishmentSchedule, RawAnchors, RepositoryError,
    ScheduleError, TableRefresh,
};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, warn};

/// Errors that can occur when regenerating the stored table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RefreshError {
    #[error("Invalid schedule: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("Anchors {start_income}..{end_income} produce an empty table; stored table left unchanged")]
    EmptyTable {
        start_income: Decimal,
        end_income: Decimal,
    },

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Regenerates the stored garnishment table from anchors.
///
/// Works against the [`GarnishmentRepository`] trait so any backend can be
/// refreshed. Refreshing is idempotent: the same anchors always leave the
/// same rows behind.
pub struct TableRefresher;

impl TableRefresher {
    /// Resolve `raw`, generate the table and replace the stored one.
    pub async fn refresh<R: GarnishmentRepository + ?Sized>(
        repo: &R,
        raw: &RawAnchors,
        schedule: &GarnishmentSchedule,
    ) -> Result<TableRefresh, RefreshError> {
        let anchors = AnchorResolver::default().resolve(raw);
        Self::refresh_resolved(repo, &anchors, schedule).await
    }

    /// Generate the table for complete `anchors` and replace the stored one.
    ///
    /// The stored table is only touched when generation yields at least one
    /// row.
    pub async fn refresh_resolved<R: GarnishmentRepository + ?Sized>(
        repo: &R,
        anchors: &AnchorSet,
        schedule: &GarnishmentSchedule,
    ) -> Result<TableRefresh, RefreshError> {
        let generator = TableGenerator::new(schedule.clone())?;
        let rows = generator.generate(anchors);

        if rows.is_empty() {
            warn!(
                start = %anchors.start_income,
                end = %anchors.end_income,
                "anchors produce no rows; keeping stored table"
            );
            return Err(RefreshError::EmptyTable {
                start_income: anchors.start_income,
                end_income: anchors.end_income,
            });
        }

        Ok(repo.replace_table(&rows, anchors).await?)
    }

    /// Fill an empty repository from the statutory default anchors.
    ///
    /// Returns `None` when rows are already stored.
    pub async fn ensure_populated<R: GarnishmentRepository + ?Sized>(
        repo: &R,
        schedule: &GarnishmentSchedule,
    ) -> Result<Option<TableRefresh>, RefreshError> {
        if repo.count_rows().await? > 0 {
            return Ok(None);
        }

        info!("garnishment table is empty; generating from default anchors");
        Self::refresh(repo, &RawAnchors::default(), schedule)
            .await
            .map(Some)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;
    use pfand_core::GarnishmentRow;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[derive(Default)]
    struct RecordingRepository {
        rows: Mutex<Vec<GarnishmentRow>>,
        refreshes: Mutex<Vec<TableRefresh>>,
    }

    #[async_trait]
    impl GarnishmentRepository for RecordingRepository {
        async fn replace_table(
            &self,
            rows: &[GarnishmentRow],
            anchors: &AnchorSet,
        ) -> Result<TableRefresh, RepositoryError> {
            *self.rows.lock().unwrap() = rows.to_vec();
            let mut refreshes = self.refreshes.lock().unwrap();
            let refresh = TableRefresh {
                id: refreshes.len() as i64 + 1,
                row_count: rows.len() as i64,
                start_income: anchors.start_income,
                end_income: anchors.end_income,
                refreshed_at: Utc::now(),
            };
            refreshes.push(refresh.clone());
            Ok(refresh)
        }
        async fn find_row(
            &self,
            income: Decimal,
        ) -> Result<Option<GarnishmentRow>, RepositoryError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.contains(income))
                .cloned())
        }
        async fn list_rows(&self) -> Result<Vec<GarnishmentRow>, RepositoryError> {
            Ok(self.rows.lock().unwrap().clone())
        }
        async fn count_rows(&self) -> Result<i64, RepositoryError> {
            Ok(self.rows.lock().unwrap().len() as i64)
        }
        async fn latest_refresh(&self) -> Result<Option<TableRefresh>, RepositoryError> {
            Ok(self.refreshes.lock().unwrap().last().cloned())
        }
    }

    #[tokio::test]
    async fn test_refresh_with_defaults() {
        let repo = RecordingRepository::default();

        let refresh =
            TableRefresher::refresh(&repo, &RawAnchors::default(), &GarnishmentSchedule::default())
                .await
                .unwrap();

        assert_eq!(refresh.row_count, 321);
        assert_eq!(repo.count_rows().await, Ok(321));
    }

    #[tokio::test]
    async fn test_refresh_applies_raw_anchors() {
        let repo = RecordingRepository::default();
        let raw = RawAnchors {
            start_income: Some(dec!(1560.00)),
            end_income: Some(dec!(1600.00)),
            ..RawAnchors::default()
        };

        let refresh = TableRefresher::refresh(&repo, &raw, &GarnishmentSchedule::default())
            .await
            .unwrap();

        assert_eq!(refresh.row_count, 5);
        assert_eq!(refresh.end_income, dec!(1600.00));
    }

    #[tokio::test]
    async fn test_refresh_empty_table_keeps_stored_rows() {
        let repo = RecordingRepository::default();
        TableRefresher::refresh(&repo, &RawAnchors::default(), &GarnishmentSchedule::default())
            .await
            .unwrap();

        let anchors = AnchorSet {
            end_income: dec!(1000.00),
            ..AnchorSet::default()
        };
        let result =
            TableRefresher::refresh_resolved(&repo, &anchors, &GarnishmentSchedule::default())
                .await;

        assert_eq!(
            result,
            Err(RefreshError::EmptyTable {
                start_income: dec!(1560.00),
                end_income: dec!(1000.00),
            })
        );
        assert_eq!(repo.count_rows().await, Ok(321));
        assert_eq!(repo.refreshes.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_inverted_range_falls_back_to_defaults() {
        let repo = RecordingRepository::default();
        let raw = RawAnchors {
            start_income: Some(dec!(2000.00)),
            end_income: Some(dec!(1500.00)),
            ..RawAnchors::default()
        };

        let refresh = TableRefresher::refresh(&repo, &raw, &GarnishmentSchedule::default())
            .await
            .unwrap();

        assert_eq!(refresh.row_count, 321);
        assert_eq!(refresh.start_income, dec!(1560.00));
    }

    #[tokio::test]
    async fn test_refresh_rejects_invalid_schedule() {
        let repo = RecordingRepository::default();
        let schedule = GarnishmentSchedule {
            step: dec!(0),
            ..GarnishmentSchedule::default()
        };

        let result = TableRefresher::refresh(&repo, &RawAnchors::default(), &schedule).await;

        assert_eq!(
            result,
            Err(RefreshError::Schedule(ScheduleError::InvalidStep(dec!(0))))
        );
        assert_eq!(repo.count_rows().await, Ok(0));
    }

    #[tokio::test]
    async fn test_refresh_is_idempotent() {
        let repo = RecordingRepository::default();
        let schedule = GarnishmentSchedule::default();

        TableRefresher::refresh(&repo, &RawAnchors::default(), &schedule)
            .await
            .unwrap();
        let first = repo.list_rows().await.unwrap();
        TableRefresher::refresh(&repo, &RawAnchors::default(), &schedule)
            .await
            .unwrap();

        assert_eq!(repo.list_rows().await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_ensure_populated_fills_empty_repository_once() {
        let repo = RecordingRepository::default();
        let schedule = GarnishmentSchedule::default();

        let first = TableRefresher::ensure_populated(&repo, &schedule)
            .await
            .unwrap();
        let second = TableRefresher::ensure_populated(&repo, &schedule)
            .await
            .unwrap();

        assert_eq!(first.map(|r| r.row_count), Some(321));
        assert_eq!(second, None);
        assert_eq!(repo.refreshes.lock().unwrap().len(), 1);
    }
}
