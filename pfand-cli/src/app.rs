use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use pfand_core::calculations::{GarnishmentTable, LookupOutcome, TableGenerator, lookup_garnishable};
use pfand_core::db::RepositoryRegistry;
use pfand_core::{
    DependentCount, GarnishmentRepository, GarnishmentRow, GarnishmentSchedule, RawAnchors,
    TableRefresh,
};
use pfand_data::{AnchorFileLoader, TableRefresher};
use pfand_db_sqlite::SqliteRepositoryFactory;
use rust_decimal::Decimal;
use tracing::{debug, info};

/// Registry with every backend this binary ships.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

/// Reads anchors from `path`, or returns empty anchors (statutory defaults).
pub fn load_anchors(path: Option<&Path>) -> Result<RawAnchors> {
    let Some(path) = path else {
        debug!("no anchor file; using defaults");
        return Ok(RawAnchors::default());
    };

    let file = File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
    AnchorFileLoader::parse(file)
        .with_context(|| format!("Failed to parse anchor file: {}", path.display()))
}

/// Generates the table in memory, without touching the database.
pub fn generate_table(
    raw: &RawAnchors,
    schedule: &GarnishmentSchedule,
) -> Result<GarnishmentTable> {
    let generator = TableGenerator::new(schedule.clone())?;
    let anchors = pfand_core::calculations::resolve(raw);
    Ok(GarnishmentTable::generate(&generator, &anchors))
}

/// Writes rows as CSV: `income_min,income_max,pfand_0,...,pfand_5`.
pub fn write_table_csv<W: Write>(
    writer: W,
    rows: &[GarnishmentRow],
) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = vec!["income_min", "income_max"];
    header.extend(DependentCount::all().map(DependentCount::column_name));
    csv_writer.write_record(&header)?;

    for row in rows {
        let mut record = vec![cents(row.income_min), cents(row.income_max)];
        record.extend(row.amounts.iter().copied().map(cents));
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush().context("Failed to write CSV")?;
    Ok(())
}

/// Regenerates and stores the table.
pub async fn refresh(
    repo: &dyn GarnishmentRepository,
    raw: &RawAnchors,
    schedule: &GarnishmentSchedule,
) -> Result<TableRefresh> {
    TableRefresher::refresh(repo, raw, schedule)
        .await
        .context("Failed to refresh garnishment table")
}

/// Looks up `income`, generating the default table first if none is stored.
pub async fn lookup(
    repo: &dyn GarnishmentRepository,
    schedule: &GarnishmentSchedule,
    income: Decimal,
    dependents: DependentCount,
) -> Result<LookupOutcome> {
    if let Some(refresh) = TableRefresher::ensure_populated(repo, schedule)
        .await
        .context("Failed to populate garnishment table")?
    {
        info!(rows = refresh.row_count, "initial garnishment table stored");
    }

    lookup_garnishable(repo, income, dependents)
        .await
        .context("Failed to look up garnishable amount")
}

/// Human-readable line for a lookup result.
pub fn describe_outcome(
    income: Decimal,
    dependents: DependentCount,
    outcome: LookupOutcome,
) -> String {
    let income = cents(income);
    match outcome {
        LookupOutcome::Garnishable(amount) => format!(
            "Net income {income} EUR with {dependents} dependents: {} EUR garnishable",
            cents(amount)
        ),
        LookupOutcome::FullyGarnishable => format!(
            "Net income {income} EUR with {dependents} dependents: above the table, the amount over the ceiling is fully garnishable"
        ),
        LookupOutcome::Exempt => format!(
            "Net income {income} EUR with {dependents} dependents: below the garnishment floor, nothing garnishable"
        ),
    }
}

fn cents(value: Decimal) -> String {
    format!("{value:.2}")
}

#[cfg(test)]
mod tests {
    use pfand_core::db::DbConfig;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_build_registry_has_sqlite() {
        assert_eq!(build_registry().available_backends(), vec!["sqlite"]);
    }

    #[test]
    fn test_write_table_csv() {
        let table = generate_table(&RawAnchors::default(), &GarnishmentSchedule::default()).unwrap();
        let mut out = Vec::new();

        write_table_csv(&mut out, &table.rows()[..2]).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "income_min,income_max,pfand_0,pfand_1,pfand_2,pfand_3,pfand_4,pfand_5\n\
             1560.00,1569.99,3.50,0.00,0.00,0.00,0.00,0.00\n\
             1570.00,1579.99,10.50,0.00,0.00,0.00,0.00,0.00\n"
        );
    }

    #[test]
    fn test_write_table_csv_pads_whole_euros() {
        let raw = RawAnchors {
            start_income: Some(dec!(1560)),
            end_income: Some(dec!(1560)),
            ..RawAnchors::default()
        };
        let table = generate_table(&raw, &GarnishmentSchedule::default()).unwrap();
        let mut out = Vec::new();

        write_table_csv(&mut out, table.rows()).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().nth(1), Some("1560.00,1569.99,3.50,0.00,0.00,0.00,0.00,0.00"));
    }

    #[test]
    fn test_generate_table_rejects_bad_schedule() {
        let schedule = GarnishmentSchedule {
            step: dec!(0),
            ..GarnishmentSchedule::default()
        };

        assert!(generate_table(&RawAnchors::default(), &schedule).is_err());
    }

    #[test]
    fn test_load_anchors_without_file_is_default() {
        assert_eq!(load_anchors(None).unwrap(), RawAnchors::default());
    }

    #[test]
    fn test_load_anchors_missing_file_fails() {
        let path = std::env::temp_dir().join("pfand-anchors-does-not-exist.csv");

        let err = load_anchors(Some(&path)).unwrap_err();

        assert!(err.to_string().starts_with("Failed to open:"));
    }

    #[tokio::test]
    async fn test_lookup_populates_empty_database() {
        let repo = build_registry().create(&DbConfig::in_memory_sqlite()).await.unwrap();
        let schedule = GarnishmentSchedule::default();

        let outcome = lookup(&*repo, &schedule, dec!(1565), DependentCount::clamped(0))
            .await
            .unwrap();

        assert_eq!(outcome, LookupOutcome::Garnishable(dec!(3.50)));
        assert_eq!(repo.count_rows().await, Ok(321));
    }

    #[tokio::test]
    async fn test_refresh_then_lookup_uses_new_ceiling() {
        let repo = build_registry().create(&DbConfig::in_memory_sqlite()).await.unwrap();
        let schedule = GarnishmentSchedule::default();
        let raw = RawAnchors {
            start_income: Some(dec!(1560.00)),
            end_income: Some(dec!(2000.00)),
            ..RawAnchors::default()
        };

        let stored = refresh(&*repo, &raw, &schedule).await.unwrap();
        let outcome = lookup(&*repo, &schedule, dec!(2500), DependentCount::clamped(2))
            .await
            .unwrap();

        assert_eq!(stored.row_count, 45);
        assert_eq!(outcome, LookupOutcome::FullyGarnishable);
    }

    #[test]
    fn test_describe_outcome() {
        let d = DependentCount::clamped(7);

        assert_eq!(
            describe_outcome(dec!(3460), d, LookupOutcome::Garnishable(dec!(1.56))),
            "Net income 3460.00 EUR with 5+ dependents: 1.56 EUR garnishable"
        );
        assert!(describe_outcome(dec!(1000), d, LookupOutcome::Exempt).contains("nothing garnishable"));
    }
}
