//! Garnishable-amount lookup for a single net income.
//!
//! | Net income | Outcome |
//! |------------|---------|
//! | above the table ceiling (`end_income`) | [`LookupOutcome::FullyGarnishable`] |
//! | inside a band | [`LookupOutcome::Garnishable`] with the band's amount for the dependent column |
//! | below the first band | [`LookupOutcome::Exempt`] |
//!
//! Negative incomes count as zero and incomes are rounded to cents before
//! matching, so values such as `1569.994` still land in a band.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::TableGenerator;
use crate::calculations::common::{max, round_half_up};
use crate::{AnchorSet, DependentCount, GarnishmentRepository, GarnishmentRow, RepositoryError};

/// Result of looking up one income.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LookupOutcome {
    /// Amount from the matching band; may be zero for columns not yet active.
    Garnishable(Decimal),

    /// Income above the table ceiling; everything above it may be garnished.
    FullyGarnishable,

    /// No band matches; the income is below the garnishment floor.
    Exempt,
}

/// Clamps `income` to zero and rounds it to cents.
pub fn normalize_income(income: Decimal) -> Decimal {
    round_half_up(max(income, Decimal::ZERO))
}

/// A generated table together with its ceiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GarnishmentTable {
    ceiling: Decimal,
    rows: Vec<GarnishmentRow>,
}

impl GarnishmentTable {
    pub fn new(
        ceiling: Decimal,
        rows: Vec<GarnishmentRow>,
    ) -> Self {
        Self { ceiling, rows }
    }

    /// Generates the table for `anchors`; the ceiling is `anchors.end_income`.
    pub fn generate(
        generator: &TableGenerator,
        anchors: &AnchorSet,
    ) -> Self {
        Self::new(anchors.end_income, generator.generate(anchors))
    }

    pub fn ceiling(&self) -> Decimal {
        self.ceiling
    }

    pub fn rows(&self) -> &[GarnishmentRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<GarnishmentRow> {
        self.rows
    }

    pub fn lookup(
        &self,
        income: Decimal,
        dependents: DependentCount,
    ) -> LookupOutcome {
        let income = normalize_income(income);
        if income > self.ceiling {
            return LookupOutcome::FullyGarnishable;
        }
        classify(self.rows.iter().find(|row| row.contains(income)), dependents)
    }
}

/// Looks `income` up in the stored table.
///
/// The ceiling comes from the latest recorded refresh; without one the
/// statutory default ceiling applies.
pub async fn lookup_garnishable(
    repo: &dyn GarnishmentRepository,
    income: Decimal,
    dependents: DependentCount,
) -> Result<LookupOutcome, RepositoryError> {
    let income = normalize_income(income);
    let ceiling = match repo.latest_refresh().await? {
        Some(refresh) => refresh.end_income,
        None => AnchorSet::default().end_income,
    };
    if income > ceiling {
        debug!(%income, %ceiling, "income above ceiling");
        return Ok(LookupOutcome::FullyGarnishable);
    }

    let row = repo.find_row(income).await?;
    Ok(classify(row.as_ref(), dependents))
}

fn classify(
    row: Option<&GarnishmentRow>,
    dependents: DependentCount,
) -> LookupOutcome {
    match row {
        Some(row) => LookupOutcome::Garnishable(row.amount_for(dependents)),
        None => LookupOutcome::Exempt,
    }
}
