//! Garnishment table generation (§ 850c ZPO).
//!
//! The published garnishment table is a multi-page list of 10 € income bands
//! with one garnishable amount per dependent count. Every column is linear
//! once it becomes active: starting from an anchor amount at the column's
//! start income, the amount grows by a fixed rate per band. This module
//! derives the full table from those anchors instead of transcribing it.
//!
//! # Algorithm
//!
//! | Step | Description |
//! |------|-------------|
//! | 1 | `income_min` runs from `start_income` while `income_min <= end_income`, advancing by `step` |
//! | 2 | `income_max = income_min + step - 0.01`; the last band may overshoot `end_income` |
//! | 3 | Column `d` is `0.00` while `income_min` is below its start income |
//! | 4 | Otherwise `start_amount[d] + n * rate[d]`, `n` = whole steps from the column's start income to `income_min` |
//! | 5 | Amounts are rounded half-up to cents |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use pfand_core::calculations::TableGenerator;
//! use pfand_core::AnchorSet;
//!
//! let rows = TableGenerator::default().generate(&AnchorSet::default());
//!
//! assert_eq!(rows.len(), 321);
//! assert_eq!(rows[0].income_min, dec!(1560.00));
//! assert_eq!(rows[0].income_max, dec!(1569.99));
//! assert_eq!(rows[0].amounts[0], dec!(3.50));
//! assert_eq!(rows[60].amounts[1], dec!(9.89));
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal::prelude::ToPrimitive;
use tracing::debug;

use crate::calculations::common::round_half_up;
use crate::{AnchorSet, DEPENDENT_COLUMNS, GarnishmentRow, GarnishmentSchedule, ScheduleError};

/// Generates garnishment tables for a fixed [`GarnishmentSchedule`].
#[derive(Debug, Clone, Default)]
pub struct TableGenerator {
    schedule: GarnishmentSchedule,
}

impl TableGenerator {
    /// Creates a generator for `schedule`.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError`] if the schedule fails
    /// [`GarnishmentSchedule::validate`].
    pub fn new(schedule: GarnishmentSchedule) -> Result<Self, ScheduleError> {
        schedule.validate()?;
        Ok(Self { schedule })
    }

    pub fn schedule(&self) -> &GarnishmentSchedule {
        &self.schedule
    }

    /// Number of rows [`generate`](Self::generate) produces for `anchors`.
    pub fn row_count(
        &self,
        anchors: &AnchorSet,
    ) -> usize {
        if anchors.end_income < anchors.start_income {
            return 0;
        }
        let span = (anchors.end_income - anchors.start_income) / self.schedule.step;
        span.floor().to_usize().map_or(0, |steps| steps + 1)
    }

    /// Generates the full table for `anchors`.
    ///
    /// Returns an empty vector when `end_income < start_income`.
    pub fn generate(
        &self,
        anchors: &AnchorSet,
    ) -> Vec<GarnishmentRow> {
        let step = self.schedule.step;
        let band_width = self.schedule.band_width();
        let rates = &self.schedule.accrual_rates;

        let mut rows = Vec::with_capacity(self.row_count(anchors));
        // Whole steps between each column's start income and the current band.
        let mut steps: [Option<Decimal>; DEPENDENT_COLUMNS] = [None; DEPENDENT_COLUMNS];
        let mut income_min = anchors.start_income;

        while income_min <= anchors.end_income {
            let mut amounts = [Decimal::ZERO; DEPENDENT_COLUMNS];

            for (d, amount) in amounts.iter_mut().enumerate() {
                let threshold = anchors.start_income_by_dependents[d];
                if income_min < threshold {
                    continue;
                }
                let n = match steps[d] {
                    Some(n) => n + Decimal::ONE,
                    None => whole_steps(income_min - threshold, step),
                };
                steps[d] = Some(n);
                *amount = round_half_up(anchors.start_amount_by_dependents[d] + n * rates[d]);
            }

            rows.push(GarnishmentRow {
                income_min,
                income_max: income_min + band_width,
                amounts,
            });
            income_min += step;
        }

        debug!(
            rows = rows.len(),
            start = %anchors.start_income,
            end = %anchors.end_income,
            "generated garnishment table"
        );
        rows
    }
}

/// `distance / step` rounded to the nearest whole step.
fn whole_steps(
    distance: Decimal,
    step: Decimal,
) -> Decimal {
    (distance / step).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}
