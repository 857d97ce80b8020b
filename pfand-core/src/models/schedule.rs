use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::dependent_count::DEPENDENT_COLUMNS;

/// Smallest currency unit; bands end one cent before the next one starts.
pub const CENT: Decimal = dec!(0.01);

/// Errors raised when a schedule cannot drive table generation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    /// The income step must be larger than one cent.
    #[error("income step must be greater than 0.01, got {0}")]
    InvalidStep(Decimal),

    /// Accrual rates are added once per step and must not shrink the amount.
    #[error("accrual rate for {dependents} dependents must be non-negative, got {rate}")]
    NegativeAccrualRate { dependents: usize, rate: Decimal },
}

/// Statutory constants of the garnishment table.
///
/// Per § 850c ZPO the table advances in 10 € income steps and the
/// garnishable amount grows per step by a fixed rate that depends on the
/// number of dependents.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use pfand_core::GarnishmentSchedule;
///
/// let schedule = GarnishmentSchedule::default();
///
/// assert_eq!(schedule.step, dec!(10.00));
/// assert_eq!(schedule.band_width(), dec!(9.99));
/// assert!(schedule.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GarnishmentSchedule {
    /// Width of one income step.
    pub step: Decimal,

    /// Increase of the garnishable amount per step, indexed by dependents.
    pub accrual_rates: [Decimal; DEPENDENT_COLUMNS],
}

impl Default for GarnishmentSchedule {
    fn default() -> Self {
        Self {
            step: dec!(10.00),
            accrual_rates: [
                dec!(7.00),
                dec!(5.00),
                dec!(4.00),
                dec!(3.00),
                dec!(2.00),
                dec!(1.00),
            ],
        }
    }
}

impl GarnishmentSchedule {
    /// Distance from `income_min` to `income_max` within one band.
    pub fn band_width(&self) -> Decimal {
        self.step - CENT
    }

    /// Validates the schedule values.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError`] if:
    /// - `step` is not greater than one cent
    /// - any accrual rate is negative
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.step <= CENT {
            return Err(ScheduleError::InvalidStep(self.step));
        }
        if let Some((dependents, rate)) = self
            .accrual_rates
            .iter()
            .enumerate()
            .find(|(_, rate)| **rate < Decimal::ZERO)
        {
            return Err(ScheduleError::NegativeAccrualRate {
                dependents,
                rate: *rate,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn default_schedule_is_statutory() {
        let schedule = GarnishmentSchedule::default();

        assert_eq!(schedule.step, dec!(10.00));
        assert_eq!(
            schedule.accrual_rates,
            [
                dec!(7.00),
                dec!(5.00),
                dec!(4.00),
                dec!(3.00),
                dec!(2.00),
                dec!(1.00)
            ]
        );
    }

    #[test]
    fn validate_rejects_zero_step() {
        let schedule = GarnishmentSchedule {
            step: dec!(0),
            ..GarnishmentSchedule::default()
        };

        assert_eq!(schedule.validate(), Err(ScheduleError::InvalidStep(dec!(0))));
    }

    #[test]
    fn validate_rejects_one_cent_step() {
        let schedule = GarnishmentSchedule {
            step: dec!(0.01),
            ..GarnishmentSchedule::default()
        };

        assert_eq!(
            schedule.validate(),
            Err(ScheduleError::InvalidStep(dec!(0.01)))
        );
    }

    #[test]
    fn validate_rejects_negative_rate() {
        let mut schedule = GarnishmentSchedule::default();
        schedule.accrual_rates[3] = dec!(-1.00);

        assert_eq!(
            schedule.validate(),
            Err(ScheduleError::NegativeAccrualRate {
                dependents: 3,
                rate: dec!(-1.00)
            })
        );
    }

    #[test]
    fn validate_accepts_zero_rate() {
        let mut schedule = GarnishmentSchedule::default();
        schedule.accrual_rates[5] = dec!(0.00);

        assert_eq!(schedule.validate(), Ok(()));
    }

    #[test]
    fn band_width_is_step_minus_one_cent() {
        let schedule = GarnishmentSchedule {
            step: dec!(25.00),
            ..GarnishmentSchedule::default()
        };

        assert_eq!(schedule.band_width(), dec!(24.99));
    }
}
