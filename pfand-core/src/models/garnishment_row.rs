use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::dependent_count::{DEPENDENT_COLUMNS, DependentCount};

/// One income band of the garnishment table.
///
/// Persisted as `income_min`, `income_max`, `pfand_0` .. `pfand_5`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GarnishmentRow {
    pub income_min: Decimal,
    pub income_max: Decimal,

    /// Garnishable amount per dependent count, rounded to cents.
    pub amounts: [Decimal; DEPENDENT_COLUMNS],
}

impl GarnishmentRow {
    pub fn amount_for(&self, dependents: DependentCount) -> Decimal {
        self.amounts[dependents.index()]
    }

    /// Inclusive on both ends, matching `income_min <= x <= income_max`.
    pub fn contains(&self, income: Decimal) -> bool {
        self.income_min <= income && income <= self.income_max
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn row() -> GarnishmentRow {
        GarnishmentRow {
            income_min: dec!(2150.00),
            income_max: dec!(2159.99),
            amounts: [
                dec!(416.50),
                dec!(4.89),
                dec!(0),
                dec!(0),
                dec!(0),
                dec!(0),
            ],
        }
    }

    #[test]
    fn contains_includes_both_bounds() {
        let row = row();

        assert!(row.contains(dec!(2150.00)));
        assert!(row.contains(dec!(2159.99)));
        assert!(!row.contains(dec!(2160.00)));
        assert!(!row.contains(dec!(2149.99)));
    }

    #[test]
    fn amount_for_reads_the_dependent_column() {
        let row = row();

        assert_eq!(row.amount_for(DependentCount::clamped(1)), dec!(4.89));
        assert_eq!(row.amount_for(DependentCount::clamped(7)), dec!(0));
    }
}
