use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::dependent_count::{DEPENDENT_COLUMNS, DependentCount};

/// Complete, validated input to table generation.
///
/// `Default` yields the statutory anchors of the table in force since
/// 1 July 2025.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorSet {
    /// First income at which anything is garnishable (0 dependents).
    pub start_income: Decimal,

    /// Income ceiling. Net income above this is garnishable in full.
    pub end_income: Decimal,

    /// Income at which each dependent-count column starts accruing.
    pub start_income_by_dependents: [Decimal; DEPENDENT_COLUMNS],

    /// Garnishable amount exactly at each column's start income.
    pub start_amount_by_dependents: [Decimal; DEPENDENT_COLUMNS],
}

impl AnchorSet {
    pub fn start_income_for(&self, dependents: DependentCount) -> Decimal {
        self.start_income_by_dependents[dependents.index()]
    }

    pub fn start_amount_for(&self, dependents: DependentCount) -> Decimal {
        self.start_amount_by_dependents[dependents.index()]
    }
}

impl Default for AnchorSet {
    fn default() -> Self {
        Self {
            start_income: dec!(1560.00),
            end_income: dec!(4766.99),
            start_income_by_dependents: [
                dec!(1560.00),
                dec!(2150.00),
                dec!(2470.00),
                dec!(2800.00),
                dec!(3120.00),
                dec!(3450.00),
            ],
            start_amount_by_dependents: [
                dec!(3.50),
                dec!(4.89),
                dec!(1.49),
                dec!(2.31),
                dec!(0.33),
                dec!(0.56),
            ],
        }
    }
}

/// Best-effort anchors as supplied by an upstream source.
///
/// Every field is optional; [`AnchorResolver`](crate::calculations::AnchorResolver)
/// fills the gaps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawAnchors {
    pub start_income: Option<Decimal>,
    pub end_income: Option<Decimal>,
    pub start_income_by_dependents: [Option<Decimal>; DEPENDENT_COLUMNS],
    pub start_amount_by_dependents: [Option<Decimal>; DEPENDENT_COLUMNS],
}

impl RawAnchors {
    pub fn is_empty(&self) -> bool {
        self.start_income.is_none()
            && self.end_income.is_none()
            && self.start_income_by_dependents.iter().all(Option::is_none)
            && self.start_amount_by_dependents.iter().all(Option::is_none)
    }

    /// Stores `value` under `key`, replacing any earlier value.
    pub fn set(
        &mut self,
        key: AnchorKey,
        value: Decimal,
    ) {
        match key {
            AnchorKey::StartIncome => self.start_income = Some(value),
            AnchorKey::EndIncome => self.end_income = Some(value),
            AnchorKey::StartIncomeFor(d) => self.start_income_by_dependents[d.index()] = Some(value),
            AnchorKey::StartAmountFor(d) => self.start_amount_by_dependents[d.index()] = Some(value),
        }
    }
}

/// Addressable field of [`RawAnchors`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorKey {
    StartIncome,
    EndIncome,
    StartIncomeFor(DependentCount),
    StartAmountFor(DependentCount),
}

impl AnchorKey {
    /// Parses a key name.
    ///
    /// Canonical names are `start_income`, `end_income`, `start_income_<d>`
    /// and `start_amount_<d>`. The legacy names `start_pfand_<d>`,
    /// `start_1_dependent` and `start_<d>_dependents` are accepted as well.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        match s {
            "start_income" => return Some(Self::StartIncome),
            "end_income" => return Some(Self::EndIncome),
            "start_1_dependent" => return DependentCount::new(1).map(Self::StartIncomeFor),
            _ => {}
        }

        if let Some(d) = s.strip_prefix("start_income_") {
            return parse_column(d).map(Self::StartIncomeFor);
        }
        if let Some(d) = s
            .strip_prefix("start_amount_")
            .or_else(|| s.strip_prefix("start_pfand_"))
        {
            return parse_column(d).map(Self::StartAmountFor);
        }
        s.strip_prefix("start_")
            .and_then(|rest| rest.strip_suffix("_dependents"))
            .and_then(parse_column)
            .filter(|d| d.get() >= 2)
            .map(Self::StartIncomeFor)
    }

    pub fn name(&self) -> String {
        match self {
            Self::StartIncome => "start_income".to_string(),
            Self::EndIncome => "end_income".to_string(),
            Self::StartIncomeFor(d) => format!("start_income_{}", d.get()),
            Self::StartAmountFor(d) => format!("start_amount_{}", d.get()),
        }
    }
}

fn parse_column(s: &str) -> Option<DependentCount> {
    s.parse::<u8>().ok().and_then(DependentCount::new)
}
