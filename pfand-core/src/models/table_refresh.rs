use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Record of one successful wholesale replacement of the stored table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRefresh {
    pub id: i64,
    pub row_count: i64,
    pub start_income: Decimal,

    /// Ceiling of the stored table; lookups above it are fully garnishable.
    pub end_income: Decimal,

    pub refreshed_at: DateTime<Utc>,
}
