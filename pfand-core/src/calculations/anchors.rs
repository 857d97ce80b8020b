//! Anchor resolution: turns best-effort anchors into a complete [`AnchorSet`].
//!
//! Upstream sources (a scraped document, a config file) rarely deliver every
//! anchor. Resolution never fails; it overlays whatever is present onto a
//! complete default record:
//!
//! | Input state | Result |
//! |-------------|--------|
//! | `start_income` or `end_income` missing | default anchor set |
//! | `start_income <= 0` or `end_income < start_income` | default anchor set |
//! | per-dependent value missing or negative | default value for that field |
//! | column-0 start income missing | resolved `start_income` |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use pfand_core::calculations::AnchorResolver;
//! use pfand_core::{AnchorSet, RawAnchors};
//!
//! let resolver = AnchorResolver::default();
//!
//! assert_eq!(resolver.resolve(&RawAnchors::default()), AnchorSet::default());
//!
//! let mut raw = RawAnchors::default();
//! raw.start_income = Some(dec!(1560.00));
//! raw.end_income = Some(dec!(4766.99));
//! raw.start_amount_by_dependents[0] = Some(dec!(3.60));
//!
//! let anchors = resolver.resolve(&raw);
//! assert_eq!(anchors.start_amount_by_dependents[0], dec!(3.60));
//! assert_eq!(anchors.start_amount_by_dependents[1], dec!(4.89));
//! ```

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::{AnchorSet, DEPENDENT_COLUMNS, RawAnchors};

/// Merges partial anchors over a complete default [`AnchorSet`].
#[derive(Debug, Clone, Default)]
pub struct AnchorResolver {
    defaults: AnchorSet,
}

impl AnchorResolver {
    /// Creates a resolver that falls back to `defaults` instead of the
    /// statutory anchors.
    pub fn new(defaults: AnchorSet) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &AnchorSet {
        &self.defaults
    }

    /// Resolves `raw` into a complete anchor set. Never fails.
    pub fn resolve(
        &self,
        raw: &RawAnchors,
    ) -> AnchorSet {
        if raw.is_empty() {
            debug!("no anchors supplied, using defaults");
            return self.defaults.clone();
        }

        let (start_income, end_income) = match (raw.start_income, raw.end_income) {
            (Some(start), Some(end)) if start > Decimal::ZERO && end >= start => (start, end),
            (start, end) => {
                warn!(
                    ?start,
                    ?end,
                    "incomplete or invalid income range, using default anchors"
                );
                return self.defaults.clone();
            }
        };

        let mut start_income_by_dependents = self.defaults.start_income_by_dependents;
        start_income_by_dependents[0] = start_income;
        let mut start_amount_by_dependents = self.defaults.start_amount_by_dependents;

        for d in 0..DEPENDENT_COLUMNS {
            start_income_by_dependents[d] =
                overlay(start_income_by_dependents[d], raw.start_income_by_dependents[d]);
            start_amount_by_dependents[d] =
                overlay(start_amount_by_dependents[d], raw.start_amount_by_dependents[d]);
        }

        AnchorSet {
            start_income,
            end_income,
            start_income_by_dependents,
            start_amount_by_dependents,
        }
    }
}

/// Resolves `raw` against the statutory default anchors.
pub fn resolve(raw: &RawAnchors) -> AnchorSet {
    AnchorResolver::default().resolve(raw)
}

fn overlay(
    fallback: Decimal,
    value: Option<Decimal>,
) -> Decimal {
    match value {
        Some(v) if v >= Decimal::ZERO => v,
        Some(v) => {
            warn!(value = %v, %fallback, "negative anchor ignored");
            fallback
        }
        None => fallback,
    }
}
