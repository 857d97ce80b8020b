pub mod anchors;
pub mod common;
pub mod lookup;
pub mod table;

pub use anchors::{AnchorResolver, resolve};
pub use lookup::{GarnishmentTable, LookupOutcome, lookup_garnishable, normalize_income};
pub use table::TableGenerator;
