mod anchor_set;
mod dependent_count;
mod garnishment_row;
mod schedule;
mod table_refresh;

pub use anchor_set::{AnchorKey, AnchorSet, RawAnchors};
pub use dependent_count::{DEPENDENT_COLUMNS, DependentCount};
pub use garnishment_row::GarnishmentRow;
pub use schedule::{CENT, GarnishmentSchedule, ScheduleError};
pub use table_refresh::TableRefresh;
