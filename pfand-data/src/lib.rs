pub mod loader;
pub mod refresh;

pub use loader::{AnchorFileError, AnchorFileLoader, AnchorRecord};
pub use refresh::{RefreshError, TableRefresher};
