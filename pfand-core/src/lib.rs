pub mod calculations;
pub mod db;
pub mod models;

pub use db::repository::{GarnishmentRepository, RepositoryError};
pub use models::*;
