//! SQLite-backed sentiment history and prediction accuracy tracking.

pub mod db;
pub mod models;
pub mod predictions;
pub mod sentiment;

pub use db::HistoryDb;
pub use models::*;
pub use predictions::evaluate_outcome;
