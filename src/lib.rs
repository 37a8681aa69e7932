pub mod api;
pub mod comparison;
pub mod config;
pub mod error;
pub mod exposition;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod query;
pub mod scheduler;
pub mod store;

pub use error::{ComparisonError, Result};
