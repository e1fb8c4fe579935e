pub mod analytics;
pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod table;
pub mod telemetry;

pub use config::Config;
pub use error::{AppError, AppResult};
