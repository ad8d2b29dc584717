pub mod alerts;
pub mod config;
pub mod logging;
pub mod models;
pub mod plugins;
pub mod reconciler;
pub mod runner;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use config::AppConfig;
pub use reconciler::{Reconciler, RunSummary};
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
