pub mod analytics;
pub mod charts;
pub mod config;
pub mod data;
pub mod error;
pub mod model;
pub mod pages;
pub mod prediction;
pub mod preprocess;
pub mod server;

pub use config::AppConfig;
pub use error::{DashboardError, Result};
pub use server::{start_server, AppState};
