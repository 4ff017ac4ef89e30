use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{DashboardError, Result};

pub const DEFAULT_DATA_PATH: &str = "data/students.csv";

/// Runtime settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub test_size: f64,
    pub split_seed: u64,
    pub user_login: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            host: "127.0.0.1".to_string(),
            port: 8080,
            test_size: 0.2,
            split_seed: 42,
            user_login: "guest".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests need not touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            data_path: lookup("STUDENTS_CSV")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_path),
            host: lookup("DASHBOARD_HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "DASHBOARD_PORT", defaults.port)?,
            test_size: parse_var(&lookup, "TEST_SIZE", defaults.test_size)?,
            split_seed: parse_var(&lookup, "SPLIT_SEED", defaults.split_seed)?,
            user_login: lookup("DASHBOARD_USER").unwrap_or(defaults.user_login),
        };

        if !(config.test_size > 0.0 && config.test_size < 1.0) {
            return Err(DashboardError::InvalidConfig(format!(
                "TEST_SIZE must be between 0 and 1, got {}",
                config.test_size
            )));
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| {
            DashboardError::InvalidConfig(format!("{key} has unparseable value {raw:?}"))
        }),
        None => Ok(default),
    }
}
