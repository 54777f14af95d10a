use std::{env, net::SocketAddr, path::PathBuf};

use crate::error::{AppError, AppResult};

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_STATIC_DIR: &str = "static";

// Key under which the whole schedule document is stored.
pub const STATE_KEY: &str = "schedule_state";

// Key for the daily to-do list, stored apart from the schedule.
pub const TASKS_KEY: &str = "daily_tasks";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub addr: SocketAddr,
    pub static_dir: PathBuf,
}

impl AppConfig {
    /// Read configuration from `TRACKER_*` environment variables,
    /// falling back to the local defaults.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = lookup("TRACKER_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
        let static_dir =
            lookup("TRACKER_STATIC_DIR").unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string());
        let raw_addr = lookup("TRACKER_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());

        let addr: SocketAddr = raw_addr
            .parse()
            .map_err(|err| AppError::Config(format!("invalid TRACKER_ADDR {raw_addr:?}: {err}")))?;

        Ok(Self {
            data_dir: PathBuf::from(data_dir),
            addr,
            static_dir: PathBuf::from(static_dir),
        })
    }
}
