//! Runtime configuration resolved from environment variables.
//!
//! Blank values count as unset. Values that do not parse fall back to the
//! default instead of failing startup.

use crate::list::DEFAULT_PAGE_SIZE;
use crate::logging::{default_log_level, LogLevel};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "HRM_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "HRM_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "HRM_LOG_DIR";
pub const PAGE_SIZE_ENV: &str = "HRM_PAGE_SIZE";

pub const MAX_PAGE_SIZE: usize = 100;
const DEFAULT_DB_FILE: &str = "hrm.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_level: LogLevel,
    /// File logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    /// Rows per list page, within `1..=MAX_PAGE_SIZE`.
    pub page_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE),
            log_level: default_log_level(),
            log_dir: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl AppConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves from an explicit key/value map (variable names as keys).
    #[must_use]
    pub fn from_map(values: &BTreeMap<String, String>) -> Self {
        Self::from_lookup(|key| values.get(key).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };
        let defaults = Self::default();

        Self {
            db_path: value(DB_PATH_ENV).map_or(defaults.db_path, PathBuf::from),
            log_level: value(LOG_LEVEL_ENV)
                .and_then(|raw| LogLevel::parse(&raw))
                .unwrap_or(defaults.log_level),
            log_dir: value(LOG_DIR_ENV).map(PathBuf::from),
            page_size: value(PAGE_SIZE_ENV)
                .and_then(|raw| raw.parse::<usize>().ok())
                .map_or(defaults.page_size, clamp_page_size),
        }
    }
}

pub fn clamp_page_size(value: usize) -> usize {
    value.clamp(1, MAX_PAGE_SIZE)
}
