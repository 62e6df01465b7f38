use std::path::PathBuf;

use anyhow::{Context, Result};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_STORE_PATH: &str = ".rupeekit.json";

/// Runtime settings read from the environment (and `.env` when present).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub store_path: PathBuf,
    pub rust_log: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            rust_log: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let port = match lookup("RUPEEKIT_PORT") {
            Some(raw) => raw.trim().parse::<u16>().with_context(|| {
                format!("RUPEEKIT_PORT must be a valid port number, got '{raw}'")
            })?,
            None => defaults.port,
        };
        Ok(Self {
            port,
            store_path: lookup("RUPEEKIT_STORE_PATH")
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.store_path),
            rust_log: lookup("RUST_LOG").unwrap_or(defaults.rust_log),
        })
    }
}
