use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,             // 0.0.0.0:3000
    pub tables_path: Option<PathBuf>,      // JSON rate table override
    pub structures_path: Option<PathBuf>,  // JSON structure catalogue override
    pub cache_capacity: usize,             // 100, 0 disables
    pub json_logging: bool,                // RUST_LOG_FORMAT=json
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let bind = env::var("TAX_API_BIND").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let config = Self {
            bind_addr: bind
                .parse()
                .with_context(|| format!("TAX_API_BIND `{bind}` is not a socket address"))?,
            tables_path: env::var("TAX_TABLES_PATH").ok().map(PathBuf::from),
            structures_path: env::var("TAX_STRUCTURES_PATH").ok().map(PathBuf::from),
            cache_capacity: env::var("TAX_CACHE_CAPACITY")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .context("TAX_CACHE_CAPACITY must be a non-negative integer")?,
            json_logging: env::var("RUST_LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        };

        Ok(config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            tables_path: None,
            structures_path: None,
            cache_capacity: 100,
            json_logging: false,
        }
    }
}
