//! Configuration Module
//!
//! Runtime configuration read from environment variables, with defaults
//! suitable for local development.

use std::env;
use std::path::PathBuf;

// == Configuration ==
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP server listens on
    pub server_port: u16,
    /// Backing file for the last-request store
    pub last_request_file: PathBuf,
    /// Retention for stored requests, in days
    pub last_request_ttl_days: i64,
    /// Seconds between background cleanup sweeps
    pub cleanup_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8080,
            last_request_file: PathBuf::from("last_requests.json"),
            last_request_ttl_days: 30,
            cleanup_interval_secs: 300,
        }
    }
}

impl Config {
    // == Environment Loading ==
    /// Builds the configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            last_request_file: env::var("LAST_REQUEST_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.last_request_file),
            last_request_ttl_days: env::var("LAST_REQUEST_TTL_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.last_request_ttl_days),
            cleanup_interval_secs: env::var("CLEANUP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cleanup_interval_secs),
        }
    }
}
