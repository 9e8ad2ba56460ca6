use std::env;
use std::time::Duration;

use crate::constants::HEALTH_PROBE_TIMEOUT_MS;

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_path: String,
    pub allowed_origins: Vec<String>,
    pub environment: String,
    /// Try the primary (redb) store at all; `false` starts in fallback mode
    pub remote_backend_enabled: bool,
    /// Seconds before a tripped primary gets a trial request.
    /// `None` keeps the failover sticky until restart.
    pub failover_retry_secs: Option<u64>,
    pub log_requests: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| "Invalid SERVER_PORT")?;

        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/saved_posts.db".to_string());

        let allowed_origins = parse_origins(
            &env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".to_string()),
        )?;

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let remote_backend_enabled = parse_flag(env::var("USE_REMOTE_BACKEND").ok(), true)
            .ok_or("Invalid USE_REMOTE_BACKEND")?;

        let failover_retry_secs = match env::var("FAILOVER_RETRY_SECS") {
            Ok(raw) if !raw.trim().is_empty() => Some(
                raw.trim()
                    .parse()
                    .map_err(|_| "Invalid FAILOVER_RETRY_SECS")?,
            ),
            _ => None,
        };

        let log_requests =
            parse_flag(env::var("LOG_REQUESTS").ok(), true).ok_or("Invalid LOG_REQUESTS")?;

        Ok(Config {
            server_host,
            server_port,
            database_path,
            allowed_origins,
            environment,
            remote_backend_enabled,
            failover_retry_secs,
            log_requests,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn failover_retry_after(&self) -> Option<Duration> {
        self.failover_retry_secs.map(Duration::from_secs)
    }
}

/// Configuration of the client-side saved-post state manager
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub health_probe_timeout_ms: u64,
    pub cache_dir: String,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let api_base_url = env::var("API_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8080".to_string())
            .trim_end_matches('/')
            .to_string();

        let health_probe_timeout_ms = env::var("HEALTH_PROBE_TIMEOUT_MS")
            .unwrap_or_else(|_| HEALTH_PROBE_TIMEOUT_MS.to_string())
            .parse()
            .map_err(|_| "Invalid HEALTH_PROBE_TIMEOUT_MS")?;

        let cache_dir = env::var("LOCAL_CACHE_DIR").unwrap_or_else(|_| "./data/cache".to_string());

        Ok(ClientConfig {
            api_base_url,
            health_probe_timeout_ms,
            cache_dir,
        })
    }

    pub fn health_probe_timeout(&self) -> Duration {
        Duration::from_millis(self.health_probe_timeout_ms)
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Explicit origins only: CORS with credentials cannot use a wildcard
fn parse_origins(raw: &str) -> Result<Vec<String>, String> {
    let origins = parse_list(raw);
    if origins.iter().any(|origin| origin.contains('*')) {
        return Err("ALLOWED_ORIGINS must list explicit origins, '*' is not allowed".to_string());
    }
    Ok(origins)
}

/// Parse a boolean flag, falling back to `default` when unset
fn parse_flag(raw: Option<String>, default: bool) -> Option<bool> {
    let Some(raw) = raw else {
        return Some(default);
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "" => Some(default),
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
