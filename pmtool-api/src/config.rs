/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8000)
/// - `DATABASE_URL`: PostgreSQL connection string (optional; without it the
///   server keeps its data in memory)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `ORG_HEADER`: Request header naming the tenant (default: X-Org-Slug)
/// - `CORS_ALLOWED_ORIGINS`: Comma separated origins, `*` for any
/// - `LOG_FORMAT`: `json` for JSON log lines, anything else for plain text
/// - `RUST_LOG`: Log filter (default: pmtool_api=debug,pmtool_shared=debug,tower_http=debug)
///
/// # Example
///
/// ```no_run
/// use pmtool_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use pmtool_shared::tenant::DEFAULT_ORG_HEADER;
use serde::{Deserialize, Serialize};
use std::env;

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173,http://127.0.0.1:5173";

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration; `None` selects the in-memory store
    pub database: Option<DatabaseSettings>,

    /// Header carrying the organization slug
    pub org_header: String,

    /// Log output format
    pub log_format: LogFormat,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins (`*` allows any)
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Plain,
    Json,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable does not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = non_empty("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match non_empty("API_PORT") {
            Some(v) => v
                .trim()
                .parse::<u16>()
                .map_err(|e| anyhow::anyhow!("API_PORT must be a port number: {}", e))?,
            None => 8000,
        };

        let cors_origins = non_empty("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        let database = match non_empty("DATABASE_URL") {
            Some(url) => {
                let max_connections = match non_empty("DATABASE_MAX_CONNECTIONS") {
                    Some(v) => v.trim().parse::<u32>().map_err(|e| {
                        anyhow::anyhow!("DATABASE_MAX_CONNECTIONS must be a number: {}", e)
                    })?,
                    None => 10,
                };
                Some(DatabaseSettings {
                    url,
                    max_connections,
                })
            }
            None => None,
        };

        let org_header = non_empty("ORG_HEADER")
            .map(|h| h.trim().to_string())
            .unwrap_or_else(|| DEFAULT_ORG_HEADER.to_string());

        let log_format = match non_empty("LOG_FORMAT") {
            Some(v) if v.trim().eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Plain,
        };

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
            },
            database,
            org_header,
            log_format,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}
