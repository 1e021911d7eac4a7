//! Application settings and configuration

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerSettings,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseSettings,
    /// Upstream source configuration
    #[serde(default)]
    pub source: SourceSettings,
    /// Fetch pipeline behavior
    #[serde(default)]
    pub pipeline: PipelineSettings,
    /// In-process refresh scheduling
    #[serde(default)]
    pub scheduler: SchedulerSettings,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Bind address for the API
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:3001".to_string()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Database connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// PostgreSQL connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Pool acquire timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgresql://localhost/gold_tracker".into())
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    2
}

fn default_connect_timeout() -> u64 {
    30
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// Upstream source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSettings {
    /// Price page URL
    #[serde(default = "default_source_url")]
    pub url: String,
    /// User-Agent header sent with each fetch
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Request timeout in seconds
    #[serde(default = "default_source_timeout")]
    pub timeout_secs: u64,
}

fn default_source_url() -> String {
    "https://kimnganphuc.vn/gia-vang".to_string()
}

/// The site serves an error page to non-browser identities.
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}

fn default_source_timeout() -> u64 {
    10
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            url: default_source_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_source_timeout(),
        }
    }
}

/// Fetch pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Persist snapshots that extracted zero rows (as all-null records)
    #[serde(default)]
    pub save_empty_snapshot: bool,
    /// Cycle report cache TTL in seconds; 0 disables the cache
    #[serde(default)]
    pub cache_ttl_secs: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            save_empty_snapshot: false,
            cache_ttl_secs: 0,
        }
    }
}

/// In-process scheduler settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerSettings {
    /// Run the refresh loop inside the service
    #[serde(default)]
    pub enabled: bool,
    /// Seconds between scheduled fetch cycles
    #[serde(default = "default_refresh_interval")]
    pub interval_secs: u32,
}

fn default_refresh_interval() -> u32 {
    300
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: default_refresh_interval(),
        }
    }
}

impl Settings {
    /// Load settings from configuration files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_prefix("GOLD_TRACKER")
    }

    /// Load settings with a custom environment variable prefix
    pub fn load_with_prefix(env_prefix: &str) -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config_dir = Self::config_dir();

        let s = Config::builder()
            // Start with default configuration
            .add_source(File::with_name(&format!("{}/default", config_dir)).required(false))
            // Add environment-specific configuration
            .add_source(File::with_name(&format!("{}/{}", config_dir, run_mode)).required(false))
            // Add local overrides (not checked into git)
            .add_source(File::with_name(&format!("{}/local", config_dir)).required(false))
            // Add environment variables (e.g., GOLD_TRACKER__SOURCE__URL)
            .add_source(
                Environment::with_prefix(env_prefix)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }

    /// Get the configuration directory path
    fn config_dir() -> String {
        std::env::var("GOLD_TRACKER_CONFIG_DIR").unwrap_or_else(|_| "config".into())
    }

    /// Create default settings (useful for testing)
    pub fn default_settings() -> Self {
        Settings {
            server: ServerSettings::default(),
            database: DatabaseSettings::default(),
            source: SourceSettings::default(),
            pipeline: PipelineSettings::default(),
            scheduler: SchedulerSettings::default(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::default_settings()
    }
}

// =============================================================================
// Tests
// =============================================================================
