//! Configuration types for result-export

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, path::PathBuf};

/// Project setting key holding the export page size
pub const SETTINGS_EXPORT_PAGE_SIZE: &str = "export_page_size";

/// Main configuration for the export service
///
/// Fields are organized into sub-configs:
/// - [`persistence`](PersistenceConfig) - database location
/// - [`export`](ExportConfig) - scratch directory, paging and compression
/// - [`server`](ServerIntegrationConfig) - REST API settings
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data storage settings
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Export pipeline settings
    #[serde(default)]
    pub export: ExportConfig,

    /// API and external server integration
    #[serde(default)]
    pub server: ServerIntegrationConfig,
}

impl Config {
    /// Load configuration from a JSON file
    ///
    /// Missing keys fall back to their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&raw).map_err(|e| Error::Config {
            message: format!("failed to parse {}: {}", path.display(), e),
            key: None,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde defaults cannot express
    pub fn validate(&self) -> Result<()> {
        if self.export.default_page_size == 0 {
            return Err(Error::Config {
                message: "default_page_size must be at least 1".to_string(),
                key: Some("export.default_page_size".to_string()),
            });
        }
        if self.export.max_page_size < self.export.default_page_size {
            return Err(Error::Config {
                message: "max_page_size must not be smaller than default_page_size".to_string(),
                key: Some("export.max_page_size".to_string()),
            });
        }
        if self.export.compression_level > 9 {
            return Err(Error::Config {
                message: "compression_level must be between 0 and 9".to_string(),
                key: Some("export.compression_level".to_string()),
            });
        }
        Ok(())
    }
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Database path (default: "./result-export.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// Export pipeline configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory that holds per-export scratch directories (default: system temp dir)
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Page size used when the project has no `export_page_size` setting (default: 1000)
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,

    /// Upper bound applied to project-configured page sizes (default: 50000)
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,

    /// Gzip compression level, 0-9 (default: 6)
    #[serde(default = "default_compression_level")]
    pub compression_level: u32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            compression_level: default_compression_level(),
        }
    }
}

impl ExportConfig {
    /// Resolve the effective page size from a project-configured value
    ///
    /// Non-positive values fall back to the default; large values are capped.
    pub fn effective_page_size(&self, configured: i64) -> usize {
        if configured <= 0 {
            return self.default_page_size;
        }
        usize::try_from(configured)
            .unwrap_or(self.max_page_size)
            .min(self.max_page_size)
    }
}

/// API and external server integration configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServerIntegrationConfig {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:6790)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from("result-export.db")
}
fn default_temp_dir() -> PathBuf {
    std::env::temp_dir()
}
fn default_page_size() -> usize {
    1000
}
fn default_max_page_size() -> usize {
    50_000
}
fn default_compression_level() -> u32 {
    6
}
fn default_true() -> bool {
    true
}
fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 6790))
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}
