//! Configuration loading and management
//!
//! [`AppConfig`] is read from YAML (every field has a default), then
//! selected values are overridden from the environment.

use crate::core::error::{ConfigError, EstateResult};
use crate::core::filter::FilterParseMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Page size used when an entity has no configured default
pub const FALLBACK_PAGE_LIMIT: u64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    InMemory,
    Mongodb,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in_memory" | "memory" => Ok(StorageBackend::InMemory),
            "mongodb" | "mongo" => Ok(StorageBackend::Mongodb),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub uri: String,
    pub database: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::InMemory,
            uri: "mongodb://localhost:27017".to_string(),
            database: "estate".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Root of the local file store (`documents/`, `uploads/` live below)
    pub root: PathBuf,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("public"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub max_limit: u64,
    pub filter_mode: FilterParseMode,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            max_limit: 100,
            filter_mode: FilterParseMode::Lenient,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub store_ms: u64,
    pub render_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            store_ms: 5_000,
            render_ms: 30_000,
        }
    }
}

impl TimeoutConfig {
    pub fn store(&self) -> Duration {
        Duration::from_millis(self.store_ms)
    }

    pub fn render(&self) -> Duration {
        Duration::from_millis(self.render_ms)
    }
}

/// Configuration for an entity type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityConfig {
    /// Singular form (e.g., "property")
    pub singular: String,

    /// Plural form, also the route segment (e.g., "properties")
    pub plural: String,

    /// Page size when the request gives none
    #[serde(default = "fallback_limit")]
    pub default_limit: u64,
}

fn fallback_limit() -> u64 {
    FALLBACK_PAGE_LIMIT
}

impl EntityConfig {
    fn new(singular: &str, plural: &str, default_limit: u64) -> Self {
        Self {
            singular: singular.to_string(),
            plural: plural.to_string(),
            default_limit,
        }
    }
}

fn default_entities() -> Vec<EntityConfig> {
    vec![
        EntityConfig::new("property", "properties", 12),
        EntityConfig::new("team_member", "team-members", 10),
        EntityConfig::new("query", "queries", 10),
        EntityConfig::new("user", "users", 10),
        EntityConfig::new("blog", "blogs", 10),
        EntityConfig::new("annexure", "annexures", 10),
    ]
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub files: FilesConfig,
    pub pagination: PaginationConfig,
    pub timeouts: TimeoutConfig,
    pub entities: Vec<EntityConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            files: FilesConfig::default(),
            pagination: PaginationConfig::default(),
            timeouts: TimeoutConfig::default(),
            entities: default_entities(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> EstateResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            message: format!("{}: {}", path, e),
        })?;
        serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                file: Some(path.to_string()),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> EstateResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// File (if given) or defaults, then process environment overrides
    pub fn load(path: Option<&str>) -> EstateResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from `lookup` (`HOST`, `PORT`, `ESTATE_STORAGE`,
    /// `MONGODB_URI`, `MONGODB_DATABASE`, `ESTATE_FILES_ROOT`,
    /// `ESTATE_FILTER_MODE`)
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> EstateResult<()> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|e: std::num::ParseIntError| invalid("PORT", &port, e))?;
        }
        if let Some(backend) = get("ESTATE_STORAGE") {
            self.storage.backend = backend.parse().map_err(|e: String| invalid("ESTATE_STORAGE", &backend, e))?;
        }
        if let Some(uri) = get("MONGODB_URI") {
            self.storage.uri = uri;
        }
        if let Some(database) = get("MONGODB_DATABASE") {
            self.storage.database = database;
        }
        if let Some(root) = get("ESTATE_FILES_ROOT") {
            self.files.root = PathBuf::from(root);
        }
        if let Some(mode) = get("ESTATE_FILTER_MODE") {
            self.pagination.filter_mode = mode.parse().map_err(|e: String| invalid("ESTATE_FILTER_MODE", &mode, e))?;
        }
        Ok(())
    }

    /// Default page size for an entity, by plural name
    pub fn default_limit_for(&self, plural: &str) -> u64 {
        self.entities
            .iter()
            .find(|e| e.plural == plural)
            .map(|e| e.default_limit.max(1))
            .unwrap_or(FALLBACK_PAGE_LIMIT)
    }

    /// `host:port`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn invalid(field: &str, value: &str, message: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        message: message.to_string(),
    }
}
