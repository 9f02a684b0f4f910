use crate::core::lock::DEFAULT_LOCK_WAIT;
use crate::domain::ports::{ConfigProvider, StoreSettings};
use crate::utils::error::{IngestError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const DEFAULT_REMOTE_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub table: TableConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            path: "/".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub name: String,
    pub lock_wait_ms: u64,
    pub strict_lock: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: "Sheet1".to_string(),
            lock_wait_ms: DEFAULT_LOCK_WAIT.as_millis() as u64,
            strict_lock: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    Csv {
        directory: String,
    },
    Remote {
        endpoint: String,
        token: Option<String>,
        timeout_seconds: Option<u64>,
    },
    Memory {
        #[serde(default)]
        header: Vec<String>,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Csv {
            directory: "./data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub verbose: bool,
    pub json: bool,
}

impl TomlConfig {
    /// Loads and parses a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(IngestError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parses TOML text after substituting `${VAR}` placeholders.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| IngestError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value. Unset variables are left
    /// as written and rejected later by validation.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| IngestError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn bind_addr(&self) -> &str {
        &self.server.bind_addr
    }

    pub fn route_path(&self) -> &str {
        &self.server.path
    }

    pub fn verbose(&self) -> bool {
        self.logging.verbose
    }

    pub fn log_json(&self) -> bool {
        self.logging.json
    }
}

fn reject_placeholder(field: &str, value: &str) -> Result<()> {
    if value.contains("${") {
        return Err(IngestError::ConfigValidationError {
            field: field.to_string(),
            message: format!("unresolved environment variable in '{}'", value),
        });
    }
    Ok(())
}

impl ConfigProvider for TomlConfig {
    fn table_name(&self) -> &str {
        &self.table.name
    }

    fn lock_wait(&self) -> Duration {
        Duration::from_millis(self.table.lock_wait_ms)
    }

    fn strict_lock(&self) -> bool {
        self.table.strict_lock
    }

    fn store(&self) -> StoreSettings {
        match &self.store {
            StoreConfig::Csv { directory } => StoreSettings::Csv {
                directory: directory.clone(),
            },
            StoreConfig::Remote {
                endpoint,
                token,
                timeout_seconds,
            } => StoreSettings::Remote {
                endpoint: endpoint.clone(),
                token: token.clone(),
                timeout: Duration::from_secs(
                    timeout_seconds.unwrap_or(DEFAULT_REMOTE_TIMEOUT_SECONDS),
                ),
            },
            StoreConfig::Memory { header } => StoreSettings::Memory {
                header: header.clone(),
            },
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_bind_addr("server.bind_addr", &self.server.bind_addr)?;
        validation::validate_route_path("server.path", &self.server.path)?;

        validation::validate_table_name("table.name", &self.table.name)?;
        validation::validate_range("table.lock_wait_ms", self.table.lock_wait_ms, 0, 600_000)?;

        match &self.store {
            StoreConfig::Csv { directory } => {
                validation::validate_path("store.directory", directory)?;
            }
            StoreConfig::Remote {
                endpoint,
                token,
                timeout_seconds,
            } => {
                reject_placeholder("store.endpoint", endpoint)?;
                validation::validate_url("store.endpoint", endpoint)?;
                if let Some(token) = token {
                    reject_placeholder("store.token", token)?;
                    validation::validate_non_empty_string("store.token", token)?;
                }
                if let Some(timeout) = timeout_seconds {
                    validation::validate_range("store.timeout_seconds", *timeout, 1, 300)?;
                }
            }
            StoreConfig::Memory { header } => {
                if header.first().map_or(true, |name| name.is_empty()) {
                    return Err(IngestError::ConfigValidationError {
                        field: "store.header".to_string(),
                        message: "memory store needs a header whose first column is named"
                            .to_string(),
                    });
                }
            }
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }
}
