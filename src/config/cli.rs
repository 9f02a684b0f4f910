use crate::config::toml_config::{StoreConfig, TomlConfig};
use crate::utils::error::Result;
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum StoreKind {
    Csv,
    Remote,
    Memory,
}

/// Command line flags. Anything given here overrides the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Parser)]
#[command(name = "row-ingest")]
#[command(about = "Append HTTP form submissions as rows of a table")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(long, help = "Address to listen on, e.g. 127.0.0.1:8080")]
    pub bind: Option<String>,

    #[arg(long, help = "Route that accepts submissions")]
    pub path: Option<String>,

    #[arg(long, help = "Name of the target table")]
    pub table: Option<String>,

    #[arg(long, value_enum)]
    pub store: Option<StoreKind>,

    #[arg(long, help = "Directory holding <table>.csv files")]
    pub data_dir: Option<String>,

    #[arg(long, help = "Base URL of the spreadsheet values API")]
    pub endpoint: Option<String>,

    #[arg(long, env = "STORE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[arg(
        long,
        value_delimiter = ',',
        help = "Header row of the in-memory table, e.g. timestamp,name,email"
    )]
    pub memory_header: Option<Vec<String>>,

    #[arg(long)]
    pub lock_wait_ms: Option<u64>,

    #[arg(long, help = "Reject submissions when the table lock cannot be taken")]
    pub strict_lock: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

impl CliConfig {
    /// Loads the TOML file (if any) and layers the flags on top.
    pub fn resolve(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };

        if let Some(bind) = &self.bind {
            config.server.bind_addr = bind.clone();
        }
        if let Some(path) = &self.path {
            config.server.path = path.clone();
        }
        if let Some(table) = &self.table {
            config.table.name = table.clone();
        }
        if let Some(wait) = self.lock_wait_ms {
            config.table.lock_wait_ms = wait;
        }
        if self.strict_lock {
            config.table.strict_lock = true;
        }
        if self.verbose {
            config.logging.verbose = true;
        }
        if self.log_json {
            config.logging.json = true;
        }

        config.store = self.resolve_store(config.store);
        Ok(config)
    }

    fn resolve_store(&self, current: StoreConfig) -> StoreConfig {
        let kind = self.store.unwrap_or(match current {
            StoreConfig::Csv { .. } => StoreKind::Csv,
            StoreConfig::Remote { .. } => StoreKind::Remote,
            StoreConfig::Memory { .. } => StoreKind::Memory,
        });

        match (kind, current) {
            (StoreKind::Csv, StoreConfig::Csv { directory }) => StoreConfig::Csv {
                directory: self.data_dir.clone().unwrap_or(directory),
            },
            (StoreKind::Csv, _) => StoreConfig::Csv {
                directory: self.data_dir.clone().unwrap_or_else(|| "./data".to_string()),
            },
            (
                StoreKind::Remote,
                StoreConfig::Remote {
                    endpoint,
                    token,
                    timeout_seconds,
                },
            ) => StoreConfig::Remote {
                endpoint: self.endpoint.clone().unwrap_or(endpoint),
                token: self.token.clone().or(token),
                timeout_seconds,
            },
            (StoreKind::Remote, _) => StoreConfig::Remote {
                endpoint: self.endpoint.clone().unwrap_or_default(),
                token: self.token.clone(),
                timeout_seconds: None,
            },
            (StoreKind::Memory, StoreConfig::Memory { header }) => StoreConfig::Memory {
                header: self.memory_header.clone().unwrap_or(header),
            },
            (StoreKind::Memory, _) => StoreConfig::Memory {
                header: self.memory_header.clone().unwrap_or_default(),
            },
        }
    }
}
