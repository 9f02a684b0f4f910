use crate::core::lock::DEFAULT_LOCK_WAIT;
use crate::domain::ports::{ConfigProvider, StoreSettings};
use crate::utils::error::{IngestError, Result};
use crate::utils::validation::{self, Validate};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LambdaConfig {
    pub table_name: String,
    pub store_endpoint: String,
    pub store_token: Option<String>,
    pub lock_wait_ms: u64,
    pub strict_lock: bool,
    pub timeout_seconds: u64,
}

impl LambdaConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`LambdaConfig::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            table_name: lookup("TABLE_NAME").unwrap_or_else(|| "Sheet1".to_string()),
            store_endpoint: lookup("STORE_ENDPOINT").ok_or_else(|| {
                IngestError::MissingConfigError {
                    field: "STORE_ENDPOINT".to_string(),
                }
            })?,
            store_token: lookup("STORE_TOKEN").filter(|token| !token.is_empty()),
            lock_wait_ms: parse_var(&lookup, "LOCK_WAIT_MS")?
                .unwrap_or(DEFAULT_LOCK_WAIT.as_millis() as u64),
            strict_lock: parse_var(&lookup, "STRICT_LOCK")?.unwrap_or(false),
            timeout_seconds: parse_var(&lookup, "STORE_TIMEOUT_SECONDS")?.unwrap_or(30),
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| IngestError::InvalidConfigValueError {
                field: key.to_string(),
                value: raw.clone(),
                reason: format!("{}", e),
            }),
    }
}

impl ConfigProvider for LambdaConfig {
    fn table_name(&self) -> &str {
        &self.table_name
    }

    fn lock_wait(&self) -> Duration {
        Duration::from_millis(self.lock_wait_ms)
    }

    fn strict_lock(&self) -> bool {
        self.strict_lock
    }

    fn store(&self) -> StoreSettings {
        StoreSettings::Remote {
            endpoint: self.store_endpoint.clone(),
            token: self.store_token.clone(),
            timeout: Duration::from_secs(self.timeout_seconds),
        }
    }
}

impl Validate for LambdaConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_table_name("TABLE_NAME", &self.table_name)?;
        validation::validate_url("STORE_ENDPOINT", &self.store_endpoint)?;
        validation::validate_range("LOCK_WAIT_MS", self.lock_wait_ms, 0, 600_000)?;
        validation::validate_range("STORE_TIMEOUT_SECONDS", self.timeout_seconds, 1, 300)?;

        tracing::info!("Lambda configuration validation passed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            LambdaConfig::from_lookup(lookup_from(&[("STORE_ENDPOINT", "https://sheets.example.com")]))
                .unwrap();

        assert_eq!(config.table_name(), "Sheet1");
        assert_eq!(config.lock_wait(), Duration::from_secs(10));
        assert!(!config.strict_lock());
        assert_eq!(config.store_token, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_all_variables() {
        let config = LambdaConfig::from_lookup(lookup_from(&[
            ("TABLE_NAME", "Signups"),
            ("STORE_ENDPOINT", "https://sheets.example.com"),
            ("STORE_TOKEN", "abc"),
            ("LOCK_WAIT_MS", "1500"),
            ("STRICT_LOCK", "true"),
            ("STORE_TIMEOUT_SECONDS", "12"),
        ]))
        .unwrap();

        assert_eq!(config.table_name(), "Signups");
        assert_eq!(config.lock_wait(), Duration::from_millis(1500));
        assert!(config.strict_lock());
        assert_eq!(
            config.store(),
            StoreSettings::Remote {
                endpoint: "https://sheets.example.com".to_string(),
                token: Some("abc".to_string()),
                timeout: Duration::from_secs(12),
            }
        );
    }

    #[test]
    fn test_missing_endpoint() {
        let err = LambdaConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, IngestError::MissingConfigError { ref field } if field == "STORE_ENDPOINT"));
    }

    #[test]
    fn test_unparsable_number() {
        let err = LambdaConfig::from_lookup(lookup_from(&[
            ("STORE_ENDPOINT", "https://sheets.example.com"),
            ("LOCK_WAIT_MS", "ten seconds"),
        ]))
        .unwrap_err();
        assert!(matches!(err, IngestError::InvalidConfigValueError { ref field, .. } if field == "LOCK_WAIT_MS"));
    }
}
