use std::{env, net::SocketAddr, str::FromStr};
use thiserror::Error;

use crate::domain::MutationPolicy;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid environment variable format for {0}: {1}")]
    InvalidVar(String, String),
}

/// Where memes and authors are persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    DynamoDb,
    /// Process-local maps; everything is lost on restart.
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dynamodb" => Ok(StorageBackend::DynamoDb),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("expected 'dynamodb' or 'memory', got '{}'", other)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub storage: StorageBackend,
    pub aws_region: String,
    // Optional endpoint for LocalStack
    pub localstack_endpoint: Option<String>,
    pub memes_table: String,
    pub authors_table: String,
    pub mutation_policy: MutationPolicy,
    /// Emit JSON log lines instead of human-readable ones.
    pub json_logs: bool,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignores errors, relies on env vars otherwise)
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; `load` feeds it the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_address_str = lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = SocketAddr::from_str(&bind_address_str)
            .map_err(|e| ConfigError::InvalidVar("BIND_ADDRESS".into(), e.to_string()))?;

        let storage = parse_or(&lookup, "STORAGE_BACKEND", StorageBackend::DynamoDb)?;
        let mutation_policy = parse_or(&lookup, "MUTATION_POLICY", MutationPolicy::default())?;

        let aws_region = lookup("AWS_DEFAULT_REGION").unwrap_or_else(|| "ca-central-1".to_string());

        // Allow overriding endpoint for localstack/testing
        let localstack_endpoint = lookup("AWS_ENDPOINT_URL").filter(|v| !v.is_empty());

        let memes_table = table_name(&lookup, "MEMES_TABLE", "memes")?;
        let authors_table = table_name(&lookup, "AUTHORS_TABLE", "users")?;

        let json_logs = lookup("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(Config {
            bind_address,
            storage,
            aws_region,
            localstack_endpoint,
            memes_table,
            authors_table,
            mutation_policy,
            json_logs,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr<Err = String>,
{
    match lookup(key) {
        Some(raw) => raw.parse().map_err(|e| ConfigError::InvalidVar(key.into(), e)),
        None => Ok(default),
    }
}

fn table_name<F>(lookup: &F, key: &str, default: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(name) if name.trim().is_empty() => Err(ConfigError::MissingVar(key.into())),
        Some(name) => Ok(name.trim().to_string()),
        None => Ok(default.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.storage, StorageBackend::DynamoDb);
        assert_eq!(config.aws_region, "ca-central-1");
        assert_eq!(config.localstack_endpoint, None);
        assert_eq!(config.memes_table, "memes");
        assert_eq!(config.authors_table, "users");
        assert_eq!(config.mutation_policy, MutationPolicy::OwnerOnly);
        assert!(!config.json_logs);
    }

    #[test]
    fn reads_overrides() {
        let config = load(&[
            ("BIND_ADDRESS", "127.0.0.1:8080"),
            ("STORAGE_BACKEND", "memory"),
            ("AWS_ENDPOINT_URL", "http://localhost:4566"),
            ("MEMES_TABLE", "memes_test"),
            ("MUTATION_POLICY", "open"),
            ("LOG_FORMAT", "JSON"),
        ])
        .unwrap();
        assert_eq!(config.bind_address.port(), 8080);
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.localstack_endpoint.as_deref(), Some("http://localhost:4566"));
        assert_eq!(config.memes_table, "memes_test");
        assert_eq!(config.mutation_policy, MutationPolicy::Open);
        assert!(config.json_logs);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            load(&[("BIND_ADDRESS", "nowhere")]),
            Err(ConfigError::InvalidVar(key, _)) if key == "BIND_ADDRESS"
        ));
        assert!(matches!(
            load(&[("STORAGE_BACKEND", "postgres")]),
            Err(ConfigError::InvalidVar(key, _)) if key == "STORAGE_BACKEND"
        ));
        assert!(matches!(
            load(&[("MEMES_TABLE", "  ")]),
            Err(ConfigError::MissingVar(key)) if key == "MEMES_TABLE"
        ));
    }
}
