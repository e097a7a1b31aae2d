//! # Configuration
//!
//! Everything the processor needs is read once from the environment at startup.
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `SQS_QUEUE_URL` | [`ProcessorConfig::queue_url`] | required |
//! | `DDB_TABLE` | [`ProcessorConfig::table_name`] | required |
//! | `ENVIRONMENT` | [`ProcessorConfig::environment`] | `local` |
//! | `AWS_REGION` | [`AwsSettings::region`] | `us-east-1` |
//! | `AWS_ENDPOINT_URL` | [`AwsSettings::endpoint_url`] | none |
//! | `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` | [`AwsSettings`] credentials | none |
//! | `METRICS_ADDR` | [`ServerSettings::addr`] | `0.0.0.0:9090` |
//!
//! A variable set to the empty string is treated as unset.

use crate::server::Readiness;
use queue_framework::PollSettings;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ENVIRONMENT: &str = "local";
pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_METRICS_ADDR: &str = "0.0.0.0:9090";

/// Credentials used against a custom endpoint when none are given.
const LOCAL_CREDENTIAL: &str = "test";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("SQS_QUEUE_URL environment variable is required")]
    MissingQueueUrl,
    #[error("DDB_TABLE environment variable is required")]
    MissingTableName,
    #[error("METRICS_ADDR {value:?} is not a socket address: {reason}")]
    InvalidMetricsAddr { value: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsSettings {
    pub region: String,
    pub endpoint_url: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl AwsSettings {
    /// The static key pair to use, or `None` for the default credential chain.
    ///
    /// With a custom endpoint a key pair is always returned, filling missing halves with
    /// `test`. Without one, both halves must be set.
    pub fn static_credentials(&self) -> Option<(String, String)> {
        match (
            &self.endpoint_url,
            &self.access_key_id,
            &self.secret_access_key,
        ) {
            (Some(_), key, secret) => Some((
                key.clone().unwrap_or_else(|| LOCAL_CREDENTIAL.to_string()),
                secret.clone().unwrap_or_else(|| LOCAL_CREDENTIAL.to_string()),
            )),
            (None, Some(key), Some(secret)) => Some((key.clone(), secret.clone())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    /// How long in-flight requests get to finish once shutdown starts.
    pub shutdown_grace: Duration,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 9090)),
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

/// The complete, validated runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorConfig {
    pub queue_url: String,
    pub table_name: String,
    /// Value of the `env` label on every metric series.
    pub environment: String,
    pub aws: AwsSettings,
    pub poll: PollSettings,
    pub server: ServerSettings,
}

impl ProcessorConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let queue_url = var("SQS_QUEUE_URL").ok_or(ConfigError::MissingQueueUrl)?;
        let table_name = var("DDB_TABLE").ok_or(ConfigError::MissingTableName)?;

        let addr = var("METRICS_ADDR").unwrap_or_else(|| DEFAULT_METRICS_ADDR.to_string());
        let addr = addr
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidMetricsAddr {
                reason: e.to_string(),
                value: addr.clone(),
            })?;

        Ok(Self {
            queue_url,
            table_name,
            environment: var("ENVIRONMENT").unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
            aws: AwsSettings {
                region: var("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
                endpoint_url: var("AWS_ENDPOINT_URL"),
                access_key_id: var("AWS_ACCESS_KEY_ID"),
                secret_access_key: var("AWS_SECRET_ACCESS_KEY"),
            },
            poll: PollSettings::default(),
            server: ServerSettings {
                addr,
                ..ServerSettings::default()
            },
        })
    }

    pub fn readiness(&self) -> Readiness {
        Readiness {
            queue_configured: !self.queue_url.is_empty(),
            store_configured: !self.table_name.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ProcessorConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ProcessorConfig::from_lookup(|name| vars.get(name).cloned())
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("SQS_QUEUE_URL", "http://localhost:4566/000000000000/orders"),
        ("DDB_TABLE", "orders"),
    ];

    #[test]
    fn test_defaults() {
        let config = load(&REQUIRED).unwrap();

        assert_eq!(config.table_name, "orders");
        assert_eq!(config.environment, "local");
        assert_eq!(config.aws.region, "us-east-1");
        assert_eq!(config.aws.endpoint_url, None);
        assert_eq!(config.poll, PollSettings::default());
        assert_eq!(config.server.addr.port(), 9090);
        assert_eq!(config.server.shutdown_grace, Duration::from_secs(5));
        assert_eq!(config.readiness(), Readiness::configured());
    }

    #[test]
    fn test_missing_or_empty_identities_are_fatal() {
        assert_eq!(
            load(&[("DDB_TABLE", "orders")]),
            Err(ConfigError::MissingQueueUrl)
        );
        assert_eq!(
            load(&[("SQS_QUEUE_URL", "q"), ("DDB_TABLE", "")]),
            Err(ConfigError::MissingTableName)
        );
        assert_eq!(
            ConfigError::MissingTableName.to_string(),
            "DDB_TABLE environment variable is required"
        );
    }

    #[test]
    fn test_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("ENVIRONMENT", "prod"),
            ("AWS_REGION", "eu-west-1"),
            ("METRICS_ADDR", "127.0.0.1:9100"),
        ]);
        let config = load(&vars).unwrap();

        assert_eq!(config.environment, "prod");
        assert_eq!(config.aws.region, "eu-west-1");
        assert_eq!(config.server.addr, "127.0.0.1:9100".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_invalid_metrics_addr() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("METRICS_ADDR", ":9090"));
        assert!(matches!(
            load(&vars),
            Err(ConfigError::InvalidMetricsAddr { .. })
        ));
    }

    #[test]
    fn test_custom_endpoint_always_uses_static_credentials() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("AWS_ENDPOINT_URL", "http://localhost:4566"));
        let config = load(&vars).unwrap();
        assert_eq!(
            config.aws.static_credentials(),
            Some(("test".to_string(), "test".to_string()))
        );

        vars.push(("AWS_ACCESS_KEY_ID", "AKIA"));
        let config = load(&vars).unwrap();
        assert_eq!(
            config.aws.static_credentials(),
            Some(("AKIA".to_string(), "test".to_string()))
        );
    }

    #[test]
    fn test_static_credentials_without_endpoint_need_both_halves() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("AWS_ACCESS_KEY_ID", "AKIA"));
        assert_eq!(load(&vars).unwrap().aws.static_credentials(), None);

        vars.push(("AWS_SECRET_ACCESS_KEY", "secret"));
        assert_eq!(
            load(&vars).unwrap().aws.static_credentials(),
            Some(("AKIA".to_string(), "secret".to_string()))
        );
    }
}
