//! Configuration file parsing and structures.
//!
//! tankless reads an optional TOML file with four sections:
//! - `[logging]`: log level and per-target overrides
//! - `[client]`: vendor endpoints and client identification
//! - `[auth]`: the pre-acquired bearer token
//! - `[transport]`: HTTP transport settings

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::filter::Targets;

/// Top-level configuration structure
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub transport: TransportConfig,
}

#[derive(Debug, Default, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default)]
    pub level: LogLevel,

    /// Per-target levels, e.g. `"tankless::transport" = "debug"`
    #[serde(default)]
    pub overrides: HashMap<String, LogLevel>,
}

impl LoggingConfig {
    /// Build a target filter from the default level and its overrides
    pub fn targets(&self) -> Targets {
        Targets::new()
            .with_default(LevelFilter::from(self.level))
            .with_targets(
                self.overrides
                    .iter()
                    .map(|(target, level)| (target.clone(), LevelFilter::from(*level))),
            )
    }
}

/// Vendor endpoints and identification used by the client.
///
/// Every field has a default pointing at the production vendor API, so an
/// empty `[client]` section (or none at all) is valid.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// GraphQL endpoint serving full device info
    pub graphql_url: String,

    /// Base URL of the shadow REST API; `/thing/{name}/shadow` is appended
    pub shadow_base_url: String,

    /// Legacy form-POST command endpoint
    pub command_url: String,

    /// User agent sent to the shadow and command endpoints
    pub user_agent: String,

    /// Value of the `x-amz-user-agent` header sent to the GraphQL endpoint
    pub graphql_user_agent: String,

    /// Optional `x-api-key` for the GraphQL endpoint
    pub graphql_api_key: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            graphql_url:
                "https://s34ox7kri5dsvdr43bfgp6qh6i.appsync-api.us-east-1.amazonaws.com/graphql"
                    .to_string(),
            shadow_base_url: "https://698suy4zs3.execute-api.us-east-1.amazonaws.com/Prod"
                .to_string(),
            command_url: "https://d1coipyopavzuf.cloudfront.net/api/device_shadow/input"
                .to_string(),
            user_agent: "okhttp/3.12.1".to_string(),
            graphql_user_agent: "aws-amplify/3.4.3 react-native".to_string(),
            graphql_api_key: None,
        }
    }
}

impl ClientConfig {
    /// Shadow document URL for a thing
    ///
    /// The thing name is percent-encoded so it always stays a single path
    /// segment.
    pub fn shadow_url(&self, thing_name: &str) -> String {
        format!(
            "{}/thing/{}/shadow",
            self.shadow_base_url.trim_end_matches('/'),
            urlencoding::encode(thing_name)
        )
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AuthConfig {
    /// Bearer token, overridden by `--token` or `TANKLESS_TOKEN`
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TransportConfig {
    /// Whole-request timeout in seconds; no timeout when unset
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl TransportConfig {
    /// Request timeout, if one is configured. Zero is rejected since every
    /// request would fail immediately.
    pub fn timeout(&self) -> Result<Option<Duration>, ConfigError> {
        match self.timeout_secs {
            Some(0) => Err(ConfigError::InvalidTimeout),
            secs => Ok(secs.map(Duration::from_secs)),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(path.as_ref().to_path_buf(), e))?;

        toml::from_str(&contents).map_err(ConfigError::Parse)
    }

    /// Pick the bearer token, preferring an explicit one over the file
    pub fn resolve_token(&self, explicit: Option<String>) -> Result<String, ConfigError> {
        explicit
            .or_else(|| self.auth.token.clone())
            .filter(|token| !token.is_empty())
            .ok_or(ConfigError::MissingToken)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("No bearer token: pass --token, set TANKLESS_TOKEN, or set auth.token")]
    MissingToken,

    #[error("transport.timeout_secs must be greater than zero")]
    InvalidTimeout,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.logging.level, LogLevel::Info);
        assert!(config.logging.overrides.is_empty());
        assert_eq!(config.client, ClientConfig::default());
        assert!(config.auth.token.is_none());
        assert_eq!(config.transport.timeout().unwrap(), None);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [logging]
            level = "warn"

            [logging.overrides]
            "tankless::transport" = "trace"

            [client]
            shadow_base_url = "http://localhost:8080/Prod/"
            graphql_api_key = "da2-key"

            [auth]
            token = "abc"

            [transport]
            timeout_secs = 10
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.logging.level, LogLevel::Warn);
        assert_eq!(
            config.logging.overrides.get("tankless::transport"),
            Some(&LogLevel::Trace)
        );
        assert_eq!(config.client.graphql_api_key.as_deref(), Some("da2-key"));
        // Unset fields in a present section keep their defaults
        assert_eq!(config.client.user_agent, "okhttp/3.12.1");
        assert_eq!(
            config.client.shadow_url("heater-1"),
            "http://localhost:8080/Prod/thing/heater-1/shadow"
        );
        assert_eq!(config.auth.token.as_deref(), Some("abc"));
        assert_eq!(
            config.transport.timeout().unwrap(),
            Some(Duration::from_secs(10))
        );
    }

    #[test]
    fn test_shadow_url_keeps_thing_name_in_one_segment() {
        let config = ClientConfig {
            shadow_base_url: "http://localhost:8080/Prod".to_string(),
            ..ClientConfig::default()
        };

        assert_eq!(
            config.shadow_url("a/../b?c"),
            "http://localhost:8080/Prod/thing/a%2F..%2Fb%3Fc/shadow"
        );
        assert_eq!(
            config.shadow_url("dev#1"),
            "http://localhost:8080/Prod/thing/dev%231/shadow"
        );
        // Ordinary thing names are unchanged
        assert_eq!(
            config.shadow_url("heater-1_A.b~c"),
            "http://localhost:8080/Prod/thing/heater-1_A.b~c/shadow"
        );
    }

    #[test]
    fn test_invalid_log_level_is_rejected() {
        let result: Result<Config, _> = toml::from_str("[logging]\nlevel = \"loud\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_log_level_maps_to_filter() {
        assert_eq!(LevelFilter::from(LogLevel::Trace), LevelFilter::TRACE);
        assert_eq!(LevelFilter::from(LogLevel::Error), LevelFilter::ERROR);
        assert!(LogLevel::Debug < LogLevel::Info);
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let config: Config = toml::from_str("[transport]\ntimeout_secs = 0\n").unwrap();
        assert!(matches!(
            config.transport.timeout(),
            Err(ConfigError::InvalidTimeout)
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[auth]
token = "from-file"
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.resolve_token(None).unwrap(), "from-file");
        assert_eq!(
            config.resolve_token(Some("explicit".to_string())).unwrap(),
            "explicit"
        );
    }

    #[test]
    fn test_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Io(ref p, _) if *p == path));
    }

    #[test]
    fn test_missing_token() {
        let config = Config::default();
        assert!(matches!(
            config.resolve_token(None),
            Err(ConfigError::MissingToken)
        ));
        assert!(matches!(
            config.resolve_token(Some(String::new())),
            Err(ConfigError::MissingToken)
        ));
    }
}
