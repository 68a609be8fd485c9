//! Gateway configuration with validation.
//!
//! Resolution order: built-in defaults, then a TOML file, then `COPNET_*`
//! environment variables. The result is validated before use.

use copnet_paper_contract::prelude::ClientIdentity;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

/// Overrides `http.port`.
pub const ENV_HTTP_PORT: &str = "COPNET_HTTP_PORT";
/// Overrides `organization.name`.
pub const ENV_ORG_NAME: &str = "COPNET_ORG_NAME";
/// Overrides `organization.msp_id`.
pub const ENV_MSP_ID: &str = "COPNET_MSP_ID";
/// Overrides `organization.operator`.
pub const ENV_OPERATOR: &str = "COPNET_OPERATOR";
/// Overrides `defaults.issuer`.
pub const ENV_ISSUER: &str = "COPNET_ISSUER";

/// Main gateway configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP server configuration
    pub http: HttpConfig,
    /// Organization this gateway acts for
    pub organization: OrganizationConfig,
    /// Channel and contract addressed on the ledger network
    pub network: NetworkConfig,
    /// Values filled in when a request omits them
    pub defaults: DefaultsConfig,
    /// Request limits
    pub limits: LimitsConfig,
    /// Timeout configuration
    pub timeouts: TimeoutConfig,
    /// CORS configuration
    pub cors: CorsConfig,
}

impl GatewayConfig {
    /// Parse a TOML document. Missing sections and fields keep their defaults.
    ///
    /// # Errors
    ///
    /// `ConfigError::Parse` if the document is not valid TOML or has
    /// mistyped fields.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from an optional TOML file, apply environment overrides and
    /// validate.
    ///
    /// # Errors
    ///
    /// Unreadable file, parse failure, malformed override or failed
    /// validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?;
                Self::from_toml_str(&raw)?
            }
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `COPNET_*` overrides from the process environment.
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidEnv` if `COPNET_HTTP_PORT` is not a port number.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidEnv` if the port override does not parse.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup(ENV_HTTP_PORT) {
            self.http.port = port.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: ENV_HTTP_PORT,
                value: port.clone(),
            })?;
        }
        if let Some(name) = lookup(ENV_ORG_NAME) {
            self.organization.name = name;
        }
        if let Some(msp_id) = lookup(ENV_MSP_ID) {
            self.organization.msp_id = msp_id;
        }
        if let Some(operator) = lookup(ENV_OPERATOR) {
            self.organization.operator = operator;
        }
        if let Some(issuer) = lookup(ENV_ISSUER) {
            self.defaults.issuer = issuer;
        }
        Ok(())
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// The first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("organization.name", &self.organization.name),
            ("organization.msp_id", &self.organization.msp_id),
            ("organization.user", &self.organization.user),
            ("organization.operator", &self.organization.operator),
            ("network.channel", &self.network.channel),
            ("network.contract", &self.network.contract),
            ("defaults.issuer", &self.defaults.issuer),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(ConfigError::MissingField(*field));
        }

        if self.limits.max_request_size == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_request_size cannot be 0".into(),
            ));
        }

        if self.timeouts.request.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "request timeout cannot be 0".into(),
            ));
        }

        if let Some(bad) = self
            .cors
            .allowed_methods
            .iter()
            .find(|m| m.parse::<axum::http::Method>().is_err())
        {
            return Err(ConfigError::Invalid(format!("unknown CORS method {bad:?}")));
        }

        Ok(())
    }

    /// HTTP bind address
    #[must_use]
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }

    /// Identity transactions are submitted under.
    #[must_use]
    pub fn identity(&self) -> ClientIdentity {
        ClientIdentity::new(
            self.organization.user.clone(),
            self.organization.msp_id.clone(),
        )
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port (default: 8080)
    pub port: u16,
    /// Enable HTTP server
    pub enabled: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 8080,
            enabled: true,
        }
    }
}

/// The organization a gateway process represents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationConfig {
    /// Display name, e.g. `PC`
    pub name: String,
    /// Membership service provider id
    pub msp_id: String,
    /// Enrolled user transactions are signed as
    pub user: String,
    /// Operator name used when a request omits `currentOperator` or
    /// `newOperator`
    pub operator: String,
}

impl Default for OrganizationConfig {
    fn default() -> Self {
        Self {
            name: "PC".into(),
            msp_id: "Org1MSP".into(),
            user: "adminPc".into(),
            operator: "PC".into(),
        }
    }
}

/// Ledger network addressing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Channel name
    pub channel: String,
    /// Deployed contract name
    pub contract: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            channel: "mychannel".into(),
            contract: "papervdx".into(),
        }
    }
}

/// Request defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Issuer used when a request omits `issuer`
    pub issuer: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            issuer: "PC".into(),
        }
    }
}

/// Request limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Max request body size in bytes (default: 1MB)
    pub max_request_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_request_size: 1024 * 1024,
        }
    }
}

/// Timeout configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Whole-request timeout
    #[serde(with = "humantime_serde")]
    pub request: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(30),
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Enable CORS checks; when off every origin is allowed
    pub enabled: bool,
    /// Allowed origins (`*` for any)
    pub allowed_origins: Vec<String>,
    /// Allowed methods
    pub allowed_methods: Vec<String>,
    /// Allowed request headers (`*` for any)
    pub allowed_headers: Vec<String>,
    /// Preflight cache lifetime in seconds
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec!["*".into()],
            allowed_methods: vec!["GET".into(), "POST".into(), "OPTIONS".into()],
            allowed_headers: vec!["content-type".into()],
            max_age: 3600,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read {path}: {reason}")]
    Io {
        /// File path
        path: String,
        /// OS error text
        reason: String,
    },
    /// Config file is not valid TOML for this schema
    #[error("invalid config file: {0}")]
    Parse(String),
    /// An environment override could not be parsed
    #[error("invalid value {value:?} for {var}")]
    InvalidEnv {
        /// Variable name
        var: &'static str,
        /// Raw value
        value: String,
    },
    /// A required field is empty
    #[error("{0} must not be empty")]
    MissingField(&'static str),
    /// Invalid size limit
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    /// Invalid timeout value
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    /// General configuration error
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config_valid() {
        let config = GatewayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.http_addr().port(), 8080);
        assert_eq!(config.identity().msp_id, "Org1MSP");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = GatewayConfig::from_toml_str(
            r#"
            [http]
            port = 8082

            [organization]
            name = "SAAQ"
            msp_id = "Org2MSP"
            user = "adminSaaq"
            operator = "SAAQ"

            [timeouts]
            request = "5s"
            "#,
        )
        .unwrap();
        assert_eq!(config.http.port, 8082);
        assert_eq!(config.organization.operator, "SAAQ");
        assert_eq!(config.timeouts.request, Duration::from_secs(5));
        assert_eq!(config.defaults.issuer, "PC");
        assert_eq!(config.network, NetworkConfig::default());
    }

    #[test]
    fn test_shipped_configs_parse() {
        for raw in [
            include_str!("../../config/pc.toml"),
            include_str!("../../config/saaq.toml"),
        ] {
            let config = GatewayConfig::from_toml_str(raw).unwrap();
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn test_bad_toml_rejected() {
        let err = GatewayConfig::from_toml_str("[http]\nport = \"eighty\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_overrides_applied() {
        let env: HashMap<&str, &str> = [
            (ENV_HTTP_PORT, "9001"),
            (ENV_ORG_NAME, "RQ"),
            (ENV_MSP_ID, "Org3MSP"),
            (ENV_OPERATOR, "RQ"),
            (ENV_ISSUER, "PCX"),
        ]
        .into_iter()
        .collect();

        let mut config = GatewayConfig::default();
        config
            .apply_overrides(|var| env.get(var).map(|v| (*v).to_string()))
            .unwrap();
        assert_eq!(config.http.port, 9001);
        assert_eq!(config.organization.name, "RQ");
        assert_eq!(config.organization.msp_id, "Org3MSP");
        assert_eq!(config.organization.operator, "RQ");
        assert_eq!(config.defaults.issuer, "PCX");
    }

    #[test]
    fn test_bad_port_override_rejected() {
        let mut config = GatewayConfig::default();
        let err = config
            .apply_overrides(|var| (var == ENV_HTTP_PORT).then(|| "http".to_string()))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidEnv {
                var: ENV_HTTP_PORT,
                value: "http".into()
            }
        );
    }

    #[test]
    fn test_validation_failures() {
        let mut config = GatewayConfig::default();
        config.organization.operator = " ".into();
        assert_eq!(
            config.validate(),
            Err(ConfigError::MissingField("organization.operator"))
        );

        let mut config = GatewayConfig::default();
        config.limits.max_request_size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidLimit(_))));

        let mut config = GatewayConfig::default();
        config.timeouts.request = Duration::ZERO;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTimeout(_))));

        let mut config = GatewayConfig::default();
        config.cors.allowed_methods.push("FETCH PLEASE".into());
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_file_reported() {
        let err = GatewayConfig::load(Some(Path::new("/nonexistent/copnet.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
