use crate::core_auth::AuthError;
use crate::core_cli::Cli;
use crate::core_tls::{TlsConfig, TlsError};
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Missing required setting: {0}")]
    MissingField(&'static str),

    #[error("Invalid passive port range {0:?}: {1}")]
    InvalidPassiveRange(String, &'static str),

    #[error("Invalid root directory {path:?}: {reason}")]
    InvalidRoot { path: PathBuf, reason: String },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Tls(#[from] TlsError),
}

/// Inclusive passive port range, written `"2000-2001"` or `"2000"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PassivePortRange {
    start: u16,
    end: u16,
}

impl PassivePortRange {
    pub fn new(start: u16, end: u16) -> Result<Self, ConfigError> {
        let text = format!("{}-{}", start, end);
        if start == 0 {
            return Err(ConfigError::InvalidPassiveRange(text, "port 0 is not usable"));
        }
        if start > end {
            return Err(ConfigError::InvalidPassiveRange(
                text,
                "lower bound is above upper bound",
            ));
        }
        Ok(Self { start, end })
    }

    pub fn as_range(&self) -> RangeInclusive<u16> {
        self.start..=self.end
    }
}

impl FromStr for PassivePortRange {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| ConfigError::InvalidPassiveRange(s.to_string(), reason);
        let bounds = s
            .split('-')
            .map(|part| part.trim().parse::<u16>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| invalid("bounds must be port numbers"))?;

        match bounds.as_slice() {
            [single] => Self::new(*single, *single),
            [start, end] => Self::new(*start, *end),
            _ => Err(invalid("needs to be a range of two values")),
        }
    }
}

impl TryFrom<String> for PassivePortRange {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PassivePortRange> for String {
    fn from(range: PassivePortRange) -> Self {
        range.to_string()
    }
}

impl fmt::Display for PassivePortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub hostname: String,
    pub listen_port: u16,
    pub passive_ports: Option<PassivePortRange>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hostname: String::from("localhost"),
            listen_port: 0,
            passive_ports: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub root: Option<PathBuf>,
    pub permissions: String,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            root: None,
            permissions: String::from("elr"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub user: UserConfig,
    pub tls: TlsConfig,
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let config_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&config_str).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Builds the configuration from an optional file, then lets every
    /// option given on the command line override it.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(username) = &cli.username {
            self.user.username = Some(username.clone());
        }
        if let Some(password) = &cli.password {
            self.user.password = Some(password.clone());
        }
        if let Some(root) = &cli.root {
            self.user.root = Some(root.clone());
        }
        if let Some(permissions) = &cli.permissions {
            self.user.permissions = permissions.clone();
        }
        if let Some(hostname) = &cli.hostname {
            self.server.hostname = hostname.clone();
        }
        if let Some(port) = cli.port {
            self.server.listen_port = port;
        }
        if let Some(range) = cli.passive_ports {
            self.server.passive_ports = Some(range);
        }
        if let Some(mode) = cli.tls {
            self.tls.mode = mode;
        }
        if let Some(require) = &cli.tls_require {
            self.tls.require = require.clone();
        }
        if let Some(cert_file) = &cli.cert_file {
            self.tls.cert_file = cert_file.clone();
        }
        if let Some(key_file) = &cli.key_file {
            self.tls.key_file = key_file.clone();
        }
        if let Some(dir) = &cli.gen_certs_dir {
            self.tls.gen_certs_dir = Some(dir.clone());
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.user.username.as_deref().unwrap_or_default().is_empty() {
            return Err(ConfigError::MissingField("username"));
        }
        if self.user.password.is_none() {
            return Err(ConfigError::MissingField("password"));
        }
        let root = self
            .user
            .root
            .as_ref()
            .ok_or(ConfigError::MissingField("root"))?;
        if !root.is_dir() {
            return Err(ConfigError::InvalidRoot {
                path: root.clone(),
                reason: "not an existing directory".to_string(),
            });
        }
        crate::core_auth::Permissions::parse(&self.user.permissions)?;
        self.tls.validate()?;
        Ok(())
    }

    pub fn log_config(&self) {
        info!("  Hostname: {}", self.server.hostname);
        info!("  Listen Port: {}", self.server.listen_port);
        match &self.server.passive_ports {
            Some(range) => info!("  Passive Ports: {}", range),
            None => info!("  Passive Ports: ephemeral"),
        }
        info!(
            "  User: {} (permissions {:?})",
            self.user.username.as_deref().unwrap_or_default(),
            self.user.permissions
        );
        info!("  Root Directory: {:?}", self.user.root);
        info!("  TLS Mode: {:?}", self.tls.mode);
        info!("  TLS Required On: {:?}", self.tls.require);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_tls::{TlsMode, TlsRequirement};
    use clap::Parser;

    #[test]
    fn test_passive_range_parsing() {
        assert_eq!(
            "2000-2001".parse::<PassivePortRange>().unwrap().as_range(),
            2000..=2001
        );
        assert_eq!(
            "2000".parse::<PassivePortRange>().unwrap().as_range(),
            2000..=2000
        );
        assert!(matches!(
            "1-2-3".parse::<PassivePortRange>(),
            Err(ConfigError::InvalidPassiveRange(..))
        ));
        assert!("2001-2000".parse::<PassivePortRange>().is_err());
        assert!("abc".parse::<PassivePortRange>().is_err());
        assert!("0-10".parse::<PassivePortRange>().is_err());
        assert!("2000-70000".parse::<PassivePortRange>().is_err());
    }

    #[test]
    fn test_toml_file_format() {
        let config: Config = toml::from_str(
            r#"
            [server]
            hostname = "127.0.0.1"
            listen_port = 2121
            passive_ports = "2000-2001"

            [user]
            username = "alice"
            password = "secret"
            root = "/srv"

            [tls]
            mode = "implicit"
            require = ["data"]
            "#,
        )
        .unwrap();

        assert_eq!(config.server.listen_port, 2121);
        assert_eq!(
            config.server.passive_ports.unwrap().as_range(),
            2000..=2001
        );
        assert_eq!(config.user.permissions, "elr");
        assert_eq!(config.tls.mode, TlsMode::Implicit);
        assert_eq!(config.tls.require, vec![TlsRequirement::Data]);
    }

    #[test]
    fn test_bad_range_in_toml_is_rejected() {
        let result: Result<Config, _> = toml::from_str(
            r#"
            [server]
            passive_ports = "3000-2000"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_overrides_and_validation() {
        let root = tempfile::tempdir().unwrap();
        let root_arg = root.path().to_str().unwrap();
        let cli = Cli::parse_from([
            "fixtureftpd",
            "alice",
            "secret",
            root_arg,
            "--permissions",
            "elradfmw",
            "--passive-ports",
            "2000-2001",
            "--port",
            "2121",
        ]);
        let config = Config::from_cli(&cli).unwrap();
        assert_eq!(config.user.username.as_deref(), Some("alice"));
        assert_eq!(config.user.permissions, "elradfmw");
        assert_eq!(config.server.listen_port, 2121);
        assert_eq!(config.server.hostname, "localhost");
        assert_eq!(config.tls.mode, TlsMode::None);
    }

    #[test]
    fn test_missing_credentials_are_rejected() {
        let cli = Cli::parse_from(["fixtureftpd"]);
        assert!(matches!(
            Config::from_cli(&cli),
            Err(ConfigError::MissingField("username"))
        ));
    }

    #[test]
    fn test_invalid_permissions_are_rejected() {
        let root = tempfile::tempdir().unwrap();
        let cli = Cli::parse_from([
            "fixtureftpd",
            "alice",
            "secret",
            root.path().to_str().unwrap(),
            "--permissions",
            "elrz",
        ]);
        assert!(matches!(
            Config::from_cli(&cli),
            Err(ConfigError::Auth(AuthError::InvalidPermission('z')))
        ));
    }

    #[test]
    fn test_missing_root_is_rejected() {
        let cli = Cli::parse_from(["fixtureftpd", "alice", "secret", "/nonexistent/fixture/root"]);
        assert!(matches!(
            Config::from_cli(&cli),
            Err(ConfigError::InvalidRoot { .. })
        ));
    }
}
