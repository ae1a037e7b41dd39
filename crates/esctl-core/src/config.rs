// crates/esctl-core/src/config.rs - Configuration System
//
// This module provides the configuration schema and loading mechanism for
// esctl. The configuration is a single YAML file (~/.esctlrc by default)
// describing clusters, users and the contexts that pair them.
//
// FILE LAYOUT:
// ```yaml
// settings:                 # client settings shared by every cluster
//   timeout: 10
// clusters:
//   production:
//     servers: [https://es01:9200, https://es02:9200]
//     settings:             # overrides the global settings for this cluster
//       no_check_certificate: true
// users:
//   admin:
//     username: elastic
//     external_password:
//       command:
//         run: pass show es/elastic
// contexts:
//   prod:
//     cluster: production
//     user: admin
// default-context: prod
// ```
//
// SOURCE PRIORITY (highest to lowest):
// 1. --context / --config command-line arguments
// 2. ESCTL_CONTEXT / ESCTL_CONFIG environment variables (handled by clap)
// 3. default-context from the file
//
// A missing file is not an error: a default one pointing at
// http://localhost:9200 is written and used.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during configuration loading and validation
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid YAML in {file}: {error}")]
    ParseError { file: String, error: String },

    #[error("Invalid configuration value: {0}")]
    ValidationError(String),

    #[error("Cannot load context '{0}': no such context in configuration")]
    UnknownContext(String),

    #[error("No context given and no default-context configured")]
    NoContext,

    #[error("Cannot determine the home directory to locate the config file")]
    NoHomeDirectory,

    #[error("Cannot serialize configuration: {0}")]
    SerializeError(String),

    #[error("I/O error on config file: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Complete configuration file
///
/// Unknown keys are rejected so that typos surface as errors instead of
/// being silently ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EsctlConfig {
    /// Client settings applied to every cluster
    #[serde(default)]
    pub settings: ClientSettings,

    /// Known clusters, by name
    #[serde(default)]
    pub clusters: IndexMap<String, ClusterConfig>,

    /// Known users, by name
    #[serde(default)]
    pub users: IndexMap<String, UserConfig>,

    /// Named (cluster, user) pairs
    #[serde(default)]
    pub contexts: IndexMap<String, ContextConfig>,

    /// Context used when none is given on the command line
    #[serde(
        rename = "default-context",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub default_context: Option<String>,
}

/// HTTP client behaviour
///
/// Every field is optional so that per-cluster settings can override the
/// global ones field by field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientSettings {
    /// Skip TLS certificate verification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_check_certificate: Option<bool>,

    /// Extra attempts on connection errors and 502/503/504 responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,

    /// Request timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl ClientSettings {
    /// Fields set in `overrides` win over ours
    pub fn merged_with(&self, overrides: &ClientSettings) -> ClientSettings {
        ClientSettings {
            no_check_certificate: overrides.no_check_certificate.or(self.no_check_certificate),
            max_retries: overrides.max_retries.or(self.max_retries),
            timeout: overrides.timeout.or(self.timeout),
        }
    }
}

/// A cluster reachable through one or more servers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClusterConfig {
    /// Base URLs, tried in order
    pub servers: Vec<String>,

    /// Cluster-specific client settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<ClientSettings>,
}

/// Credentials used to authenticate against a cluster
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Shell command printing the password on stdout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_password: Option<ExternalPassword>,
}

impl UserConfig {
    pub fn password_command(&self) -> Option<&str> {
        self.external_password
            .as_ref()
            .map(|external| external.command.run.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExternalPassword {
    pub command: PasswordCommand,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PasswordCommand {
    pub run: String,
}

/// A named pairing of a cluster and an optional user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContextConfig {
    pub cluster: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// Everything a command needs to reach one cluster
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedContext {
    pub name: String,
    pub cluster_name: String,
    pub cluster: ClusterConfig,
    pub user: Option<UserConfig>,
    /// Global settings merged with the cluster's own settings
    pub settings: ClientSettings,
}

impl ResolvedContext {
    /// "http" when the first server is a plain http URL, "https" otherwise
    pub fn scheme(&self) -> &'static str {
        match self.cluster.servers.first() {
            Some(server) if server.starts_with("http:") => "http",
            _ => "https",
        }
    }

    pub fn servers(&self) -> &[String] {
        &self.cluster.servers
    }
}

impl EsctlConfig {
    /// Resolve a context by name, or the default context when `name` is None
    pub fn resolve_context(&self, name: Option<&str>) -> ConfigResult<ResolvedContext> {
        let name = match name {
            Some(name) => {
                debug!("Using provided context: {name}");
                name
            }
            None => {
                let name = self.default_context.as_deref().ok_or(ConfigError::NoContext)?;
                debug!("No context provided, using default context: {name}");
                name
            }
        };

        let context = self
            .contexts
            .get(name)
            .ok_or_else(|| ConfigError::UnknownContext(name.to_string()))?;

        let cluster = self.clusters.get(&context.cluster).ok_or_else(|| {
            ConfigError::ValidationError(format!(
                "context '{name}' refers to unknown cluster '{}'",
                context.cluster
            ))
        })?;

        let user = match &context.user {
            Some(user_name) => Some(self.users.get(user_name).cloned().ok_or_else(|| {
                ConfigError::ValidationError(format!(
                    "context '{name}' refers to unknown user '{user_name}'"
                ))
            })?),
            None => None,
        };

        let settings = match &cluster.settings {
            Some(overrides) => self.settings.merged_with(overrides),
            None => self.settings.clone(),
        };

        Ok(ResolvedContext {
            name: name.to_string(),
            cluster_name: context.cluster.clone(),
            cluster: cluster.clone(),
            user,
            settings,
        })
    }
}

/// Configuration loading and management
pub struct ConfigManager;

impl ConfigManager {
    /// `~/.esctlrc`
    pub fn default_path() -> ConfigResult<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(".esctlrc"))
            .ok_or(ConfigError::NoHomeDirectory)
    }

    /// Expand a leading `~/` to the home directory
    pub fn expand_path(raw: &str) -> ConfigResult<PathBuf> {
        match raw.strip_prefix("~/") {
            Some(rest) => dirs::home_dir()
                .map(|home| home.join(rest))
                .ok_or(ConfigError::NoHomeDirectory),
            None => Ok(PathBuf::from(raw)),
        }
    }

    /// Load and validate the configuration file
    ///
    /// LOADING STRATEGY:
    /// 1. Create a default file if none exists
    /// 2. Parse YAML, rejecting unknown keys and wrong types
    /// 3. Validate cross references (contexts -> clusters/users)
    pub fn load_config(path: &Path) -> ConfigResult<EsctlConfig> {
        debug!("Trying to load config file: {}", path.display());

        if !path.is_file() {
            return Self::create_default_config(path);
        }

        let content = fs::read_to_string(path)?;
        let config = Self::parse_config(&content, &path.display().to_string())?;
        Self::validate_config(&config)?;

        debug!(
            clusters = config.clusters.len(),
            users = config.users.len(),
            contexts = config.contexts.len(),
            "Loaded configuration"
        );

        Ok(config)
    }

    /// Parse YAML content; `file` is only used in error messages
    pub fn parse_config(content: &str, file: &str) -> ConfigResult<EsctlConfig> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError {
            file: file.to_string(),
            error: e.to_string(),
        })
    }

    /// Write the configuration back to disk
    pub fn write_config(path: &Path, config: &EsctlConfig) -> ConfigResult<()> {
        let content =
            serde_yaml::to_string(config).map_err(|e| ConfigError::SerializeError(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Make `context` the default one and persist the change
    pub fn set_default_context(
        path: &Path,
        config: &mut EsctlConfig,
        context: &str,
    ) -> ConfigResult<()> {
        if !config.contexts.contains_key(context) {
            return Err(ConfigError::UnknownContext(context.to_string()));
        }

        config.default_context = Some(context.to_string());
        Self::write_config(path, config)
    }

    fn create_default_config(path: &Path) -> ConfigResult<EsctlConfig> {
        info!(
            "{} config file does not exist, creating a default one",
            path.display()
        );

        let config = EsctlConfig::default();
        Self::write_config(path, &config)?;
        Ok(config)
    }

    /// Validate the configuration for consistency
    ///
    /// Catches mistakes that would otherwise only show up when a context is
    /// used: clusters without servers, dangling references.
    pub fn validate_config(config: &EsctlConfig) -> ConfigResult<()> {
        for (name, cluster) in &config.clusters {
            if cluster.servers.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "cluster '{name}' has no servers"
                )));
            }
        }

        for (name, context) in &config.contexts {
            if !config.clusters.contains_key(&context.cluster) {
                return Err(ConfigError::ValidationError(format!(
                    "context '{name}' refers to unknown cluster '{}'",
                    context.cluster
                )));
            }

            if let Some(user) = &context.user {
                if !config.users.contains_key(user) {
                    return Err(ConfigError::ValidationError(format!(
                        "context '{name}' refers to unknown user '{user}'"
                    )));
                }
            }
        }

        if let Some(default_context) = &config.default_context {
            if !config.contexts.contains_key(default_context) {
                return Err(ConfigError::ValidationError(format!(
                    "default-context '{default_context}' is not a known context"
                )));
            }
        }

        Ok(())
    }
}

/// A single local cluster, reachable without credentials
impl Default for EsctlConfig {
    fn default() -> Self {
        let mut clusters = IndexMap::new();
        clusters.insert(
            "localhost".to_string(),
            ClusterConfig {
                servers: vec!["http://localhost:9200".to_string()],
                settings: None,
            },
        );

        let mut contexts = IndexMap::new();
        contexts.insert(
            "localhost".to_string(),
            ContextConfig {
                cluster: "localhost".to_string(),
                user: None,
            },
        );

        Self {
            settings: ClientSettings::default(),
            clusters,
            users: IndexMap::new(),
            contexts,
            default_context: Some("localhost".to_string()),
        }
    }
}
