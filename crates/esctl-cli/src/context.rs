// crates/esctl-cli/src/context.rs - Application context
//
// Built once in main and passed to every cluster command. Nothing global:
// the configuration, the selected cluster and the renderer all live here.

use anyhow::{Context as AnyhowContext, Result, bail};
use esctl_core::config::{ConfigManager, EsctlConfig, ResolvedContext, UserConfig};
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

use crate::services::{ClusterService, Credentials, OutputService};

/// Application context that gets passed to command handlers
pub struct Context {
    pub cluster: ClusterService,
    pub output: OutputService,
    resolved: ResolvedContext,
}

impl Context {
    /// Resolve the context and build the transport for it
    pub fn new(config: &EsctlConfig, context_name: Option<&str>, output: OutputService) -> Result<Self> {
        let resolved = config.resolve_context(context_name)?;
        debug!(
            context = %resolved.name,
            cluster = %resolved.cluster_name,
            scheme = resolved.scheme(),
            "Using context"
        );

        let credentials = match &resolved.user {
            Some(user) => credentials(user)
                .with_context(|| format!("Cannot load credentials for context '{}'", resolved.name))?,
            None => None,
        };

        let cluster = ClusterService::new(&resolved, credentials)?;

        Ok(Self {
            cluster,
            output,
            resolved,
        })
    }

    pub fn resolved(&self) -> &ResolvedContext {
        &self.resolved
    }
}

/// Locate and load the configuration file
///
/// Precedence: --config, then ESCTL_CONFIG (both arrive through clap), then
/// ~/.esctlrc.
pub fn load_config(path: Option<&str>) -> Result<(PathBuf, EsctlConfig)> {
    let path = match path {
        Some(raw) => ConfigManager::expand_path(raw)?,
        None => ConfigManager::default_path()?,
    };

    let config = ConfigManager::load_config(&path)
        .with_context(|| format!("Cannot load configuration from {}", path.display()))?;

    Ok((path, config))
}

/// Username and password, the latter possibly coming from a shell command
///
/// Credentials are only sent when both halves are known.
pub fn credentials(user: &UserConfig) -> Result<Option<Credentials>> {
    let password = match (&user.password, user.password_command()) {
        (Some(password), _) => Some(password.clone()),
        (None, Some(command)) => Some(run_password_command(command)?),
        (None, None) => None,
    };

    Ok(match (&user.username, password) {
        (Some(username), Some(password)) => Some(Credentials {
            username: username.clone(),
            password,
        }),
        _ => None,
    })
}

fn run_password_command(command: &str) -> Result<String> {
    debug!("Running external password command");

    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .output()
        .with_context(|| format!("Failed to run password command '{command}'"))?;

    if !output.status.success() {
        bail!(
            "Password command '{command}' exited with {:?}: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    Ok(String::from_utf8(output.stdout)
        .context("Password command printed invalid UTF-8")?
        .trim()
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use esctl_core::config::{ExternalPassword, PasswordCommand};
    use tempfile::TempDir;

    fn user(username: Option<&str>, password: Option<&str>, command: Option<&str>) -> UserConfig {
        UserConfig {
            username: username.map(String::from),
            password: password.map(String::from),
            external_password: command.map(|run| ExternalPassword {
                command: PasswordCommand { run: run.to_string() },
            }),
        }
    }

    #[test]
    fn test_plain_credentials() {
        let credentials = credentials(&user(Some("elastic"), Some("secret"), None)).unwrap();
        assert_eq!(
            credentials,
            Some(Credentials {
                username: "elastic".into(),
                password: "secret".into()
            })
        );
    }

    #[test]
    fn test_incomplete_credentials_are_not_sent() {
        assert_eq!(credentials(&user(Some("elastic"), None, None)).unwrap(), None);
        assert_eq!(credentials(&user(None, Some("secret"), None)).unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_external_password_is_trimmed() {
        let credentials = credentials(&user(Some("elastic"), None, Some("echo '  s3cret  '")))
            .unwrap()
            .unwrap();
        assert_eq!(credentials.password, "s3cret");
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_password_command() {
        assert!(credentials(&user(Some("elastic"), None, Some("exit 3"))).is_err());
    }

    #[test]
    fn test_load_config_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("esctlrc");
        let raw = path.to_string_lossy().to_string();

        let (loaded_path, config) = load_config(Some(&raw)).unwrap();
        assert_eq!(loaded_path, path);
        assert!(path.is_file());
        assert_eq!(config.default_context.as_deref(), Some("localhost"));
    }
}
