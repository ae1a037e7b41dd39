// crates/esctl-cli/src/commands/config.rs - Local configuration commands
//
// These run before any cluster context is built: they only read (or, for
// `context set`, rewrite) the configuration file.

use anyhow::Result;
use esctl_core::config::{ConfigManager, EsctlConfig};
use esctl_core::projection::columns;
use esctl_core::style::Tone;
use serde_json::{Map, Value, json};
use std::path::Path;
use tracing::info;

use crate::cli::{ConfigCommands, ConfigContextCommands, ConfigListCommands};
use crate::services::OutputService;

pub fn handle(
    path: &Path,
    config: &mut EsctlConfig,
    output: &OutputService,
    cmd: ConfigCommands,
) -> Result<()> {
    match cmd {
        ConfigCommands::Cluster(ConfigListCommands::List) => {
            let table = output
                .projector()
                .project_objects(&cluster_rows(config), &columns(["name", "servers"]));
            output.print_table(table)
        }
        ConfigCommands::User(ConfigListCommands::List) => {
            let table = output.projector().project_objects(
                &user_rows(config),
                &columns(["name", "username", "password", "password_command"]),
            );
            output.print_table(table)
        }
        ConfigCommands::Context(ConfigContextCommands::List) => {
            let rows = context_rows(config);
            let mut table = output
                .projector()
                .project_objects(&rows, &columns(["name", "user", "cluster"]));
            table.highlight(&rows, |row| default_context_tones(config, row));
            output.print_table(table)
        }
        ConfigCommands::Context(ConfigContextCommands::Set { name }) => {
            ConfigManager::set_default_context(path, config, &name)?;
            info!("Default context set to {name} in {}", path.display());
            output.print_message(&format!("Default context is now {name}"));
            Ok(())
        }
    }
}

fn cluster_rows(config: &EsctlConfig) -> Vec<Map<String, Value>> {
    config
        .clusters
        .iter()
        .map(|(name, cluster)| row(json!({"name": name, "servers": cluster.servers.join("\n")})))
        .collect()
}

fn user_rows(config: &EsctlConfig) -> Vec<Map<String, Value>> {
    config
        .users
        .iter()
        .map(|(name, user)| {
            row(json!({
                "name": name,
                "username": user.username,
                "password": user.password,
                "password_command": user.password_command(),
            }))
        })
        .collect()
}

fn context_rows(config: &EsctlConfig) -> Vec<Map<String, Value>> {
    config
        .contexts
        .iter()
        .map(|(name, context)| row(json!({"name": name, "user": context.user, "cluster": context.cluster})))
        .collect()
}

/// Every cell of the default context is underlined
fn default_context_tones(config: &EsctlConfig, row: &Map<String, Value>) -> Vec<(&'static str, Tone)> {
    let is_default = row
        .get("name")
        .and_then(Value::as_str)
        .is_some_and(|name| config.default_context.as_deref() == Some(name));

    if is_default {
        vec![("name", Tone::Underline), ("user", Tone::Underline), ("cluster", Tone::Underline)]
    } else {
        Vec::new()
    }
}

fn row(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(object) => object,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EsctlConfig {
        ConfigManager::parse_config(
            r#"
clusters:
  prod:
    servers: [https://es01:9200, https://es02:9200]
  local:
    servers: [http://localhost:9200]
users:
  admin:
    username: elastic
    external_password:
      command:
        run: pass show es
contexts:
  prod:
    cluster: prod
    user: admin
  local:
    cluster: local
default-context: local
"#,
            "test",
        )
        .unwrap()
    }

    #[test]
    fn test_cluster_rows() {
        let rows = cluster_rows(&config());
        assert_eq!(rows[0]["servers"], "https://es01:9200\nhttps://es02:9200");
        assert_eq!(rows[1]["name"], "local");
    }

    #[test]
    fn test_user_rows() {
        let rows = user_rows(&config());
        assert_eq!(rows[0]["password"], Value::Null);
        assert_eq!(rows[0]["password_command"], "pass show es");
    }

    #[test]
    fn test_default_context_is_highlighted() {
        let config = config();
        let rows = context_rows(&config);
        assert_eq!(rows[0]["name"], "prod");
        assert_eq!(rows[1]["user"], Value::Null);

        assert!(default_context_tones(&config, &rows[0]).is_empty());
        assert_eq!(default_context_tones(&config, &rows[1]).len(), 3);
    }
}
