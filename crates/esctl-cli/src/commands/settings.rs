// crates/esctl-cli/src/commands/settings.rs - Cluster settings commands
//
// Also home of the fetch/update helpers that `cluster
// routing-allocation-enable`, `logging` and `node exclude` build on.

use anyhow::{Context as AnyhowContext, Result, bail};
use esctl_core::projection::{Table, columns};
use esctl_core::settings::{ClusterSettings, Persistency, Setting, Tier, TierBreakdown};
use esctl_core::style::{Painter, Tone};
use serde_json::{Map, Value};
use tracing::debug;

use crate::cli::ClusterSettingsCommands;
use crate::context::Context;

const SETTINGS_QUERY: [(&str, &str); 2] = [("include_defaults", "true"), ("flat_settings", "true")];

pub async fn handle(ctx: &Context, cmd: ClusterSettingsCommands) -> Result<()> {
    match cmd {
        ClusterSettingsCommands::List => {
            let settings = fetch(ctx).await?;
            let documents: Vec<_> = settings.list().iter().map(Setting::to_document).collect();
            ctx.output.print_table(settings_table(ctx, &documents))
        }
        ClusterSettingsCommands::Get {
            name,
            all: true,
            ..
        } => {
            let breakdown = fetch(ctx).await?.mget(&name);
            ctx.output.print_table(settings_table(ctx, &breakdown_documents(&breakdown)))
        }
        ClusterSettingsCommands::Get {
            name, persistency, ..
        } => {
            let persistency = persistency.persistency();
            debug!("Persistency is {persistency}");

            let setting = fetch(ctx).await?.get(&name, persistency.tier());
            match describe_value(&setting, ctx.output.painter()) {
                Some(line) => {
                    ctx.output.print_message(&line);
                    Ok(())
                }
                None => bail!("{name} does not exist in {persistency} cluster settings"),
            }
        }
        ClusterSettingsCommands::Set {
            name,
            value,
            persistency,
        } => {
            let painter = ctx.output.painter();
            ctx.output.print_message(&format!(
                "Changing {} to {}",
                painter.paint(&name, Tone::Italic),
                painter.paint(&value, Tone::Italic)
            ));
            let response = update(ctx, &name, Some(Value::String(value)), persistency.persistency()).await?;
            ctx.output.print_json(&response)
        }
        ClusterSettingsCommands::Reset { name, persistency } => {
            ctx.output.print_message(&format!(
                "Resetting {} to its default value",
                ctx.output.painter().paint(&name, Tone::Italic)
            ));
            let response = update(ctx, &name, None, persistency.persistency()).await?;
            ctx.output.print_json(&response)
        }
    }
}

/// Current cluster settings, defaults included, with flat names
pub async fn fetch(ctx: &Context) -> Result<ClusterSettings> {
    let response = ctx.cluster.get("_cluster/settings", &SETTINGS_QUERY).await?;
    ClusterSettings::from_value(&response).context("Unexpected cluster settings response")
}

/// PUT one cluster setting; `None` resets it
pub async fn update(
    ctx: &Context,
    name: &str,
    value: Option<Value>,
    persistency: Persistency,
) -> Result<Value> {
    let body = persistency.update_body(name, value);
    debug!(%body, "Updating cluster settings");
    Ok(ctx.cluster.put("_cluster/settings", Some(&body)).await?)
}

/// Name/Value/Tier table of setting documents
pub fn settings_table(ctx: &Context, documents: &[Map<String, Value>]) -> Table {
    ctx.output
        .projector()
        .project_objects(documents, &columns(["name", "value", "tier"]))
}

/// One row per tier, the tier column naming the inspected tier even when unset
fn breakdown_documents(breakdown: &TierBreakdown) -> Vec<Map<String, Value>> {
    breakdown
        .iter()
        .map(|(tier, setting)| {
            let mut document = setting.to_document();
            document.insert("tier".into(), Value::String(tier.to_string()));
            document
        })
        .collect()
}

/// "value", or "value (default)" when it comes from the defaults tier
fn describe_value(setting: &Setting, painter: &dyn Painter) -> Option<String> {
    if !setting.is_found() {
        return None;
    }

    let value = setting.value_or("");
    Some(match setting.tier {
        Some(Tier::Defaults) => format!("{value} ({})", painter.paint("default", Tone::Italic)),
        _ => value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use esctl_core::style::Plain;
    use serde_json::json;

    fn settings() -> ClusterSettings {
        ClusterSettings::from_value(&json!({
            "transient": {"a": "100ms"},
            "persistent": {"a": "200ms"},
            "defaults": {"b": "90%"}
        }))
        .unwrap()
    }

    #[test]
    fn test_describe_value() {
        let settings = settings();
        assert_eq!(
            describe_value(&settings.get("a", Tier::Persistent), &Plain),
            Some("200ms".into())
        );
        assert_eq!(
            describe_value(&settings.get("b", Tier::Transient), &Plain),
            Some("90% (default)".into())
        );
        assert_eq!(describe_value(&settings.get("zzz", Tier::Transient), &Plain), None);
    }

    #[test]
    fn test_breakdown_documents_name_every_tier() {
        let documents = breakdown_documents(&settings().mget("b"));
        let tiers: Vec<_> = documents.iter().map(|d| d["tier"].clone()).collect();
        assert_eq!(tiers, [json!("transient"), json!("persistent"), json!("defaults")]);
        assert_eq!(documents[0]["value"], Value::Null);
        assert_eq!(documents[2]["value"], "90%");
    }
}
