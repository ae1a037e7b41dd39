use anyhow::{Context as AnyhowContext, Result};
use esctl_core::projection::{ColumnSpec, columns};
use esctl_core::settings::{IndexSettings, Setting, SettingPattern, index_update_body};
use esctl_core::style::Tone;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::info;

use super::{JSON_FORMAT, cat_route, into_rows};
use crate::cli::{IndexCommands, IndexSettingsCommands};
use crate::context::Context;
use crate::stdin;

const SETTINGS_QUERY: [(&str, &str); 2] = [("include_defaults", "true"), ("flat_settings", "true")];

pub async fn handle(ctx: &Context, cmd: IndexCommands) -> Result<()> {
    match cmd {
        IndexCommands::List { index } => list(ctx, index.as_deref()).await,
        IndexCommands::Create {
            index,
            configuration,
        } => create(ctx, &index, configuration.as_deref()).await,
        IndexCommands::Open { index } => {
            info!("Opening index {index}");
            let response = ctx.cluster.post(&format!("{index}/_open"), None).await?;
            ctx.output.print_json(&response)
        }
        IndexCommands::Close { index } => {
            info!("Closing index {index}");
            let response = ctx.cluster.post(&format!("{index}/_close"), None).await?;
            ctx.output.print_json(&response)
        }
        IndexCommands::Delete { index } => {
            info!("Deleting index {index}");
            let response = ctx.cluster.delete(&index).await?;
            ctx.output.print_json(&response)
        }
        IndexCommands::Settings(cmd) => settings(ctx, cmd).await,
    }
}

async fn list(ctx: &Context, index: Option<&str>) -> Result<()> {
    let indices = into_rows(
        ctx.cluster.get(&cat_route("indices", index), &JSON_FORMAT).await?,
        "indices",
    )?;

    let mut table = ctx.output.projector().project(
        &indices,
        &columns([
            ColumnSpec::new("index"),
            ColumnSpec::new("health"),
            ColumnSpec::new("status"),
            ColumnSpec::labeled("uuid", "UUID"),
            ColumnSpec::labeled("pri", "Primary"),
            ColumnSpec::labeled("rep", "Replica"),
            ColumnSpec::new("docs.count"),
            ColumnSpec::new("docs.deleted"),
            ColumnSpec::new("store.size"),
            ColumnSpec::labeled("pri.store.size", "Primary Store Size"),
        ]),
    )?;
    table.highlight(&indices, index_tones);
    ctx.output.print_table(table)
}

async fn create(ctx: &Context, index: &str, configuration: Option<&Path>) -> Result<()> {
    let body = stdin::read_document(configuration).context("Cannot read index configuration")?;

    info!("Creating index {index}");
    let response = ctx.cluster.put(index, body.as_ref()).await?;
    ctx.output.print_json(&response)
}

async fn settings(ctx: &Context, cmd: IndexSettingsCommands) -> Result<()> {
    match cmd {
        IndexSettingsCommands::List { index } => {
            let settings = fetch(ctx, &index).await?;
            print_settings(ctx, &settings.list())
        }
        IndexSettingsCommands::Get { index, pattern } => {
            let pattern = SettingPattern::parse(&pattern)?;
            let settings = fetch(ctx, &index).await?;
            print_settings(ctx, &settings.get(&pattern))
        }
        IndexSettingsCommands::Set { index, name, value } => {
            let painter = ctx.output.painter();
            ctx.output.print_message(&format!(
                "Changing {} to {} on {}",
                painter.paint(&name, Tone::Italic),
                painter.paint(&value, Tone::Italic),
                painter.paint(&index, Tone::Italic)
            ));
            let body = index_update_body(&name, Value::String(value));
            let response = ctx
                .cluster
                .put(&format!("{index}/_settings"), Some(&body))
                .await?;
            ctx.output.print_json(&response)
        }
    }
}

async fn fetch(ctx: &Context, index: &str) -> Result<IndexSettings> {
    let response = ctx
        .cluster
        .get(&format!("{index}/_settings"), &SETTINGS_QUERY)
        .await?;
    IndexSettings::from_value(&response).context("Unexpected index settings response")
}

fn print_settings(ctx: &Context, settings: &IndexMap<String, Vec<Setting>>) -> Result<()> {
    let table = ctx
        .output
        .projector()
        .project_objects(&setting_rows(settings), &columns(["index", "name", "value", "tier"]));
    ctx.output.print_table(table)
}

/// One row per (index, setting)
fn setting_rows(settings: &IndexMap<String, Vec<Setting>>) -> Vec<Map<String, Value>> {
    settings
        .iter()
        .flat_map(|(index, settings)| {
            settings.iter().map(move |setting| {
                let mut row = Map::new();
                row.insert("index".into(), Value::String(index.clone()));
                row.extend(setting.to_document());
                row
            })
        })
        .collect()
}

/// Health in its own colour, closed indices in italics
fn index_tones(index: &Value) -> Vec<(&'static str, Tone)> {
    let mut tones = Vec::new();
    if let Some(tone) = index
        .get("health")
        .and_then(Value::as_str)
        .and_then(Tone::for_health)
    {
        tones.push(("health", tone));
    }
    if index.get("status").and_then(Value::as_str) == Some("close") {
        tones.push(("status", Tone::Italic));
    }
    tones
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_setting_rows() {
        let settings = IndexSettings::from_value(&json!({
            "logs": {
                "settings": {"index.number_of_shards": "3"},
                "defaults": {"index.refresh_interval": "1s"}
            },
            "metrics": {
                "settings": {"index.number_of_shards": "1"},
                "defaults": {}
            }
        }))
        .unwrap();

        let rows = setting_rows(&settings.get(&SettingPattern::parse("index.number_of_shards,index.refresh_interval").unwrap()));
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0]["index"], "logs");
        assert_eq!(rows[0]["value"], "3");
        assert_eq!(rows[1]["tier"], "defaults");
        assert_eq!(rows[3]["index"], "metrics");
        assert_eq!(rows[3]["value"], Value::Null);
    }

    #[test]
    fn test_index_tones() {
        assert_eq!(
            index_tones(&json!({"index": "logs", "health": "green", "status": "open"})),
            [("health", Tone::Green)]
        );
        assert_eq!(
            index_tones(&json!({"index": "old", "health": "red", "status": "close"})),
            [("health", Tone::Red), ("status", Tone::Italic)]
        );
    }
}
