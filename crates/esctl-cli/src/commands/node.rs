use anyhow::Result;
use esctl_core::projection::{ColumnSpec, columns};
use esctl_core::settings::Persistency;
use esctl_core::style::Tone;
use reqwest::Method;
use serde_json::Value;

use super::{JSON_FORMAT, into_rows, settings};
use crate::cli::{NodeCommands, ThreadType};
use crate::context::Context;

pub async fn handle(ctx: &Context, cmd: NodeCommands) -> Result<()> {
    match cmd {
        NodeCommands::List => list(ctx).await,
        NodeCommands::Exclude { by, list } => exclude(ctx, &by, list).await,
        NodeCommands::HotThreads { thread_type } => hot_threads(ctx, thread_type).await,
    }
}

async fn list(ctx: &Context) -> Result<()> {
    let nodes = into_rows(ctx.cluster.get("_cat/nodes", &JSON_FORMAT).await?, "nodes")?;

    let table = ctx.output.projector().project(
        &nodes,
        &columns([
            ColumnSpec::labeled("ip", "IP"),
            ColumnSpec::new("heap.percent"),
            ColumnSpec::new("ram.percent"),
            ColumnSpec::new("cpu"),
            ColumnSpec::new("load_1m"),
            ColumnSpec::new("load_5m"),
            ColumnSpec::new("load_15m"),
            ColumnSpec::labeled("node.role", "Role"),
            ColumnSpec::new("master"),
            ColumnSpec::new("name"),
        ]),
    )?;
    ctx.output.print_table(table)
}

/// Without a list, print the current exclusion; with one, replace it
///
/// Exclusions are always transient.
async fn exclude(ctx: &Context, by: &str, list: Option<String>) -> Result<()> {
    let setting_name = exclusion_setting(by);

    match list {
        None => {
            let setting = settings::fetch(ctx)
                .await?
                .get(&setting_name, Persistency::Transient.tier());
            ctx.output.print_message(&setting.value_or(""));
            Ok(())
        }
        Some(list) => {
            let painter = ctx.output.painter();
            ctx.output.print_message(&format!(
                "Changing node exclusion list ({}) to : {}",
                painter.paint(&setting_name, Tone::Italic),
                painter.paint(&list, Tone::Italic)
            ));
            let response = settings::update(
                ctx,
                &setting_name,
                Some(Value::String(list)),
                Persistency::Transient,
            )
            .await?;
            ctx.output.print_json(&response)
        }
    }
}

async fn hot_threads(ctx: &Context, thread_type: ThreadType) -> Result<()> {
    let threads = ctx
        .cluster
        .request_text(
            Method::GET,
            "_nodes/hot_threads",
            &[("type", thread_type.as_str())],
            None,
        )
        .await?;
    ctx.output.print_message(threads.trim_end());
    Ok(())
}

fn exclusion_setting(by: &str) -> String {
    format!("cluster.routing.allocation.exclude.{by}")
}
