use anyhow::Result;
use esctl_core::projection::columns;
use esctl_core::style::Tone;
use serde_json::Value;

use super::{JSON_FORMAT, cat_route, into_rows};
use crate::cli::SnapshotCommands;
use crate::context::Context;

pub async fn handle(ctx: &Context, cmd: SnapshotCommands) -> Result<()> {
    match cmd {
        SnapshotCommands::List { repository } => {
            let snapshots = into_rows(
                ctx.cluster
                    .get(&cat_route("snapshots", Some(repository.as_str())), &JSON_FORMAT)
                    .await?,
                "snapshots",
            )?;

            let mut table = ctx.output.projector().project(
                &snapshots,
                &columns([
                    "id",
                    "status",
                    "start_time",
                    "end_time",
                    "duration",
                    "indices",
                    "successful_shards",
                    "failed_shards",
                    "total_shards",
                ]),
            )?;
            table.highlight(&snapshots, snapshot_tones);
            ctx.output.print_table(table)
        }
    }
}

/// Partial snapshots in yellow with their failures in red, running ones in cyan
fn snapshot_tones(snapshot: &Value) -> Vec<(&'static str, Tone)> {
    match snapshot.get("status").and_then(Value::as_str) {
        Some("PARTIAL") => vec![("status", Tone::Yellow), ("failed_shards", Tone::Red)],
        Some("FAILED") => vec![("status", Tone::Red)],
        Some("IN_PROGRESS") => vec![("status", Tone::Cyan)],
        _ => Vec::new(),
    }
}
