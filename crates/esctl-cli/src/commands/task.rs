use anyhow::{Result, anyhow};
use chrono::DateTime;
use esctl_core::projection::{ColumnSpec, columns};
use serde_json::{Map, Value};

use super::into_object;
use crate::cli::TaskCommands;
use crate::context::Context;

pub async fn handle(ctx: &Context, cmd: TaskCommands) -> Result<()> {
    match cmd {
        TaskCommands::List {
            actions,
            detailed,
            parent_task_id,
        } => {
            let mut query = vec![("detailed", if detailed { "true" } else { "false" })];
            if let Some(actions) = actions.as_deref() {
                query.push(("actions", actions));
            }
            if let Some(parent) = parent_task_id.as_deref() {
                query.push(("parent_task_id", parent));
            }

            let response = into_object(ctx.cluster.get("_tasks", &query).await?, "tasks")?;
            let nodes = match response.get("nodes") {
                Some(Value::Object(nodes)) => nodes.clone(),
                _ => Map::new(),
            };
            let tasks = flatten_tasks(&nodes)?;

            let table = ctx.output.projector().project_objects(
                &tasks,
                &columns([
                    ColumnSpec::new("name"),
                    ColumnSpec::new("node"),
                    ColumnSpec::labeled("id", "ID"),
                    ColumnSpec::new("type"),
                    ColumnSpec::new("action"),
                    ColumnSpec::labeled("start_time_human_readable", "Start Time"),
                    ColumnSpec::new("running_time_in_nanos"),
                    ColumnSpec::new("parent_task_id"),
                    ColumnSpec::new("cancellable"),
                    ColumnSpec::new("headers"),
                ]),
            );
            ctx.output.print_table(table)
        }
    }
}

/// One row per task across all nodes
///
/// Rows are named after their task key, get an empty parent when they have
/// none and a readable start time.
fn flatten_tasks(nodes: &Map<String, Value>) -> Result<Vec<Map<String, Value>>> {
    let mut rows = Vec::new();

    for (node_id, node) in nodes {
        let Some(tasks) = node.get("tasks").and_then(Value::as_object) else {
            continue;
        };

        for (task_name, task) in tasks {
            let mut row = task
                .as_object()
                .cloned()
                .ok_or_else(|| anyhow!("Task {task_name} on node {node_id} is not an object"))?;

            row.insert("name".into(), Value::String(task_name.clone()));
            row.entry("parent_task_id")
                .or_insert_with(|| Value::String(String::new()));

            let start = row
                .get("start_time_in_millis")
                .and_then(Value::as_i64)
                .map(format_timestamp_millis)
                .unwrap_or_default();
            row.insert("start_time_human_readable".into(), Value::String(start));

            rows.push(row);
        }
    }

    Ok(rows)
}

/// UTC `YYYY-mm-dd HH:MM:SS.mmm`
fn format_timestamp_millis(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|time| time.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
        .unwrap_or_default()
}
