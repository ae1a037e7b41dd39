use anyhow::Result;
use esctl_core::projection::{ColumnSpec, columns, display_value};
use esctl_core::style::Tone;
use serde_json::Value;

use super::{JSON_FORMAT, cat_route, into_rows};
use crate::cli::CatCommands;
use crate::context::Context;

const THREAD_POOL_COUNTERS: [&str; 3] = ["active", "queue", "rejected"];

pub async fn handle(ctx: &Context, cmd: CatCommands) -> Result<()> {
    match cmd {
        CatCommands::Allocation => allocation(ctx).await,
        CatCommands::Plugins => plugins(ctx).await,
        CatCommands::ThreadPool {
            thread_pool_patterns,
            headers,
        } => thread_pool(ctx, thread_pool_patterns.as_deref(), &headers).await,
    }
}

async fn allocation(ctx: &Context) -> Result<()> {
    let nodes = into_rows(ctx.cluster.get("_cat/allocation", &JSON_FORMAT).await?, "nodes")?;

    let mut table = ctx.output.projector().project(
        &nodes,
        &columns([
            ColumnSpec::new("shards"),
            ColumnSpec::new("disk.indices"),
            ColumnSpec::new("disk.used"),
            ColumnSpec::new("disk.avail"),
            ColumnSpec::new("disk.total"),
            ColumnSpec::new("disk.percent"),
            ColumnSpec::new("host"),
            ColumnSpec::labeled("ip", "IP"),
            ColumnSpec::new("node"),
        ]),
    )?;
    table.highlight(&nodes, disk_usage_tone);
    ctx.output.print_table(table)
}

async fn plugins(ctx: &Context) -> Result<()> {
    let mut plugins = into_rows(ctx.cluster.get("_cat/plugins", &JSON_FORMAT).await?, "plugins")?;
    sort_by_node_name(&mut plugins);

    let table = ctx.output.projector().project(
        &plugins,
        &columns([("name", "Node"), ("component", "Plugin"), ("version", "Version")]),
    )?;
    ctx.output.print_table(table)
}

async fn thread_pool(ctx: &Context, patterns: Option<&str>, headers: &str) -> Result<()> {
    let query = [("format", "json"), ("h", headers)];
    let pools = into_rows(
        ctx.cluster.get(&cat_route("thread_pool", patterns), &query).await?,
        "thread pools",
    )?;

    let mut table = ctx
        .output
        .projector()
        .project(&pools, &columns(headers.split(',').map(str::trim)))?;
    table.highlight(&pools, busy_counters);
    ctx.output.print_table(table)
}

/// Red above 85%, yellow above 70%
fn disk_usage_tone(node: &Value) -> Vec<(&'static str, Tone)> {
    node.get("disk.percent")
        .and_then(|percent| display_value(percent).parse::<u64>().ok())
        .and_then(Tone::for_disk_usage)
        .map(|tone| vec![("disk.percent", tone)])
        .unwrap_or_default()
}

fn sort_by_node_name(plugins: &mut [Value]) {
    plugins.sort_by_key(|plugin| plugin.get("name").map(display_value).unwrap_or_default());
}

/// Any non-zero active/queue/rejected counter is red
fn busy_counters(pool: &Value) -> Vec<(&'static str, Tone)> {
    THREAD_POOL_COUNTERS
        .into_iter()
        .filter(|counter| {
            pool.get(*counter)
                .is_some_and(|value| display_value(value).parse::<u64>().is_ok_and(|n| n > 0))
        })
        .map(|counter| (counter, Tone::Red))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_disk_usage_thresholds() {
        assert_eq!(
            disk_usage_tone(&json!({"node": "a", "disk.percent": "90"})),
            [("disk.percent", Tone::Red)]
        );
        assert_eq!(
            disk_usage_tone(&json!({"node": "b", "disk.percent": "75"})),
            [("disk.percent", Tone::Yellow)]
        );
        assert!(disk_usage_tone(&json!({"node": "c", "disk.percent": "10"})).is_empty());
        assert!(disk_usage_tone(&json!({"node": "UNASSIGNED", "disk.percent": null})).is_empty());
    }

    #[test]
    fn test_plugins_sorted_by_node() {
        let mut plugins = vec![
            json!({"name": "es02", "component": "repository-s3"}),
            json!({"name": "es01", "component": "analysis-icu"}),
        ];
        sort_by_node_name(&mut plugins);
        assert_eq!(plugins[0]["name"], "es01");
    }

    #[test]
    fn test_busy_pools() {
        let pool = json!({"name": "write", "active": "2", "queue": "0", "rejected": "5"});
        assert_eq!(busy_counters(&pool), [("active", Tone::Red), ("rejected", Tone::Red)]);
        assert!(busy_counters(&json!({"name": "search", "active": "0"})).is_empty());
    }
}
