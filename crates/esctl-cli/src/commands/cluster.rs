use anyhow::Result;
use esctl_core::flatten::{expand_list_attributes, flatten_object};
use esctl_core::projection::{ColumnSpec, Entity, fields_from_keys};
use esctl_core::style::Tone;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{into_object, settings, sort_keys};
use crate::cli::{ClusterCommands, PersistencyArgs, RoutingAllocation};
use crate::context::Context;
use crate::services::TransportError;

const ROUTING_ALLOCATION_ENABLE: &str = "cluster.routing.allocation.enable";

/// List-of-objects attributes of the cluster stats, expanded to one key per element
const STATS_LIST_ATTRIBUTES: [&str; 6] = [
    "nodes.jvm.versions",
    "nodes.os.cpu",
    "nodes.plugins",
    "nodes.os.names",
    "nodes.os.pretty_names",
    "nodes.packaging_types",
];

pub async fn handle(ctx: &Context, cmd: ClusterCommands) -> Result<()> {
    match cmd {
        ClusterCommands::AllocationExplain => allocation_explain(ctx).await,
        ClusterCommands::Health => health(ctx).await,
        ClusterCommands::Info => info(ctx).await,
        ClusterCommands::Stats => stats(ctx).await,
        ClusterCommands::RoutingAllocationEnable {
            status,
            persistency,
        } => routing_allocation_enable(ctx, status, persistency).await,
        ClusterCommands::Settings(cmd) => settings::handle(ctx, cmd).await,
    }
}

async fn allocation_explain(ctx: &Context) -> Result<()> {
    let response = match ctx.cluster.get("_cluster/allocation/explain", &[]).await {
        Ok(response) => response,
        Err(TransportError::Status { status: 400, .. }) => {
            warn!(
                "Unable to find any unassigned shards to explain. \
                 This may indicate that all shards are allocated."
            );
            return ctx.output.print_entity(Entity::default());
        }
        Err(e) => return Err(e.into()),
    };

    let explanation = into_object(response, "allocation explanation")?;
    let (document, fields) = explain_document(&explanation);
    ctx.output
        .print_entity(ctx.output.projector().project_object(&document, &fields))
}

async fn health(ctx: &Context) -> Result<()> {
    let health = sort_keys(into_object(ctx.cluster.get("_cluster/health", &[]).await?, "health")?);
    let mut entity = ctx
        .output
        .projector()
        .project_object(&health, &fields_from_keys(&health));
    if let Some(tone) = status_tone(&health) {
        entity.highlight("status", tone);
    }
    ctx.output.print_entity(entity)
}

async fn info(ctx: &Context) -> Result<()> {
    debug!("Fetching information about cluster {}", ctx.resolved().cluster_name);
    let info = flatten_object(&into_object(ctx.cluster.get("/", &[]).await?, "cluster info")?);
    show_all(ctx, &info)
}

async fn stats(ctx: &Context) -> Result<()> {
    let stats = into_object(ctx.cluster.get("_cluster/stats", &[]).await?, "cluster stats")?;
    show_all(ctx, &flatten_stats(&stats)?)
}

async fn routing_allocation_enable(
    ctx: &Context,
    status: Option<RoutingAllocation>,
    persistency: PersistencyArgs,
) -> Result<()> {
    let persistency = persistency.persistency();

    if let Some(status) = status {
        settings::update(
            ctx,
            ROUTING_ALLOCATION_ENABLE,
            Some(Value::String(status.as_str().to_string())),
            persistency,
        )
        .await?;
    }

    let setting = settings::fetch(ctx)
        .await?
        .get(ROUTING_ALLOCATION_ENABLE, persistency.tier());
    let document = setting.to_document();
    show_all(ctx, &document)
}

/// Every key of `document`, in its order
fn show_all(ctx: &Context, document: &Map<String, Value>) -> Result<()> {
    let entity = ctx
        .output
        .projector()
        .project_object(document, &fields_from_keys(document));
    ctx.output.print_entity(entity)
}

fn status_tone(health: &Map<String, Value>) -> Option<Tone> {
    health
        .get("status")
        .and_then(Value::as_str)
        .and_then(Tone::for_health)
}

/// Flattened stats, list attributes expanded, keys sorted
fn flatten_stats(stats: &Map<String, Value>) -> Result<Map<String, Value>> {
    let flat = flatten_object(stats);
    Ok(sort_keys(expand_list_attributes(&flat, &STATS_LIST_ATTRIBUTES)?))
}

/// Summary of an allocation explanation plus one line per node decision
///
/// Node names are used verbatim as labels.
fn explain_document(explanation: &Map<String, Value>) -> (Map<String, Value>, Vec<ColumnSpec>) {
    let unassigned = |key: &str| {
        explanation
            .get("unassigned_info")
            .and_then(|info| info.get(key))
            .cloned()
            .unwrap_or(Value::Null)
    };

    let mut document = Map::new();
    let mut fields = Vec::new();
    let mut push = |key: &str, value: Value, spec: ColumnSpec| {
        document.insert(key.to_string(), value);
        fields.push(spec);
    };

    let field = |key: &str| explanation.get(key).cloned().unwrap_or(Value::Null);
    push("index", field("index"), ColumnSpec::new("index"));
    push("shard", field("shard"), ColumnSpec::new("shard"));
    push("primary", field("primary"), ColumnSpec::new("primary"));
    push("can_allocate", field("can_allocate"), ColumnSpec::new("can_allocate"));
    push(
        "allocate_explanation",
        field("allocate_explanation"),
        ColumnSpec::labeled("allocate_explanation", "Explanation"),
    );
    push(
        "last_allocation_status",
        unassigned("last_allocation_status"),
        ColumnSpec::new("last_allocation_status"),
    );
    push("reason", unassigned("reason"), ColumnSpec::new("reason"));

    let decisions = explanation
        .get("node_allocation_decisions")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    for decision in decisions {
        let Some(node) = decision.get("node_name").and_then(Value::as_str) else {
            continue;
        };
        let verdict = decision
            .get("deciders")
            .and_then(|deciders| deciders.get(0))
            .and_then(|decider| decider.get("explanation"))
            .cloned()
            .unwrap_or(Value::Null);
        let key = format!("node:{node}");
        push(&key, verdict, ColumnSpec::labeled(key.clone(), node));
    }

    (document, fields)
}
