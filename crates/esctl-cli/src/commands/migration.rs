use anyhow::Result;
use esctl_core::flatten::flatten_categories;
use esctl_core::projection::columns;

use super::into_object;
use crate::cli::MigrationCommands;
use crate::context::Context;

pub async fn handle(ctx: &Context, cmd: MigrationCommands) -> Result<()> {
    match cmd {
        MigrationCommands::Deprecations => {
            let response = ctx.cluster.get("_migration/deprecations", &[]).await?;
            let deprecations =
                flatten_categories(&into_object(response, "deprecations")?, "kind", "message")?;

            let table = ctx.output.projector().project_objects(
                &deprecations,
                &columns([
                    ("kind", "Kind"),
                    ("level", "Level"),
                    ("message", "Message"),
                    ("url", "Doc"),
                ]),
            );
            ctx.output.print_table(table)
        }
    }
}
