use anyhow::Result;
use esctl_core::projection::columns;

use super::{JSON_FORMAT, cat_route, into_rows};
use crate::cli::AliasCommands;
use crate::context::Context;

pub async fn handle(ctx: &Context, cmd: AliasCommands) -> Result<()> {
    match cmd {
        AliasCommands::List { alias } => {
            let aliases = into_rows(
                ctx.cluster
                    .get(&cat_route("aliases", alias.as_deref()), &JSON_FORMAT)
                    .await?,
                "aliases",
            )?;

            let table = ctx.output.projector().project(
                &aliases,
                &columns(["alias", "index", "filter", "routing.index", "routing.search"]),
            )?;
            ctx.output.print_table(table)
        }
    }
}
