use anyhow::Result;
use esctl_core::flatten::flatten_object;
use esctl_core::projection::fields_from_keys;

use super::into_object;
use crate::cli::DocumentCommands;
use crate::context::Context;

pub async fn handle(ctx: &Context, cmd: DocumentCommands) -> Result<()> {
    match cmd {
        DocumentCommands::Get { index, id } => {
            let response = ctx.cluster.get(&format!("{index}/_doc/{id}"), &[]).await?;
            let document = flatten_object(&into_object(response, "document")?);

            let entity = ctx
                .output
                .projector()
                .project_object(&document, &fields_from_keys(&document));
            ctx.output.print_entity(entity)
        }
    }
}
