use anyhow::{Result, anyhow};
use esctl_core::flatten::flatten_object;
use esctl_core::projection::{columns, fields_from_keys};

use super::{JSON_FORMAT, into_object, into_rows};
use crate::cli::RepositoryCommands;
use crate::context::Context;

pub async fn handle(ctx: &Context, cmd: RepositoryCommands) -> Result<()> {
    match cmd {
        RepositoryCommands::List => {
            let repositories = into_rows(
                ctx.cluster.get("_cat/repositories", &JSON_FORMAT).await?,
                "repositories",
            )?;
            let table = ctx
                .output
                .projector()
                .project(&repositories, &columns([("id", "Name"), ("type", "Type")]))?;
            ctx.output.print_table(table)
        }
        RepositoryCommands::Show { repository } => {
            let mut response =
                into_object(ctx.cluster.get(&format!("_snapshot/{repository}"), &[]).await?, "repositories")?;
            let definition = response
                .shift_remove(&repository)
                .ok_or_else(|| anyhow!("Repository {repository} not found in response"))?;
            let definition = flatten_object(&into_object(definition, "repository")?);

            let entity = ctx
                .output
                .projector()
                .project_object(&definition, &fields_from_keys(&definition));
            ctx.output.print_entity(entity)
        }
        RepositoryCommands::Verify { repository } => {
            let response = ctx
                .cluster
                .post(&format!("_snapshot/{repository}/_verify"), None)
                .await?;
            ctx.output.print_json(&response)
        }
    }
}
