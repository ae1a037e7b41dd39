use anyhow::{Context as AnyhowContext, Result};
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use crate::context::Context;
use crate::stdin;

/// Any verb on any route; JSON answers are pretty-printed, text is passed through
pub async fn handle(ctx: &Context, verb: &str, body: Option<&str>, route: &str) -> Result<()> {
    let method = Method::from_bytes(verb.to_uppercase().as_bytes())
        .with_context(|| format!("Invalid HTTP verb '{verb}'"))?;
    let body = stdin::read_body_arg(body)?;

    debug!(%method, route, "Raw call");
    let response = ctx
        .cluster
        .request_text(method, route, &[], body.as_ref())
        .await?;

    match serde_json::from_str::<Value>(&response) {
        Ok(json) => ctx.output.print_json(&json),
        Err(_) => {
            ctx.output.print_message(response.trim_end());
            Ok(())
        }
    }
}
