use anyhow::Result;
use serde_json::Value;
use tracing::debug;

use super::settings;
use crate::cli::LoggingCommands;
use crate::context::Context;

const LOGGER_PREFIX: &str = "logger.";

pub async fn handle(ctx: &Context, cmd: LoggingCommands) -> Result<()> {
    match cmd {
        LoggingCommands::Get {
            logger,
            persistency,
        } => {
            let persistency = persistency.persistency();
            debug!("Persistency is {persistency}");

            let logger = logger_setting(&logger);
            let level = settings::fetch(ctx).await?.get(&logger, persistency.tier());
            ctx.output
                .print_message(&format!("{logger} : {}", level.value_or("")));
            Ok(())
        }
        LoggingCommands::Set {
            logger,
            level,
            persistency,
        } => {
            let logger = logger_setting(&logger);
            ctx.output
                .print_message(&format!("Changing logger {logger} to {level}"));
            let response = settings::update(
                ctx,
                &logger,
                Some(Value::String(level.to_string())),
                persistency.persistency(),
            )
            .await?;
            ctx.output.print_json(&response)
        }
        LoggingCommands::Reset {
            logger,
            persistency,
        } => {
            let logger = logger_setting(&logger);
            ctx.output.print_message(&format!("Resetting logger {logger}"));
            let response = settings::update(ctx, &logger, None, persistency.persistency()).await?;
            ctx.output.print_json(&response)
        }
    }
}

/// `org.elasticsearch.discovery` -> `logger.org.elasticsearch.discovery`
fn logger_setting(logger: &str) -> String {
    if logger.starts_with(LOGGER_PREFIX) {
        logger.to_string()
    } else {
        format!("{LOGGER_PREFIX}{logger}")
    }
}
