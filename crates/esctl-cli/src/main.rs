// crates/esctl-cli/src/main.rs - CLI Application Entry Point
//
// esctl administrates an Elasticsearch cluster from the command line. Each
// subcommand maps to one REST call (or a couple of them) and renders the
// JSON answer as a table, a key/value view or raw text.
//
// ARCHITECTURE OVERVIEW:
// ┌─────────────────┐    ┌──────────────────┐    ┌─────────────────────┐
// │   User Input    │───▶│   CLI Parser     │───▶│  Command Handlers   │
// │ (clap commands) │    │ (main function)  │    │ (commands/*.rs)     │
// └─────────────────┘    └──────────────────┘    └─────────────────────┘
//                                 │                        │
//                                 ▼                        ▼
//                        ┌──────────────────┐    ┌─────────────────────┐
//                        │     Context      │    │     Services        │
//                        │ (config + output)│    │ (transport, output) │
//                        └──────────────────┘    └─────────────────────┘
//
// STARTUP ORDER:
// 1. parse arguments, set up logging
// 2. completion: needs nothing else
// 3. config: needs the configuration file only
// 4. everything else: resolve the context, build the transport, run the
//    handler on a single-threaded tokio runtime
//
// EXAMPLE USAGE:
// ```bash
// esctl cluster health
// esctl --context prod index list 'logs-*' -f json | jq '.[].Index'
// esctl cluster settings get cluster.routing.allocation.enable --all
// esctl index settings get logs 'index.routing.*'
// ```

use anyhow::Result;
use clap::Parser;
use tracing::Level;

mod cli; // Command-line interface definitions (pure data structures)
mod commands; // Command implementations
mod context; // Application context and dependency injection
mod services; // Cluster transport and output rendering
mod stdin; // Request bodies from files or stdin

use cli::{Cli, Commands};
use context::Context;
use services::OutputService;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    #[cfg(feature = "completions")]
    {
        if let Commands::Completion { shell } = &cli.command {
            return commands::completion::handle(*shell);
        }
    }

    let (config_path, mut config) = context::load_config(cli.config.as_deref())?;
    let output = OutputService::new(cli.output.clone());

    match cli.command {
        // Local commands never need a reachable cluster
        Commands::Config(cmd) => commands::config::handle(&config_path, &mut config, &output, cmd),
        command => {
            let ctx = Context::new(&config, cli.context.as_deref(), output)?;
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(run(&ctx, command))
        }
    }
}

/// Dispatch a cluster command to its handler
async fn run(ctx: &Context, command: Commands) -> Result<()> {
    match command {
        Commands::Cat(cmd) => commands::cat::handle(ctx, cmd).await,
        Commands::Cluster(cmd) => commands::cluster::handle(ctx, cmd).await,
        Commands::Index(cmd) => commands::index::handle(ctx, cmd).await,
        Commands::Logging(cmd) => commands::logging::handle(ctx, cmd).await,
        Commands::Node(cmd) => commands::node::handle(ctx, cmd).await,
        Commands::Alias(cmd) => commands::alias::handle(ctx, cmd).await,
        Commands::Repository(cmd) => commands::repository::handle(ctx, cmd).await,
        Commands::Snapshot(cmd) => commands::snapshot::handle(ctx, cmd).await,
        Commands::Task(cmd) => commands::task::handle(ctx, cmd).await,
        Commands::Document(cmd) => commands::document::handle(ctx, cmd).await,
        Commands::Migration(cmd) => commands::migration::handle(ctx, cmd).await,
        Commands::Roles(cmd) => commands::security::handle_roles(ctx, cmd).await,
        Commands::Users(cmd) => commands::security::handle_users(ctx, cmd).await,
        Commands::Raw { verb, body, route } => {
            commands::raw::handle(ctx, &verb, body.as_deref(), &route).await
        }
        Commands::Config(_) => unreachable!(), // Handled before the context is built
        #[cfg(feature = "completions")]
        Commands::Completion { .. } => unreachable!(), // Handled before the context is built
    }
}

/// Logs go to stderr so that stdout stays pipeable
///
/// -q: errors only, default: warnings, -v: info, -vv and more: debug
fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::WARN,
        (false, 1) => Level::INFO,
        (false, _) => Level::DEBUG,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
