// crates/esctl-cli/src/cli.rs - Command-line interface definitions
//
// Pure data: the whole command tree as clap derive structures. Behaviour
// lives in commands/*.rs, one module per top-level command.

use clap::{Args, Parser, Subcommand, ValueEnum};
use esctl_core::settings::Persistency;
use std::fmt;
use std::path::PathBuf;

/// Main CLI structure
#[derive(Parser, Debug)]
#[command(name = "esctl")]
#[command(about = "Administrate Elasticsearch clusters from the command line")]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to ~/.esctlrc)
    #[arg(long, global = true, env = "ESCTL_CONFIG")]
    pub config: Option<String>,

    /// Context to use instead of the configured default-context
    #[arg(long, global = true, env = "ESCTL_CONTEXT")]
    pub context: Option<String>,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(flatten)]
    pub output: OutputArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shaping how results are rendered
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Column to display; repeat to select several, in order
    #[arg(short = 'c', long = "column", global = true)]
    pub columns: Vec<String>,

    /// Column to sort rows on; repeat to sort on several
    #[arg(long = "sort-column", global = true)]
    pub sort_columns: Vec<String>,

    /// Show raw field names instead of human-friendly labels
    #[arg(long, global = true)]
    pub raw_names: bool,

    /// Never colour the output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
    Yaml,
    Value,
}

/// `--persistent` / `--transient`, transient being the default
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct PersistencyArgs {
    /// Target transient settings (default)
    #[arg(long, conflicts_with = "persistent")]
    pub transient: bool,

    /// Target persistent settings
    #[arg(long)]
    pub persistent: bool,
}

impl PersistencyArgs {
    pub fn persistency(&self) -> Persistency {
        Persistency::from_flag(self.persistent)
    }
}

/// Top-level command categories
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compact, tabular views of the _cat APIs
    #[command(subcommand)]
    Cat(CatCommands),

    /// Cluster-wide health, information and settings
    #[command(subcommand)]
    Cluster(ClusterCommands),

    /// Inspect and edit the local configuration file
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Index lifecycle and settings
    #[command(subcommand)]
    Index(IndexCommands),

    /// Get and set logger levels
    #[command(subcommand)]
    Logging(LoggingCommands),

    /// Node listing, exclusion and hot threads
    #[command(subcommand)]
    Node(NodeCommands),

    /// Index aliases
    #[command(subcommand)]
    Alias(AliasCommands),

    /// Snapshot repositories
    #[command(subcommand)]
    Repository(RepositoryCommands),

    /// Snapshots
    #[command(subcommand)]
    Snapshot(SnapshotCommands),

    /// Running tasks
    #[command(subcommand)]
    Task(TaskCommands),

    /// Documents
    #[command(subcommand)]
    Document(DocumentCommands),

    /// Upgrade assistance
    #[command(subcommand)]
    Migration(MigrationCommands),

    /// Native realm roles
    #[command(subcommand)]
    Roles(RolesCommands),

    /// Native realm and built-in users
    #[command(subcommand)]
    Users(UsersCommands),

    /// Perform a raw HTTP call against the cluster
    Raw {
        /// HTTP verb
        #[arg(short = 'X', long = "request", default_value = "GET", value_name = "VERB")]
        verb: String,

        /// Request body; "-" reads it from stdin
        #[arg(short = 'd', long = "data", value_name = "BODY")]
        body: Option<String>,

        /// Route to call, e.g. /_cluster/health
        route: String,
    },

    /// Print a shell completion script
    #[cfg(feature = "completions")]
    Completion {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum CatCommands {
    /// Shards allocated to each data node and their disk space
    Allocation,

    /// Installed plugins across nodes
    Plugins,

    /// Cluster-wide thread pool statistics per node
    ThreadPool {
        /// Comma-separated list of thread pool names or patterns
        #[arg(long)]
        thread_pool_patterns: Option<String>,

        /// Comma-separated list of columns to display
        #[arg(long, default_value = "node_name,name,active,queue,rejected,type")]
        headers: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ClusterCommands {
    /// Explain why a shard is unassigned
    AllocationExplain,

    /// Cluster health
    Health,

    /// Basic information about the cluster
    Info,

    /// Cluster statistics
    Stats,

    /// Get, and optionally set, cluster.routing.allocation.enable
    RoutingAllocationEnable {
        #[arg(value_enum)]
        status: Option<RoutingAllocation>,

        #[command(flatten)]
        persistency: PersistencyArgs,
    },

    /// Cluster-level settings
    #[command(subcommand)]
    Settings(ClusterSettingsCommands),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
#[value(rename_all = "snake_case")]
pub enum RoutingAllocation {
    All,
    Primaries,
    NewPrimaries,
    None,
}

impl RoutingAllocation {
    pub fn as_str(self) -> &'static str {
        match self {
            RoutingAllocation::All => "all",
            RoutingAllocation::Primaries => "primaries",
            RoutingAllocation::NewPrimaries => "new_primaries",
            RoutingAllocation::None => "none",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ClusterSettingsCommands {
    /// Every cluster setting with its tier
    List,

    /// Value of one setting
    Get {
        name: String,

        /// Show the value in every tier
        #[arg(long)]
        all: bool,

        #[command(flatten)]
        persistency: PersistencyArgs,
    },

    /// Change a setting
    Set {
        name: String,
        value: String,

        #[command(flatten)]
        persistency: PersistencyArgs,
    },

    /// Reset a setting to its default value
    Reset {
        name: String,

        #[command(flatten)]
        persistency: PersistencyArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Configured clusters
    #[command(subcommand)]
    Cluster(ConfigListCommands),

    /// Configured users
    #[command(subcommand)]
    User(ConfigListCommands),

    /// Configured contexts
    #[command(subcommand)]
    Context(ConfigContextCommands),
}

#[derive(Subcommand, Debug)]
pub enum ConfigListCommands {
    List,
}

#[derive(Subcommand, Debug)]
pub enum ConfigContextCommands {
    List,

    /// Make a context the default one
    Set { name: String },
}

#[derive(Subcommand, Debug)]
pub enum IndexCommands {
    /// Indices with their health, counts and sizes
    List {
        /// Comma-separated list of index names
        index: Option<String>,
    },

    /// Create an index from a JSON configuration (file or stdin)
    Create {
        index: String,

        /// JSON document with mappings, aliases and settings
        #[arg(long, value_name = "PATH")]
        configuration: Option<PathBuf>,
    },

    /// Open a closed index
    Open { index: String },

    /// Close an index
    Close { index: String },

    /// Delete an index
    Delete { index: String },

    /// Index-level settings
    #[command(subcommand)]
    Settings(IndexSettingsCommands),
}

#[derive(Subcommand, Debug)]
pub enum IndexSettingsCommands {
    /// Every setting of the index, explicit values first
    List { index: String },

    /// Settings matching a name, a comma-separated list or a glob
    Get { index: String, pattern: String },

    /// Change an index setting
    Set {
        index: String,
        name: String,
        value: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum LoggingCommands {
    /// Current level of a logger
    Get {
        logger: String,

        #[command(flatten)]
        persistency: PersistencyArgs,
    },

    /// Change the level of a logger
    Set {
        logger: String,

        #[arg(value_enum)]
        level: LogLevel,

        #[command(flatten)]
        persistency: PersistencyArgs,
    },

    /// Reset a logger to its default level
    Reset {
        logger: String,

        #[command(flatten)]
        persistency: PersistencyArgs,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
#[value(rename_all = "UPPER")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        };
        f.write_str(level)
    }
}

#[derive(Subcommand, Debug)]
pub enum NodeCommands {
    /// Nodes with their load and roles
    List,

    /// Show or set the list of nodes excluded from shard allocation
    Exclude {
        /// Node attribute to match: _ip, _name, _host or a custom one
        #[arg(long, default_value = "_ip")]
        by: String,

        /// Comma-separated list of attribute values to exclude
        list: Option<String>,
    },

    /// Hot threads of every node
    HotThreads {
        #[arg(long = "type", value_enum, default_value_t = ThreadType::Cpu)]
        thread_type: ThreadType,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadType {
    Cpu,
    Wait,
    Block,
}

impl ThreadType {
    pub fn as_str(self) -> &'static str {
        match self {
            ThreadType::Cpu => "cpu",
            ThreadType::Wait => "wait",
            ThreadType::Block => "block",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum AliasCommands {
    List {
        /// Comma-separated list of alias names
        alias: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum RepositoryCommands {
    /// Registered snapshot repositories
    List,

    /// Configuration of one repository
    Show { repository: String },

    /// Check that every node can access a repository
    Verify { repository: String },
}

#[derive(Subcommand, Debug)]
pub enum SnapshotCommands {
    List {
        /// Repository name, list or wildcard expression
        repository: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    List {
        /// Comma-separated list of actions to return
        #[arg(long)]
        actions: Option<String>,

        /// Return detailed task information
        #[arg(long)]
        detailed: bool,

        /// Only tasks with this parent (node_id:task_number)
        #[arg(long)]
        parent_task_id: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum DocumentCommands {
    Get { index: String, id: String },
}

#[derive(Subcommand, Debug)]
pub enum MigrationCommands {
    /// Settings and features that will break on the next major version
    Deprecations,
}

#[derive(Subcommand, Debug)]
pub enum RolesCommands {
    Get {
        /// Comma-separated list of roles
        roles: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum UsersCommands {
    Get {
        /// Comma-separated list of usernames
        users: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_persistency_flags() {
        let cli = Cli::try_parse_from(["esctl", "cluster", "settings", "set", "a", "1", "--persistent"])
            .unwrap();
        match cli.command {
            Commands::Cluster(ClusterCommands::Settings(ClusterSettingsCommands::Set {
                persistency,
                ..
            })) => assert_eq!(persistency.persistency(), Persistency::Persistent),
            other => panic!("unexpected command {other:?}"),
        }

        assert!(
            Cli::try_parse_from([
                "esctl", "logging", "get", "x", "--persistent", "--transient"
            ])
            .is_err()
        );
    }

    #[test]
    fn test_global_output_flags() {
        let cli = Cli::try_parse_from([
            "esctl", "node", "list", "-f", "csv", "-c", "Name", "-c", "IP", "--raw-names",
        ])
        .unwrap();
        assert_eq!(cli.output.format, OutputFormat::Csv);
        assert_eq!(cli.output.columns, ["Name", "IP"]);
        assert!(cli.output.raw_names);
    }

    #[test]
    fn test_value_enums() {
        let cli = Cli::try_parse_from(["esctl", "logging", "set", "org.foo", "DEBUG"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Logging(LoggingCommands::Set {
                level: LogLevel::Debug,
                ..
            })
        ));

        let cli =
            Cli::try_parse_from(["esctl", "cluster", "routing-allocation-enable", "new_primaries"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Cluster(ClusterCommands::RoutingAllocationEnable {
                status: Some(RoutingAllocation::NewPrimaries),
                ..
            })
        ));

        assert!(Cli::try_parse_from(["esctl", "logging", "set", "org.foo", "LOUD"]).is_err());
    }
}
