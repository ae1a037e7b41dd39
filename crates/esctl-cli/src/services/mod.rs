// crates/esctl-cli/src/services/mod.rs - Service layer modules
pub mod cluster;
pub mod output;

pub use cluster::{ClusterService, Credentials, TransportError};
pub use output::OutputService;
