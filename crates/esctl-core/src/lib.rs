// crates/esctl-core/src/lib.rs - Core Library
//
// Everything esctl does that does not touch the network: turning cluster
// responses into tables and entities, resolving settings across tiers, and
// loading the YAML configuration.
//
// PIPELINE:
// raw JSON -> flatten (optional) -> projection (labels from naming) -> Table/Entity
//
// Commands tag cells with a `style::Tone`; the renderer paints them through
// the `style::Painter` capability, so this crate never needs to know which
// renderer is in use.

pub mod config;
pub mod flatten;
pub mod naming;
pub mod projection;
pub mod settings;
pub mod style;

pub use config::{ConfigError, ConfigManager, EsctlConfig, ResolvedContext};
pub use projection::{ColumnSpec, Entity, Projector, Table, columns};
pub use settings::{ClusterSettings, IndexSettings, Persistency, Setting, SettingPattern, Tier};
pub use style::{Painter, Plain, Tone};
