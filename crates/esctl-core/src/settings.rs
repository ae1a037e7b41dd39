// crates/esctl-core/src/settings.rs - Settings Resolution
//
// Resolves setting names against the snapshots returned by the settings
// APIs. Nothing here talks to the cluster: callers fetch the snapshot, hand
// it over, and get `Setting` values back.
//
// CLUSTER LEVEL (GET _cluster/settings?include_defaults&flat_settings):
// ```json
// {"transient": {"name": "value"}, "persistent": {...}, "defaults": {...}}
// ```
// A lookup tries the requested tier, then falls back to "defaults". Most
// cluster settings are never set explicitly and only carry a default, so the
// fallback spares every caller from special-casing "unset".
//
// INDEX LEVEL (GET <index>/_settings?include_defaults&flat_settings):
// ```json
// {"my-index": {"settings": {"name": "value"}, "defaults": {...}}}
// ```
// A pattern (literal, comma list or glob) is expanded against the setting
// names of the FIRST index in the response, then resolved for every index.
// Indices with diverging setting sets are not expanded individually.
//
// NOT FOUND IS NOT AN ERROR:
// A missing setting comes back as `Setting { value: None, .. }`. Commands
// that require the setting to exist check for it themselves.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

use crate::projection::{display_value, kind_of};

/// Errors raised when a settings snapshot does not have the expected shape
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettingsError {
    #[error("Settings response for {scope} is not a JSON object (found {found})")]
    NotAnObject { scope: String, found: &'static str },

    #[error("Settings response for {scope} has no '{tier}' section")]
    MissingTier { scope: String, tier: Tier },

    #[error("Invalid setting pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Result type for settings operations
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Where a setting value comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Cluster-level, cleared on full cluster restart
    Transient,
    /// Cluster-level, survives restarts
    Persistent,
    /// Compiled-in default, read-only
    Defaults,
    /// Explicit index-level value
    Settings,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Transient => "transient",
            Tier::Persistent => "persistent",
            Tier::Defaults => "defaults",
            Tier::Settings => "settings",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Writable cluster tiers, selected by `--transient` / `--persistent`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Persistency {
    #[default]
    Transient,
    Persistent,
}

impl Persistency {
    pub fn from_flag(persistent: bool) -> Self {
        if persistent {
            Persistency::Persistent
        } else {
            Persistency::Transient
        }
    }

    pub fn tier(self) -> Tier {
        match self {
            Persistency::Transient => Tier::Transient,
            Persistency::Persistent => Tier::Persistent,
        }
    }

    /// Body for PUT _cluster/settings; `None` resets the setting
    pub fn update_body(self, name: &str, value: Option<Value>) -> Value {
        let mut section = Map::new();
        section.insert(name.to_string(), value.unwrap_or(Value::Null));

        let mut body = Map::new();
        body.insert(self.tier().as_str().to_string(), Value::Object(section));
        Value::Object(body)
    }
}

impl fmt::Display for Persistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.tier(), f)
    }
}

/// Body for PUT <index>/_settings
pub fn index_update_body(name: &str, value: Value) -> Value {
    let mut body = Map::new();
    body.insert(name.to_string(), value);
    Value::Object(body)
}

/// A resolved setting
///
/// `value` is `None` when the setting exists in none of the inspected tiers,
/// in which case `tier` is `None` as well.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Setting {
    pub name: String,
    pub value: Option<Value>,
    pub tier: Option<Tier>,
}

impl Setting {
    pub fn new(name: impl Into<String>, value: Value, tier: Tier) -> Self {
        Self {
            name: name.into(),
            value: Some(value),
            tier: Some(tier),
        }
    }

    pub fn missing(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            tier: None,
        }
    }

    pub fn is_found(&self) -> bool {
        self.value.is_some()
    }

    /// Value as display text, or `fallback` when unresolved
    pub fn value_or(&self, fallback: &str) -> String {
        match &self.value {
            Some(value) => display_value(value),
            None => fallback.to_string(),
        }
    }

    /// Row shape used when settings are projected into tables
    pub fn to_document(&self) -> Map<String, Value> {
        let mut document = Map::new();
        document.insert("name".into(), Value::String(self.name.clone()));
        document.insert("value".into(), self.value.clone().unwrap_or(Value::Null));
        document.insert(
            "tier".into(),
            self.tier
                .map(|tier| Value::String(tier.to_string()))
                .unwrap_or(Value::Null),
        );
        document
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tier = self.tier.map(Tier::as_str).unwrap_or("none");
        write!(f, "{}={}({})", self.name, self.value_or("None"), tier)
    }
}

/// All three cluster tiers of one setting, side by side
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierBreakdown {
    pub transient: Setting,
    pub persistent: Setting,
    pub defaults: Setting,
}

impl TierBreakdown {
    pub fn iter(&self) -> impl Iterator<Item = (Tier, &Setting)> {
        [
            (Tier::Transient, &self.transient),
            (Tier::Persistent, &self.persistent),
            (Tier::Defaults, &self.defaults),
        ]
        .into_iter()
    }
}

/// Snapshot of the cluster-level settings
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClusterSettings {
    transient: Map<String, Value>,
    persistent: Map<String, Value>,
    defaults: Map<String, Value>,
}

impl ClusterSettings {
    /// Parse the verbatim settings response; all three tiers must be present
    pub fn from_value(response: &Value) -> SettingsResult<Self> {
        let scope = "cluster";
        let object = response.as_object().ok_or(SettingsError::NotAnObject {
            scope: scope.to_string(),
            found: kind_of(response),
        })?;

        Ok(Self {
            transient: tier_section(object, Tier::Transient, scope)?,
            persistent: tier_section(object, Tier::Persistent, scope)?,
            defaults: tier_section(object, Tier::Defaults, scope)?,
        })
    }

    pub fn tier(&self, tier: Tier) -> Option<&Map<String, Value>> {
        match tier {
            Tier::Transient => Some(&self.transient),
            Tier::Persistent => Some(&self.persistent),
            Tier::Defaults => Some(&self.defaults),
            Tier::Settings => None,
        }
    }

    /// Requested tier first, then "defaults", then not found
    pub fn get(&self, name: &str, requested: Tier) -> Setting {
        if let Some(setting) = self.get_exact(name, requested) {
            return setting;
        }

        if let Some(value) = self.defaults.get(name) {
            return Setting::new(name, value.clone(), Tier::Defaults);
        }

        Setting::missing(name)
    }

    /// Every tier resolved on its own, without fallback between them
    pub fn mget(&self, name: &str) -> TierBreakdown {
        let resolve = |tier| self.get_exact(name, tier).unwrap_or_else(|| Setting::missing(name));

        TierBreakdown {
            transient: resolve(Tier::Transient),
            persistent: resolve(Tier::Persistent),
            defaults: resolve(Tier::Defaults),
        }
    }

    /// Every setting of every tier, transient first
    pub fn list(&self) -> Vec<Setting> {
        [Tier::Transient, Tier::Persistent, Tier::Defaults]
            .into_iter()
            .flat_map(|tier| {
                self.tier(tier)
                    .into_iter()
                    .flatten()
                    .map(move |(name, value)| Setting::new(name.as_str(), value.clone(), tier))
            })
            .collect()
    }

    fn get_exact(&self, name: &str, tier: Tier) -> Option<Setting> {
        self.tier(tier)?
            .get(name)
            .map(|value| Setting::new(name, value.clone(), tier))
    }
}

/// A request for one or more index settings
#[derive(Debug, Clone)]
pub enum SettingPattern {
    /// Literal names, kept in the order given
    Names(Vec<String>),
    /// Shell glob matched against the known setting names
    Glob(glob::Pattern),
}

impl SettingPattern {
    /// `a*` is a glob, `a,b` a list, anything else a single name
    ///
    /// Every comma-separated entry is a requested name, empty ones included,
    /// so the row count always matches the request.
    pub fn parse(raw: &str) -> SettingsResult<Self> {
        if raw.contains('*') {
            let glob = collapse_stars(raw);
            let pattern = glob::Pattern::new(&glob).map_err(|e| SettingsError::InvalidPattern {
                pattern: raw.to_string(),
                reason: e.to_string(),
            })?;
            return Ok(SettingPattern::Glob(pattern));
        }

        let names = raw.split(',').map(|name| name.trim().to_string()).collect();
        Ok(SettingPattern::Names(names))
    }

    /// Names this pattern stands for, given the known setting names
    pub fn expand<'a>(&self, known: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        match self {
            SettingPattern::Names(names) => names.clone(),
            SettingPattern::Glob(pattern) => known
                .into_iter()
                .filter(|name| pattern.matches(name))
                .map(String::from)
                .collect(),
        }
    }
}

/// `index.**` -> `index.*`
///
/// Setting names are not paths: a run of stars means the same as one star,
/// while `glob` only accepts `**` as a whole path component.
fn collapse_stars(raw: &str) -> String {
    let mut collapsed = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c == '*' && collapsed.ends_with('*') {
            continue;
        }
        collapsed.push(c);
    }
    collapsed
}

/// Explicit and default settings of one index
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndexTiers {
    settings: Map<String, Value>,
    defaults: Map<String, Value>,
}

impl IndexTiers {
    /// Explicit value first, then default, then not found
    pub fn resolve(&self, name: &str) -> Setting {
        if let Some(value) = self.settings.get(name) {
            return Setting::new(name, value.clone(), Tier::Settings);
        }
        if let Some(value) = self.defaults.get(name) {
            return Setting::new(name, value.clone(), Tier::Defaults);
        }
        Setting::missing(name)
    }

    /// Setting names, explicit ones first, each name once
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.settings.keys().map(String::as_str).chain(
            self.defaults
                .keys()
                .filter(|name| !self.settings.contains_key(*name))
                .map(String::as_str),
        )
    }
}

/// Snapshot of the settings of one or more indices
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndexSettings {
    indices: IndexMap<String, IndexTiers>,
}

impl IndexSettings {
    pub fn from_value(response: &Value) -> SettingsResult<Self> {
        let object = response.as_object().ok_or(SettingsError::NotAnObject {
            scope: "indices".to_string(),
            found: kind_of(response),
        })?;

        let mut indices = IndexMap::new();
        for (index_name, index_response) in object {
            let scope = format!("index {index_name}");
            let tiers = index_response.as_object().ok_or(SettingsError::NotAnObject {
                scope: scope.clone(),
                found: kind_of(index_response),
            })?;

            indices.insert(
                index_name.clone(),
                IndexTiers {
                    settings: tier_section(tiers, Tier::Settings, &scope)?,
                    defaults: tier_section(tiers, Tier::Defaults, &scope)?,
                },
            );
        }

        Ok(Self { indices })
    }

    /// Setting names used to expand globs: those of the first index only
    pub fn known_settings(&self) -> Vec<&str> {
        self.indices
            .values()
            .next()
            .map(|tiers| tiers.names().collect())
            .unwrap_or_default()
    }

    /// Resolve a pattern for every index
    ///
    /// Each index gets one entry per expanded name, in pattern order, even
    /// when the name resolves to nothing.
    pub fn get(&self, pattern: &SettingPattern) -> IndexMap<String, Vec<Setting>> {
        let requested = pattern.expand(self.known_settings());

        self.indices
            .iter()
            .map(|(index_name, tiers)| {
                let settings = requested.iter().map(|name| tiers.resolve(name)).collect();
                (index_name.clone(), settings)
            })
            .collect()
    }

    /// Every setting of every index
    pub fn list(&self) -> IndexMap<String, Vec<Setting>> {
        self.indices
            .iter()
            .map(|(index_name, tiers)| {
                let settings = tiers.names().map(|name| tiers.resolve(name)).collect();
                (index_name.clone(), settings)
            })
            .collect()
    }
}

fn tier_section(
    object: &Map<String, Value>,
    tier: Tier,
    scope: &str,
) -> SettingsResult<Map<String, Value>> {
    match object.get(tier.as_str()) {
        Some(Value::Object(section)) => Ok(section.clone()),
        Some(other) => Err(SettingsError::NotAnObject {
            scope: format!("{scope} ({tier})"),
            found: kind_of(other),
        }),
        None => Err(SettingsError::MissingTier {
            scope: scope.to_string(),
            tier,
        }),
    }
}
