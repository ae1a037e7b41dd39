// crates/esctl-cli/src/commands/mod.rs - Command Handler Modules
//
// One module per top-level command. Each handler issues its REST call(s)
// through ctx.cluster, reshapes the response with the core (flatten,
// projection, settings) and renders through ctx.output.
//
// MODULE ORGANIZATION:
// - config, completion: local only, run without a cluster context
// - settings: cluster settings, shared by cluster/logging/node handlers
// - everything else: one REST call per subcommand
//
// Response reshaping lives in plain functions next to each handler so it
// can be tested without a cluster.

use anyhow::{Result, anyhow};
use serde_json::{Map, Value};

pub mod alias;
pub mod cat;
pub mod cluster;
#[cfg(feature = "completions")]
pub mod completion;
pub mod config;
pub mod document;
pub mod index;
pub mod logging;
pub mod migration;
pub mod node;
pub mod raw;
pub mod repository;
pub mod security;
pub mod settings;
pub mod snapshot;
pub mod task;

/// `?format=json`, the query every _cat call uses
pub(crate) const JSON_FORMAT: [(&str, &str); 1] = [("format", "json")];

/// A response that must be a JSON array of documents
pub(crate) fn into_rows(response: Value, what: &str) -> Result<Vec<Value>> {
    match response {
        Value::Array(rows) => Ok(rows),
        other => Err(anyhow!("Expected a list of {what}, got: {other}")),
    }
}

/// A response that must be a JSON object
pub(crate) fn into_object(response: Value, what: &str) -> Result<Map<String, Value>> {
    match response {
        Value::Object(object) => Ok(object),
        other => Err(anyhow!("Expected {what} to be an object, got: {other}")),
    }
}

/// Same object with its keys in lexical order
pub(crate) fn sort_keys(object: Map<String, Value>) -> Map<String, Value> {
    let mut entries: Vec<_> = object.into_iter().collect();
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));
    entries.into_iter().collect()
}

/// `_cat/<api>` or `_cat/<api>/<filter>`
pub(crate) fn cat_route(api: &str, filter: Option<&str>) -> String {
    match filter {
        Some(filter) => format!("_cat/{api}/{filter}"),
        None => format!("_cat/{api}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sort_keys() {
        let object = json!({"b": 1, "a": 2, "c": 3}).as_object().cloned().unwrap();
        let keys: Vec<_> = sort_keys(object).keys().cloned().collect();
        assert_eq!(keys, ["a", "b", "c"]);
    }

    #[test]
    fn test_shape_checks() {
        assert_eq!(into_rows(json!([1, 2]), "nodes").unwrap().len(), 2);
        assert!(into_rows(json!({"a": 1}), "nodes").is_err());
        assert!(into_object(json!([]), "health").is_err());
    }

    #[test]
    fn test_cat_route() {
        assert_eq!(cat_route("indices", None), "_cat/indices");
        assert_eq!(cat_route("aliases", Some("logs")), "_cat/aliases/logs");
    }
}
