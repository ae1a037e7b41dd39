// crates/esctl-core/src/flatten.rs - Response Flattening
//
// The projector only does flat key lookups, but cluster responses are
// nested objects, lists of objects and maps of lists. These functions
// normalize those shapes into flat objects.
//
// SHAPES HANDLED:
// - nested object   {"version": {"number": "7.0.1"}}  -> {"version.number": "7.0.1"}
// - list of objects [{"count": 1}, {"count": 2}]      -> {"[0].count": 1, "[1].count": 2}
// - map of lists    {"idx": [{"message": "m"}]}       -> [{"message": "[idx] m"}]
//
// Arrays met while flattening an object are copied as-is; callers that want
// them expanded name them explicitly (see `expand_list_attributes`).

use serde_json::{Map, Value};
use thiserror::Error;

use crate::projection::{display_value, kind_of};

/// Raised when an element that must be an object is something else
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlattenError {
    #[error("Expected a JSON object at '{path}' but found {found}")]
    NotAnObject { path: String, found: &'static str },

    #[error("Expected a list or a map of lists at '{path}' but found {found}")]
    UnexpectedShape { path: String, found: &'static str },
}

/// Result type for flattening operations
pub type FlattenResult<T> = Result<T, FlattenError>;

/// Join nested object keys with `.`
pub fn flatten_object(object: &Map<String, Value>) -> Map<String, Value> {
    let mut flat = Map::new();
    flatten_into(None, object, &mut flat);
    flat
}

fn flatten_into(prefix: Option<&str>, object: &Map<String, Value>, flat: &mut Map<String, Value>) {
    for (key, value) in object {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key.clone(),
        };

        match value {
            Value::Object(inner) => flatten_into(Some(&path), inner, flat),
            other => {
                flat.insert(path, other.clone());
            }
        }
    }
}

/// Flatten a list of objects into `[i].attribute` keys
pub fn flatten_list_of_objects(list: &[Value]) -> FlattenResult<Map<String, Value>> {
    let mut flat = Map::new();

    for (index, element) in list.iter().enumerate() {
        let object = expect_object(element, || format!("[{index}]"))?;
        for (key, value) in flatten_object(object) {
            flat.insert(format!("[{index}].{key}"), value);
        }
    }

    Ok(flat)
}

/// One row per (outer key, element), with `field` prefixed by `[outer key]`
///
/// The outer key is dropped as a column, so the prefix keeps each row
/// self-describing. An element without `field` gets the bare prefix.
pub fn flatten_map_of_lists(
    map_of_lists: &Map<String, Value>,
    field: &str,
) -> FlattenResult<Vec<Map<String, Value>>> {
    let mut rows = Vec::new();

    for (outer_key, list) in map_of_lists {
        let elements = list.as_array().ok_or_else(|| FlattenError::UnexpectedShape {
            path: outer_key.clone(),
            found: kind_of(list),
        })?;

        for (index, element) in elements.iter().enumerate() {
            let mut row = expect_object(element, || format!("{outer_key}[{index}]"))?.clone();
            let prefixed = match row.get(field) {
                Some(existing) => format!("[{outer_key}] {}", display_value(existing)),
                None => format!("[{outer_key}]"),
            };
            row.insert(field.to_string(), Value::String(prefixed));
            rows.push(row);
        }
    }

    Ok(rows)
}

/// Flatten a category -> (list | map of lists) payload into tagged rows
///
/// Each row carries its category name in `kind_field`. Categories shaped as
/// a map of lists go through `flatten_map_of_lists` on `prefix_field` first.
/// This is the shape of the deprecation info API:
///
/// ```
/// use esctl_core::flatten::flatten_categories;
/// use serde_json::json;
///
/// let payload = json!({
///     "cluster_settings": [{"level": "critical", "message": "m1"}],
///     "index_settings": {"logs": [{"level": "warning", "message": "m2"}]}
/// });
/// let rows = flatten_categories(payload.as_object().unwrap(), "kind", "message").unwrap();
/// assert_eq!(rows[1]["kind"], "index_settings");
/// assert_eq!(rows[1]["message"], "[logs] m2");
/// ```
pub fn flatten_categories(
    payload: &Map<String, Value>,
    kind_field: &str,
    prefix_field: &str,
) -> FlattenResult<Vec<Map<String, Value>>> {
    let mut rows = Vec::new();

    for (category, content) in payload {
        let elements = match content {
            Value::Array(list) => list
                .iter()
                .enumerate()
                .map(|(index, element)| {
                    expect_object(element, || format!("{category}[{index}]")).cloned()
                })
                .collect::<FlattenResult<Vec<_>>>()?,
            Value::Object(map_of_lists) => flatten_map_of_lists(map_of_lists, prefix_field)
                .map_err(|e| nest_path(e, category))?,
            other => {
                return Err(FlattenError::UnexpectedShape {
                    path: category.clone(),
                    found: kind_of(other),
                });
            }
        };

        for element in elements {
            let mut row = Map::new();
            row.insert(kind_field.to_string(), Value::String(category.clone()));
            for (key, value) in element {
                if key != kind_field {
                    row.insert(key, value);
                }
            }
            rows.push(row);
        }
    }

    Ok(rows)
}

/// Replace list-of-objects attributes of a flat object by their expansion
///
/// `nodes.jvm.versions: [{"version": "11"}]` becomes
/// `nodes.jvm.versions[0].version: "11"`. Attributes that are absent or not
/// lists are left alone.
pub fn expand_list_attributes(
    flat: &Map<String, Value>,
    attributes: &[&str],
) -> FlattenResult<Map<String, Value>> {
    let mut expanded = flat.clone();

    for attribute in attributes {
        let Some(Value::Array(list)) = flat.get(*attribute) else {
            continue;
        };

        let entries = flatten_list_of_objects(list).map_err(|e| nest_path(e, attribute))?;
        expanded.shift_remove(*attribute);
        for (key, value) in entries {
            expanded.insert(format!("{attribute}{key}"), value);
        }
    }

    Ok(expanded)
}

fn expect_object<'a>(
    value: &'a Value,
    path: impl FnOnce() -> String,
) -> FlattenResult<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| FlattenError::NotAnObject {
        path: path(),
        found: kind_of(value),
    })
}

fn nest_path(error: FlattenError, parent: &str) -> FlattenError {
    match error {
        FlattenError::NotAnObject { path, found } => FlattenError::NotAnObject {
            path: format!("{parent}.{path}"),
            found,
        },
        FlattenError::UnexpectedShape { path, found } => FlattenError::UnexpectedShape {
            path: format!("{parent}.{path}"),
            found,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::{Projector, columns};
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_flatten_nested_object() {
        let info = object(json!({
            "name": "es01",
            "version": {"number": "7.0.1", "build": {"flavor": "default"}},
            "tags": ["a", "b"]
        }));

        let flat = flatten_object(&info);
        assert_eq!(
            flat,
            object(json!({
                "name": "es01",
                "version.number": "7.0.1",
                "version.build.flavor": "default",
                "tags": ["a", "b"]
            }))
        );
    }

    #[test]
    fn test_flatten_list_of_objects() {
        let versions = vec![
            json!({"version": "11.0.2", "count": 2}),
            json!({"version": "17.0.1", "count": 1}),
        ];
        let flat = flatten_list_of_objects(&versions).unwrap();
        assert_eq!(flat["[0].version"], "11.0.2");
        assert_eq!(flat["[1].count"], 1);
        assert_eq!(flat.len(), 4);
    }

    #[test]
    fn test_flatten_list_rejects_scalars() {
        let err = flatten_list_of_objects(&[json!({"a": 1}), json!(3)]).unwrap_err();
        assert_eq!(
            err,
            FlattenError::NotAnObject {
                path: "[1]".into(),
                found: "number"
            }
        );
    }

    #[test]
    fn test_flatten_map_of_lists() {
        let map = object(json!({
            "logs:apache": [{"level": "warning", "message": "Index name cannot contain ':'"}],
            "foobar": [
                {"level": "critical", "message": "Foo bar baz qux."},
                {"level": "warning"}
            ]
        }));

        let rows = flatten_map_of_lists(&map, "message").unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["message"], "[logs:apache] Index name cannot contain ':'");
        assert_eq!(rows[1]["message"], "[foobar] Foo bar baz qux.");
        assert_eq!(rows[2]["message"], "[foobar]");
    }

    #[test]
    fn test_deprecations_end_to_end() {
        let url = "https://www.elastic.co/guide/en/elasticsearch/reference/7.17/breaking-changes-7.0.html";
        let payload = object(json!({
            "cluster_settings": [
                {"level": "critical", "message": "Cluster name cannot contain ':'", "url": url,
                 "details": "This cluster is named [mycompany:logging]"}
            ],
            "node_settings": [],
            "index_settings": {
                "logs:apache": [
                    {"level": "warning", "message": "Index name cannot contain ':'", "url": url}
                ],
                "foobar": [
                    {"level": "critical", "message": "Foo bar baz qux.", "url": url},
                    {"level": "warning", "message": "Index name cannot contain ':'", "url": url}
                ]
            },
            "ml_settings": []
        }));

        let rows = flatten_categories(&payload, "kind", "message").unwrap();
        let table = Projector::new().project_objects(
            &rows,
            &columns([("kind", "Kind"), ("level", "Level"), ("message", "Message"), ("url", "Doc")]),
        );

        assert_eq!(table.headers(), ["Kind", "Level", "Message", "Doc"]);
        assert_eq!(table.len(), 4);

        let expected = [
            ("cluster_settings", "critical", "Cluster name cannot contain ':'"),
            ("index_settings", "warning", "[logs:apache] Index name cannot contain ':'"),
            ("index_settings", "critical", "[foobar] Foo bar baz qux."),
            ("index_settings", "warning", "[foobar] Index name cannot contain ':'"),
        ];
        for (row, (kind, level, message)) in table.rows().iter().zip(expected) {
            assert_eq!(row[0], kind);
            assert_eq!(row[1], level);
            assert_eq!(row[2], message);
            assert_eq!(row[3], url);
        }
    }

    #[test]
    fn test_categories_reject_scalars() {
        let payload = object(json!({"cluster_settings": "oops"}));
        let err = flatten_categories(&payload, "kind", "message").unwrap_err();
        assert_eq!(
            err,
            FlattenError::UnexpectedShape {
                path: "cluster_settings".into(),
                found: "string"
            }
        );

        let payload = object(json!({"index_settings": {"idx": [1]}}));
        let err = flatten_categories(&payload, "kind", "message").unwrap_err();
        assert_eq!(
            err,
            FlattenError::NotAnObject {
                path: "index_settings.idx[0]".into(),
                found: "number"
            }
        );
    }

    #[test]
    fn test_expand_list_attributes() {
        let stats = object(json!({
            "nodes": {
                "count": {"total": 3},
                "jvm": {"versions": [{"version": "11.0.2", "count": 3}]},
                "plugins": []
            },
            "status": "green"
        }));

        let flat = flatten_object(&stats);
        let expanded =
            expand_list_attributes(&flat, &["nodes.jvm.versions", "nodes.plugins", "nodes.os.names"])
                .unwrap();

        assert_eq!(expanded["nodes.jvm.versions[0].version"], "11.0.2");
        assert_eq!(expanded["nodes.jvm.versions[0].count"], 3);
        assert!(!expanded.contains_key("nodes.jvm.versions"));
        assert!(!expanded.contains_key("nodes.plugins"));
        assert_eq!(expanded["nodes.count.total"], 3);
        assert_eq!(expanded["status"], "green");
    }
}
