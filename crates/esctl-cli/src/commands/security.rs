// crates/esctl-cli/src/commands/security.rs - Native realm roles and users

use anyhow::Result;
use esctl_core::projection::{ColumnSpec, columns};
use serde_json::{Map, Value};

use super::{into_object, sort_keys};
use crate::cli::{RolesCommands, UsersCommands};
use crate::context::Context;

pub async fn handle_roles(ctx: &Context, cmd: RolesCommands) -> Result<()> {
    match cmd {
        RolesCommands::Get { roles } => {
            let response = ctx.cluster.get(&security_route("role", roles.as_deref()), &[]).await?;
            let rows = role_rows(sort_keys(into_object(response, "roles")?));

            let table = ctx.output.projector().project_objects(
                &rows,
                &columns([
                    ColumnSpec::new("role"),
                    ColumnSpec::labeled("cluster", "Cluster-level permissions"),
                    ColumnSpec::labeled("indices", "Index-level permissions"),
                    ColumnSpec::new("applications"),
                    ColumnSpec::new("run_as"),
                ]),
            );
            ctx.output.print_table(table)
        }
    }
}

pub async fn handle_users(ctx: &Context, cmd: UsersCommands) -> Result<()> {
    match cmd {
        UsersCommands::Get { users } => {
            let response = ctx.cluster.get(&security_route("user", users.as_deref()), &[]).await?;
            let rows = user_rows(sort_keys(into_object(response, "users")?));

            let table = ctx.output.projector().project_objects(
                &rows,
                &columns(["username", "roles", "full_name", "email", "metadata", "enabled"]),
            );
            ctx.output.print_table(table)
        }
    }
}

fn security_route(kind: &str, names: Option<&str>) -> String {
    match names {
        Some(names) => format!("_security/{kind}/{names}"),
        None => format!("_security/{kind}"),
    }
}

/// One row per role, keyed by its name, cluster privileges joined
fn role_rows(roles: Map<String, Value>) -> Vec<Map<String, Value>> {
    roles
        .into_iter()
        .map(|(name, definition)| {
            let mut row = Map::new();
            row.insert("role".into(), Value::String(name));
            if let Value::Object(definition) = definition {
                row.extend(definition);
            }
            join_list(&mut row, "cluster");
            row
        })
        .collect()
}

/// One row per user, roles joined
fn user_rows(users: Map<String, Value>) -> Vec<Map<String, Value>> {
    users
        .into_iter()
        .filter_map(|(_, user)| match user {
            Value::Object(mut row) => {
                join_list(&mut row, "roles");
                Some(row)
            }
            _ => None,
        })
        .collect()
}

/// `["a", "b"]` -> `"a, b"`
fn join_list(row: &mut Map<String, Value>, key: &str) {
    if let Some(Value::Array(items)) = row.get(key) {
        let joined = items
            .iter()
            .map(|item| item.as_str().map(String::from).unwrap_or_else(|| item.to_string()))
            .collect::<Vec<_>>()
            .join(", ");
        row.insert(key.to_string(), Value::String(joined));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_role_rows() {
        let roles = sort_keys(object(json!({
            "viewer": {"cluster": ["monitor"], "indices": [], "run_as": []},
            "admin": {
                "cluster": ["all", "manage_security"],
                "indices": [{"names": ["*"], "privileges": ["all"]}],
                "run_as": ["*"]
            }
        })));

        let rows = role_rows(roles);
        assert_eq!(rows[0]["role"], "admin");
        assert_eq!(rows[0]["cluster"], "all, manage_security");
        assert_eq!(rows[1]["role"], "viewer");
        assert_eq!(rows[1]["cluster"], "monitor");
        let keys: Vec<_> = rows[0].keys().map(String::as_str).collect();
        assert_eq!(keys[0], "role");
    }

    #[test]
    fn test_user_rows() {
        let users = object(json!({
            "jacknich": {
                "username": "jacknich",
                "roles": ["admin", "other_role1"],
                "full_name": "Jack Nicholson",
                "email": "jacknich@example.com",
                "metadata": {"intelligence": 7},
                "enabled": true
            }
        }));

        let rows = user_rows(users);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["roles"], "admin, other_role1");
        assert_eq!(rows[0]["enabled"], true);
    }

    #[test]
    fn test_security_route() {
        assert_eq!(security_route("role", None), "_security/role");
        assert_eq!(security_route("user", Some("a,b")), "_security/user/a,b");
    }
}
