//! Cursor-based connection walker (spec §4.1, used by the destination index
//! builders in `shopsync-index`). Lazily fetches pages as the caller consumes
//! them — the same "fetch one page ahead, yield from it" shape as the
//! teacher's journal fragment iterator.

use crate::client::{ClientError, GraphQlClient};
use serde_json::Value;

/// Locates the `{ nodes, pageInfo }` connection object within a GraphQL
/// response's `data`, given the field path to walk to reach it (e.g.
/// `["products"]` or `["product", "variants"]`).
pub struct ConnectionPath(pub Vec<&'static str>);

impl ConnectionPath {
    fn resolve<'v>(&self, data: &'v Value) -> Option<&'v Value> {
        let mut cur = data;
        for segment in &self.0 {
            cur = cur.get(segment)?;
        }
        Some(cur)
    }
}

/// Walks every page of a cursor-based connection, returning all of its
/// nodes. `query` must accept a `$cursor: String` variable and select
/// `nodes { ... } pageInfo { hasNextPage endCursor }` at `path`.
pub async fn collect_all(
    client: &GraphQlClient,
    query: &str,
    mut variables: Value,
    path: &ConnectionPath,
) -> Result<Vec<Value>, ClientError> {
    let mut out = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        if let Some(cursor) = &cursor {
            variables["cursor"] = Value::String(cursor.clone());
        }
        let data = client.execute(query, variables.clone()).await?;
        let connection = path
            .resolve(&data)
            .cloned()
            .unwrap_or(Value::Null);

        let nodes = connection.get("nodes").and_then(Value::as_array).cloned().unwrap_or_default();
        out.extend(nodes);

        let page_info = connection.get("pageInfo");
        let has_next = page_info
            .and_then(|p| p.get("hasNextPage"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !has_next {
            break;
        }
        cursor = page_info
            .and_then(|p| p.get("endCursor"))
            .and_then(Value::as_str)
            .map(str::to_string);
        if cursor.is_none() {
            break;
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_path_resolves_nested_field() {
        let data = serde_json::json!({"product": {"variants": {"nodes": [1, 2]}}});
        let path = ConnectionPath(vec!["product", "variants"]);
        assert_eq!(path.resolve(&data).unwrap()["nodes"], serde_json::json!([1, 2]));
    }
}
