//! Metaobjects (spec §4.5 "Metaobject writers discover all defined types up
//! front..., then issue one bulk query per type"). The bulk API's
//! `bulkOperationRunQuery` mutation takes a literal query string with no
//! variables, so the type filter is interpolated directly into the query
//! text rather than passed as `$type`.

use crate::error::DumpError;
use crate::fields::{collect_typed_fields, TYPED_FIELD_SELECTION};
use crate::writer::JsonlWriter;
use serde_json::{json, Value};
use shopsync_bulk::BulkRuntime;
use shopsync_client::{collect_all, ClientError, ConnectionPath, GraphQlClient};
use std::path::Path;

/// Pages through `metaobjectDefinitions` to discover every type in use.
pub async fn discover_metaobject_types(client: &GraphQlClient) -> Result<Vec<String>, ClientError> {
    let query = r#"query Types($cursor: String) {
        metaobjectDefinitions(first: 250, after: $cursor) {
            nodes { type }
            pageInfo { hasNextPage endCursor }
        }
    }"#;
    let nodes = collect_all(client, query, json!({}), &ConnectionPath(vec!["metaobjectDefinitions"])).await?;
    Ok(nodes.iter().filter_map(|n| n["type"].as_str().map(str::to_string)).collect())
}

pub async fn dump_metaobjects(
    runtime: &BulkRuntime,
    output_dir: &Path,
    metaobject_types: &[String],
) -> Result<usize, DumpError> {
    let mut total = 0;
    for type_ in metaobject_types {
        total += dump_one_type(runtime, output_dir, type_).await?;
    }
    Ok(total)
}

async fn dump_one_type(runtime: &BulkRuntime, output_dir: &Path, type_: &str) -> Result<usize, DumpError> {
    let escaped = type_.replace('"', "\\\"");
    let query = format!(
        r#"
        {{
            metaobjects(type: "{escaped}") {{
                edges {{
                    node {{
                        id
                        handle
                        type: type
                        capabilities {{ publishable {{ status }} }}
                        fields {{ {fields} }}
                    }}
                }}
            }}
        }}
        "#,
        fields = TYPED_FIELD_SELECTION
    );
    let field_map: [(&str, &str); 0] = [];
    let records = runtime.run_query(&query, &field_map).await?;

    let mut writer = JsonlWriter::create(output_dir.join(format!("metaobjects-{type_}.jsonl")))?;
    let mut count = 0;
    for node in &records {
        writer.write_record(&transform(node, type_))?;
        count += 1;
    }
    Ok(count)
}

fn transform(node: &Value, type_: &str) -> Value {
    json!({
        "id": node["id"],
        "handle": node["handle"],
        "type": type_,
        "status": node["capabilities"]["publishable"]["status"],
        "fields": collect_typed_fields(node.get("fields").and_then(Value::as_array).unwrap_or(&Vec::new())),
    })
}
