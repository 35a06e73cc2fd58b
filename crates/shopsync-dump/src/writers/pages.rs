use crate::error::DumpError;
use crate::fields::{collect_typed_fields, TYPED_FIELD_SELECTION};
use crate::writer::JsonlWriter;
use serde_json::{json, Value};
use shopsync_bulk::BulkRuntime;
use std::path::Path;

const QUERY: &str = r#"
    {
        pages {
            edges {
                node {
                    id
                    handle
                    title
                    body
                    isPublished
                    metafields { edges { node { KEY_TYPE_VALUE_REFERENCE } } }
                }
            }
        }
    }
    "#;

pub async fn dump_pages(runtime: &BulkRuntime, output_dir: &Path) -> Result<usize, DumpError> {
    let query = QUERY.replace("KEY_TYPE_VALUE_REFERENCE", TYPED_FIELD_SELECTION);
    let field_map = [("Metafield", "metafields")];
    let records = runtime.run_query(&query, &field_map).await?;

    let mut writer = JsonlWriter::create(output_dir.join("pages.jsonl"))?;
    let mut count = 0;
    for node in &records {
        writer.write_record(&transform(node))?;
        count += 1;
    }
    Ok(count)
}

fn transform(node: &Value) -> Value {
    json!({
        "id": node["id"],
        "handle": node["handle"],
        "title": node["title"],
        "body": node["body"],
        "isPublished": node["isPublished"],
        "metafields": collect_typed_fields(node["metafields"].as_array().unwrap_or(&Vec::new())),
    })
}
