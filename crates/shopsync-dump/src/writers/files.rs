use crate::error::DumpError;
use crate::writer::JsonlWriter;
use serde_json::{json, Value};
use shopsync_bulk::BulkRuntime;
use shopsync_core::filename::filename_from_url;
use std::path::Path;

const QUERY: &str = r#"
    {
        files {
            edges {
                node {
                    id
                    alt
                    ... on GenericFile { url }
                    ... on MediaImage { image { url } }
                    ... on Video { originalSource { url } }
                }
            }
        }
    }
    "#;

pub async fn dump_files(runtime: &BulkRuntime, output_dir: &Path) -> Result<usize, DumpError> {
    let field_map: [(&str, &str); 0] = [];
    let records = runtime.run_query(QUERY, &field_map).await?;

    let mut writer = JsonlWriter::create(output_dir.join("files.jsonl"))?;
    let mut count = 0;
    for node in &records {
        if let Some(record) = transform(node) {
            writer.write_record(&record)?;
            count += 1;
        }
    }
    Ok(count)
}

fn transform(node: &Value) -> Option<Value> {
    let url = file_url(node)?;
    let filename = filename_from_url(&url);
    Some(json!({
        "id": node["id"],
        "url": url,
        "filename": filename,
        "altText": node["alt"],
    }))
}

fn file_url(node: &Value) -> Option<String> {
    node.get("url")
        .and_then(Value::as_str)
        .or_else(|| node.get("image")?.get("url")?.as_str())
        .or_else(|| node.get("originalSource")?.get("url")?.as_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_derives_filename_from_url() {
        let node = json!({"id": "gid://shopify/MediaImage/1", "alt": "a shirt", "image": {"url": "https://cdn.example/files/shirt.png?v=1"}});
        let record = transform(&node).unwrap();
        assert_eq!(record["filename"], "shirt.png");
        assert_eq!(record["altText"], "a shirt");
    }

    #[test]
    fn unresolvable_url_skips_record() {
        assert!(transform(&json!({"id": "gid://shopify/GenericFile/1"})).is_none());
    }
}
