//! The enrichment pass (spec §4.5, §9): after every dump file has been
//! written, build a global opaque-id -> natural-key map from the dumps
//! themselves, then walk every dump file again and attach `refList`
//! annotations to list-reference fields in place. Running it twice produces
//! no further changes (spec §8.2) because each pass recomputes `refList`
//! from scratch rather than merging into whatever was there before.

use serde_json::{Map, Value};
use shopsync_core::EntityRef;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub struct Enricher {
    global: HashMap<String, EntityRef>,
}

impl Enricher {
    /// Scans the standard dump file set in `dir` and builds the opaque-id ->
    /// natural-key map. Missing files are treated as empty, not an error —
    /// not every tenant dumps every entity family.
    pub fn build(dir: &Path) -> io::Result<Self> {
        let mut global = HashMap::new();

        index_products(dir, &mut global)?;
        index_handles(dir, "collections.jsonl", &mut global, |h| EntityRef::Collection { handle: h })?;
        index_handles(dir, "pages.jsonl", &mut global, |h| EntityRef::Page { handle: h })?;
        index_handles(dir, "blogs.jsonl", &mut global, |h| EntityRef::Blog { handle: h })?;
        index_articles(dir, &mut global)?;
        index_metaobjects(dir, &mut global)?;
        index_files(dir, &mut global)?;

        Ok(Enricher { global })
    }

    /// Rewrites every dump file in `dir` in place, attaching `refList`
    /// annotations wherever the raw ids resolve against the global map.
    pub fn enrich_dir(&self, dir: &Path) -> io::Result<()> {
        for path in dump_file_paths(dir)? {
            self.enrich_file(&path)?;
        }
        Ok(())
    }

    fn enrich_file(&self, path: &Path) -> io::Result<()> {
        let contents = fs::read_to_string(path)?;
        let mut out = String::with_capacity(contents.len());
        for line in contents.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let mut value: Value = match serde_json::from_str(line) {
                Ok(v) => v,
                Err(_) => {
                    out.push_str(line);
                    out.push('\n');
                    continue;
                }
            };
            self.enrich_value(&mut value);
            out.push_str(&serde_json::to_string(&value).expect("Value always serializes"));
            out.push('\n');
        }
        fs::write(path, out)
    }

    fn enrich_value(&self, value: &mut Value) {
        match value {
            Value::Array(items) => {
                for item in items.iter_mut() {
                    self.enrich_value(item);
                }
            }
            Value::Object(map) => {
                if looks_like_typed_field(map) {
                    self.enrich_typed_field(map);
                }
                for v in map.values_mut() {
                    self.enrich_value(v);
                }
            }
            _ => {}
        }
    }

    fn enrich_typed_field(&self, map: &mut Map<String, Value>) {
        let type_name = map.get("type").and_then(Value::as_str).unwrap_or("").to_string();
        if !(type_name.starts_with("list.") && type_name.contains("reference")) {
            return;
        }
        let raw = map.get("value").and_then(Value::as_str).unwrap_or("[]").to_string();
        let ids: Vec<String> = serde_json::from_str(&raw).unwrap_or_default();
        let resolved: Vec<&EntityRef> = ids.iter().filter_map(|id| self.global.get(id)).collect();

        map.remove("refList");
        if !resolved.is_empty() {
            let entries: Vec<Value> = resolved.iter().map(|r| r.to_ref_list_entry()).collect();
            map.insert("refList".to_string(), Value::Array(entries));
        }
    }
}

fn looks_like_typed_field(map: &Map<String, Value>) -> bool {
    map.contains_key("key") && map.contains_key("type") && map.contains_key("value")
}

fn dump_file_paths(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("jsonl") {
            paths.push(path);
        }
    }
    Ok(paths)
}

fn read_lines(dir: &Path, filename: &str) -> io::Result<Vec<Value>> {
    let path = dir.join(filename);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents = fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|l| serde_json::from_str(l).ok())
        .collect())
}

fn index_handles(
    dir: &Path,
    filename: &str,
    global: &mut HashMap<String, EntityRef>,
    make_ref: impl Fn(String) -> EntityRef,
) -> io::Result<()> {
    for record in read_lines(dir, filename)? {
        if let (Some(id), Some(handle)) = (record["id"].as_str(), record["handle"].as_str()) {
            global.insert(id.to_string(), make_ref(handle.to_string()));
        }
    }
    Ok(())
}

fn index_products(dir: &Path, global: &mut HashMap<String, EntityRef>) -> io::Result<()> {
    use shopsync_core::entity::variant_key;

    for record in read_lines(dir, "products.jsonl")? {
        let (Some(id), Some(handle)) = (record["id"].as_str(), record["handle"].as_str()) else { continue };
        global.insert(id.to_string(), EntityRef::Product { handle: handle.to_string() });

        if let Some(variants) = record["variants"].as_array() {
            for (i, variant) in variants.iter().enumerate() {
                let Some(vid) = variant["id"].as_str() else { continue };
                let sku = variant["sku"].as_str();
                let position = variant["position"].as_u64().unwrap_or(i as u64 + 1) as u32;
                global.insert(
                    vid.to_string(),
                    EntityRef::Variant {
                        product_handle: handle.to_string(),
                        variant_key: variant_key(sku, position),
                    },
                );
            }
        }
    }
    Ok(())
}

fn index_articles(dir: &Path, global: &mut HashMap<String, EntityRef>) -> io::Result<()> {
    for record in read_lines(dir, "articles.jsonl")? {
        let (Some(id), Some(handle), Some(blog_handle)) =
            (record["id"].as_str(), record["handle"].as_str(), record["blogHandle"].as_str())
        else {
            continue;
        };
        global.insert(
            id.to_string(),
            EntityRef::Article {
                blog_handle: blog_handle.to_string(),
                article_handle: handle.to_string(),
            },
        );
    }
    Ok(())
}

fn index_metaobjects(dir: &Path, global: &mut HashMap<String, EntityRef>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(filename) = path.file_name().and_then(|f| f.to_str()) else { continue };
        let Some(type_from_name) = filename
            .strip_prefix("metaobjects-")
            .and_then(|rest| rest.strip_suffix(".jsonl"))
        else {
            continue;
        };
        for record in read_lines(dir, filename)? {
            let (Some(id), Some(handle)) = (record["id"].as_str(), record["handle"].as_str()) else { continue };
            let type_ = record["type"].as_str().unwrap_or(type_from_name).to_string();
            global.insert(id.to_string(), EntityRef::Metaobject { type_, handle: handle.to_string() });
        }
    }
    Ok(())
}

fn index_files(dir: &Path, global: &mut HashMap<String, EntityRef>) -> io::Result<()> {
    for record in read_lines(dir, "files.jsonl")? {
        if let (Some(id), Some(filename)) = (record["id"].as_str(), record["filename"].as_str()) {
            global.insert(id.to_string(), EntityRef::File { filename: filename.to_string() });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, lines: &[Value]) {
        let mut f = fs::File::create(dir.join(name)).unwrap();
        for line in lines {
            writeln!(f, "{}", serde_json::to_string(line).unwrap()).unwrap();
        }
    }

    #[test]
    fn enriches_list_reference_with_resolved_entries() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();

        write_file(
            dir,
            "products.jsonl",
            &[
                serde_json::json!({"id": "gid://shopify/Product/1", "handle": "a"}),
                serde_json::json!({"id": "gid://shopify/Product/2", "handle": "b"}),
                serde_json::json!({
                    "id": "gid://shopify/Product/3",
                    "handle": "c",
                    "metafields": [
                        {"key": "related", "type": "list.product_reference", "value": "[\"gid://shopify/Product/1\",\"gid://shopify/Product/2\"]"}
                    ]
                }),
            ],
        );

        let enricher = Enricher::build(dir).unwrap();
        enricher.enrich_dir(dir).unwrap();

        let contents = fs::read_to_string(dir.join("products.jsonl")).unwrap();
        let last_line = contents.lines().last().unwrap();
        let record: Value = serde_json::from_str(last_line).unwrap();
        let ref_list = &record["metafields"][0]["refList"];
        assert_eq!(ref_list[0]["type"], "Product");
        assert_eq!(ref_list[0]["handle"], "a");
        assert_eq!(ref_list[1]["handle"], "b");
    }

    #[test]
    fn unresolvable_list_entries_are_dropped_without_annotation() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        write_file(
            dir,
            "metaobjects-color-pattern.jsonl",
            &[serde_json::json!({
                "id": "gid://shopify/Metaobject/1",
                "handle": "red",
                "fields": [
                    {"key": "variants", "type": "list.product_taxonomy_value_reference", "value": "[\"gid://shopify/TaxonomyValue/9\"]"}
                ]
            })],
        );

        let enricher = Enricher::build(dir).unwrap();
        enricher.enrich_dir(dir).unwrap();

        let contents = fs::read_to_string(dir.join("metaobjects-color-pattern.jsonl")).unwrap();
        let record: Value = serde_json::from_str(contents.lines().next().unwrap()).unwrap();
        assert!(record["fields"][0].get("refList").is_none());
        assert_eq!(record["fields"][0]["value"], "[\"gid://shopify/TaxonomyValue/9\"]");
    }

    #[test]
    fn running_enrichment_twice_is_a_fixed_point() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        write_file(
            dir,
            "products.jsonl",
            &[
                serde_json::json!({"id": "gid://shopify/Product/1", "handle": "a"}),
                serde_json::json!({
                    "id": "gid://shopify/Product/2",
                    "handle": "b",
                    "metafields": [
                        {"key": "related", "type": "list.product_reference", "value": "[\"gid://shopify/Product/1\"]"}
                    ]
                }),
            ],
        );

        let enricher = Enricher::build(dir).unwrap();
        enricher.enrich_dir(dir).unwrap();
        let first_pass = fs::read_to_string(dir.join("products.jsonl")).unwrap();

        let enricher_again = Enricher::build(dir).unwrap();
        enricher_again.enrich_dir(dir).unwrap();
        let second_pass = fs::read_to_string(dir.join("products.jsonl")).unwrap();

        assert_eq!(first_pass, second_pass);
    }
}
