//! Reassembles the flattened parent/child NDJSON stream the bulk API
//! produces back into nested object graphs (spec §4.2).
//!
//! Each line is a flattened node with an `id`; a child additionally carries
//! `__parentId`. The field name a child is attached under is not present on
//! the line itself, so each bulk query is submitted alongside a small
//! `FieldMap` telling the reconstructor which GraphQL type maps to which
//! connection field — the dump writer that authored the query already knows
//! this, since it chose the field aliases.

use serde_json::{Map, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Maps a GID type name (`Product`, `ProductVariant`, ...) to the field name
/// its instances should be attached under on the parent.
#[derive(Debug, Clone, Default)]
pub struct FieldMap(HashMap<String, String>);

impl FieldMap {
    pub fn new(pairs: &[(&str, &str)]) -> Self {
        FieldMap(pairs.iter().map(|(t, f)| (t.to_string(), f.to_string())).collect())
    }

    fn field_for(&self, gid: &str) -> Option<&str> {
        let ty = gid_type(gid)?;
        self.0.get(ty).map(String::as_str)
    }
}

/// Extracts the type name segment of a platform opaque id, e.g.
/// `gid://shopify/ProductVariant/123` -> `ProductVariant`.
pub fn gid_type(gid: &str) -> Option<&str> {
    let rest = gid.strip_prefix("gid://shopify/")?;
    rest.split('/').next()
}

type NodeRef = Rc<RefCell<Node>>;

struct Node {
    fields: Map<String, Value>,
    children: HashMap<String, Vec<NodeRef>>,
}

/// Streaming reconstructor: feed it lines in file order, drain completed
/// top-level records as they become available.
pub struct Reconstructor {
    field_map: FieldMap,
    objects: HashMap<String, NodeRef>,
    current_top_id: Option<String>,
    ready: Vec<Value>,
}

#[derive(Debug, thiserror::Error)]
#[error("malformed bulk result line: {0}")]
pub struct ParseError(pub String);

impl Reconstructor {
    pub fn new(field_map: FieldMap) -> Self {
        Reconstructor {
            field_map,
            objects: HashMap::new(),
            current_top_id: None,
            ready: Vec::new(),
        }
    }

    /// Feeds one NDJSON line. Malformed lines are reported but do not abort
    /// the stream (spec §4.2 `parse_error(line)`).
    pub fn feed_line(&mut self, line: &str) -> Result<(), ParseError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }
        let mut map: Map<String, Value> =
            serde_json::from_str(line).map_err(|_| ParseError(line.to_string()))?;
        let id = map
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| ParseError(line.to_string()))?
            .to_string();

        if let Some(parent_id) = map.remove("__parentId").and_then(|v| v.as_str().map(str::to_string)) {
            let field = self.field_map.field_for(&id).unwrap_or("unknown").to_string();
            let node = Rc::new(RefCell::new(Node { fields: map, children: HashMap::new() }));
            self.objects.insert(id, node.clone());
            if let Some(parent) = self.objects.get(&parent_id) {
                parent.borrow_mut().children.entry(field).or_default().push(node);
            }
        } else {
            if let Some(prev) = self.current_top_id.take() {
                self.flush(&prev);
            }
            let node = Rc::new(RefCell::new(Node { fields: map, children: HashMap::new() }));
            self.objects.insert(id.clone(), node);
            self.current_top_id = Some(id);
        }
        Ok(())
    }

    /// Call once the input is exhausted to flush the last buffered record.
    pub fn finish(&mut self) {
        if let Some(id) = self.current_top_id.take() {
            self.flush(&id);
        }
    }

    fn flush(&mut self, id: &str) {
        if let Some(node) = self.objects.remove(id) {
            self.ready.push(Self::finalize(&node));
        }
    }

    fn finalize(node: &NodeRef) -> Value {
        let n = node.borrow();
        let mut map = n.fields.clone();
        for (field, children) in &n.children {
            let arr: Vec<Value> = children.iter().map(Self::finalize).collect();
            map.insert(field.clone(), Value::Array(arr));
        }
        Value::Object(map)
    }

    /// Drains every record that has become ready to emit since the last call.
    pub fn drain_ready(&mut self) -> Vec<Value> {
        std::mem::take(&mut self.ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_map() -> FieldMap {
        FieldMap::new(&[("ProductVariant", "variants"), ("Metafield", "metafields")])
    }

    #[test]
    fn reassembles_children_under_parent() {
        let mut r = Reconstructor::new(field_map());
        r.feed_line(r#"{"id":"gid://shopify/Product/1","handle":"tshirt"}"#).unwrap();
        r.feed_line(r#"{"id":"gid://shopify/ProductVariant/10","sku":"RED-L","__parentId":"gid://shopify/Product/1"}"#).unwrap();
        r.feed_line(r#"{"id":"gid://shopify/Metafield/99","key":"k","__parentId":"gid://shopify/ProductVariant/10"}"#).unwrap();
        r.feed_line(r#"{"id":"gid://shopify/Product/2","handle":"hoodie"}"#).unwrap();
        r.finish();

        let records = r.drain_ready();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["handle"], "tshirt");
        assert_eq!(records[0]["variants"][0]["sku"], "RED-L");
        assert_eq!(records[0]["variants"][0]["metafields"][0]["key"], "k");
        assert_eq!(records[1]["handle"], "hoodie");
    }

    #[test]
    fn malformed_line_is_reported_not_fatal() {
        let mut r = Reconstructor::new(field_map());
        assert!(r.feed_line("not json").is_err());
        r.feed_line(r#"{"id":"gid://shopify/Product/1","handle":"tshirt"}"#).unwrap();
        r.finish();
        assert_eq!(r.drain_ready().len(), 1);
    }

    #[test]
    fn empty_stream_yields_no_records() {
        let mut r = Reconstructor::new(field_map());
        r.finish();
        assert!(r.drain_ready().is_empty());
    }

    #[test]
    fn gid_type_extraction() {
        assert_eq!(gid_type("gid://shopify/Product/123"), Some("Product"));
        assert_eq!(gid_type("not-a-gid"), None);
    }
}
