//! Turns the raw `{key, type, value, reference}` nodes a bulk query returns
//! for typed fields / metafields into the annotated dump record shape (spec
//! §4.5 step 3, §6.2 record shape), via the single-reference half of the
//! rewriter.

use serde_json::Value;
use shopsync_rewrite::export_field;

/// Fragment requested for every typed field / metafield connection. List
/// references cannot carry a resolved child (§9) so only `value` is asked for
/// those; the union selects every single-reference natural key shape the
/// rewriter knows how to read.
pub const TYPED_FIELD_SELECTION: &str = r#"
    key
    type
    value
    reference {
        __typename
        ... on Product { handle }
        ... on Collection { handle }
        ... on Page { handle }
        ... on Blog { handle }
        ... on Metaobject { type: type handle }
        ... on Article { handle blog { handle } }
        ... on ProductVariant { sku position product { handle } }
        ... on GenericFile { url }
        ... on MediaImage { image { url } }
        ... on Video { originalSource { url } }
    }
"#;

pub fn collect_typed_fields(nodes: &[Value]) -> Vec<Value> {
    nodes
        .iter()
        .filter_map(|node| {
            let key = node.get("key")?.as_str()?;
            let type_name = node.get("type")?.as_str()?;
            let value = node.get("value").and_then(Value::as_str).unwrap_or_default();
            let reference = node.get("reference").filter(|r| !r.is_null());
            let field = export_field(key, type_name, value, reference);
            serde_json::to_value(field).ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn collects_and_annotates_single_reference_field() {
        let nodes = vec![json!({
            "key": "featured",
            "type": "product_reference",
            "value": "gid://shopify/Product/1",
            "reference": {"__typename": "Product", "handle": "awesome-tshirt"}
        })];
        let out = collect_typed_fields(&nodes);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["refProduct"]["handle"], "awesome-tshirt");
        assert_eq!(out[0]["value"], "gid://shopify/Product/1");
    }

    #[test]
    fn list_reference_field_is_passed_through_unannotated() {
        let nodes = vec![json!({
            "key": "related",
            "type": "list.product_reference",
            "value": "[\"gid://shopify/Product/1\"]",
            "reference": null
        })];
        let out = collect_typed_fields(&nodes);
        assert!(out[0].get("refProduct").is_none());
        assert!(out[0].get("refList").is_none());
    }

    #[test]
    fn skips_malformed_nodes_missing_required_fields() {
        let nodes = vec![json!({"type": "product_reference", "value": "x"})];
        assert!(collect_typed_fields(&nodes).is_empty());
    }
}
