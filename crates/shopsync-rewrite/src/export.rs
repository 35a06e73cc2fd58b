//! Export-direction rewriting (spec §4.4): annotates a typed field with the
//! natural key of whatever it references, when the bulk query was able to
//! resolve a child node inline. List references can't carry a resolved child
//! (§9 nested-connection limitation) — those are left for the enrichment
//! pass.

use serde_json::Value;
use shopsync_core::entity::variant_key;
use shopsync_core::filename::filename_from_url;
use shopsync_core::{EntityRef, TypedFieldValue};

/// Builds the dump-record representation of one typed field. `reference` is
/// the raw `reference { __typename ... }` union node the bulk query
/// requested inline, if `type_name` denotes a single (non-list) reference.
pub fn export_field(key: &str, type_name: &str, value: &str, reference: Option<&Value>) -> TypedFieldValue {
    let mut field = TypedFieldValue::new(key, type_name, value);
    if field.is_reference() && !field.is_list_reference() {
        if let Some(reference) = reference {
            field.ref_single = resolve_single_reference(reference);
        }
    }
    field
}

fn resolve_single_reference(node: &Value) -> Option<EntityRef> {
    let typename = node.get("__typename")?.as_str()?;
    match typename {
        "Product" => Some(EntityRef::Product {
            handle: node.get("handle")?.as_str()?.to_string(),
        }),
        "Collection" => Some(EntityRef::Collection {
            handle: node.get("handle")?.as_str()?.to_string(),
        }),
        "Page" => Some(EntityRef::Page {
            handle: node.get("handle")?.as_str()?.to_string(),
        }),
        "Blog" => Some(EntityRef::Blog {
            handle: node.get("handle")?.as_str()?.to_string(),
        }),
        "Metaobject" => Some(EntityRef::Metaobject {
            type_: node.get("type")?.as_str()?.to_string(),
            handle: node.get("handle")?.as_str()?.to_string(),
        }),
        "Article" => Some(EntityRef::Article {
            blog_handle: node.get("blog")?.get("handle")?.as_str()?.to_string(),
            article_handle: node.get("handle")?.as_str()?.to_string(),
        }),
        "ProductVariant" => {
            let sku = node.get("sku").and_then(Value::as_str);
            let position = node.get("position").and_then(Value::as_u64).unwrap_or(1) as u32;
            Some(EntityRef::Variant {
                product_handle: node.get("product")?.get("handle")?.as_str()?.to_string(),
                variant_key: variant_key(sku, position),
            })
        }
        "GenericFile" | "MediaImage" | "Video" => {
            let url = node
                .get("url")
                .and_then(Value::as_str)
                .or_else(|| node.get("image")?.get("url")?.as_str())
                .or_else(|| node.get("originalSource")?.get("url")?.as_str())?;
            Some(EntityRef::File { filename: filename_from_url(url) })
        }
        // TaxonomyValue and anything else unrecognized: non-remappable, the
        // raw opaque value is preserved untouched (spec §3.3 invariant 1).
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_product_reference() {
        let node = json!({"__typename": "Product", "handle": "awesome-tshirt"});
        let field = export_field("featured", "product_reference", "gid://shopify/Product/1", Some(&node));
        assert_eq!(field.ref_single, Some(EntityRef::Product { handle: "awesome-tshirt".to_string() }));
    }

    #[test]
    fn resolves_variant_reference_via_nested_product_handle() {
        let node = json!({
            "__typename": "ProductVariant",
            "sku": "RED-L",
            "position": 1,
            "product": {"handle": "tshirt"}
        });
        let field = export_field("default_variant", "variant_reference", "gid://shopify/ProductVariant/10", Some(&node));
        assert_eq!(
            field.ref_single,
            Some(EntityRef::Variant { product_handle: "tshirt".to_string(), variant_key: "RED-L".to_string() })
        );
    }

    #[test]
    fn taxonomy_reference_is_left_unannotated() {
        let node = json!({"__typename": "TaxonomyValue", "id": "gid://shopify/TaxonomyValue/123"});
        let field = export_field("category", "product_taxonomy_value_reference", "gid://shopify/TaxonomyValue/123", Some(&node));
        assert!(field.ref_single.is_none());
        assert_eq!(field.value, "gid://shopify/TaxonomyValue/123");
    }

    #[test]
    fn list_reference_never_gets_a_single_annotation() {
        let node = json!({"__typename": "Product", "handle": "a"});
        let field = export_field("related", "list.product_reference", "[\"gid://1\"]", Some(&node));
        assert!(field.ref_single.is_none());
    }

    #[test]
    fn non_reference_field_is_untouched() {
        let field = export_field("title", "single_line_text_field", "Hello", None);
        assert!(field.ref_single.is_none());
        assert_eq!(field.value, "Hello");
    }
}
