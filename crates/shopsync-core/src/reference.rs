//! The natural-key reference annotations attached to typed field values
//! (spec §3.2, §4.4, §6.2). `EntityRef` is the natural key of whatever a
//! reference field points at; `TypedFieldValue` is the on-disk record shape
//! for one field, including its optional single- or list-reference
//! annotation.
//!
//! Deserializing a single-reference annotation is dispatched by the *sibling
//! key name* (`refProduct`, `refCollection`, ...), not by the shape of the
//! value, because several kinds (Product/Collection/Page/Blog) share the
//! identical `{ "handle": ... }` shape and would otherwise be indistinguishable.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The natural key of a single cross-referenced entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum EntityRef {
    Product {
        handle: String,
    },
    Variant {
        #[serde(rename = "productHandle")]
        product_handle: String,
        #[serde(rename = "variantKey")]
        variant_key: String,
    },
    Collection {
        handle: String,
    },
    Page {
        handle: String,
    },
    Blog {
        handle: String,
    },
    Article {
        #[serde(rename = "blogHandle")]
        blog_handle: String,
        #[serde(rename = "articleHandle")]
        article_handle: String,
    },
    Metaobject {
        #[serde(rename = "type")]
        type_: String,
        handle: String,
    },
    File {
        filename: String,
    },
}

impl EntityRef {
    /// The sibling annotation key this reference is attached under when it is
    /// the sole reference of a single-valued field, e.g. `"refProduct"`.
    pub fn annotation_key(&self) -> &'static str {
        match self {
            EntityRef::Product { .. } => "refProduct",
            EntityRef::Variant { .. } => "refVariant",
            EntityRef::Collection { .. } => "refCollection",
            EntityRef::Page { .. } => "refPage",
            EntityRef::Blog { .. } => "refBlog",
            EntityRef::Article { .. } => "refArticle",
            EntityRef::Metaobject { .. } => "refMetaobject",
            EntityRef::File { .. } => "refFile",
        }
    }

    /// The discriminator tag used inside `refList` entries.
    pub fn type_tag(&self) -> &'static str {
        match self {
            EntityRef::Product { .. } => "Product",
            EntityRef::Variant { .. } => "Variant",
            EntityRef::Collection { .. } => "Collection",
            EntityRef::Page { .. } => "Page",
            EntityRef::Blog { .. } => "Blog",
            EntityRef::Article { .. } => "Article",
            EntityRef::Metaobject { .. } => "Metaobject",
            EntityRef::File { .. } => "File",
        }
    }

    /// Parses a single-reference annotation, given the sibling key name it
    /// was stored under (e.g. `"refProduct"`) and its JSON value.
    pub fn from_annotation(key: &str, value: &Value) -> Option<EntityRef> {
        let get = |field: &str| value.get(field)?.as_str().map(str::to_string);
        match key {
            "refProduct" => Some(EntityRef::Product { handle: get("handle")? }),
            "refCollection" => Some(EntityRef::Collection { handle: get("handle")? }),
            "refPage" => Some(EntityRef::Page { handle: get("handle")? }),
            "refBlog" => Some(EntityRef::Blog { handle: get("handle")? }),
            "refFile" => Some(EntityRef::File { filename: get("filename")? }),
            "refVariant" => Some(EntityRef::Variant {
                product_handle: get("productHandle")?,
                variant_key: get("variantKey")?,
            }),
            "refArticle" => Some(EntityRef::Article {
                blog_handle: get("blogHandle")?,
                article_handle: get("articleHandle")?,
            }),
            "refMetaobject" => Some(EntityRef::Metaobject {
                type_: get("type")?,
                handle: get("handle")?,
            }),
            _ => None,
        }
    }

    /// Serializes this reference as a tagged `refList` entry, e.g.
    /// `{"type":"Product","productHandle":"a"}`.
    pub fn to_ref_list_entry(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".to_string(), Value::String(self.type_tag().to_string()));
        if let Value::Object(fields) = serde_json::to_value(self).expect("EntityRef always serializes") {
            map.extend(fields);
        }
        Value::Object(map)
    }

    /// Parses one tagged `refList` entry.
    pub fn from_ref_list_entry(value: &Value) -> Option<EntityRef> {
        let tag = value.get("type")?.as_str()?;
        let get = |field: &str| value.get(field)?.as_str().map(str::to_string);
        match tag {
            "Product" => Some(EntityRef::Product { handle: get("handle")? }),
            "Collection" => Some(EntityRef::Collection { handle: get("handle")? }),
            "Page" => Some(EntityRef::Page { handle: get("handle")? }),
            "Blog" => Some(EntityRef::Blog { handle: get("handle")? }),
            "File" => Some(EntityRef::File { filename: get("filename")? }),
            "Variant" => Some(EntityRef::Variant {
                product_handle: get("productHandle")?,
                variant_key: get("variantKey")?,
            }),
            "Article" => Some(EntityRef::Article {
                blog_handle: get("blogHandle")?,
                article_handle: get("articleHandle")?,
            }),
            "Metaobject" => Some(EntityRef::Metaobject {
                type_: get("type")?,
                handle: get("handle")?,
            }),
            _ => None,
        }
    }
}

/// One field entry as it lives in a dump record: a `key`/`type`/`value`
/// triple plus whatever reference annotation the rewriter attached. The
/// annotation is additive only — `key`, `type_name`, and `value` are never
/// defaulted away by (de)serialization, per the "set-not-overwrite" contract
/// (spec §4.4, §9).
#[derive(Debug, Clone, PartialEq)]
pub struct TypedFieldValue {
    pub key: String,
    pub type_name: String,
    pub value: String,
    pub ref_single: Option<EntityRef>,
    pub ref_list: Option<Vec<EntityRef>>,
}

impl TypedFieldValue {
    pub fn new(key: impl Into<String>, type_name: impl Into<String>, value: impl Into<String>) -> Self {
        TypedFieldValue {
            key: key.into(),
            type_name: type_name.into(),
            value: value.into(),
            ref_single: None,
            ref_list: None,
        }
    }

    pub fn is_reference(&self) -> bool {
        self.type_name.contains("reference")
    }

    pub fn is_list_reference(&self) -> bool {
        self.type_name.starts_with("list.") && self.is_reference()
    }
}

impl Serialize for TypedFieldValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = Map::new();
        map.insert("key".to_string(), Value::String(self.key.clone()));
        map.insert("type".to_string(), Value::String(self.type_name.clone()));
        map.insert("value".to_string(), Value::String(self.value.clone()));
        if let Some(r) = &self.ref_single {
            map.insert(
                r.annotation_key().to_string(),
                serde_json::to_value(r).map_err(serde::ser::Error::custom)?,
            );
        }
        if let Some(list) = &self.ref_list {
            let entries: Vec<Value> = list.iter().map(EntityRef::to_ref_list_entry).collect();
            map.insert("refList".to_string(), Value::Array(entries));
        }
        Value::Object(map).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TypedFieldValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let map = Map::deserialize(deserializer)?;
        let key = map
            .get("key")
            .and_then(Value::as_str)
            .ok_or_else(|| serde::de::Error::missing_field("key"))?
            .to_string();
        let type_name = map
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| serde::de::Error::missing_field("type"))?
            .to_string();
        let value = map
            .get("value")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let ref_list = map.get("refList").and_then(Value::as_array).map(|arr| {
            arr.iter().filter_map(EntityRef::from_ref_list_entry).collect::<Vec<_>>()
        });

        let ref_single = map.iter().find_map(|(k, v)| {
            if k.starts_with("ref") && k != "refList" {
                EntityRef::from_annotation(k, v)
            } else {
                None
            }
        });

        Ok(TypedFieldValue {
            key,
            type_name,
            value,
            ref_single,
            ref_list,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_ref_round_trips_through_json() {
        let mut field = TypedFieldValue::new("featured", "product_reference", "gid://shopify/Product/1");
        field.ref_single = Some(EntityRef::Product { handle: "awesome-tshirt".to_string() });

        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["refProduct"]["handle"], "awesome-tshirt");
        assert!(json.get("refList").is_none());

        let parsed: TypedFieldValue = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, field);
    }

    #[test]
    fn list_ref_round_trips_and_is_flat_not_nested() {
        let mut field = TypedFieldValue::new(
            "related",
            "list.product_reference",
            "[\"gid://shopify/Product/1\",\"gid://shopify/Product/2\"]",
        );
        field.ref_list = Some(vec![
            EntityRef::Product { handle: "a".to_string() },
            EntityRef::Product { handle: "b".to_string() },
        ]);

        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["refList"][0]["type"], "Product");
        assert_eq!(json["refList"][0]["handle"], "a");

        let parsed: TypedFieldValue = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, field);
    }

    #[test]
    fn annotation_never_clobbers_key_type_value() {
        // Regression for the "set-not-overwrite" bug class (spec §9): a
        // partial annotation-only merge must leave key/type/value intact.
        let field = TypedFieldValue::new("k", "product_reference", "raw-id");
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["key"], "k");
        assert_eq!(json["type"], "product_reference");
        assert_eq!(json["value"], "raw-id");
    }

    #[test]
    fn unresolvable_reference_has_no_annotation() {
        let field = TypedFieldValue::new(
            "category",
            "product_taxonomy_value_reference",
            "gid://shopify/TaxonomyValue/123",
        );
        assert!(field.ref_single.is_none());
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["value"], "gid://shopify/TaxonomyValue/123");
    }

    #[test]
    fn distinguishes_same_shaped_single_refs_by_key_name() {
        // Product/Collection/Page/Blog all serialize to `{"handle": ...}` —
        // only the sibling key name disambiguates them on the way back in.
        let value = serde_json::json!({"handle": "shirts"});
        assert_eq!(
            EntityRef::from_annotation("refCollection", &value),
            Some(EntityRef::Collection { handle: "shirts".to_string() })
        );
        assert_eq!(
            EntityRef::from_annotation("refPage", &value),
            Some(EntityRef::Page { handle: "shirts".to_string() })
        );
    }
}
