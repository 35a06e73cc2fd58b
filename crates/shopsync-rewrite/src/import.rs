//! Import-direction rewriting (spec §4.4): resolves natural-key annotations
//! back to fresh destination opaque ids via the destination index.

use shopsync_core::entity::variant_index_key;
use shopsync_core::{EntityRef, TypedFieldValue};
use shopsync_index::DestinationIndex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportResolution {
    /// The field should be written with this value.
    Value(String),
    /// The field's reference is unresolvable and the field should be
    /// dropped from the write (spec §4.4, §7 "field-level skip with warning").
    Skip,
}

/// Resolves one exported field to the value that should be sent on import.
pub fn resolve_for_import(field: &TypedFieldValue, index: &DestinationIndex) -> ImportResolution {
    if !field.is_reference() {
        return ImportResolution::Value(field.value.clone());
    }

    if field.is_list_reference() {
        match &field.ref_list {
            // No annotation at all means every entry was non-remappable
            // (e.g. taxonomy values) — pass the raw value through.
            None => ImportResolution::Value(field.value.clone()),
            Some(refs) => {
                let mut resolved = Vec::new();
                for r in refs {
                    match lookup(index, r) {
                        Some(id) => resolved.push(id.to_string()),
                        None => tracing::warn!(?r, field = %field.key, "skipping unresolved list reference entry"),
                    }
                }
                ImportResolution::Value(serde_json::to_string(&resolved).expect("Vec<String> always serializes"))
            }
        }
    } else {
        match &field.ref_single {
            None => ImportResolution::Value(field.value.clone()),
            Some(r) => match lookup(index, r) {
                Some(id) => ImportResolution::Value(id.to_string()),
                None => {
                    tracing::warn!(field = %field.key, reference = ?r, "unresolved single reference, skipping field");
                    ImportResolution::Skip
                }
            },
        }
    }
}

fn lookup<'a>(index: &'a DestinationIndex, r: &EntityRef) -> Option<&'a str> {
    match r {
        EntityRef::Product { handle } => index.products.get(handle).map(String::as_str),
        EntityRef::Variant { product_handle, variant_key } => index
            .variants
            .get(&variant_index_key(product_handle, variant_key))
            .map(String::as_str),
        EntityRef::Collection { handle } => index.collections.get(handle).map(String::as_str),
        EntityRef::Page { handle } => index.pages.get(handle).map(String::as_str),
        EntityRef::Blog { handle } => index.blogs.get(handle).map(String::as_str),
        EntityRef::Article { blog_handle, article_handle } => index.lookup_article(blog_handle, article_handle),
        EntityRef::Metaobject { type_, handle } => index.lookup_metaobject(type_, handle),
        EntityRef::File { filename } => index.files_by_filename.get(filename).map(|f| f.id.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_with_product(handle: &str, id: &str) -> DestinationIndex {
        let mut idx = DestinationIndex::new();
        idx.insert_product(handle, id);
        idx
    }

    #[test]
    fn resolves_single_reference_to_destination_id() {
        let idx = index_with_product("awesome-tshirt", "gid://dst/Product/9");
        let mut field = TypedFieldValue::new("featured", "product_reference", "gid://src/Product/1");
        field.ref_single = Some(EntityRef::Product { handle: "awesome-tshirt".to_string() });
        assert_eq!(
            resolve_for_import(&field, &idx),
            ImportResolution::Value("gid://dst/Product/9".to_string())
        );
    }

    #[test]
    fn missing_single_reference_skips_field() {
        let idx = DestinationIndex::new();
        let mut field = TypedFieldValue::new("featured", "product_reference", "gid://src/Product/1");
        field.ref_single = Some(EntityRef::Product { handle: "missing".to_string() });
        assert_eq!(resolve_for_import(&field, &idx), ImportResolution::Skip);
    }

    #[test]
    fn list_reference_skips_missing_entries_but_keeps_the_rest() {
        let idx = index_with_product("a", "gid://dst/Product/1");
        let mut field = TypedFieldValue::new("related", "list.product_reference", "[\"gid://src/1\",\"gid://src/2\"]");
        field.ref_list = Some(vec![
            EntityRef::Product { handle: "a".to_string() },
            EntityRef::Product { handle: "missing".to_string() },
        ]);
        let resolution = resolve_for_import(&field, &idx);
        assert_eq!(resolution, ImportResolution::Value("[\"gid://dst/Product/1\"]".to_string()));
    }

    #[test]
    fn non_remappable_reference_passes_through_raw_value() {
        let idx = DestinationIndex::new();
        let field = TypedFieldValue::new("category", "product_taxonomy_value_reference", "gid://shopify/TaxonomyValue/1");
        assert_eq!(
            resolve_for_import(&field, &idx),
            ImportResolution::Value("gid://shopify/TaxonomyValue/1".to_string())
        );
    }

    #[test]
    fn non_reference_field_passes_through() {
        let idx = DestinationIndex::new();
        let field = TypedFieldValue::new("title", "single_line_text_field", "Hello");
        assert_eq!(resolve_for_import(&field, &idx), ImportResolution::Value("Hello".to_string()));
    }
}
