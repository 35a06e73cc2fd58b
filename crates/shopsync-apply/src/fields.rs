//! Resolves a dump record's typed field / metafield array against the
//! destination index, producing `(key, type, value)` triples ready to send
//! as metafield-write input (spec §4.4 import direction, §4.6 phase 10).

use serde_json::Value;
use shopsync_core::TypedFieldValue;
use shopsync_index::DestinationIndex;
use shopsync_rewrite::{resolve_for_import, ImportResolution};

pub struct ResolvedField {
    pub key: String,
    pub type_name: String,
    pub value: String,
}

pub fn resolve_typed_fields(raw_fields: &[Value], index: &DestinationIndex) -> Vec<ResolvedField> {
    raw_fields
        .iter()
        .filter_map(|raw| serde_json::from_value::<TypedFieldValue>(raw.clone()).ok())
        .filter_map(|field| match resolve_for_import(&field, index) {
            ImportResolution::Value(value) => Some(ResolvedField { key: field.key, type_name: field.type_name, value }),
            ImportResolution::Skip => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn skips_unresolvable_single_reference_field() {
        let raw = vec![json!({
            "key": "featured",
            "type": "product_reference",
            "value": "gid://src/1",
            "refProduct": {"handle": "missing"}
        })];
        let index = DestinationIndex::new();
        assert!(resolve_typed_fields(&raw, &index).is_empty());
    }

    #[test]
    fn passes_through_plain_scalar_field() {
        let raw = vec![json!({"key": "color", "type": "single_line_text_field", "value": "Red"})];
        let index = DestinationIndex::new();
        let resolved = resolve_typed_fields(&raw, &index);
        assert_eq!(resolved[0].value, "Red");
    }
}
