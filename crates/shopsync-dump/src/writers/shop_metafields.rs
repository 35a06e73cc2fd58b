//! Shop-level metafields (spec §3.1 MetafieldDefinition ownerType `SHOP`,
//! §4.6 phase 10 "all owner types including shop"). `shop` is a singleton
//! root field, not a connection, but the bulk runtime handles it the same
//! way: one top-level record (the shop) with metafields as children.

use crate::error::DumpError;
use crate::fields::{collect_typed_fields, TYPED_FIELD_SELECTION};
use crate::writer::JsonlWriter;
use shopsync_bulk::BulkRuntime;
use std::path::Path;

const QUERY: &str = r#"
    {
        shop {
            id
            metafields { edges { node { KEY_TYPE_VALUE_REFERENCE } } }
        }
    }
    "#;

pub async fn dump_shop_metafields(runtime: &BulkRuntime, output_dir: &Path) -> Result<usize, DumpError> {
    let query = QUERY.replace("KEY_TYPE_VALUE_REFERENCE", TYPED_FIELD_SELECTION);
    let field_map = [("Metafield", "metafields")];
    let records = runtime.run_query(&query, &field_map).await?;

    let mut writer = JsonlWriter::create(output_dir.join("shop-metafields.jsonl"))?;
    let mut count = 0;
    if let Some(shop) = records.first() {
        for field in collect_typed_fields(shop["metafields"].as_array().unwrap_or(&Vec::new())) {
            writer.write_record(&field)?;
            count += 1;
        }
    }
    Ok(count)
}
