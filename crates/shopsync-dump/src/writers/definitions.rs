//! `definitions.json` (spec §6.2): metaobject and metafield definitions,
//! read with ordinary paginated queries rather than the bulk runtime — the
//! schema-level definition count is small relative to data records.

use crate::error::DumpError;
use crate::writer::write_json_doc;
use serde_json::{json, Value};
use shopsync_client::{collect_all, ClientError, ConnectionPath, GraphQlClient};
use std::path::Path;

const OWNER_TYPES: &[&str] = &[
    "PRODUCT",
    "PRODUCTVARIANT",
    "COLLECTION",
    "PAGE",
    "BLOG",
    "ARTICLE",
    "SHOP",
];

pub async fn dump_definitions(client: &GraphQlClient, output_dir: &Path) -> Result<(), DumpError> {
    let metaobject_definitions = load_metaobject_definitions(client).await?;
    let metafield_definitions = load_metafield_definitions(client).await?;

    write_json_doc(
        output_dir.join("definitions.json"),
        &json!({
            "metaobjectDefinitions": metaobject_definitions,
            "metafieldDefinitions": metafield_definitions,
        }),
    )
}

async fn load_metaobject_definitions(client: &GraphQlClient) -> Result<Vec<Value>, ClientError> {
    let query = r#"query Defs($cursor: String) {
        metaobjectDefinitions(first: 250, after: $cursor) {
            nodes {
                type
                name
                fieldDefinitions {
                    key
                    name
                    type { name }
                    required
                    validations { name value }
                }
            }
            pageInfo { hasNextPage endCursor }
        }
    }"#;
    collect_all(client, query, json!({}), &ConnectionPath(vec!["metaobjectDefinitions"])).await
}

async fn load_metafield_definitions(client: &GraphQlClient) -> Result<Vec<Value>, ClientError> {
    let mut all = Vec::new();
    let query = r#"query Defs($ownerType: MetafieldOwnerType!, $cursor: String) {
        metafieldDefinitions(ownerType: $ownerType, first: 250, after: $cursor) {
            nodes {
                namespace
                key
                name
                type { name }
                ownerType
                validations { name value }
            }
            pageInfo { hasNextPage endCursor }
        }
    }"#;
    for owner_type in OWNER_TYPES {
        let nodes = collect_all(
            client,
            query,
            json!({ "ownerType": owner_type }),
            &ConnectionPath(vec!["metafieldDefinitions"]),
        )
        .await?;
        all.extend(nodes);
    }
    Ok(all)
}
