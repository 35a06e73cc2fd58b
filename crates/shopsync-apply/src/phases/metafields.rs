//! Phase 10: metafields for every owner type, including shop (spec §4.6,
//! §9 Open Question — applied in one pass after every metaobject exists,
//! batched at 25 per `metafieldsSet` call, rather than a full multi-pass
//! retry loop).

use crate::error::ApplyError;
use crate::fields::resolve_typed_fields;
use crate::mutate::{execute_mutation, MutationOutcome};
use crate::source::{discover_metaobject_dumps, read_jsonl};
use crate::worker::{run_phase, WorkOutcome, DEFAULT_CONCURRENCY};
use serde_json::{json, Value};
use shopsync_client::GraphQlClient;
use shopsync_core::stats::PhaseStats;
use shopsync_index::DestinationIndex;
use std::path::Path;

const BATCH_SIZE: usize = 25;

const SET: &str = r#"mutation SetMetafields($metafields: [MetafieldsSetInput!]!) {
    metafieldsSet(metafields: $metafields) { metafields { id } userErrors { field message } }
}"#;

/// One owner id plus its resolved `(key, type, value)` triples, ready to
/// fold into `MetafieldsSetInput` entries.
struct OwnerFields {
    owner_id: String,
    raw_fields: Vec<Value>,
}

pub async fn apply_metafields(client: &GraphQlClient, output_dir: &Path, index: &DestinationIndex) -> Result<PhaseStats, ApplyError> {
    let mut owners = Vec::new();
    owners.extend(product_and_variant_owners(output_dir, index)?);
    owners.extend(simple_owners(output_dir, "collections.jsonl", &index.collections)?);
    owners.extend(simple_owners(output_dir, "pages.jsonl", &index.pages)?);
    owners.extend(simple_owners(output_dir, "blogs.jsonl", &index.blogs)?);
    owners.extend(article_owners(output_dir, index)?);
    owners.extend(metaobject_owners(output_dir, index)?);
    owners.extend(shop_owner(client, output_dir).await?);

    let batches = into_batches(owners, index);
    let stats = run_phase("metafields", batches, DEFAULT_CONCURRENCY, |batch| apply_batch(client, batch)).await;
    Ok(stats)
}

fn product_and_variant_owners(output_dir: &Path, index: &DestinationIndex) -> Result<Vec<OwnerFields>, ApplyError> {
    let records = read_jsonl(&output_dir.join("products.jsonl"))?;
    let mut owners = Vec::new();
    for record in &records {
        let Some(handle) = record["handle"].as_str() else { continue };
        if let Some(id) = index.products.get(handle) {
            owners.push(OwnerFields {
                owner_id: id.clone(),
                raw_fields: record["metafields"].as_array().cloned().unwrap_or_default(),
            });
        }
        for (i, variant) in record["variants"].as_array().unwrap_or(&Vec::new()).iter().enumerate() {
            let sku = variant["sku"].as_str();
            let position = variant["position"].as_u64().unwrap_or(i as u64 + 1) as u32;
            if let Some(id) = index.lookup_variant(handle, sku, position) {
                owners.push(OwnerFields {
                    owner_id: id.to_string(),
                    raw_fields: variant["metafields"].as_array().cloned().unwrap_or_default(),
                });
            }
        }
    }
    Ok(owners)
}

fn simple_owners(
    output_dir: &Path,
    filename: &str,
    handle_index: &std::collections::HashMap<String, String>,
) -> Result<Vec<OwnerFields>, ApplyError> {
    let records = read_jsonl(&output_dir.join(filename))?;
    Ok(records
        .iter()
        .filter_map(|record| {
            let handle = record["handle"].as_str()?;
            let id = handle_index.get(handle)?;
            Some(OwnerFields {
                owner_id: id.clone(),
                raw_fields: record["metafields"].as_array().cloned().unwrap_or_default(),
            })
        })
        .collect())
}

fn article_owners(output_dir: &Path, index: &DestinationIndex) -> Result<Vec<OwnerFields>, ApplyError> {
    let records = read_jsonl(&output_dir.join("articles.jsonl"))?;
    Ok(records
        .iter()
        .filter_map(|record| {
            let blog_handle = record["blogHandle"].as_str()?;
            let handle = record["handle"].as_str()?;
            let id = index.lookup_article(blog_handle, handle)?;
            Some(OwnerFields {
                owner_id: id.to_string(),
                raw_fields: record["metafields"].as_array().cloned().unwrap_or_default(),
            })
        })
        .collect())
}

fn metaobject_owners(output_dir: &Path, index: &DestinationIndex) -> Result<Vec<OwnerFields>, ApplyError> {
    let mut owners = Vec::new();
    for (type_, path) in discover_metaobject_dumps(output_dir)? {
        let records = read_jsonl(&path)?;
        for record in &records {
            let Some(handle) = record["handle"].as_str() else { continue };
            if let Some(id) = index.lookup_metaobject(&type_, handle) {
                owners.push(OwnerFields {
                    owner_id: id.to_string(),
                    raw_fields: record["fields"].as_array().cloned().unwrap_or_default(),
                });
            }
        }
    }
    Ok(owners)
}

/// The shop is a destination-side singleton with no natural key to index —
/// its id is fetched directly rather than looked up.
async fn shop_owner(client: &GraphQlClient, output_dir: &Path) -> Result<Vec<OwnerFields>, ApplyError> {
    let raw_fields = read_jsonl(&output_dir.join("shop-metafields.jsonl"))?;
    if raw_fields.is_empty() {
        return Ok(Vec::new());
    }
    let result = client.execute("query ShopId { shop { id } }", json!({})).await?;
    let Some(shop_id) = result["shop"]["id"].as_str() else {
        return Ok(Vec::new());
    };
    Ok(vec![OwnerFields {
        owner_id: shop_id.to_string(),
        raw_fields,
    }])
}

/// Flattens every owner's resolved fields into `MetafieldsSetInput` entries
/// and chunks them at `BATCH_SIZE`.
fn into_batches(owners: Vec<OwnerFields>, index: &DestinationIndex) -> Vec<Vec<Value>> {
    let mut entries = Vec::new();
    for owner in owners {
        let resolved = resolve_typed_fields(&owner.raw_fields, index);
        for field in resolved {
            entries.push(json!({
                "ownerId": owner.owner_id,
                "key": field.key,
                "type": field.type_name,
                "value": field.value,
            }));
        }
    }
    entries.chunks(BATCH_SIZE).map(<[Value]>::to_vec).collect()
}

async fn apply_batch(client: &GraphQlClient, batch: Vec<Value>) -> WorkOutcome {
    if batch.is_empty() {
        return WorkOutcome::Skipped;
    }
    let count = batch.len();
    match execute_mutation(client, SET, json!({ "metafields": batch }), "metafieldsSet").await {
        MutationOutcome::Ok(_) => WorkOutcome::Updated,
        MutationOutcome::UserErrors(errs) => WorkOutcome::Failed(format!("batch of {count}: {}", errs.join("; "))),
        MutationOutcome::Transport(err) => WorkOutcome::Failed(format!("batch of {count}: {err}")),
    }
}
