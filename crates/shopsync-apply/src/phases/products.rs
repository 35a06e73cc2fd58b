//! Phase 3: products, variants, and sales-channel publications (spec §4.6).
//! Metafields are deferred to phase 10 — by the time phase 10 runs, every
//! metaobject a product might reference already exists.

use crate::error::ApplyError;
use crate::mutate::{execute_mutation, MutationOutcome};
use crate::publications::{fold_publication_result, sync_publications};
use crate::source::read_jsonl;
use crate::worker::{run_phase, WorkOutcome, DEFAULT_CONCURRENCY};
use serde_json::{json, Value};
use shopsync_client::GraphQlClient;
use shopsync_core::entity::variant_key;
use shopsync_core::stats::PhaseStats;
use shopsync_index::DestinationIndex;
use std::path::Path;

const CREATE: &str = r#"mutation CreateProduct($input: ProductInput!) {
    productCreate(input: $input) { product { id } userErrors { field message } }
}"#;

const UPDATE: &str = r#"mutation UpdateProduct($input: ProductInput!) {
    productUpdate(input: $input) { product { id } userErrors { field message } }
}"#;

const CREATE_VARIANT: &str = r#"mutation CreateVariants($productId: ID!, $variants: [ProductVariantsBulkInput!]!) {
    productVariantsBulkCreate(productId: $productId, variants: $variants) { userErrors { field message } }
}"#;

const UPDATE_VARIANT: &str = r#"mutation UpdateVariants($productId: ID!, $variants: [ProductVariantsBulkInput!]!) {
    productVariantsBulkUpdate(productId: $productId, variants: $variants) { userErrors { field message } }
}"#;

pub async fn apply_products(
    client: &GraphQlClient,
    output_dir: &Path,
    index: &DestinationIndex,
) -> Result<PhaseStats, ApplyError> {
    let records = read_jsonl(&output_dir.join("products.jsonl"))?;
    let stats = run_phase("products", records, DEFAULT_CONCURRENCY, |record| {
        apply_one_product(client, record, index)
    })
    .await;
    Ok(stats)
}

async fn apply_one_product(client: &GraphQlClient, record: Value, index: &DestinationIndex) -> WorkOutcome {
    let Some(handle) = record["handle"].as_str() else {
        return WorkOutcome::Failed("product record missing handle".to_string());
    };

    let input = json!({
        "handle": handle,
        "title": record["title"],
        "descriptionHtml": record["descriptionHtml"],
        "productType": record["productType"],
        "vendor": record["vendor"],
        "tags": record["tags"],
        "status": record["status"],
    });

    let existing_id = index.products.get(handle).cloned();
    let (mutation, result_field, variables) = match &existing_id {
        Some(id) => (UPDATE, "productUpdate", json!({ "input": merge_id(input, id) })),
        None => (CREATE, "productCreate", json!({ "input": input })),
    };

    let base_outcome = match execute_mutation(client, mutation, variables, result_field).await {
        MutationOutcome::Ok(result) => {
            let Some(product_id) = result["product"]["id"].as_str() else {
                return WorkOutcome::Failed(format!("{handle}: mutation returned no product id"));
            };
            let variant_outcome = apply_variants(client, product_id, handle, &record, index).await;
            if let Err(msg) = variant_outcome {
                WorkOutcome::Failed(format!("{handle}: {msg}"))
            } else if existing_id.is_some() {
                WorkOutcome::Updated
            } else {
                WorkOutcome::Created
            }
        }
        MutationOutcome::UserErrors(errs) => return WorkOutcome::Failed(format!("{handle}: {}", errs.join("; "))),
        MutationOutcome::Transport(err) => return WorkOutcome::Failed(format!("{handle}: {err}")),
    };

    let resource_id = existing_id.or_else(|| index.products.get(handle).cloned());
    let Some(resource_id) = resource_id else { return base_outcome };
    let source_channels: Vec<String> = record["publications"]
        .as_array()
        .unwrap_or(&Vec::new())
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect();
    let publication_result = sync_publications(client, &resource_id, &source_channels, index).await;
    fold_publication_result(base_outcome, publication_result)
}

async fn apply_variants(
    client: &GraphQlClient,
    product_id: &str,
    product_handle: &str,
    record: &Value,
    index: &DestinationIndex,
) -> Result<(), String> {
    let variants = record["variants"].as_array().cloned().unwrap_or_default();
    let mut to_create = Vec::new();
    let mut to_update = Vec::new();

    for (i, variant) in variants.iter().enumerate() {
        let sku = variant["sku"].as_str();
        let position = variant["position"].as_u64().unwrap_or(i as u64 + 1) as u32;
        let key = variant_key(sku, position);
        let input = json!({
            "price": variant["price"],
            "inventoryPolicy": variant["inventoryPolicy"],
            "taxable": variant["taxable"],
            "optionValues": [{"name": key}],
        });
        match index.lookup_variant(product_handle, sku, position) {
            Some(existing_id) => to_update.push(merge_id(input, existing_id)),
            None => to_create.push(input),
        }
    }

    if !to_create.is_empty() {
        match execute_mutation(
            client,
            CREATE_VARIANT,
            json!({ "productId": product_id, "variants": to_create }),
            "productVariantsBulkCreate",
        )
        .await
        {
            MutationOutcome::Ok(_) => {}
            MutationOutcome::UserErrors(errs) => return Err(errs.join("; ")),
            MutationOutcome::Transport(err) => return Err(err.to_string()),
        }
    }
    if !to_update.is_empty() {
        match execute_mutation(
            client,
            UPDATE_VARIANT,
            json!({ "productId": product_id, "variants": to_update }),
            "productVariantsBulkUpdate",
        )
        .await
        {
            MutationOutcome::Ok(_) => {}
            MutationOutcome::UserErrors(errs) => return Err(errs.join("; ")),
            MutationOutcome::Transport(err) => return Err(err.to_string()),
        }
    }
    Ok(())
}

fn merge_id(mut input: Value, id: &str) -> Value {
    input["id"] = json!(id);
    input
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_id_adds_id_field_without_disturbing_other_keys() {
        let input = json!({"handle": "a"});
        let merged = merge_id(input, "gid://1");
        assert_eq!(merged["handle"], "a");
        assert_eq!(merged["id"], "gid://1");
    }
}
