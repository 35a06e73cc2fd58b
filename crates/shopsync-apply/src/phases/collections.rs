//! Phase 4: collections + sales-channel publications (spec §4.6).

use crate::error::ApplyError;
use crate::mutate::{execute_mutation, MutationOutcome};
use crate::publications::{fold_publication_result, sync_publications};
use crate::source::read_jsonl;
use crate::worker::{run_phase, WorkOutcome, DEFAULT_CONCURRENCY};
use serde_json::{json, Value};
use shopsync_client::GraphQlClient;
use shopsync_core::stats::PhaseStats;
use shopsync_index::DestinationIndex;
use std::path::Path;

const CREATE: &str = r#"mutation CreateCollection($input: CollectionInput!) {
    collectionCreate(input: $input) { collection { id } userErrors { field message } }
}"#;

const UPDATE: &str = r#"mutation UpdateCollection($input: CollectionInput!) {
    collectionUpdate(input: $input) { collection { id } userErrors { field message } }
}"#;

pub async fn apply_collections(
    client: &GraphQlClient,
    output_dir: &Path,
    index: &DestinationIndex,
) -> Result<PhaseStats, ApplyError> {
    let records = read_jsonl(&output_dir.join("collections.jsonl"))?;
    let stats = run_phase("collections", records, DEFAULT_CONCURRENCY, |record| {
        apply_one(client, record, index)
    })
    .await;
    Ok(stats)
}

async fn apply_one(client: &GraphQlClient, record: Value, index: &DestinationIndex) -> WorkOutcome {
    let Some(handle) = record["handle"].as_str() else {
        return WorkOutcome::Failed("collection record missing handle".to_string());
    };
    let input = json!({
        "handle": handle,
        "title": record["title"],
        "descriptionHtml": record["descriptionHtml"],
        "sortOrder": record["sortOrder"],
    });

    let existing_id = index.collections.get(handle).cloned();
    let (mutation, result_field, variables) = match &existing_id {
        Some(id) => (UPDATE, "collectionUpdate", json!({ "input": with_id(input, id) })),
        None => (CREATE, "collectionCreate", json!({ "input": input })),
    };

    let (base_outcome, resource_id) = match execute_mutation(client, mutation, variables, result_field).await {
        MutationOutcome::Ok(result) => {
            let Some(id) = result["collection"]["id"].as_str().map(str::to_string) else {
                return WorkOutcome::Failed(format!("{handle}: mutation returned no collection id"));
            };
            let outcome = if existing_id.is_some() { WorkOutcome::Updated } else { WorkOutcome::Created };
            (outcome, id)
        }
        MutationOutcome::UserErrors(errs) => return WorkOutcome::Failed(format!("{handle}: {}", errs.join("; "))),
        MutationOutcome::Transport(err) => return WorkOutcome::Failed(format!("{handle}: {err}")),
    };

    let source_channels: Vec<String> = record["publications"]
        .as_array()
        .unwrap_or(&Vec::new())
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect();
    let publication_result = sync_publications(client, &resource_id, &source_channels, index).await;
    fold_publication_result(base_outcome, publication_result)
}

fn with_id(mut input: Value, id: &str) -> Value {
    input["id"] = json!(id);
    input
}
