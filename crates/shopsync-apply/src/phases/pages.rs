//! Phase 7: pages (spec §4.6).

use crate::error::ApplyError;
use crate::mutate::{execute_mutation, MutationOutcome};
use crate::source::read_jsonl;
use crate::worker::{run_phase, WorkOutcome, DEFAULT_CONCURRENCY};
use serde_json::{json, Value};
use shopsync_client::GraphQlClient;
use shopsync_core::stats::PhaseStats;
use shopsync_index::DestinationIndex;
use std::path::Path;

const CREATE: &str = r#"mutation CreatePage($input: PageCreateInput!) {
    pageCreate(page: $input) { page { id } userErrors { code field message } }
}"#;

const UPDATE: &str = r#"mutation UpdatePage($id: ID!, $input: PageUpdateInput!) {
    pageUpdate(id: $id, page: $input) { page { id } userErrors { code field message } }
}"#;

pub async fn apply_pages(client: &GraphQlClient, output_dir: &Path, index: &DestinationIndex) -> Result<PhaseStats, ApplyError> {
    let records = read_jsonl(&output_dir.join("pages.jsonl"))?;
    let stats = run_phase("pages", records, DEFAULT_CONCURRENCY, |record| apply_one(client, record, index)).await;
    Ok(stats)
}

async fn apply_one(client: &GraphQlClient, record: Value, index: &DestinationIndex) -> WorkOutcome {
    let Some(handle) = record["handle"].as_str() else {
        return WorkOutcome::Failed("page record missing handle".to_string());
    };
    let input = json!({
        "handle": handle,
        "title": record["title"],
        "body": record["body"],
        "isPublished": record["isPublished"],
    });

    let existing_id = index.pages.get(handle);
    let outcome = match existing_id {
        Some(id) => execute_mutation(client, UPDATE, json!({ "id": id, "input": input }), "pageUpdate").await,
        None => execute_mutation(client, CREATE, json!({ "input": input }), "pageCreate").await,
    };

    match outcome {
        MutationOutcome::Ok(_) => {
            if existing_id.is_some() {
                WorkOutcome::Updated
            } else {
                WorkOutcome::Created
            }
        }
        MutationOutcome::UserErrors(errs) => WorkOutcome::Failed(format!("{handle}: {}", errs.join("; "))),
        MutationOutcome::Transport(err) => WorkOutcome::Failed(format!("{handle}: {err}")),
    }
}
