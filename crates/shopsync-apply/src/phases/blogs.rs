//! Phase 5: blogs (spec §4.6).

use crate::error::ApplyError;
use crate::mutate::{execute_mutation, MutationOutcome};
use crate::source::read_jsonl;
use crate::worker::{run_phase, WorkOutcome, DEFAULT_CONCURRENCY};
use serde_json::{json, Value};
use shopsync_client::GraphQlClient;
use shopsync_core::stats::PhaseStats;
use shopsync_index::DestinationIndex;
use std::path::Path;

const CREATE: &str = r#"mutation CreateBlog($input: BlogInput!) {
    blogCreate(blog: $input) { blog { id } userErrors { field message } }
}"#;

const UPDATE: &str = r#"mutation UpdateBlog($id: ID!, $input: BlogInput!) {
    blogUpdate(id: $id, blog: $input) { blog { id } userErrors { field message } }
}"#;

pub async fn apply_blogs(client: &GraphQlClient, output_dir: &Path, index: &DestinationIndex) -> Result<PhaseStats, ApplyError> {
    let records = read_jsonl(&output_dir.join("blogs.jsonl"))?;
    let stats = run_phase("blogs", records, DEFAULT_CONCURRENCY, |record| apply_one(client, record, index)).await;
    Ok(stats)
}

async fn apply_one(client: &GraphQlClient, record: Value, index: &DestinationIndex) -> WorkOutcome {
    let Some(handle) = record["handle"].as_str() else {
        return WorkOutcome::Failed("blog record missing handle".to_string());
    };
    let input = json!({ "handle": handle, "title": record["title"] });

    let outcome = match index.blogs.get(handle) {
        Some(id) => execute_mutation(client, UPDATE, json!({ "id": id, "input": input }), "blogUpdate").await,
        None => execute_mutation(client, CREATE, json!({ "input": input }), "blogCreate").await,
    };

    match outcome {
        MutationOutcome::Ok(_) => {
            if index.blogs.contains_key(handle) {
                WorkOutcome::Updated
            } else {
                WorkOutcome::Created
            }
        }
        MutationOutcome::UserErrors(errs) => WorkOutcome::Failed(format!("{handle}: {}", errs.join("; "))),
        MutationOutcome::Transport(err) => WorkOutcome::Failed(format!("{handle}: {err}")),
    }
}
