//! Phase 9: metaobject instances (spec §4.6). Metaobjects expose a dedicated
//! upsert mutation keyed by `(type, handle)`, so there is no separate
//! create/update branch here — unlike the phases before it.

use crate::error::ApplyError;
use crate::mutate::{execute_mutation, MutationOutcome};
use crate::source::{discover_metaobject_dumps, read_jsonl};
use crate::worker::{run_phase, WorkOutcome, DEFAULT_CONCURRENCY};
use serde_json::{json, Value};
use shopsync_client::GraphQlClient;
use shopsync_core::stats::PhaseStats;
use shopsync_index::DestinationIndex;
use std::path::Path;

const UPSERT: &str = r#"mutation UpsertMetaobject($handle: MetaobjectHandleInput!, $input: MetaobjectUpsertInput!) {
    metaobjectUpsert(handle: $handle, metaobject: $input) {
        metaobject { id }
        userErrors { field message }
    }
}"#;

pub async fn apply_metaobjects(client: &GraphQlClient, output_dir: &Path, index: &DestinationIndex) -> Result<Vec<PhaseStats>, ApplyError> {
    let mut all_stats = Vec::new();
    for (type_, path) in discover_metaobject_dumps(output_dir)? {
        let records = read_jsonl(&path)?;
        let phase_name = format!("metaobjects:{type_}");
        let stats = run_phase(phase_name, records, DEFAULT_CONCURRENCY, |record| {
            apply_one(client, record, &type_, index)
        })
        .await;
        all_stats.push(stats);
    }
    Ok(all_stats)
}

async fn apply_one(client: &GraphQlClient, record: Value, type_: &str, index: &DestinationIndex) -> WorkOutcome {
    let Some(handle) = record["handle"].as_str() else {
        return WorkOutcome::Failed("metaobject record missing handle".to_string());
    };

    let existed_before = index.lookup_metaobject(type_, handle).is_some();
    let handle_input = json!({ "type": type_, "handle": handle });
    let metaobject_input = json!({
        "handle": handle,
        "capabilities": { "publishable": { "status": record["status"] } },
        "fields": [],
    });

    match execute_mutation(client, UPSERT, json!({ "handle": handle_input, "input": metaobject_input }), "metaobjectUpsert").await {
        MutationOutcome::Ok(_) => {
            if existed_before {
                WorkOutcome::Updated
            } else {
                WorkOutcome::Created
            }
        }
        MutationOutcome::UserErrors(errs) => WorkOutcome::Failed(format!("{type_}:{handle}: {}", errs.join("; "))),
        MutationOutcome::Transport(err) => WorkOutcome::Failed(format!("{type_}:{handle}: {err}")),
    }
}
