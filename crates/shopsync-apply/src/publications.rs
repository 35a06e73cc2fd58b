//! Sales-channel publication sync (spec §4.6 "Batching"): unpublish a
//! resource from every destination channel, then publish it to the channels
//! named in its source record. Idempotent regardless of prior destination
//! state because it never depends on reading current publication status.

use crate::mutate::{execute_mutation, MutationOutcome};
use crate::worker::WorkOutcome;
use serde_json::json;
use shopsync_client::GraphQlClient;
use shopsync_index::DestinationIndex;

const UNPUBLISH: &str = r#"mutation Unpublish($id: ID!, $input: [PublicationInput!]!) {
    publishableUnpublish(id: $id, input: $input) { userErrors { field message } }
}"#;

const PUBLISH: &str = r#"mutation Publish($id: ID!, $input: [PublicationInput!]!) {
    publishablePublish(id: $id, input: $input) { userErrors { field message } }
}"#;

pub async fn sync_publications(
    client: &GraphQlClient,
    resource_id: &str,
    source_channel_names: &[String],
    index: &DestinationIndex,
) -> Result<(), String> {
    let all_channels: Vec<_> = index.publications.values().map(|id| json!({"publicationId": id})).collect();
    if !all_channels.is_empty() {
        match execute_mutation(client, UNPUBLISH, json!({"id": resource_id, "input": all_channels}), "publishableUnpublish").await {
            MutationOutcome::Ok(_) => {}
            MutationOutcome::UserErrors(errs) => return Err(errs.join("; ")),
            MutationOutcome::Transport(err) => return Err(err.to_string()),
        }
    }

    let targets: Vec<_> = source_channel_names
        .iter()
        .filter_map(|name| index.publications.get(name))
        .map(|id| json!({"publicationId": id}))
        .collect();
    if targets.is_empty() {
        return Ok(());
    }
    match execute_mutation(client, PUBLISH, json!({"id": resource_id, "input": targets}), "publishablePublish").await {
        MutationOutcome::Ok(_) => Ok(()),
        MutationOutcome::UserErrors(errs) => Err(errs.join("; ")),
        MutationOutcome::Transport(err) => Err(err.to_string()),
    }
}

/// Folds a publication sync result into the entity-creation outcome it rides
/// along with: a publication failure downgrades a successful create/update to
/// a failed record, matching "a phase never aborts... stats reported at end".
pub fn fold_publication_result(base: WorkOutcome, publication_result: Result<(), String>) -> WorkOutcome {
    match (base, publication_result) {
        (WorkOutcome::Failed(msg), _) => WorkOutcome::Failed(msg),
        (outcome, Ok(())) => outcome,
        (_, Err(msg)) => WorkOutcome::Failed(format!("publication sync failed: {msg}")),
    }
}
