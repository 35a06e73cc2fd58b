//! Drop operation (spec §4.8): files only, destructive, separately invoked.
//! Pages through the destination's file library and batch-deletes 50 at a
//! time. No other entity family is droppable.

use crate::error::ApplyError;
use crate::mutate::{execute_mutation, MutationOutcome};
use serde_json::json;
use shopsync_client::{collect_all, ConnectionPath, GraphQlClient};
use shopsync_core::stats::PhaseStats;

const BATCH_SIZE: usize = 50;
const CONFIRMATION: &str = "delete";

const DELETE: &str = r#"mutation DeleteFiles($fileIds: [ID!]!) {
    fileDelete(fileIds: $fileIds) { deletedFileIds userErrors { field message } }
}"#;

/// Deletes every file in the destination library. `confirmation` must be
/// exactly `"delete"` or the operation is refused before any network call.
pub async fn drop_files(client: &GraphQlClient, confirmation: &str) -> Result<PhaseStats, ApplyError> {
    if confirmation != CONFIRMATION {
        return Err(ApplyError::ConfirmationRequired);
    }

    let query = r#"query Files($cursor: String) {
        files(first: 250, after: $cursor) {
            nodes { id }
            pageInfo { hasNextPage endCursor }
        }
    }"#;
    let nodes = collect_all(client, query, json!({}), &ConnectionPath(vec!["files"])).await?;
    let ids: Vec<String> = nodes.iter().filter_map(|n| n["id"].as_str().map(str::to_string)).collect();

    let mut stats = PhaseStats::new("drop-files");
    for batch in ids.chunks(BATCH_SIZE) {
        match execute_mutation(client, DELETE, json!({ "fileIds": batch }), "fileDelete").await {
            MutationOutcome::Ok(_) => {
                for _ in batch {
                    stats.record(shopsync_core::stats::Outcome::Updated);
                }
            }
            MutationOutcome::UserErrors(errs) => stats.record_failure(errs.join("; ")),
            MutationOutcome::Transport(err) => stats.record_failure(err.to_string()),
        }
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn refuses_without_exact_confirmation_string() {
        let client = GraphQlClient::new("shop.myshopify.com", "tok", "2025-10").unwrap();
        let err = drop_files(&client, "yes please").await.unwrap_err();
        assert!(matches!(err, ApplyError::ConfirmationRequired));
    }
}
