//! Phase 2: file library sync (spec §4.7). Runs before products so
//! `sourceUrl -> destinationId` is available for the rewriter by the time
//! file-reference fields are resolved in later phases.
//!
//! Source URLs are the source tenant's CDN URLs, directly fetchable by the
//! destination platform, so files are created with `fileCreate`'s
//! originalSource URL form; the staged-upload sub-protocol
//! (`stagedUploadsCreate` + HTTP POST + `fileCreate`) is reserved for
//! locally-sourced blobs, which this system never produces.

use crate::error::ApplyError;
use crate::mutate::{execute_mutation, MutationOutcome};
use crate::source::read_jsonl;
use crate::worker::{run_phase, WorkOutcome, DEFAULT_CONCURRENCY};
use serde_json::{json, Value};
use shopsync_client::GraphQlClient;
use shopsync_core::stats::PhaseStats;
use shopsync_index::DestinationIndex;
use std::path::Path;

const CREATE: &str = r#"mutation CreateFile($files: [FileCreateInput!]!) {
    fileCreate(files: $files) { files { id } userErrors { field message } }
}"#;

const UPDATE: &str = r#"mutation UpdateFile($input: FileUpdateInput!) {
    fileUpdate(file: $input) { file { id } userErrors { field message } }
}"#;

pub async fn apply_files(client: &GraphQlClient, output_dir: &Path, index: &DestinationIndex) -> Result<PhaseStats, ApplyError> {
    let records = read_jsonl(&output_dir.join("files.jsonl"))?;
    let stats = run_phase("files", records, DEFAULT_CONCURRENCY, |record| apply_one(client, record, index)).await;
    Ok(stats)
}

async fn apply_one(client: &GraphQlClient, record: Value, index: &DestinationIndex) -> WorkOutcome {
    let (Some(url), Some(filename)) = (record["url"].as_str(), record["filename"].as_str()) else {
        return WorkOutcome::Failed("file record missing url/filename".to_string());
    };
    let alt_text = record["altText"].as_str();

    match index.files_by_filename.get(filename) {
        Some(existing) if existing.alt_text.as_deref() == alt_text => WorkOutcome::Skipped,
        Some(existing) => {
            let input = json!({ "id": existing.id, "alt": alt_text });
            match execute_mutation(client, UPDATE, json!({ "input": input }), "fileUpdate").await {
                MutationOutcome::Ok(_) => WorkOutcome::Updated,
                MutationOutcome::UserErrors(errs) => WorkOutcome::Failed(format!("{filename}: {}", errs.join("; "))),
                MutationOutcome::Transport(err) => WorkOutcome::Failed(format!("{filename}: {err}")),
            }
        }
        None => {
            let input = json!([{ "originalSource": url, "alt": alt_text, "contentType": "FILE" }]);
            match execute_mutation(client, CREATE, json!({ "files": input }), "fileCreate").await {
                MutationOutcome::Ok(_) => WorkOutcome::Created,
                MutationOutcome::UserErrors(errs) => WorkOutcome::Failed(format!("{filename}: {}", errs.join("; "))),
                MutationOutcome::Transport(err) => WorkOutcome::Failed(format!("{filename}: {err}")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopsync_index::ExistingFile;

    #[test]
    fn unchanged_alt_text_is_recognized_as_skip_condition() {
        let mut index = DestinationIndex::new();
        index.insert_file("https://cdn/a.png", "a.png", "gid://1", Some("hi".to_string()));
        let existing = index.files_by_filename.get("a.png").unwrap();
        assert_eq!(existing, &ExistingFile { id: "gid://1".to_string(), alt_text: Some("hi".to_string()) });
    }
}
