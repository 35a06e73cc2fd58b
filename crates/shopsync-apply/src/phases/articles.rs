//! Phase 6: articles, keyed by `(blogHandle, articleHandle)` (spec §4.6).
//! Requires the blog to already exist — phase 5 runs first.

use crate::error::ApplyError;
use crate::mutate::{execute_mutation, MutationOutcome};
use crate::source::read_jsonl;
use crate::worker::{run_phase, WorkOutcome, DEFAULT_CONCURRENCY};
use serde_json::{json, Value};
use shopsync_client::GraphQlClient;
use shopsync_core::stats::PhaseStats;
use shopsync_index::DestinationIndex;
use std::path::Path;

const CREATE: &str = r#"mutation CreateArticle($input: ArticleCreateInput!) {
    articleCreate(article: $input) { article { id } userErrors { field message } }
}"#;

const UPDATE: &str = r#"mutation UpdateArticle($id: ID!, $input: ArticleUpdateInput!) {
    articleUpdate(id: $id, article: $input) { article { id } userErrors { field message } }
}"#;

pub async fn apply_articles(client: &GraphQlClient, output_dir: &Path, index: &DestinationIndex) -> Result<PhaseStats, ApplyError> {
    let records = read_jsonl(&output_dir.join("articles.jsonl"))?;
    let stats = run_phase("articles", records, DEFAULT_CONCURRENCY, |record| apply_one(client, record, index)).await;
    Ok(stats)
}

async fn apply_one(client: &GraphQlClient, record: Value, index: &DestinationIndex) -> WorkOutcome {
    let (Some(blog_handle), Some(article_handle)) = (record["blogHandle"].as_str(), record["handle"].as_str()) else {
        return WorkOutcome::Failed("article record missing blogHandle/handle".to_string());
    };
    let Some(blog_id) = index.blogs.get(blog_handle) else {
        return WorkOutcome::Failed(format!("{blog_handle}/{article_handle}: destination blog not found"));
    };

    let input = json!({
        "blogId": blog_id,
        "handle": article_handle,
        "title": record["title"],
        "contentHtml": record["contentHtml"],
        "tags": record["tags"],
    });

    let existing_id = index.lookup_article(blog_handle, article_handle);
    let outcome = match existing_id {
        Some(id) => execute_mutation(client, UPDATE, json!({ "id": id, "input": input }), "articleUpdate").await,
        None => execute_mutation(client, CREATE, json!({ "input": input }), "articleCreate").await,
    };

    match outcome {
        MutationOutcome::Ok(_) => {
            if existing_id.is_some() {
                WorkOutcome::Updated
            } else {
                WorkOutcome::Created
            }
        }
        MutationOutcome::UserErrors(errs) => WorkOutcome::Failed(format!("{blog_handle}/{article_handle}: {}", errs.join("; "))),
        MutationOutcome::Transport(err) => WorkOutcome::Failed(format!("{blog_handle}/{article_handle}: {err}")),
    }
}
