//! Blogs and their articles (spec §3.1, §6.2) are dumped from one bulk query
//! — articles are a nested connection under blog — but land in two separate
//! files, since Article's natural key already carries the parent blog handle.

use crate::error::DumpError;
use crate::fields::{collect_typed_fields, TYPED_FIELD_SELECTION};
use crate::writer::JsonlWriter;
use serde_json::{json, Value};
use shopsync_bulk::BulkRuntime;
use std::path::Path;

const QUERY: &str = r#"
    {
        blogs {
            edges {
                node {
                    id
                    handle
                    title
                    metafields { edges { node { KEY_TYPE_VALUE_REFERENCE } } }
                    articles {
                        edges {
                            node {
                                id
                                handle
                                title
                                contentHtml
                                publishedAt
                                tags
                                metafields { edges { node { KEY_TYPE_VALUE_REFERENCE } } }
                            }
                        }
                    }
                }
            }
        }
    }
    "#;

pub async fn dump_blogs_and_articles(runtime: &BulkRuntime, output_dir: &Path) -> Result<(usize, usize), DumpError> {
    let query = QUERY.replace("KEY_TYPE_VALUE_REFERENCE", TYPED_FIELD_SELECTION);
    let field_map = [("Article", "articles"), ("Metafield", "metafields")];
    let records = runtime.run_query(&query, &field_map).await?;

    let mut blogs_writer = JsonlWriter::create(output_dir.join("blogs.jsonl"))?;
    let mut articles_writer = JsonlWriter::create(output_dir.join("articles.jsonl"))?;
    let mut blog_count = 0;
    let mut article_count = 0;

    for node in &records {
        let blog_handle = node["handle"].as_str().unwrap_or_default().to_string();
        blogs_writer.write_record(&transform_blog(node))?;
        blog_count += 1;

        for article in node["articles"].as_array().unwrap_or(&Vec::new()) {
            articles_writer.write_record(&transform_article(article, &blog_handle))?;
            article_count += 1;
        }
    }
    Ok((blog_count, article_count))
}

fn transform_blog(node: &Value) -> Value {
    json!({
        "id": node["id"],
        "handle": node["handle"],
        "title": node["title"],
        "metafields": collect_typed_fields(node["metafields"].as_array().unwrap_or(&Vec::new())),
    })
}

fn transform_article(node: &Value, blog_handle: &str) -> Value {
    json!({
        "id": node["id"],
        "handle": node["handle"],
        "blogHandle": blog_handle,
        "title": node["title"],
        "contentHtml": node["contentHtml"],
        "publishedAt": node["publishedAt"],
        "tags": node["tags"],
        "metafields": collect_typed_fields(node["metafields"].as_array().unwrap_or(&Vec::new())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn article_carries_parent_blog_handle() {
        let article = json!({"id": "gid://shopify/Article/1", "handle": "hello-world", "title": "Hi"});
        let record = transform_article(&article, "news");
        assert_eq!(record["blogHandle"], "news");
        assert_eq!(record["handle"], "hello-world");
    }
}
