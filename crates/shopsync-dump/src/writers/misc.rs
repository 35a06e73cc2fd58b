//! The small, single-document artifacts (spec §3.1, §6.2): menus, redirects,
//! policies, discounts, markets. None of these need the bulk runtime — their
//! per-tenant counts are small enough for ordinary paginated reads, and the
//! on-disk shape is a single JSON array/object rather than JSONL.

use crate::error::DumpError;
use crate::writer::write_json_doc;
use serde_json::{json, Value};
use shopsync_client::{collect_all, ConnectionPath, GraphQlClient};
use std::path::Path;

pub async fn dump_menus(client: &GraphQlClient, output_dir: &Path) -> Result<usize, DumpError> {
    let query = r#"query Menus($cursor: String) {
        menus(first: 250, after: $cursor) {
            nodes {
                handle
                title
                items {
                    title
                    type
                    url
                    items {
                        title
                        type
                        url
                        items { title type url }
                    }
                }
            }
            pageInfo { hasNextPage endCursor }
        }
    }"#;
    let nodes = collect_all(client, query, json!({}), &ConnectionPath(vec!["menus"])).await?;
    let count = nodes.len();
    write_json_doc(output_dir.join("menus.json"), &nodes)?;
    Ok(count)
}

pub async fn dump_redirects(client: &GraphQlClient, output_dir: &Path) -> Result<usize, DumpError> {
    let query = r#"query Redirects($cursor: String) {
        urlRedirects(first: 250, after: $cursor) {
            nodes { path target }
            pageInfo { hasNextPage endCursor }
        }
    }"#;
    let nodes = collect_all(client, query, json!({}), &ConnectionPath(vec!["urlRedirects"])).await?;
    let count = nodes.len();
    write_json_doc(output_dir.join("redirects.json"), &nodes)?;
    Ok(count)
}

pub async fn dump_policies(client: &GraphQlClient, output_dir: &Path) -> Result<usize, DumpError> {
    let query = r#"query Policies {
        shop {
            shopPolicies {
                type
                title
                body
            }
        }
    }"#;
    let data = client.execute(query, json!({})).await?;
    let policies = data["shop"]["shopPolicies"].clone();
    let count = policies.as_array().map(Vec::len).unwrap_or(0);
    write_json_doc(output_dir.join("policies.json"), &policies)?;
    Ok(count)
}

pub async fn dump_discounts(client: &GraphQlClient, output_dir: &Path) -> Result<usize, DumpError> {
    let query = r#"query Discounts($cursor: String) {
        discountNodes(first: 250, after: $cursor) {
            nodes {
                id
                discount {
                    __typename
                    ... on DiscountCodeBasic { title codes(first: 1) { nodes { code } } }
                    ... on DiscountAutomaticBasic { title }
                    ... on DiscountCodeBxgy { title codes(first: 1) { nodes { code } } }
                    ... on DiscountAutomaticBxgy { title }
                    ... on DiscountCodeFreeShipping { title codes(first: 1) { nodes { code } } }
                    ... on DiscountAutomaticFreeShipping { title }
                }
            }
            pageInfo { hasNextPage endCursor }
        }
    }"#;
    let nodes = collect_all(client, query, json!({}), &ConnectionPath(vec!["discountNodes"])).await?;
    let transformed: Vec<Value> = nodes.iter().map(transform_discount).collect();
    let count = transformed.len();
    write_json_doc(output_dir.join("discounts.json"), &transformed)?;
    Ok(count)
}

fn transform_discount(node: &Value) -> Value {
    let discount = &node["discount"];
    let typename = discount["__typename"].as_str().unwrap_or_default();
    let is_code = typename.starts_with("DiscountCode");
    let code = discount["codes"]["nodes"][0]["code"].as_str();
    json!({
        "title": discount["title"],
        "kind": typename,
        "isCode": is_code,
        "code": code,
    })
}

pub async fn dump_markets(client: &GraphQlClient, output_dir: &Path) -> Result<usize, DumpError> {
    let query = r#"query Markets($cursor: String) {
        markets(first: 250, after: $cursor) {
            nodes {
                handle
                name
                regions(first: 250) { nodes { ... on MarketRegionCountry { code } } }
                webPresence { domain { host } subfolderSuffix }
                currencySettings { baseCurrency { currencyCode } }
            }
            pageInfo { hasNextPage endCursor }
        }
    }"#;
    let nodes = collect_all(client, query, json!({}), &ConnectionPath(vec!["markets"])).await?;
    let count = nodes.len();
    write_json_doc(output_dir.join("markets.json"), &nodes)?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_discount_detects_code_vs_automatic() {
        let code_discount = json!({
            "discount": {"__typename": "DiscountCodeBasic", "title": "Summer Sale", "codes": {"nodes": [{"code": "SUMMER10"}]}}
        });
        let record = transform_discount(&code_discount);
        assert_eq!(record["isCode"], true);
        assert_eq!(record["code"], "SUMMER10");

        let automatic = json!({"discount": {"__typename": "DiscountAutomaticBasic", "title": "Auto"}});
        let record = transform_discount(&automatic);
        assert_eq!(record["isCode"], false);
        assert!(record["code"].is_null());
    }
}
