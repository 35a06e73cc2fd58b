//! Builds a `DestinationIndex` from the destination tenant's current state
//! via paginated reads (spec §4.3). Run once before apply and again between
//! phases so later phases can resolve references to entities just created.

use crate::index::DestinationIndex;
use serde_json::{json, Value};
use shopsync_client::{collect_all, ClientError, ConnectionPath, GraphQlClient};
use shopsync_core::filename::filename_from_url;

const MAX_VARIANTS_PER_PRODUCT: &str = "first: 100";

pub struct IndexBuilder<'a> {
    client: &'a GraphQlClient,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(client: &'a GraphQlClient) -> Self {
        IndexBuilder { client }
    }

    /// Rebuilds the whole index from scratch (spec §3.3 invariant 3).
    pub async fn build(&self, metaobject_types: &[String]) -> Result<DestinationIndex, ClientError> {
        let mut index = DestinationIndex::new();
        self.load_products_and_variants(&mut index).await?;
        self.load_simple(&mut index, "collections", |idx, handle, id| idx.insert_collection(handle, id)).await?;
        self.load_simple(&mut index, "pages", |idx, handle, id| idx.insert_page(handle, id)).await?;
        self.load_blogs_and_articles(&mut index).await?;
        self.load_metaobjects(&mut index, metaobject_types).await?;
        self.load_files(&mut index).await?;
        self.load_publications(&mut index).await?;
        self.load_simple(&mut index, "markets", |idx, handle, id| idx.insert_market(handle, id)).await?;
        Ok(index)
    }

    async fn load_simple(
        &self,
        index: &mut DestinationIndex,
        field: &'static str,
        insert: impl Fn(&mut DestinationIndex, &str, &str),
    ) -> Result<(), ClientError> {
        let query = format!(
            r#"query Index($cursor: String) {{
                {field}(first: 250, after: $cursor) {{
                    nodes {{ id handle }}
                    pageInfo {{ hasNextPage endCursor }}
                }}
            }}"#
        );
        let nodes = collect_all(self.client, &query, json!({}), &ConnectionPath(vec![field])).await?;
        for node in nodes {
            if let (Some(handle), Some(id)) = (node["handle"].as_str(), node["id"].as_str()) {
                insert(index, handle, id);
            }
        }
        Ok(())
    }

    async fn load_products_and_variants(&self, index: &mut DestinationIndex) -> Result<(), ClientError> {
        let query = format!(
            r#"query Index($cursor: String) {{
                products(first: 250, after: $cursor) {{
                    nodes {{
                        id
                        handle
                        variants({MAX_VARIANTS_PER_PRODUCT}) {{
                            nodes {{ id sku position }}
                            pageInfo {{ hasNextPage }}
                        }}
                    }}
                    pageInfo {{ hasNextPage endCursor }}
                }}
            }}"#
        );
        let nodes = collect_all(self.client, &query, json!({}), &ConnectionPath(vec!["products"])).await?;
        for node in nodes {
            let (Some(handle), Some(id)) = (node["handle"].as_str(), node["id"].as_str()) else { continue };
            index.insert_product(handle, id);

            let variants = &node["variants"];
            if variants["pageInfo"]["hasNextPage"].as_bool().unwrap_or(false) {
                tracing::warn!(
                    product = handle,
                    "product has more than 100 variants; excess variants are unmapped in the destination index"
                );
            }
            if let Some(variant_nodes) = variants["nodes"].as_array() {
                for (i, variant) in variant_nodes.iter().enumerate() {
                    let Some(vid) = variant["id"].as_str() else { continue };
                    let sku = variant["sku"].as_str();
                    let position = variant["position"].as_u64().unwrap_or(i as u64 + 1) as u32;
                    index.insert_variant(handle, sku, position, vid);
                }
            }
        }
        Ok(())
    }

    async fn load_blogs_and_articles(&self, index: &mut DestinationIndex) -> Result<(), ClientError> {
        let query = r#"query Index($cursor: String) {
            blogs(first: 250, after: $cursor) {
                nodes {
                    id
                    handle
                    articles(first: 250) {
                        nodes { id handle }
                        pageInfo { hasNextPage }
                    }
                }
                pageInfo { hasNextPage endCursor }
            }
        }"#;
        let nodes = collect_all(self.client, query, json!({}), &ConnectionPath(vec!["blogs"])).await?;
        for node in nodes {
            let (Some(handle), Some(id)) = (node["handle"].as_str(), node["id"].as_str()) else { continue };
            index.insert_blog(handle, id);
            if let Some(articles) = node["articles"]["nodes"].as_array() {
                for article in articles {
                    if let (Some(ahandle), Some(aid)) = (article["handle"].as_str(), article["id"].as_str()) {
                        index.insert_article(handle, ahandle, aid);
                    }
                }
            }
        }
        Ok(())
    }

    async fn load_metaobjects(&self, index: &mut DestinationIndex, metaobject_types: &[String]) -> Result<(), ClientError> {
        let query = r#"query Index($type: String!, $cursor: String) {
            metaobjects(type: $type, first: 250, after: $cursor) {
                nodes { id handle }
                pageInfo { hasNextPage endCursor }
            }
        }"#;
        for type_ in metaobject_types {
            let nodes = collect_all(
                self.client,
                query,
                json!({ "type": type_ }),
                &ConnectionPath(vec!["metaobjects"]),
            )
            .await?;
            for node in nodes {
                if let (Some(handle), Some(id)) = (node["handle"].as_str(), node["id"].as_str()) {
                    index.insert_metaobject(type_, handle, id);
                }
            }
        }
        Ok(())
    }

    async fn load_files(&self, index: &mut DestinationIndex) -> Result<(), ClientError> {
        let query = r#"query Index($cursor: String) {
            files(first: 250, after: $cursor) {
                nodes {
                    id
                    alt
                    ... on GenericFile { url }
                    ... on MediaImage { image { url } }
                    ... on Video { originalSource { url } }
                }
                pageInfo { hasNextPage endCursor }
            }
        }"#;
        let nodes = collect_all(self.client, query, json!({}), &ConnectionPath(vec!["files"])).await?;
        for node in nodes {
            let Some(id) = node["id"].as_str() else { continue };
            let url = file_url(&node);
            let Some(url) = url else { continue };
            let filename = filename_from_url(&url);
            let alt = node["alt"].as_str().map(str::to_string);
            index.insert_file(&url, &filename, id, alt);
        }
        Ok(())
    }

    async fn load_publications(&self, index: &mut DestinationIndex) -> Result<(), ClientError> {
        let query = r#"query Index($cursor: String) {
            publications(first: 25, after: $cursor) {
                nodes { id name }
                pageInfo { hasNextPage endCursor }
            }
        }"#;
        let nodes = collect_all(self.client, query, json!({}), &ConnectionPath(vec!["publications"])).await?;
        for node in nodes {
            if let (Some(name), Some(id)) = (node["name"].as_str(), node["id"].as_str()) {
                index.insert_publication(name, id);
            }
        }
        Ok(())
    }
}

fn file_url(node: &Value) -> Option<String> {
    node.get("url")
        .and_then(Value::as_str)
        .or_else(|| node.get("image")?.get("url")?.as_str())
        .or_else(|| node.get("originalSource")?.get("url")?.as_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_url_falls_back_across_union_variants() {
        assert_eq!(file_url(&json!({"url": "https://a"})), Some("https://a".to_string()));
        assert_eq!(file_url(&json!({"image": {"url": "https://b"}})), Some("https://b".to_string()));
        assert_eq!(
            file_url(&json!({"originalSource": {"url": "https://c"}})),
            Some("https://c".to_string())
        );
        assert_eq!(file_url(&json!({})), None);
    }
}
