//! The destination index (spec §4.3): a bundle of in-memory maps from
//! natural key to destination opaque id. Monotonic within a phase — entries
//! are only added — and re-seeded wholesale between phases (spec §3.3
//! invariant 3, §4.3 invariant).

use shopsync_core::entity::{article_index_key, metaobject_index_key, variant_index_key};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingFile {
    pub id: String,
    pub alt_text: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct DestinationIndex {
    pub products: HashMap<String, String>,
    pub variants: HashMap<String, String>,
    pub collections: HashMap<String, String>,
    pub pages: HashMap<String, String>,
    pub blogs: HashMap<String, String>,
    pub articles: HashMap<String, String>,
    pub metaobjects: HashMap<String, String>,
    pub files_by_url: HashMap<String, String>,
    pub files_by_filename: HashMap<String, ExistingFile>,
    pub publications: HashMap<String, String>,
    pub markets: HashMap<String, String>,
}

impl DestinationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_product(&mut self, handle: &str, id: &str) {
        self.products.insert(handle.to_string(), id.to_string());
    }

    pub fn insert_collection(&mut self, handle: &str, id: &str) {
        self.collections.insert(handle.to_string(), id.to_string());
    }

    pub fn insert_page(&mut self, handle: &str, id: &str) {
        self.pages.insert(handle.to_string(), id.to_string());
    }

    pub fn insert_blog(&mut self, handle: &str, id: &str) {
        self.blogs.insert(handle.to_string(), id.to_string());
    }

    pub fn insert_article(&mut self, blog_handle: &str, article_handle: &str, id: &str) {
        self.articles
            .insert(article_index_key(blog_handle, article_handle), id.to_string());
    }

    pub fn insert_metaobject(&mut self, type_: &str, handle: &str, id: &str) {
        self.metaobjects.insert(metaobject_index_key(type_, handle), id.to_string());
    }

    pub fn insert_publication(&mut self, channel_name: &str, id: &str) {
        self.publications.insert(channel_name.to_string(), id.to_string());
    }

    pub fn insert_market(&mut self, handle: &str, id: &str) {
        self.markets.insert(handle.to_string(), id.to_string());
    }

    pub fn insert_file(&mut self, url: &str, filename: &str, id: &str, alt_text: Option<String>) {
        self.files_by_url.insert(url.to_string(), id.to_string());
        self.files_by_filename.insert(
            filename.to_string(),
            ExistingFile { id: id.to_string(), alt_text },
        );
    }

    /// Inserts a variant under the position-based fallback key, and — if a
    /// SKU is present — also under the SKU key, which wins if the two
    /// happen to collide (spec §4.3: "the SKU-based key wins on collision").
    pub fn insert_variant(&mut self, product_handle: &str, sku: Option<&str>, position: u32, id: &str) {
        let pos_key = variant_index_key(product_handle, &format!("pos{position}"));
        self.variants.entry(pos_key).or_insert_with(|| id.to_string());

        if let Some(sku) = sku.filter(|s| !s.is_empty()) {
            let sku_key = variant_index_key(product_handle, sku);
            self.variants.insert(sku_key, id.to_string());
        }
    }

    pub fn lookup_variant(&self, product_handle: &str, sku: Option<&str>, position: u32) -> Option<&str> {
        if let Some(sku) = sku.filter(|s| !s.is_empty()) {
            if let Some(id) = self.variants.get(&variant_index_key(product_handle, sku)) {
                return Some(id);
            }
        }
        self.variants
            .get(&variant_index_key(product_handle, &format!("pos{position}")))
            .map(String::as_str)
    }

    pub fn lookup_article(&self, blog_handle: &str, article_handle: &str) -> Option<&str> {
        self.articles.get(&article_index_key(blog_handle, article_handle)).map(String::as_str)
    }

    pub fn lookup_metaobject(&self, type_: &str, handle: &str) -> Option<&str> {
        self.metaobjects.get(&metaobject_index_key(type_, handle)).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_lookup_prefers_sku_then_falls_back_to_position() {
        let mut idx = DestinationIndex::new();
        idx.insert_variant("tshirt", Some("RED-L"), 1, "gid://1");
        idx.insert_variant("tshirt", None, 2, "gid://2");

        assert_eq!(idx.lookup_variant("tshirt", Some("RED-L"), 1), Some("gid://1"));
        assert_eq!(idx.lookup_variant("tshirt", Some(""), 2), Some("gid://2"));
        assert_eq!(idx.lookup_variant("tshirt", None, 2), Some("gid://2"));
        assert_eq!(idx.lookup_variant("tshirt", Some("MISSING"), 9), None);
    }

    #[test]
    fn duplicate_skus_under_different_products_are_distinct() {
        let mut idx = DestinationIndex::new();
        idx.insert_variant("tshirt", Some("SKU1"), 1, "gid://a");
        idx.insert_variant("hoodie", Some("SKU1"), 1, "gid://b");
        assert_eq!(idx.lookup_variant("tshirt", Some("SKU1"), 1), Some("gid://a"));
        assert_eq!(idx.lookup_variant("hoodie", Some("SKU1"), 1), Some("gid://b"));
    }

    #[test]
    fn sku_key_wins_on_collision_with_position_key() {
        let mut idx = DestinationIndex::new();
        // A position-based key is written first for variant at position 3...
        idx.insert_variant("tshirt", None, 3, "gid://position-based");
        // ...then a *different* variant's SKU happens to literally be "pos3".
        idx.insert_variant("tshirt", Some("pos3"), 7, "gid://sku-based");
        assert_eq!(idx.variants.get("tshirt:pos3"), Some(&"gid://sku-based".to_string()));
    }

    #[test]
    fn article_and_metaobject_keys_are_composite() {
        let mut idx = DestinationIndex::new();
        idx.insert_article("news", "hello-world", "gid://article/1");
        idx.insert_metaobject("hero_banner", "home", "gid://mo/1");
        assert_eq!(idx.lookup_article("news", "hello-world"), Some("gid://article/1"));
        assert_eq!(idx.lookup_metaobject("hero_banner", "home"), Some("gid://mo/1"));
    }
}
