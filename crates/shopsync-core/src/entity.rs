//! Natural-key helpers shared by the dump writers, the rewriter, and the
//! destination index. These are pure string functions: the *meaning* of a
//! natural key (spec §3.1) lives here once so every component agrees on the
//! same composite-key format.

/// Owner-type strings used by metafield definitions and metafield instances.
pub mod owner_type {
    pub const PRODUCT: &str = "PRODUCT";
    pub const PRODUCTVARIANT: &str = "PRODUCTVARIANT";
    pub const COLLECTION: &str = "COLLECTION";
    pub const PAGE: &str = "PAGE";
    pub const BLOG: &str = "BLOG";
    pub const ARTICLE: &str = "ARTICLE";
    pub const SHOP: &str = "SHOP";
}

/// The variant's key component: the SKU if non-empty, else `pos{position}`.
pub fn variant_key(sku: Option<&str>, position: u32) -> String {
    match sku {
        Some(sku) if !sku.is_empty() => sku.to_string(),
        _ => format!("pos{position}"),
    }
}

pub fn variant_index_key(product_handle: &str, variant_key: &str) -> String {
    format!("{product_handle}:{variant_key}")
}

pub fn article_index_key(blog_handle: &str, article_handle: &str) -> String {
    format!("{blog_handle}:{article_handle}")
}

pub fn metaobject_index_key(type_: &str, handle: &str) -> String {
    format!("{type_}:{handle}")
}

/// Namespaces owned by the platform vendor. Definitions in these namespaces
/// can never be created via the admin API and are silently skipped on apply
/// (spec §3.3 invariant 4, §9 "Reserved namespaces"). Instances of metafields
/// in these namespaces are left untouched in data records.
pub fn is_reserved_namespace(namespace: &str) -> bool {
    namespace == "shopify" || namespace.starts_with("shopify--") || namespace == "reviews"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_key_prefers_sku() {
        assert_eq!(variant_key(Some("RED-L"), 1), "RED-L");
        assert_eq!(variant_key(Some(""), 2), "pos2");
        assert_eq!(variant_key(None, 3), "pos3");
    }

    #[test]
    fn reserved_namespaces_detected_by_prefix() {
        assert!(is_reserved_namespace("shopify"));
        assert!(is_reserved_namespace("shopify--discount"));
        assert!(is_reserved_namespace("reviews"));
        assert!(!is_reserved_namespace("my_custom_app"));
        assert!(!is_reserved_namespace("shopifyish"));
    }
}
