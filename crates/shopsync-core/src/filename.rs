//! Filename extraction from a CDN URL — the natural key for File entities
//! (spec §3.1, §8.3 "a file whose CDN URL has query-string version tokens
//! resolves to the same filename as one without them").

pub fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        if let Some(last) = parsed.path_segments().and_then(|mut s| s.next_back()) {
            if !last.is_empty() {
                return last.to_string();
            }
        }
    }
    let without_query = url.split('?').next().unwrap_or(url);
    without_query.rsplit('/').next().unwrap_or(without_query).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_query_string_version_tokens() {
        let with_version = "https://cdn.shop.com/files/1/0001/logo.png?v=1700000000";
        let without_version = "https://cdn.shop.com/files/1/0001/logo.png";
        assert_eq!(filename_from_url(with_version), filename_from_url(without_version));
        assert_eq!(filename_from_url(with_version), "logo.png");
    }

    #[test]
    fn falls_back_for_non_url_strings() {
        assert_eq!(filename_from_url("files/logo.png?v=1"), "logo.png");
    }
}
