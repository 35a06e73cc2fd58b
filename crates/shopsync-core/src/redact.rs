//! Token redaction so credentials never reach a log line.

/// Replaces an access token wherever it appears verbatim in `text` with a
/// fixed placeholder. Cheap substring replacement — the token is a known
/// value at the call site, never discovered by pattern matching.
pub fn redact_token(text: &str, token: &str) -> String {
    if token.is_empty() {
        return text.to_string();
    }
    text.replace(token, "<redacted>")
}

/// Strips an access-token-bearing query parameter from a URL before it is
/// logged, e.g. `?access_token=...` used by staged-upload target URLs.
pub fn redact_url(url: &str) -> String {
    let Ok(mut parsed) = url::Url::parse(url) else {
        return url.to_string();
    };
    let redacted_pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| {
            let is_sensitive = k.eq_ignore_ascii_case("access_token")
                || k.eq_ignore_ascii_case("signature")
                || k.eq_ignore_ascii_case("x-goog-signature")
                || k.eq_ignore_ascii_case("token");
            if is_sensitive {
                (k.into_owned(), "<redacted>".to_string())
            } else {
                (k.into_owned(), v.into_owned())
            }
        })
        .collect();
    if redacted_pairs.is_empty() {
        return parsed.into();
    }
    parsed.query_pairs_mut().clear().extend_pairs(&redacted_pairs);
    parsed.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_token_substring() {
        let line = "calling https://shop/admin with token shpat_abc123";
        assert_eq!(
            redact_token(line, "shpat_abc123"),
            "calling https://shop/admin with token <redacted>"
        );
    }

    #[test]
    fn redacts_sensitive_query_param() {
        let url = "https://cdn.example.com/files/1?access_token=secret&foo=bar";
        let redacted = redact_url(url);
        assert!(redacted.contains("access_token=%3Credacted%3E") || redacted.contains("access_token=<redacted>"));
        assert!(redacted.contains("foo=bar"));
    }

    #[test]
    fn leaves_non_urls_unchanged() {
        assert_eq!(redact_url("not a url"), "not a url");
    }
}
