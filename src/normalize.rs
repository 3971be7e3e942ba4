/// URL canonicalization for duplicate detection
use url::Url;

/// Query parameters that only carry tracking information
pub const TRACKING_PARAMS: [&str; 9] = [
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "gclid",
    "fbclid",
    "igsh",
    "ref",
];

/// Canonicalize a URL so equivalent pages compare equal
///
/// Algorithm:
/// 1. Parse the URL; if that fails, return the raw string unchanged
/// 2. Drop tracking query parameters (see `TRACKING_PARAMS`)
/// 3. Drop the fragment
/// 4. Strip exactly one trailing "/" from the serialized result
///
/// Examples:
/// - https://a.com/?utm_source=x&keep=1#frag → https://a.com/?keep=1
/// - https://a.com/path/ → https://a.com/path
/// - not a url → not a url
pub fn normalize_url(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw) else {
        return raw.to_string();
    };

    strip_tracking_params(&mut url);
    url.set_fragment(None);

    let href = String::from(url);
    match href.strip_suffix('/') {
        Some(trimmed) => trimmed.to_string(),
        None => href,
    }
}

/// Remove tracking parameters, leaving any other query text untouched
///
/// A bare `?` counts as no query at all.
fn strip_tracking_params(url: &mut Url) {
    if url.query() == Some("") {
        url.set_query(None);
        return;
    }

    let has_tracking = url
        .query_pairs()
        .any(|(key, _)| is_tracking_param(&key));
    if !has_tracking {
        return;
    }

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }
}

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key)
}

/// Lower-cased hostname of a URL, if it parses and has one
pub fn hostname(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let host = url.host_str()?.to_lowercase();
    if host.is_empty() { None } else { Some(host) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_tracking_and_fragment() {
        assert_eq!(
            normalize_url("https://a.com/?utm_source=x&keep=1#frag"),
            "https://a.com/?keep=1"
        );
    }

    #[test]
    fn test_normalize_strips_every_tracking_param() {
        let url = "https://a.com/page?utm_source=a&utm_medium=b&utm_campaign=c&utm_term=d\
                   &utm_content=e&gclid=f&fbclid=g&igsh=h&ref=i";
        assert_eq!(normalize_url(url), "https://a.com/page");
    }

    #[test]
    fn test_normalize_trailing_slash() {
        assert_eq!(normalize_url("https://a.com/path/"), "https://a.com/path");
        assert_eq!(normalize_url("https://a.com/"), "https://a.com");
        assert_eq!(normalize_url("https://a.com"), "https://a.com");
    }

    #[test]
    fn test_normalize_strips_only_one_slash() {
        assert_eq!(normalize_url("https://a.com/path//"), "https://a.com/path/");
    }

    #[test]
    fn test_normalize_keeps_other_parts() {
        assert_eq!(
            normalize_url("https://a.com/Some/Path?b=2&a=1"),
            "https://a.com/Some/Path?b=2&a=1"
        );
        assert_eq!(normalize_url("http://a.com/x"), "http://a.com/x");
    }

    #[test]
    fn test_normalize_keeps_similar_param_names() {
        assert_eq!(
            normalize_url("https://a.com/?referrer=x&ref=y"),
            "https://a.com/?referrer=x"
        );
    }

    #[test]
    fn test_normalize_empty_query_is_dropped() {
        assert_eq!(normalize_url("https://a.com/?"), "https://a.com");
        assert_eq!(normalize_url("https://a.com/?"), normalize_url("https://a.com/"));
        assert_eq!(normalize_url("https://a.com/page?#top"), "https://a.com/page");
    }

    #[test]
    fn test_normalize_keeps_query_encoding_without_tracking() {
        assert_eq!(normalize_url("https://a.com/?x=%20y"), "https://a.com/?x=%20y");
        assert_eq!(normalize_url("https://a.com/?flag"), "https://a.com/?flag");
    }

    #[test]
    fn test_normalize_unparseable_is_raw() {
        assert_eq!(normalize_url("not a url"), "not a url");
        assert_eq!(normalize_url(""), "");
        assert_eq!(normalize_url("/relative/path/"), "/relative/path/");
    }

    #[test]
    fn test_normalize_idempotent() {
        let urls = [
            "https://a.com/?utm_source=x&keep=1#frag",
            "https://a.com/path/",
            "https://www.example.com/docs/index.html?q=rust&ref=home",
            "http://localhost:3000/",
            "https://a.com/?x=%20y",
            "chrome://extensions/",
            "https://a.com/?",
        ];

        for url in urls {
            let once = normalize_url(url);
            assert_eq!(normalize_url(&once), once, "not idempotent for {}", url);
        }
    }

    #[test]
    fn test_hostname() {
        assert_eq!(hostname("https://LeetCode.com/problems"), Some("leetcode.com".to_string()));
        assert_eq!(hostname("http://localhost:8080/"), Some("localhost".to_string()));
        assert_eq!(hostname("about:blank"), None);
        assert_eq!(hostname("garbage"), None);
    }
}
