//! URL Utility Functions
//!
//! Resolution of relative links and images against a page URL, fragment
//! stripping for link deduplication, and host comparison for same-domain
//! filtering.

use url::Url;

/// Schemes that never name a fetchable page.
const NON_PAGE_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Check if a string is a valid absolute http(s) URL.
///
/// # Returns
/// * `(is_absolute, parsed_url)` - Whether URL is absolute and the parsed URL if valid
#[must_use]
pub fn is_absolute_url(s: &str) -> (bool, Option<Url>) {
    let s = s.trim();

    if !s.starts_with("http://") && !s.starts_with("https://") {
        return (false, None);
    }

    match Url::parse(s) {
        Ok(url) if url.host().is_some() => (true, Some(url)),
        _ => (false, None),
    }
}

/// Parse an absolute http(s) URL.
#[must_use]
pub fn parse_url(url_str: &str) -> Option<Url> {
    is_absolute_url(url_str).1
}

/// Whether the value uses a scheme that is not a web page (`javascript:`,
/// `mailto:`, `tel:`, `data:`).
#[must_use]
pub fn is_non_page_scheme(url_str: &str) -> bool {
    let lower = url_str.trim_start().to_ascii_lowercase();
    NON_PAGE_SCHEMES.iter().any(|scheme| lower.starts_with(scheme))
}

/// Convert a relative or absolute URL to absolute form.
///
/// Special-scheme values are returned unchanged, as is anything the base
/// cannot resolve.
#[must_use]
pub fn create_absolute_url(url_str: &str, base: &Url) -> String {
    let url_str = url_str.trim();

    if url_str.is_empty() {
        return String::new();
    }

    if is_non_page_scheme(url_str) || is_absolute_url(url_str).0 {
        return url_str.to_string();
    }

    match base.join(url_str) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => url_str.to_string(),
    }
}

/// Resolve against an optional base; without one the value is only trimmed.
#[must_use]
pub fn resolve(url_str: &str, base: Option<&Url>) -> String {
    match base {
        Some(base) => create_absolute_url(url_str, base),
        None => url_str.trim().to_string(),
    }
}

/// Drop the `#fragment` part of a URL.
#[must_use]
pub fn strip_fragment(url_str: &str) -> String {
    if let Some(mut url) = parse_url(url_str) {
        url.set_fragment(None);
        return url.to_string();
    }
    url_str.split('#').next().unwrap_or_default().to_string()
}

/// Hostname of an absolute URL, or empty string if invalid.
#[must_use]
pub fn get_domain_url(url_str: &str) -> String {
    parse_url(url_str)
        .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
        .unwrap_or_default()
}

/// Whether two URLs share a host. Invalid URLs never match.
#[must_use]
pub fn same_host(url1: &str, url2: &str) -> bool {
    let host = get_domain_url(url1);
    !host.is_empty() && host == get_domain_url(url2)
}

/// Percent-encode the characters that would end a Markdown link destination.
#[must_use]
pub fn markdown_destination(url_str: &str) -> String {
    url_str
        .replace(' ', "%20")
        .replace('(', "%28")
        .replace(')', "%29")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/blog/post.html").unwrap()
    }

    #[test]
    fn test_is_absolute_url() {
        assert!(is_absolute_url("https://example.com/a").0);
        assert!(is_absolute_url("  http://example.com ").0);
        assert!(!is_absolute_url("/relative").0);
        assert!(!is_absolute_url("ftp://example.com").0);
        assert!(!is_absolute_url("").0);
    }

    #[test]
    fn test_create_absolute_url_relative() {
        assert_eq!(create_absolute_url("next.html", &base()), "https://example.com/blog/next.html");
        assert_eq!(create_absolute_url("/about", &base()), "https://example.com/about");
        assert_eq!(create_absolute_url("../img/a.png", &base()), "https://example.com/img/a.png");
    }

    #[test]
    fn test_create_absolute_url_special() {
        assert_eq!(create_absolute_url("mailto:a@b.c", &base()), "mailto:a@b.c");
        assert_eq!(create_absolute_url("javascript:void(0)", &base()), "javascript:void(0)");
        assert_eq!(create_absolute_url("", &base()), "");
    }

    #[test]
    fn test_resolve_without_base() {
        assert_eq!(resolve(" /x ", None), "/x");
        assert_eq!(resolve("/x", Some(&base())), "https://example.com/x");
    }

    #[test]
    fn test_strip_fragment() {
        assert_eq!(strip_fragment("https://example.com/a#top"), "https://example.com/a");
        assert_eq!(strip_fragment("/a#top"), "/a");
        assert_eq!(strip_fragment("#top"), "");
    }

    #[test]
    fn test_same_host() {
        assert!(same_host("https://Example.com/a", "http://example.com/b"));
        assert!(!same_host("https://example.com/a", "https://other.com/a"));
        assert!(!same_host("/a", "/a"));
    }

    #[test]
    fn test_non_page_scheme() {
        assert!(is_non_page_scheme("JavaScript:alert(1)"));
        assert!(is_non_page_scheme("tel:123"));
        assert!(!is_non_page_scheme("https://example.com"));
    }

    #[test]
    fn test_markdown_destination() {
        assert_eq!(markdown_destination("https://x.com/a b(1).png"), "https://x.com/a%20b%281%29.png");
    }
}
