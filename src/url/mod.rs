//! URL handling module for Catalog-Harvest
//!
//! Link resolution, category slugs, and page-number query rewriting.

use url::Url;

/// Resolves an `href` attribute to an absolute HTTP(S) URL
///
/// Returns None if the link should be excluded:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
///
/// # Example
///
/// ```
/// use catalog_harvest::url::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("https://shop.example.com/catalog/optics/").unwrap();
/// let url = resolve_link("/product/lens-42/", &base).unwrap();
/// assert_eq!(url.as_str(), "https://shop.example.com/product/lens-42/");
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => Some(absolute_url),
        _ => None,
    }
}

/// File-name-safe label for a category URL
///
/// This is the last non-empty path segment, so a trailing slash is ignored.
/// A URL with an empty path maps to `index`.
pub fn category_slug(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|segment| {
            segment
                .chars()
                .map(|c| if c == '/' || c == '\\' || c.is_control() { '_' } else { c })
                .collect::<String>()
        })
        .filter(|slug| slug != "." && slug != "..")
        .unwrap_or_else(|| "index".to_string())
}

/// Returns `url` with query parameter `name` set to `value`
///
/// An existing parameter keeps its position (every occurrence is rewritten);
/// a missing one is appended. Other parameters are left untouched.
pub fn with_query_param(url: &Url, name: &str, value: &str) -> Url {
    let mut found = false;
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            if k == name {
                found = true;
                (k.into_owned(), value.to_string())
            } else {
                (k.into_owned(), v.into_owned())
            }
        })
        .collect();

    let mut rewritten = url.clone();
    {
        let mut query = rewritten.query_pairs_mut();
        query.clear();
        query.extend_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        if !found {
            query.append_pair(name, value);
        }
    }
    rewritten
}
