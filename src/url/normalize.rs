use crate::CrawlerError;
use url::Url;

/// Removes the fragment from an address
///
/// # Examples
///
/// ```
/// use kraul::url::strip_fragment;
/// use url::Url;
///
/// let url = strip_fragment(Url::parse("http://example.com/page#section").unwrap());
/// assert_eq!(url.as_str(), "http://example.com/page");
/// ```
pub fn strip_fragment(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}

/// Returns the key an address is tracked under in the visited set
pub fn visit_key(url: &Url) -> String {
    strip_fragment(url.clone()).into()
}

/// Returns true for addresses the crawler is able to fetch (http and https)
pub fn is_web_url(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Parses the seed address a crawl starts from
///
/// The seed must be an absolute http(s) URL with a host. Its fragment is
/// dropped so that it deduplicates against links found later.
///
/// # Arguments
///
/// * `seed` - The raw seed argument
///
/// # Returns
///
/// * `Ok(Url)` - The seed, ready to enqueue
/// * `Err(CrawlerError::InvalidSeed)` - The seed cannot be crawled
pub fn parse_seed(seed: &str) -> crate::Result<Url> {
    let invalid = |reason: String| CrawlerError::InvalidSeed {
        seed: seed.to_string(),
        reason,
    };

    let url = Url::parse(seed.trim()).map_err(|e| invalid(e.to_string()))?;

    if !is_web_url(&url) {
        return Err(invalid(format!(
            "only http and https seeds can be crawled, got {}",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(strip_fragment(url)),
        _ => Err(invalid("missing host".to_string())),
    }
}
