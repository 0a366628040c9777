//! Link extraction from fetched HTML
//!
//! This module walks a parsed document in document order and collects:
//! - Absolute addresses of every `<a href>` that resolves
//! - `tel://` references, kept verbatim
//!
//! A `<base href>` inside the document head changes the address later links
//! are resolved against.

use crate::url::{resolve, strip_fragment};
use scraper::{ElementRef, Html};
use url::Url;

/// Prefix of anchor targets recorded as phone numbers
const PHONE_PREFIX: &str = "tel://";

/// Links and phone numbers found in one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedLinks {
    /// Absolute addresses in document order, fragments removed
    pub links: Vec<Url>,

    /// `tel://` references in document order
    pub phone_numbers: Vec<String>,
}

/// Extracts links and phone numbers from an HTML document
///
/// # Extraction Rules
///
/// - `<base href>` inside `<head>` replaces the resolution base for all
///   following links; a base that does not resolve to an address with a host
///   falls back to `document_url`
/// - `<a href="tel://...">` is recorded as a phone number, never resolved
/// - Any other `<a href>` is resolved; unresolvable hrefs are skipped
/// - Non-web schemes (`mailto:`, `javascript:`) are kept; the scheduler
///   filters them before they reach the frontier
///
/// The parser recovers from malformed markup, so extraction never fails.
///
/// # Arguments
///
/// * `document_url` - The address the document was fetched from
/// * `html` - The document body
///
/// # Example
///
/// ```
/// use kraul::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<html><body><a href="/b">B</a><a href="tel://5551234">Call</a></body></html>"#;
/// let page = Url::parse("http://example.com/a").unwrap();
/// let extracted = extract_links(&page, html);
/// assert_eq!(extracted.links[0].as_str(), "http://example.com/b");
/// assert_eq!(extracted.phone_numbers, vec!["tel://5551234".to_string()]);
/// ```
pub fn extract_links(document_url: &Url, html: &str) -> ExtractedLinks {
    let document = Html::parse_document(html);
    let mut base = document_url.clone();
    let mut extracted = ExtractedLinks::default();

    for node in document.root_element().descendants() {
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };

        match element.value().name() {
            "base" if in_head(element) => {
                if let Some(href) = element.value().attr("href") {
                    base = resolve_base(document_url, href);
                }
            }
            "a" => {
                let Some(href) = element.value().attr("href").map(str::trim) else {
                    continue;
                };

                if let Some(phone_number) = phone_number(href) {
                    extracted.phone_numbers.push(phone_number.to_string());
                    continue;
                }

                match resolve(&base, href) {
                    Ok(url) => extracted.links.push(strip_fragment(url)),
                    Err(e) => tracing::debug!("Skipping link {:?} on {}: {}", href, document_url, e),
                }
            }
            _ => {}
        }
    }

    extracted
}

/// Returns the href verbatim when it is a `tel://` reference
fn phone_number(href: &str) -> Option<&str> {
    let number = href.strip_prefix(PHONE_PREFIX)?;
    if number.is_empty() || number.contains('\n') {
        return None;
    }
    Some(href)
}

fn in_head(element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| ancestor.value().name() == "head")
}

/// Resolves a `<base href>` against the document address
fn resolve_base(document_url: &Url, href: &str) -> Url {
    match resolve(document_url, href) {
        Ok(url) if url.host_str().is_some_and(|host| !host.is_empty()) => url,
        Ok(url) => {
            tracing::warn!("Ignoring base tag without host on {}: {}", document_url, url);
            document_url.clone()
        }
        Err(e) => {
            tracing::warn!("Invalid base tag on {}: {}", document_url, e);
            document_url.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_url() -> Url {
        Url::parse("http://example.com/a").unwrap()
    }

    fn link_strings(extracted: &ExtractedLinks) -> Vec<&str> {
        extracted.links.iter().map(Url::as_str).collect()
    }

    #[test]
    fn test_extract_absolute_link() {
        let html = r#"<html><body><a href="https://other.com/page">Link</a></body></html>"#;
        let extracted = extract_links(&page_url(), html);
        assert_eq!(link_strings(&extracted), vec!["https://other.com/page"]);
    }

    #[test]
    fn test_absolute_and_relative_links_with_phone() {
        let html = r#"
            <html><body>
                <a href="/b">B</a>
                <a href="./c">C</a>
                <a href="tel://5551234">Call us</a>
            </body></html>
        "#;
        let extracted = extract_links(&page_url(), html);
        assert_eq!(
            link_strings(&extracted),
            vec!["http://example.com/b", "http://example.com/c"]
        );
        assert_eq!(extracted.phone_numbers, vec!["tel://5551234"]);
    }

    #[test]
    fn test_fragments_are_stripped() {
        let html = r##"<html><body><a href="/b#x">B</a><a href="#top">Top</a></body></html>"##;
        let extracted = extract_links(&page_url(), html);
        assert_eq!(
            link_strings(&extracted),
            vec!["http://example.com/b", "http://example.com/a"]
        );
    }

    #[test]
    fn test_links_keep_document_order() {
        let html: String = (0..20)
            .map(|i| format!(r#"<p><a href="http://site{}.example/">{}</a></p>"#, i, i))
            .collect();
        let extracted = extract_links(&page_url(), &format!("<html><body>{}</body></html>", html));

        assert_eq!(extracted.links.len(), 20);
        for (i, link) in extracted.links.iter().enumerate() {
            assert_eq!(link.as_str(), format!("http://site{}.example/", i));
        }
    }

    #[test]
    fn test_phone_number_never_becomes_link() {
        let html = r#"<html><body><a href="tel://+1-555-0100">Call</a></body></html>"#;
        let extracted = extract_links(&page_url(), html);
        assert!(extracted.links.is_empty());
        assert_eq!(extracted.phone_numbers, vec!["tel://+1-555-0100"]);
    }

    #[test]
    fn test_phone_number_with_surrounding_whitespace() {
        let html = "<html><body><a href=\" tel://5551234\">A</a><a href=\"\n\ttel://5550000 \">B</a></body></html>";
        let extracted = extract_links(&page_url(), html);
        assert!(extracted.links.is_empty());
        assert_eq!(extracted.phone_numbers, vec!["tel://5551234", "tel://5550000"]);
    }

    #[test]
    fn test_tel_without_slashes_is_a_link() {
        let html = r#"<html><body><a href="tel:5551234">Call</a></body></html>"#;
        let extracted = extract_links(&page_url(), html);
        assert!(extracted.phone_numbers.is_empty());
        assert_eq!(extracted.links.len(), 1);
        assert_eq!(extracted.links[0].scheme(), "tel");
    }

    #[test]
    fn test_empty_tel_is_not_a_phone_number() {
        assert_eq!(phone_number("tel://"), None);
        assert_eq!(phone_number("tel://123"), Some("tel://123"));
    }

    #[test]
    fn test_non_web_links_are_kept() {
        let html = r#"<html><body><a href="mailto:test@example.com">Email</a></body></html>"#;
        let extracted = extract_links(&page_url(), html);
        assert_eq!(link_strings(&extracted), vec!["mailto:test@example.com"]);
    }

    #[test]
    fn test_malformed_href_is_skipped() {
        let html = r#"
            <html><body>
                <a href=":broken">Bad</a>
                <a href="/valid">Good</a>
            </body></html>
        "#;
        let extracted = extract_links(&page_url(), html);
        assert_eq!(link_strings(&extracted), vec!["http://example.com/valid"]);
    }

    #[test]
    fn test_anchor_without_href_ignored() {
        let html = r#"<html><body><a name="anchor">No link</a></body></html>"#;
        let extracted = extract_links(&page_url(), html);
        assert!(extracted.links.is_empty());
        assert!(extracted.phone_numbers.is_empty());
    }

    #[test]
    fn test_base_tag_in_head() {
        let html = r#"
            <html>
            <head><base href="http://other.com/dir/"></head>
            <body><a href="page">Page</a><a href="/root">Root</a></body>
            </html>
        "#;
        let extracted = extract_links(&page_url(), html);
        assert_eq!(
            link_strings(&extracted),
            vec!["http://other.com/dir/page", "http://other.com/root"]
        );
    }

    #[test]
    fn test_relative_base_tag() {
        let html = r#"
            <html>
            <head><base href="/docs/"></head>
            <body><a href="intro">Intro</a></body>
            </html>
        "#;
        let extracted = extract_links(&page_url(), html);
        assert_eq!(link_strings(&extracted), vec!["http://example.com/docs/intro"]);
    }

    #[test]
    fn test_malformed_base_falls_back_to_document() {
        let html = r#"
            <html>
            <head><base href=":nope"></head>
            <body><a href="c">C</a></body>
            </html>
        "#;
        let extracted = extract_links(&page_url(), html);
        assert_eq!(link_strings(&extracted), vec!["http://example.com/c"]);
    }

    #[test]
    fn test_base_without_host_falls_back_to_document() {
        let html = r#"
            <html>
            <head><base href="mailto:someone@example.com"></head>
            <body><a href="c">C</a></body>
            </html>
        "#;
        let extracted = extract_links(&page_url(), html);
        assert_eq!(link_strings(&extracted), vec!["http://example.com/c"]);
    }

    #[test]
    fn test_base_outside_head_ignored() {
        let html = r#"
            <html>
            <head><title>T</title></head>
            <body><base href="http://other.com/"><a href="x">X</a></body>
            </html>
        "#;
        let extracted = extract_links(&page_url(), html);
        assert_eq!(link_strings(&extracted), vec!["http://example.com/x"]);
    }

    #[test]
    fn test_malformed_markup_is_best_effort() {
        let html = r#"<html><body><div><a href="/one">One<p><a href="/two">Two</div"#;
        let extracted = extract_links(&page_url(), html);
        assert_eq!(
            link_strings(&extracted),
            vec!["http://example.com/one", "http://example.com/two"]
        );
    }
}
