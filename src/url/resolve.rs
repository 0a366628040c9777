use crate::{ResolveError, ResolveResult};
use url::Url;

/// Schemes whose references are merged with the base host and path
const NETWORK_SCHEMES: &[&str] = &["http", "https", "ftp"];

/// A raw link reference split into its generic URI components
///
/// The `url` crate only models absolute URLs, so relative references are
/// decomposed here before being merged with a base.
#[derive(Debug, Default, PartialEq, Eq)]
struct Reference<'a> {
    scheme: Option<&'a str>,
    authority: Option<&'a str>,
    path: &'a str,
    query: Option<&'a str>,
    fragment: Option<&'a str>,
}

impl<'a> Reference<'a> {
    fn split(raw: &'a str) -> ResolveResult<Self> {
        let (rest, fragment) = match raw.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment)),
            None => (raw, None),
        };

        let (rest, query) = match rest.split_once('?') {
            Some((rest, query)) => (rest, Some(query)),
            None => (rest, None),
        };

        let (scheme, rest) = split_scheme(raw, rest)?;

        let (authority, path) = match rest.strip_prefix("//") {
            Some(after) => {
                let end = after.find('/').unwrap_or(after.len());
                (Some(&after[..end]), &after[end..])
            }
            None => (None, rest),
        };

        Ok(Self {
            scheme,
            authority,
            path,
            query,
            fragment,
        })
    }
}

/// Splits a leading `scheme:` off a reference with query and fragment removed
fn split_scheme<'a>(raw: &str, rest: &'a str) -> ResolveResult<(Option<&'a str>, &'a str)> {
    let Some(colon) = rest.find(':') else {
        return Ok((None, rest));
    };

    let candidate = &rest[..colon];

    // A colon after the first '/' belongs to the path or authority
    if candidate.contains('/') {
        return Ok((None, rest));
    }

    if candidate.is_empty() {
        return Err(malformed(raw, "missing protocol scheme"));
    }

    let mut chars = candidate.chars();
    let starts_alpha = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let valid = starts_alpha && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));

    if !valid {
        return Err(malformed(
            raw,
            "first path segment in URL cannot contain colon",
        ));
    }

    Ok((Some(candidate), &rest[colon + 1..]))
}

fn malformed(raw: &str, reason: &str) -> ResolveError {
    ResolveError::MalformedReference {
        reference: raw.to_string(),
        reason: reason.to_string(),
    }
}

fn is_network_scheme(scheme: &str) -> bool {
    NETWORK_SCHEMES
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(scheme))
}

/// Returns the base path up to and including its last '/'
fn directory_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..=idx],
        None => "/",
    }
}

/// Resolves a raw link reference against a base address
///
/// # Resolution Rules
///
/// 1. The base must carry a scheme and a host, otherwise `MissingBase`
/// 2. Scheme: the reference's own if present, else the base's. References
///    with a scheme other than http, https or ftp are parsed and returned
///    untouched (`mailto:`, `javascript:`, ...)
/// 3. Host: the reference's own if present, else the base's host and port
/// 4. Path:
///    - absent → the base path (`/` if the base path is empty)
///    - absolute → used as-is
///    - relative → appended to the directory of the base path
/// 5. The reference's query and fragment are kept
///
/// Dot segments are collapsed when the merged address is serialized.
///
/// # Arguments
///
/// * `base` - The address relative references are resolved against
/// * `reference` - The raw `href` value
///
/// # Returns
///
/// * `Ok(Url)` - The absolute address
/// * `Err(ResolveError)` - The reference or the base is unusable
///
/// # Examples
///
/// ```
/// use kraul::url::resolve;
/// use url::Url;
///
/// let base = Url::parse("http://example.com/docs/index.html").unwrap();
/// let url = resolve(&base, "guide.html#intro").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/docs/guide.html#intro");
/// ```
pub fn resolve(base: &Url, reference: &str) -> ResolveResult<Url> {
    let base_host = match base.host_str() {
        Some(host) if !host.is_empty() => host,
        _ => return Err(ResolveError::MissingBase),
    };

    let raw = reference.trim();
    let parts = Reference::split(raw)?;

    let scheme = match parts.scheme {
        None => base.scheme().to_string(),
        Some(scheme) if is_network_scheme(scheme) => scheme.to_ascii_lowercase(),
        Some(_) => return Url::parse(raw).map_err(|e| malformed(raw, &e.to_string())),
    };

    let authority = match parts.authority {
        Some(authority) if !authority.is_empty() => authority.to_string(),
        _ => match base.port() {
            Some(port) => format!("{}:{}", base_host, port),
            None => base_host.to_string(),
        },
    };

    let path = if parts.path.is_empty() {
        if base.path().is_empty() {
            "/".to_string()
        } else {
            base.path().to_string()
        }
    } else if parts.path.starts_with('/') {
        parts.path.to_string()
    } else {
        format!("{}{}", directory_of(base.path()), parts.path)
    };

    let mut merged = format!("{}://{}{}", scheme, authority, path);
    if let Some(query) = parts.query {
        merged.push('?');
        merged.push_str(query);
    }
    if let Some(fragment) = parts.fragment {
        merged.push('#');
        merged.push_str(fragment);
    }

    Url::parse(&merged).map_err(|e| malformed(raw, &e.to_string()))
}
