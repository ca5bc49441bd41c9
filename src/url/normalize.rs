use crate::UrlError;
use url::{ParseError, Url};

/// Returns true for the schemes the crawler is able to fetch
fn is_crawlable_scheme(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Resolves a possibly-relative link reference against a base URL
///
/// # Resolution Steps
///
/// 1. Trim surrounding whitespace from the reference
/// 2. Resolve it against `base` using standard relative-reference rules
/// 3. Drop the fragment (`/page#top` and `/page` name the same target)
/// 4. Filter the scheme of the *resolved* URL: anything other than `http` or
///    `https` is skipped
///
/// # Returns
///
/// * `Ok(Some(Url))` - The absolute, crawlable URL
/// * `Ok(None)` - The link uses another scheme (`mailto:`, `javascript:`, ...)
///   and should be skipped silently
/// * `Err(ParseError)` - The reference is malformed
///
/// # Examples
///
/// ```
/// use ripple_map::url::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("http://example.com/docs/index.html").unwrap();
///
/// let link = resolve_link("../about", &base).unwrap().unwrap();
/// assert_eq!(link.as_str(), "http://example.com/about");
///
/// assert!(resolve_link("mailto:team@example.com", &base).unwrap().is_none());
/// ```
pub fn resolve_link(reference: &str, base: &Url) -> Result<Option<Url>, ParseError> {
    let mut resolved = base.join(reference.trim())?;

    if !is_crawlable_scheme(&resolved) {
        return Ok(None);
    }

    resolved.set_fragment(None);
    Ok(Some(resolved))
}

/// Parses and validates the crawl's seed URL
///
/// The seed must be absolute, use `http` or `https`, and name a host. Any
/// fragment is removed so the seed has the same canonical form as the links
/// discovered later.
///
/// # Examples
///
/// ```
/// use ripple_map::url::parse_seed;
///
/// let seed = parse_seed("http://example.com").unwrap();
/// assert_eq!(seed.as_str(), "http://example.com/");
///
/// assert!(parse_seed("example.com").is_err());
/// assert!(parse_seed("ftp://example.com/").is_err());
/// ```
pub fn parse_seed(input: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(input.trim()).map_err(|source| UrlError::Parse {
        input: input.to_string(),
        source,
    })?;

    if !is_crawlable_scheme(&url) {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost(input.to_string()));
    }

    url.set_fragment(None);
    Ok(url)
}
