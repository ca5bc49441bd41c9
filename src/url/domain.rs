use url::Url;

/// Extracts the host from a URL
///
/// The host is lowercased and, when the URL names a port explicitly, the port
/// is appended (`example.com:8080`). Default ports are omitted by the `url`
/// crate, so `http://example.com:80/` and `http://example.com/` share a host.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use ripple_map::url::extract_host;
///
/// let url = Url::parse("https://EXAMPLE.com/path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(extract_host(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}

/// Returns true if both URLs have the same host (and explicit port)
///
/// The scheme is not part of the comparison, so an `https` link found on an
/// `http` seed stays in scope.
pub fn same_host(url: &Url, seed: &Url) -> bool {
    match (extract_host(url), extract_host(seed)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
