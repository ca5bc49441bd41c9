//! Link extraction from fetched markup
//!
//! This module handles turning a response body into link references:
//! - Draining the body stream with a size limit
//! - Collecting the raw `href` of every `<a>` element
//!
//! Resolution of the references against a base URL happens in the caller, so
//! a malformed reference can be reported against the page it came from.

use futures::{Stream, StreamExt};
use scraper::{Html, Selector};
use std::fmt;

/// Raw `href` values of a document's anchors, in document order
///
/// The whole document is parsed and every `href` collected before the first
/// item is yielded; iterating only hands out the collected values.
#[derive(Debug)]
pub struct Links {
    hrefs: std::vec::IntoIter<String>,
}

impl Iterator for Links {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.hrefs.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.hrefs.size_hint()
    }
}

impl ExactSizeIterator for Links {}

/// Reads a body stream to completion
///
/// # Arguments
///
/// * `stream` - The body as a stream of byte chunks
/// * `limit` - Maximum number of bytes accepted
///
/// # Returns
///
/// * `Ok(String)` - The body, decoded as UTF-8 with invalid sequences replaced
/// * `Err(String)` - The stream failed, or the body exceeded `limit`. Whatever
///   was read before the failure is discarded.
pub async fn read_body<S, B, E>(stream: S, limit: usize) -> Result<String, String>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: fmt::Display,
{
    futures::pin_mut!(stream);
    let mut body = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| format!("failed to read body: {}", e))?;
        let chunk = chunk.as_ref();

        if body.len() + chunk.len() > limit {
            return Err(format!("body exceeds {} bytes", limit));
        }
        body.extend_from_slice(chunk);
    }

    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// Extracts the `href` of every anchor in an HTML document
///
/// Both `<a href="...">` start tags and self-closing `<a href="..."/>` tags
/// count. Other elements carrying `href` (`<link>`, `<area>`, `<base>`) are
/// ignored, as are anchors without the attribute. Values are returned as
/// written, without resolution or filtering.
///
/// # Example
///
/// ```
/// use ripple_map::crawler::extract_links;
///
/// let html = r#"<p><a href="/a">A</a><link href="/style.css"><a href="b"/></p>"#;
/// let links: Vec<String> = extract_links(html).collect();
/// assert_eq!(links, vec!["/a", "b"]);
/// ```
pub fn extract_links(markup: &str) -> Links {
    let document = Html::parse_document(markup);
    let mut hrefs = Vec::new();

    if let Ok(anchor_selector) = Selector::parse("a[href]") {
        for element in document.select(&anchor_selector) {
            if let Some(href) = element.value().attr("href") {
                hrefs.push(href.to_string());
            }
        }
    }

    Links {
        hrefs: hrefs.into_iter(),
    }
}
