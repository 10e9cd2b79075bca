//! Response classification
//!
//! The catalog reports most failures with a normal-looking HTML page rather
//! than an HTTP status, so bodies are scanned for the known failure
//! signatures. Detection is plain substring matching; anything unrecognised
//! is treated as a valid response.
//!
//! Every failure except [`UpstreamFailure::ErrorPage`] is transient and
//! retried by the fetcher.

use crate::UpstreamFailure;

/// Classifies a fetched response body
///
/// # Signatures
///
/// | Marker | Failure |
/// |--------|---------|
/// | title contains "Request-URI Too Large" | OversizedRequest |
/// | body contains "max_user_connections" | ConnectionLimitExceeded |
/// | title contains "524" and "timeout" | GatewayTimeout |
/// | body contains "Too many requests for" | RateLimited |
/// | title contains "502" and "Bad Gateway" | BadGateway |
/// | `<center>nginx</center>` footer, 5xx status | ServerError |
/// | `<center>nginx</center>` footer, other status | ErrorPage |
///
/// # Example
///
/// ```
/// use libgen_comics::fetcher::classify;
/// use libgen_comics::UpstreamFailure;
///
/// assert!(classify(r#"{"1": {"title": "Saga"}}"#).is_ok());
/// assert_eq!(
///     classify("<p>Too many requests for your IP</p>"),
///     Err(UpstreamFailure::RateLimited)
/// );
/// ```
pub fn classify(body: &str) -> Result<(), UpstreamFailure> {
    let title = extract_title(body).map(|t| t.to_lowercase());
    let title = title.as_deref().unwrap_or("");

    if title.contains("request-uri too large") {
        return Err(UpstreamFailure::OversizedRequest);
    }

    if body.contains("max_user_connections") {
        return Err(UpstreamFailure::ConnectionLimitExceeded);
    }

    if title.contains("524") && title.contains("timeout") {
        return Err(UpstreamFailure::GatewayTimeout);
    }

    if body.contains("Too many requests for") {
        return Err(UpstreamFailure::RateLimited);
    }

    if title.contains("502") && title.contains("bad gateway") {
        return Err(UpstreamFailure::BadGateway);
    }

    if body.contains("<center>nginx") {
        let status = status_code(title).or_else(|| {
            extract_element(body, "h1").and_then(status_code)
        });
        return match status {
            Some(500..=599) => Err(UpstreamFailure::ServerError),
            other => Err(UpstreamFailure::ErrorPage(other)),
        };
    }

    Ok(())
}

/// Returns the text of the first `<title>` element, if any
fn extract_title(body: &str) -> Option<&str> {
    extract_element(body, "title")
}

/// Returns the trimmed text of the first `<tag>` element, if any
fn extract_element<'a>(body: &'a str, tag: &str) -> Option<&'a str> {
    // ASCII lowercasing keeps byte offsets aligned with `body`
    let lower = body.to_ascii_lowercase();
    let open = lower.find(&format!("<{}", tag))?;
    let content_start = open + lower[open..].find('>')? + 1;
    let content_end = content_start + lower[content_start..].find(&format!("</{}", tag))?;
    Some(body[content_start..content_end].trim())
}

/// Reads an HTTP status such as "404" from heading text like "404 Not Found"
fn status_code(text: &str) -> Option<u16> {
    text.split_whitespace()
        .find(|token| token.len() == 3 && token.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|token| token.parse().ok())
}
