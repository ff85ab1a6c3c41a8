use axum::http::HeaderMap;

use cellcentre_auth::{RequestContext, RequestMetadata};

/// Copy HTTP headers into transport-neutral request metadata.
///
/// Non-UTF-8 header values are skipped.
pub fn metadata_from_headers(headers: &HeaderMap) -> RequestMetadata {
    headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v)))
        .collect()
}

pub fn request_context(headers: &HeaderMap) -> RequestContext {
    RequestContext::new(metadata_from_headers(headers))
}
