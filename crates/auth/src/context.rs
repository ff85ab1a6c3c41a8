use std::collections::HashMap;

use crate::IdentityClaims;

/// Transport metadata of one inbound request.
///
/// Keys are case-insensitive (stored lower-cased); values are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMetadata {
    entries: HashMap<String, String>,
}

impl RequestMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        self.entries
            .insert(key.as_ref().to_ascii_lowercase(), value.into());
    }

    pub fn with(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for RequestMetadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut metadata = Self::new();
        for (k, v) in iter {
            metadata.insert(k, v);
        }
        metadata
    }
}

/// Request-scoped context: inbound metadata plus the claims attached once the
/// caller has been verified.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    metadata: RequestMetadata,
    claims: Option<IdentityClaims>,
}

impl RequestContext {
    pub fn new(metadata: RequestMetadata) -> Self {
        Self {
            metadata,
            claims: None,
        }
    }

    pub fn metadata(&self) -> &RequestMetadata {
        &self.metadata
    }

    pub fn claims(&self) -> Option<&IdentityClaims> {
        self.claims.as_ref()
    }

    pub fn attach_claims(&mut self, claims: IdentityClaims) {
        self.claims = Some(claims);
    }
}
