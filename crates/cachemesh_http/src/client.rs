// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The HTTP client handle for one remote peer.

use async_trait::async_trait;
use cachemesh::{Error, PeerClient, Result};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// Characters escaped inside one URL path segment. Beyond the always-unsafe
/// set this covers the segment and query delimiters, so namespaces and keys
/// survive the round-trip byte-exact.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Escapes `segment` for use as one path segment.
pub(crate) fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

/// A remote peer reachable over HTTP.
///
/// The handle fetches `(namespace, key)` pairs from the peer's cache
/// endpoint. Any transport failure or non-success status maps to
/// [`Error::PeerUnavailable`], which the lookup pipeline answers by falling
/// back to the origin source.
#[derive(Clone, Debug)]
pub struct HttpPeer {
    /// The peer's cache endpoint including the base path, e.g.
    /// `http://cache-b:8002/_cache/`.
    endpoint: String,
    http: reqwest::Client,
}

impl HttpPeer {
    pub(crate) fn new(endpoint: String, http: reqwest::Client) -> Self {
        Self { endpoint, http }
    }

    /// The peer's cache endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PeerClient for HttpPeer {
    async fn fetch(&self, namespace: &str, key: &str) -> Result<Vec<u8>> {
        let url = format!(
            "{}{}/{}",
            self.endpoint,
            encode_segment(namespace),
            encode_segment(key)
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| Error::PeerUnavailable(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::PeerUnavailable(format!("{url} returned {status}")));
        }

        // Read the body to completion; values are returned whole or not at
        // all.
        let body = response
            .bytes()
            .await
            .map_err(|err| Error::PeerUnavailable(format!("reading response body: {err}")))?;
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_are_escaped() {
        assert_eq!(encode_segment("plain-key"), "plain-key");
        assert_eq!(encode_segment("a b"), "a%20b");
        assert_eq!(encode_segment("a/b"), "a%2Fb");
        assert_eq!(encode_segment("50%"), "50%25");
        assert_eq!(encode_segment("müller"), "m%C3%BCller");
    }
}
