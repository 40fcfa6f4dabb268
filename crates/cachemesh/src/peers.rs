// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Interfaces between a namespace and the peer transport.
//!
//! The transport layer (an HTTP pool in this workspace) decides which peer
//! owns a key and how to reach it; the namespace only sees these two traits.

use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;

/// A handle to one remote peer, provided by the transport layer.
#[async_trait]
pub trait PeerClient: Send + Sync {
    /// Fetches the value for `key` in `namespace` from the remote peer.
    ///
    /// Transport failures and non-success peer responses surface as
    /// [`Error::PeerUnavailable`](crate::Error::PeerUnavailable); the lookup
    /// pipeline treats that as a signal to fall back to the origin source.
    async fn fetch(&self, namespace: &str, key: &str) -> Result<Vec<u8>>;
}

/// Locates the peer that owns a key.
pub trait PeerPicker: Send + Sync {
    /// Returns the handle of the owning remote peer, or `None` when the
    /// current process owns the key (or no peers are known) and the caller
    /// should consult the origin source itself.
    fn pick(&self, key: &str) -> Option<Arc<dyn PeerClient>>;
}
