// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::Arc;

use thiserror::Error;

/// A specialized `Result` type for cache lookups and configuration.
pub type Result<T> = std::result::Result<T, Error>;

/// An error from a cache lookup or from namespace configuration.
///
/// The type is `Clone` so that a coalesced load can hand the identical
/// failure to every caller waiting on the same key.
///
/// Lookup callers mostly care about [`Error::KeyNotFound`] versus everything
/// else; [`Error::PeerUnavailable`] is normally consumed inside the lookup
/// pipeline (a failing peer falls back to the origin source) and only
/// surfaces from the transport layer itself.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The origin source has no datum for this key.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// The key was empty at the public boundary.
    #[error("key must not be empty")]
    InvalidKey,

    /// A remote peer could not be reached or answered with a non-success
    /// status.
    #[error("peer unavailable: {0}")]
    PeerUnavailable(String),

    /// The origin source failed for a reason other than a missing key.
    #[error(transparent)]
    Source(Arc<dyn std::error::Error + Send + Sync>),

    /// A peer picker was registered twice for the same namespace.
    #[error("peer picker already registered for namespace {0}")]
    AlreadyRegistered(String),
}

impl Error {
    /// Wraps an origin-source failure, preserving the underlying error.
    pub fn source_failure(cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Source(Arc::new(cause))
    }
}
