// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The origin data source a namespace falls back to on a cache miss.

use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;

/// Loads the authoritative value for a key when every cache layer misses.
///
/// Implemented by the embedder; the namespace treats the returned buffer as
/// its own from the moment it is handed over, so sources must not retain a
/// way to mutate it.
///
/// Return [`Error::KeyNotFound`](crate::Error::KeyNotFound) for keys that do
/// not exist and [`Error::source_failure`](crate::Error::source_failure) for
/// infrastructure failures; the distinction is surfaced verbatim to lookup
/// callers. The namespace never retries on its own.
///
/// Synchronous lookup functions become sources via [`source_fn`]:
///
/// ```
/// use cachemesh::{Error, source_fn};
///
/// let source = source_fn(|key: &str| match key {
///     "Tom" => Ok(b"630".to_vec()),
///     _ => Err(Error::KeyNotFound(key.to_string())),
/// });
/// # let _ = source;
/// ```
#[async_trait]
pub trait Source: Send + Sync {
    /// Loads the value for `key` from the origin.
    async fn load(&self, key: &str) -> Result<Vec<u8>>;
}

/// One origin can back any number of namespaces: sources forward through
/// `Arc`.
#[async_trait]
impl<T: Source + ?Sized> Source for Arc<T> {
    async fn load(&self, key: &str) -> Result<Vec<u8>> {
        (**self).load(key).await
    }
}

#[async_trait]
impl<T: Source + ?Sized> Source for Box<T> {
    async fn load(&self, key: &str) -> Result<Vec<u8>> {
        (**self).load(key).await
    }
}

/// Adapts a plain lookup function into a [`Source`].
///
/// Created by [`source_fn`].
#[derive(Clone)]
pub struct SourceFn<F> {
    f: F,
}

/// Wraps a synchronous lookup function as a [`Source`].
pub fn source_fn<F>(f: F) -> SourceFn<F>
where
    F: Fn(&str) -> Result<Vec<u8>> + Send + Sync,
{
    SourceFn { f }
}

#[async_trait]
impl<F> Source for SourceFn<F>
where
    F: Fn(&str) -> Result<Vec<u8>> + Send + Sync,
{
    async fn load(&self, key: &str) -> Result<Vec<u8>> {
        (self.f)(key)
    }
}

impl<F> std::fmt::Debug for SourceFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceFn").finish_non_exhaustive()
    }
}
