// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Named caches and the lookup pipeline.
//!
//! A [`Namespace`] is a named logical cache with its own byte budget, origin
//! source, and view of the peer group. A lookup walks local cache → owning
//! peer → origin source, with concurrent misses for the same key coalesced
//! into a single load.

use std::{
    collections::HashMap,
    sync::{Arc, LazyLock, OnceLock},
};

use cachemesh_flight::Flight;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::{ByteView, Error, GuardedCache, PeerPicker, Result, Source};

/// Process-wide name → namespace registry. The transport layer resolves
/// inbound peer requests against it.
static NAMESPACES: LazyLock<RwLock<HashMap<String, Arc<Namespace>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// A named logical cache backed by an origin source and, optionally, a peer
/// group.
///
/// Create namespaces through [`Namespace::builder`]; building registers the
/// namespace under its name so the transport layer can route inbound peer
/// requests to it via [`Namespace::lookup`].
///
/// # Examples
///
/// ```
/// use cachemesh::{Error, Namespace, source_fn};
///
/// # futures::executor::block_on(async {
/// let scores = Namespace::builder("scores-example")
///     .cache_bytes(2 << 10)
///     .source(source_fn(|key: &str| match key {
///         "Tom" => Ok(b"630".to_vec()),
///         _ => Err(Error::KeyNotFound(key.to_string())),
///     }))
///     .build();
///
/// let view = scores.get("Tom").await?;
/// assert_eq!(view.as_slice(), b"630");
/// # Ok::<(), Error>(())
/// # });
/// ```
pub struct Namespace {
    name: String,
    source: Arc<dyn Source>,
    cache: GuardedCache,
    peers: OnceLock<Arc<dyn PeerPicker>>,
    flight: Flight<String, Result<ByteView>>,
}

impl Namespace {
    /// Starts building a namespace with the given name.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> NamespaceBuilder {
        NamespaceBuilder {
            name: name.into(),
            cache_bytes: 0,
        }
    }

    /// Returns the namespace previously registered under `name`.
    #[must_use]
    pub fn lookup(name: &str) -> Option<Arc<Namespace>> {
        NAMESPACES.read().get(name).cloned()
    }

    /// Drops every registered namespace. Intended for tests that need a
    /// deterministic starting point.
    pub fn clear_registry() {
        NAMESPACES.write().clear();
    }

    /// The namespace's registered name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wires in the peer picker. May be called at most once per namespace;
    /// namespaces without a picker serve every miss from the origin source.
    pub fn register_peer_picker(&self, picker: Arc<dyn PeerPicker>) -> Result<()> {
        self.peers
            .set(picker)
            .map_err(|_| Error::AlreadyRegistered(self.name.clone()))
    }

    /// Looks up `key`: local cache first, then a coalesced load from the
    /// owning peer or the origin source.
    ///
    /// Concurrent callers missing on the same key share a single load; all
    /// of them receive the same value or the same error. Values fetched from
    /// a peer are returned without populating the local cache: the owning
    /// peer already caches them, and duplicating every remote hit would
    /// collapse the group's aggregate capacity to that of one node. Values
    /// loaded from the source are cached locally before being returned.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidKey`] for an empty key; otherwise whatever the origin
    /// source returned for this load episode ([`Error::KeyNotFound`] or a
    /// source failure).
    pub async fn get(&self, key: &str) -> Result<ByteView> {
        if key.is_empty() {
            return Err(Error::InvalidKey);
        }

        if let Some(view) = self.cache.get(key) {
            debug!(namespace = %self.name, key, "local cache hit");
            return Ok(view);
        }

        self.flight.work(key.to_string(), || self.load(key)).await
    }

    /// The miss path, executed once per in-flight key episode.
    async fn load(&self, key: &str) -> Result<ByteView> {
        if let Some(picker) = self.peers.get() {
            if let Some(peer) = picker.pick(key) {
                match peer.fetch(&self.name, key).await {
                    Ok(bytes) => {
                        debug!(namespace = %self.name, key, "served by peer");
                        return Ok(ByteView::from(bytes));
                    }
                    Err(err) => {
                        warn!(namespace = %self.name, key, %err, "peer fetch failed, falling back to source");
                    }
                }
            }
        }
        self.load_from_source(key).await
    }

    async fn load_from_source(&self, key: &str) -> Result<ByteView> {
        let bytes = self.source.load(key).await?;
        let view = ByteView::from(bytes);
        self.cache.put(key, view.clone());
        debug!(namespace = %self.name, key, len = view.len(), "loaded from source");
        Ok(view)
    }
}

impl std::fmt::Debug for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Namespace")
            .field("name", &self.name)
            .field("has_peers", &self.peers.get().is_some())
            .finish_non_exhaustive()
    }
}

/// First-stage namespace builder: name and budget.
#[derive(Debug)]
pub struct NamespaceBuilder {
    name: String,
    cache_bytes: i64,
}

impl NamespaceBuilder {
    /// Sets the local cache byte budget. `0` (the default) means unbounded.
    #[must_use]
    pub fn cache_bytes(mut self, cache_bytes: i64) -> Self {
        self.cache_bytes = cache_bytes;
        self
    }

    /// Sets the mandatory origin source, unlocking [`build`](NamespaceBuilderWithSource::build).
    #[must_use]
    pub fn source(self, source: impl Source + 'static) -> NamespaceBuilderWithSource {
        NamespaceBuilderWithSource {
            name: self.name,
            cache_bytes: self.cache_bytes,
            source: Arc::new(source),
        }
    }
}

/// Second-stage namespace builder; the source is set.
pub struct NamespaceBuilderWithSource {
    name: String,
    cache_bytes: i64,
    source: Arc<dyn Source>,
}

impl NamespaceBuilderWithSource {
    /// Builds the namespace and registers it process-wide under its name,
    /// replacing any namespace previously registered under the same name.
    #[must_use]
    pub fn build(self) -> Arc<Namespace> {
        let namespace = Arc::new(Namespace {
            name: self.name,
            source: self.source,
            cache: GuardedCache::new(self.cache_bytes),
            peers: OnceLock::new(),
            flight: Flight::new(),
        });
        NAMESPACES
            .write()
            .insert(namespace.name.clone(), Arc::clone(&namespace));
        namespace
    }
}
