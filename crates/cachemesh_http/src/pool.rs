// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The peer registry: consistent-hash ring plus per-peer client handles.

use std::{sync::Arc, time::Duration};

use cachemesh::{PeerClient, PeerPicker};
use cachemesh_ring::{HashRing, NodeId};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::client::HttpPeer;

/// Path prefix for inter-peer traffic, leaving the rest of the host's URL
/// space to other services.
pub const DEFAULT_BASE_PATH: &str = "/_cache/";

/// Default virtual replicas per peer on the ring.
pub const DEFAULT_REPLICAS: usize = 50;

/// Ring membership and client handles, mutated together under one lock.
struct PoolState {
    ring: HashRing,
    peers: FxHashMap<NodeId, Arc<HttpPeer>>,
}

/// The peer registry of one cache process.
///
/// Maps keys to owning peers via the consistent-hash ring and hands out the
/// matching [`HttpPeer`] handle. The process's own node id participates in
/// the ring like any other peer, but picking it yields `None` so the lookup
/// pipeline serves the key from its own source instead of dialing itself.
///
/// Register the pool on a namespace with
/// [`Namespace::register_peer_picker`](cachemesh::Namespace::register_peer_picker).
///
/// # Examples
///
/// ```
/// use cachemesh_http::HttpPool;
///
/// let pool = HttpPool::new("http://localhost:8001");
/// pool.add_peers([
///     "http://localhost:8001", // self
///     "http://localhost:8002",
///     "http://localhost:8003",
/// ]);
/// ```
pub struct HttpPool {
    self_id: NodeId,
    base_path: String,
    http: reqwest::Client,
    state: RwLock<PoolState>,
}

impl HttpPool {
    /// Creates a pool for the peer whose public base URL is `self_url`, with
    /// default replicas, base path, and client settings.
    #[must_use]
    pub fn new(self_url: impl Into<String>) -> Self {
        Self::builder(self_url).build()
    }

    /// Starts building a pool with custom settings.
    #[must_use]
    pub fn builder(self_url: impl Into<String>) -> HttpPoolBuilder {
        HttpPoolBuilder {
            self_url: self_url.into(),
            base_path: DEFAULT_BASE_PATH.to_string(),
            replicas: DEFAULT_REPLICAS,
            timeout: None,
        }
    }

    /// Adds peers by node id (base URL), placing them on the ring and
    /// creating a client handle per peer. Adding the pool's own id is fine
    /// and expected; it gets ring positions but no traffic from this
    /// process.
    pub fn add_peers<I, N>(&self, peers: I)
    where
        I: IntoIterator<Item = N>,
        N: Into<NodeId>,
    {
        let mut state = self.state.write();
        for peer in peers {
            let peer = peer.into();
            let endpoint = format!("{}{}", peer, self.base_path);
            state.ring.add_nodes([peer.clone()]);
            state
                .peers
                .insert(peer, Arc::new(HttpPeer::new(endpoint, self.http.clone())));
        }
    }

    /// Removes a peer and all of its ring positions.
    pub fn remove_peer(&self, peer: &NodeId) {
        let mut state = self.state.write();
        if state.peers.remove(peer).is_some() {
            state.ring.remove_node(peer);
        }
    }

    /// The node id of this process.
    #[must_use]
    pub fn self_id(&self) -> &NodeId {
        &self.self_id
    }
}

impl PeerPicker for HttpPool {
    fn pick(&self, key: &str) -> Option<Arc<dyn PeerClient>> {
        let state = self.state.read();
        let owner = state.ring.pick(key)?;
        if *owner == self.self_id {
            // The key hashed home; the caller loads from its own source.
            return None;
        }
        debug!(%owner, key, "picked peer");
        state
            .peers
            .get(owner)
            .map(|peer| Arc::clone(peer) as Arc<dyn PeerClient>)
    }
}

impl std::fmt::Debug for HttpPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPool")
            .field("self_id", &self.self_id)
            .field("base_path", &self.base_path)
            .finish_non_exhaustive()
    }
}

/// Builder for [`HttpPool`].
#[derive(Debug)]
pub struct HttpPoolBuilder {
    self_url: String,
    base_path: String,
    replicas: usize,
    timeout: Option<Duration>,
}

impl HttpPoolBuilder {
    /// Overrides the inter-peer path prefix. Every member of the group must
    /// agree on it.
    #[must_use]
    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Overrides the virtual replicas per peer. Every member of the group
    /// must agree on it.
    #[must_use]
    pub fn replicas(mut self, replicas: usize) -> Self {
        self.replicas = replicas;
        self
    }

    /// Caps the time spent on one peer request; an expired deadline surfaces
    /// as a peer failure and the lookup falls back to the origin source.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the pool.
    #[must_use]
    pub fn build(self) -> HttpPool {
        let mut http = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }
        HttpPool {
            self_id: NodeId::new(self.self_url),
            base_path: self.base_path,
            http: http.build().expect("default reqwest client configuration is valid"),
            state: RwLock::new(PoolState {
                ring: HashRing::new(self.replicas),
                peers: FxHashMap::default(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pool_picks_nothing() {
        let pool = HttpPool::new("http://localhost:8001");
        assert!(pool.pick("key").is_none());
    }

    #[test]
    fn never_picks_self() {
        let pool = HttpPool::new("http://localhost:8001");
        pool.add_peers(["http://localhost:8001"]);

        // Every key is owned by the only node, which is us.
        for i in 0..100 {
            assert!(pool.pick(&format!("key-{i}")).is_none());
        }
    }

    #[test]
    fn removal_stops_routing() {
        let pool = HttpPool::new("http://localhost:8001");
        pool.add_peers(["http://localhost:8001", "http://localhost:8002"]);

        let routed_somewhere = (0..100).any(|i| pool.pick(&format!("key-{i}")).is_some());
        assert!(routed_somewhere, "two nodes should split the key space");

        pool.remove_peer(&NodeId::from("http://localhost:8002"));
        for i in 0..100 {
            assert!(pool.pick(&format!("key-{i}")).is_none());
        }
    }
}
