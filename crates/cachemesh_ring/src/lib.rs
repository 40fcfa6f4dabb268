// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Consistent-hash ring with virtual replicas.
//!
//! [`HashRing`] maps keys to owning nodes so that membership changes remap
//! only a bounded fraction of the key space. Each node contributes
//! `replicas` virtual positions derived from `"{node}-{i}"` for
//! `i in 0..replicas`; a key belongs to the node owning the first position at
//! or after the key's hash, wrapping around the top of the 32-bit space.
//!
//! The default hash is CRC32-IEEE. The virtual-position encoding and the
//! hash together form a compatibility contract: two processes only agree on
//! key ownership if they use the same replicas count, hash, and node set.
//!
//! The ring itself is a plain data structure: mutations take `&mut self` and
//! lookups take `&self`. Owners that share a ring across threads serialize
//! mutations and fence lookups with an outer lock.
//!
//! # Example
//!
//! ```
//! use cachemesh_ring::{HashRing, NodeId};
//!
//! let mut ring = HashRing::new(50);
//! ring.add_nodes(["http://cache-a:8001", "http://cache-b:8002"]);
//!
//! let owner = ring.pick("user:42").expect("ring is not empty");
//! assert!(owner.as_str().starts_with("http://cache-"));
//! ```

use std::fmt;

use rustc_hash::FxHashMap;

/// Opaque identifier of a ring node, typically the peer's base URL.
///
/// Equality is byte-exact on the underlying string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(String);

impl NodeId {
    /// Wraps a node identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The position hash, replaceable for deterministic tests.
type HashFn = Box<dyn Fn(&[u8]) -> u32 + Send + Sync>;

/// A consistent-hash ring: sorted virtual positions plus a position→node map.
pub struct HashRing {
    replicas: usize,
    hasher: HashFn,
    positions: Vec<u32>,
    nodes: FxHashMap<u32, NodeId>,
}

impl HashRing {
    /// Creates a ring hashing with CRC32-IEEE.
    ///
    /// # Panics
    ///
    /// Panics if `replicas` is zero.
    #[must_use]
    pub fn new(replicas: usize) -> Self {
        Self::with_hasher(replicas, crc32fast::hash)
    }

    /// Creates a ring with a custom position hash.
    ///
    /// All members of one logical ring must share the same hash, replicas
    /// count, and virtual-position encoding.
    ///
    /// # Panics
    ///
    /// Panics if `replicas` is zero.
    #[must_use]
    pub fn with_hasher(replicas: usize, hasher: impl Fn(&[u8]) -> u32 + Send + Sync + 'static) -> Self {
        assert!(replicas >= 1, "ring requires at least one replica per node");
        Self {
            replicas,
            hasher: Box::new(hasher),
            positions: Vec::new(),
            nodes: FxHashMap::default(),
        }
    }

    /// Adds nodes to the ring, placing `replicas` virtual positions per node.
    ///
    /// Position collisions across nodes resolve last-write-wins; a
    /// well-distributed hash makes them negligible. The position list is
    /// re-sorted once per batch.
    pub fn add_nodes<I, N>(&mut self, nodes: I)
    where
        I: IntoIterator<Item = N>,
        N: Into<NodeId>,
    {
        let mut added = false;
        for node in nodes {
            let node = node.into();
            let placed: Vec<u32> = self.virtual_positions(&node).collect();
            for position in placed {
                self.nodes.insert(position, node.clone());
                self.positions.push(position);
                added = true;
            }
        }
        if added {
            self.positions.sort_unstable();
        }
    }

    /// Removes a node: recomputes its `replicas` positions and deletes
    /// exactly those from the map and the position list.
    pub fn remove_node(&mut self, node: &NodeId) {
        let removed: Vec<u32> = self.virtual_positions(node).collect();
        for position in &removed {
            self.nodes.remove(position);
        }
        self.positions.retain(|position| !removed.contains(position));
    }

    /// Picks the node owning `key`, or `None` if the ring is empty.
    ///
    /// The owner is the node at the smallest position at or after
    /// `hash(key)`, wrapping to the first position past the top of the ring.
    #[must_use]
    pub fn pick(&self, key: &str) -> Option<&NodeId> {
        if self.positions.is_empty() {
            return None;
        }
        let hash = (self.hasher)(key.as_bytes());
        let idx = self.positions.partition_point(|&position| position < hash);
        let position = self.positions[idx % self.positions.len()];
        Some(&self.nodes[&position])
    }

    /// `true` if the ring holds no positions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Number of virtual positions currently on the ring.
    #[must_use]
    pub fn positions_len(&self) -> usize {
        self.positions.len()
    }

    /// The virtual positions of `node`: `hash("{node}-{i}")` for each
    /// replica index in decimal with no leading zeros.
    fn virtual_positions<'a>(&'a self, node: &'a NodeId) -> impl Iterator<Item = u32> + 'a {
        (0..self.replicas).map(move |i| (self.hasher)(format!("{}-{i}", node.0).as_bytes()))
    }
}

impl fmt::Debug for HashRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashRing")
            .field("replicas", &self.replicas)
            .field("positions", &self.positions.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_ring_picks_nothing() {
        let ring = HashRing::new(3);
        assert!(ring.pick("anything").is_none());
    }

    #[test]
    fn single_node_owns_everything() {
        let mut ring = HashRing::new(4);
        ring.add_nodes(["only"]);
        for key in ["a", "b", "c", "zz"] {
            assert_eq!(ring.pick(key), Some(&NodeId::from("only")));
        }
    }

    #[test]
    fn removal_clears_positions() {
        let mut ring = HashRing::new(5);
        ring.add_nodes(["a", "b"]);
        assert_eq!(ring.positions_len(), 10);

        ring.remove_node(&NodeId::from("a"));
        assert_eq!(ring.positions_len(), 5);
        for key in ["x", "y", "z"] {
            assert_eq!(ring.pick(key), Some(&NodeId::from("b")));
        }
    }

    #[test]
    #[should_panic(expected = "at least one replica")]
    fn zero_replicas_rejected() {
        let _ = HashRing::new(0);
    }
}
