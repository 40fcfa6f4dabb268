// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Distributed in-memory key/value caching.
//!
//! cachemesh federates peer processes into one logical cache: every key has
//! exactly one owning peer (chosen by consistent hashing in the transport
//! layer), concurrent misses for a key collapse into a single origin load,
//! and each peer bounds its memory with a byte-budgeted LRU.
//!
//! This crate is the pipeline core. A [`Namespace`] owns a local cache, an
//! origin [`Source`], and an optional [`PeerPicker`] wired in by a transport
//! crate; [`Namespace::get`] walks local cache → owning peer → origin
//! source. Values are immutable [`ByteView`]s that can be shared cheaply
//! with any number of callers.
//!
//! # Standalone example
//!
//! Without a peer picker, a namespace is a process-local loading cache:
//!
//! ```
//! use cachemesh::{Error, Namespace, source_fn};
//!
//! # futures::executor::block_on(async {
//! let users = Namespace::builder("users-standalone")
//!     .cache_bytes(64 << 20)
//!     .source(source_fn(|key: &str| match key {
//!         "alice" => Ok(b"42".to_vec()),
//!         _ => Err(Error::KeyNotFound(key.to_string())),
//!     }))
//!     .build();
//!
//! assert_eq!(users.get("alice").await?.as_slice(), b"42");
//! assert!(matches!(users.get("bob").await, Err(Error::KeyNotFound(_))));
//! # Ok::<(), Error>(())
//! # });
//! ```
//!
//! In a cluster, the transport layer (see the `cachemesh_http` crate)
//! registers a peer picker on the namespace and serves inbound peer requests
//! through [`Namespace::lookup`].

mod cache;
mod error;
mod namespace;
mod peers;
mod source;
mod view;

pub(crate) use cache::GuardedCache;

pub use error::{Error, Result};
pub use namespace::{Namespace, NamespaceBuilder, NamespaceBuilderWithSource};
pub use peers::{PeerClient, PeerPicker};
pub use source::{Source, SourceFn, source_fn};
pub use view::ByteView;
