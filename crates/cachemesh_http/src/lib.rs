// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! HTTP peer transport for cachemesh.
//!
//! Peers reach each other over plain HTTP:
//! `GET <peer><base_path><namespace>/<key>` returns the value bytes as
//! `application/octet-stream`. This crate provides the three transport
//! pieces a peer process needs:
//!
//! - [`router`]: the axum routes serving inbound peer requests against the
//!   process-wide namespace registry,
//! - [`HttpPeer`]: the client handle for one remote peer,
//! - [`HttpPool`]: the peer registry gluing the consistent-hash ring to the
//!   client handles, registered on a namespace as its peer picker.
//!
//! A peer process wires the pieces together like this:
//!
//! ```no_run
//! use std::sync::Arc;
//! use cachemesh::{Namespace, source_fn};
//! use cachemesh_http::HttpPool;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let scores = Namespace::builder("scores")
//!     .cache_bytes(2 << 10)
//!     .source(source_fn(|key: &str| Err(cachemesh::Error::KeyNotFound(key.to_string()))))
//!     .build();
//!
//! let pool = Arc::new(HttpPool::new("http://localhost:8001"));
//! pool.add_peers(["http://localhost:8001", "http://localhost:8002"]);
//! scores.register_peer_picker(pool)?;
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8001").await?;
//! axum::serve(listener, cachemesh_http::router()).await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod pool;
mod server;

pub use client::HttpPeer;
pub use pool::{DEFAULT_BASE_PATH, DEFAULT_REPLICAS, HttpPool, HttpPoolBuilder};
pub use server::{router, router_with_base_path};
