// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The axum routes serving inbound peer requests.

use axum::{
    Router,
    extract::Path,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use cachemesh::Namespace;
use tracing::debug;

use crate::pool::DEFAULT_BASE_PATH;

/// Routes for inter-peer traffic under [`DEFAULT_BASE_PATH`].
///
/// Mount the router on the listener whose address matches this peer's node
/// id; peers resolve `GET <base_path><namespace>/<key>` against the
/// process-wide namespace registry.
#[must_use]
pub fn router() -> Router {
    router_with_base_path(DEFAULT_BASE_PATH)
}

/// Routes for inter-peer traffic under a custom path prefix. Every member of
/// the peer group must agree on the prefix.
#[must_use]
pub fn router_with_base_path(base_path: &str) -> Router {
    Router::new().route(&format!("{base_path}{{namespace}}/{{key}}"), get(serve_value))
}

/// `GET <base_path><namespace>/<key>`: resolve the namespace and run a
/// regular lookup, so a peer request hits this process's local cache and, on
/// a miss, its origin source.
async fn serve_value(Path((namespace, key)): Path<(String, String)>) -> Response {
    debug!(namespace, key, "peer request");

    let Some(ns) = Namespace::lookup(&namespace) else {
        return (StatusCode::NOT_FOUND, format!("no such namespace: {namespace}")).into_response();
    };

    match ns.get(&key).await {
        Ok(view) => (
            [(header::CONTENT_TYPE, "application/octet-stream")],
            view.to_vec(),
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}
