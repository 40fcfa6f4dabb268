// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Three-peer cluster demo.
//!
//! Run one process per peer, then query any of them through the API
//! endpoint:
//!
//! ```text
//! cachemesh-demo --port 8001 &
//! cachemesh-demo --port 8002 &
//! cachemesh-demo --port 8003 --api &
//! curl "http://localhost:9999/api?key=Tom"
//! ```
//!
//! Every peer knows the full member list; whichever peer receives a request
//! either owns the key (and loads it from the mock DB on a miss) or forwards
//! to the owner over HTTP.

use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    Router,
    extract::Query,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use cachemesh::{Error, Namespace, source_fn};
use cachemesh_http::HttpPool;
use clap::Parser;
use tracing::info;

const PEERS: [(u16, &str); 3] = [
    (8001, "http://localhost:8001"),
    (8002, "http://localhost:8002"),
    (8003, "http://localhost:8003"),
];

const API_ADDR: &str = "127.0.0.1:9999";

#[derive(Debug, Parser)]
#[command(name = "cachemesh-demo", about = "Run one peer of the demo cache cluster")]
struct Args {
    /// Peer port to listen on (8001, 8002, or 8003).
    #[arg(long, default_value_t = 8001)]
    port: u16,

    /// Also serve the user-facing API endpoint on port 9999.
    #[arg(long)]
    api: bool,
}

/// The mock slow DB every peer can load from.
fn create_namespace() -> Arc<Namespace> {
    let db: HashMap<&str, &str> = HashMap::from([("Tom", "630"), ("Jack", "589"), ("Sam", "567")]);
    Namespace::builder("scores")
        .cache_bytes(2 << 10)
        .source(source_fn(move |key: &str| {
            info!(key, "slow db lookup");
            std::thread::sleep(Duration::from_millis(100));
            db.get(key)
                .map(|value| value.as_bytes().to_vec())
                .ok_or_else(|| Error::KeyNotFound(key.to_string()))
        }))
        .build()
}

#[derive(Debug, serde::Deserialize)]
struct ApiQuery {
    key: String,
}

/// `GET /api?key=…`: the user-facing entry point, served by one peer for the
/// whole cluster.
async fn api_lookup(Query(query): Query<ApiQuery>) -> Response {
    let Some(ns) = Namespace::lookup("scores") else {
        return (StatusCode::INTERNAL_SERVER_ERROR, "scores namespace missing").into_response();
    };
    match ns.get(&query.key).await {
        Ok(view) => (
            [(header::CONTENT_TYPE, "application/octet-stream")],
            view.to_vec(),
        )
            .into_response(),
        Err(Error::KeyNotFound(key)) => (StatusCode::NOT_FOUND, format!("{key} does not exist")).into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let self_url = PEERS
        .iter()
        .find(|(port, _)| *port == args.port)
        .map(|(_, url)| *url)
        .ok_or("--port must be one of 8001, 8002, 8003")?;

    let namespace = create_namespace();

    let pool = Arc::new(HttpPool::new(self_url));
    pool.add_peers(PEERS.iter().map(|(_, url)| *url));
    namespace.register_peer_picker(pool)?;

    if args.api {
        tokio::spawn(async {
            let app = Router::new().route("/api", get(api_lookup));
            let listener = tokio::net::TcpListener::bind(API_ADDR)
                .await
                .expect("bind api address");
            info!("api server listening on http://{API_ADDR}");
            axum::serve(listener, app).await.expect("api server runs");
        });
    }

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", args.port)).await?;
    info!(%self_url, "cache peer listening");
    axum::serve(listener, cachemesh_http::router()).await?;
    Ok(())
}
