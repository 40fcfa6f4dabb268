// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! A single-process namespace acting as a loading cache over a slow source.

use std::time::Duration;

use cachemesh::{Error, Namespace, source_fn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    let scores = Namespace::builder("scores")
        .cache_bytes(2 << 10)
        .source(source_fn(|key: &str| {
            println!("[slow db] loading {key}");
            std::thread::sleep(Duration::from_millis(100));
            match key {
                "Tom" => Ok(b"630".to_vec()),
                "Jack" => Ok(b"589".to_vec()),
                "Sam" => Ok(b"567".to_vec()),
                _ => Err(Error::KeyNotFound(key.to_string())),
            }
        }))
        .build();

    // The first lookup pays the source latency; the rest are local hits.
    for _ in 0..3 {
        let view = scores.get("Tom").await?;
        println!("Tom = {}", String::from_utf8_lossy(view.as_slice()));
    }

    match scores.get("Nobody").await {
        Err(Error::KeyNotFound(key)) => println!("{key} is not in the db"),
        other => println!("unexpected result: {other:?}"),
    }

    Ok(())
}
