pub mod auth;
mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result};
use tracing::debug;

/// Performs a single GET and returns the body.
///
/// Non-2xx responses are turned into errors; there is no retry.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(
        reqwest::Method::GET,
        url.parse().with_context(|| format!("invalid feed URL '{url}'"))?,
    );

    let resp = client.execute(req).await?.error_for_status()?;
    let bytes = resp.bytes().await?;
    debug!(url, bytes = bytes.len(), "Feed body received");
    Ok(bytes.to_vec())
}

/// Loads feed bytes over HTTP, or from disk when `source` is not a URL.
///
/// Reading from a file makes it possible to replay a saved feed.
#[tracing::instrument(skip(client))]
pub async fn load_feed<C: HttpClient>(client: &C, source: &str) -> Result<Vec<u8>> {
    if source.starts_with("http") {
        fetch_bytes(client, source).await
    } else {
        std::fs::read(source).with_context(|| format!("failed to read feed file '{source}'"))
    }
}
