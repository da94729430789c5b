//! Retrieval of source files from a local directory or an HTTP base URL.

mod basic;
mod client;
mod source;

pub use basic::BasicClient;
pub use client::HttpClient;
pub use source::SourceRoot;

use anyhow::{Context, Result};

/// Issues a GET for `url` and returns the body of a successful response.
///
/// # Errors
///
/// Fails on an unparseable URL, a transport error, or a non-2xx status.
pub async fn fetch_bytes<C: HttpClient + ?Sized>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(
        reqwest::Method::GET,
        url.parse().with_context(|| format!("invalid url {url}"))?,
    );

    let resp = client.execute(req).await?.error_for_status()?;
    Ok(resp.bytes().await?.to_vec())
}
