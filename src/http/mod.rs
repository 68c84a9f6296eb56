//! Byte-fetch collaborator for remote filter resources.

mod client;

use anyhow::Result;
use async_trait::async_trait;

pub use client::HttpClient;

/// Trait for fetching raw bytes from a URL.
///
/// The filter core never talks to the network directly; it goes through this
/// trait so rule resolution can be tested without a server.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetch the body behind `url` as raw bytes.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}
