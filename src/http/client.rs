//! HTTP client for fetching remote rule resources.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};

use super::Fetch;

/// Thin wrapper around a reqwest [`Client`].
///
/// Carries an optional bearer api key and an opt-in bypass of TLS
/// certificate verification for self-hosted rule servers. There is no retry
/// logic: a failed fetch fails the rule resolution.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Build a client, installing `api_key` as a bearer Authorization header
    /// when present.
    pub fn new(api_key: Option<&str>, insecure_skip_verify: bool) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", key))?;
            auth_value.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth_value);
        }

        let client = Client::builder()
            .user_agent("binfilter-cli")
            .default_headers(headers)
            .danger_accept_invalid_certs(insecure_skip_verify)
            .build()?;

        Ok(Self { client })
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Fetch for HttpClient {
    #[tracing::instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        debug!("GET {}...", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        let response = response
            .error_for_status()
            .with_context(|| format!("Request to {} failed", url))?;

        let body = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))?;

        debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body.to_vec())
    }
}
