//! Loading SARK configurations from strings, files and remote resources.

use anyhow::{Context, Result, bail};
use std::path::Path;

use crate::http::Fetch;
use crate::runtime::Runtime;

use super::SarkConfig;

impl SarkConfig {
    /// Parse a configuration from YAML text. `id` stays empty; callers that
    /// know the origin set it afterwards.
    pub fn from_str(config: &str) -> Result<SarkConfig> {
        if config.trim().is_empty() {
            bail!("Invalid configuration: empty document");
        }
        serde_yaml::from_str(config).context("Failed to parse SARK configuration")
    }

    /// Parse a configuration from raw YAML bytes.
    pub fn from_bytes(data: &[u8]) -> Result<SarkConfig> {
        if data.is_empty() {
            bail!("Invalid configuration: empty document");
        }
        let text = std::str::from_utf8(data).context("Configuration is not valid UTF-8")?;
        Self::from_str(text)
    }

    /// Load a configuration from a local file. The document id becomes the
    /// canonical absolute path, which the filter uses for deduplication.
    pub fn from_file<R: Runtime + ?Sized>(runtime: &R, file: &Path) -> Result<SarkConfig> {
        let content = runtime
            .read_to_string(file)
            .with_context(|| format!("Failed to read SARK configuration {:?}", file))?;
        let mut config = Self::from_str(&content)
            .with_context(|| format!("Failed to parse SARK configuration {:?}", file))?;
        config.id = runtime
            .canonicalize(file)?
            .to_string_lossy()
            .into_owned();
        Ok(config)
    }

    /// Load a configuration from a resource reference: `http(s)://` goes
    /// through the fetch collaborator, anything else is a local path.
    pub async fn from_resource<R, F>(runtime: &R, fetcher: &F, resource: &str) -> Result<SarkConfig>
    where
        R: Runtime + ?Sized,
        F: Fetch + ?Sized,
    {
        if resource.starts_with("http://") || resource.starts_with("https://") {
            let data = fetcher.fetch(resource).await?;
            Self::from_bytes(&data)
                .with_context(|| format!("Failed to parse SARK configuration from {}", resource))
        } else {
            Self::from_file(runtime, Path::new(resource))
        }
    }
}
