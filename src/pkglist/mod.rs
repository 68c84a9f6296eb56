//! Flat newline-delimited package lists.
//!
//! The `pkglist|` resource scheme and a couple of maintenance commands speak
//! this format: one atom per line, `#` comments and blank lines ignored.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use crate::http::Fetch;
use crate::runtime::Runtime;

/// Parse package-list text into atom strings.
///
/// Lines are trimmed of trailing CR/LF; blank lines and `#` comments are
/// skipped.
pub fn parse(data: &str) -> Vec<String> {
    data.lines()
        .map(|line| line.trim_end_matches('\r').trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Load a package list from a resource reference: `http(s)://` goes through
/// the fetch collaborator, anything else is a local path.
pub async fn load_resource<R, F>(runtime: &R, fetcher: &F, resource: &str) -> Result<Vec<String>>
where
    R: Runtime + ?Sized,
    F: Fetch + ?Sized,
{
    let data = if resource.starts_with("http://") || resource.starts_with("https://") {
        let bytes = fetcher.fetch(resource).await?;
        String::from_utf8(bytes)
            .with_context(|| format!("Package list {} is not valid UTF-8", resource))?
    } else {
        runtime
            .read_to_string(Path::new(resource))
            .with_context(|| format!("Failed to read package list {}", resource))?
    };

    Ok(parse(&data))
}

/// Write a package list, sorted, one atom per line.
pub fn write<W: Write>(pkgs: &[String], mut out: W) -> Result<()> {
    let mut sorted = pkgs.to_vec();
    sorted.sort();
    for pkg in sorted {
        writeln!(out, "{}", pkg).context("Failed to write package list")?;
    }
    Ok(())
}
