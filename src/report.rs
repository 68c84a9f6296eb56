//! JSON report of a filter run.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::runtime::Runtime;
use crate::sark::FilterKind;

/// The report document written after classification.
///
/// Path lists are sorted so repeated dry runs produce identical files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterReport {
    #[serde(default)]
    pub filter_date: String,
    #[serde(default)]
    pub filter_type: String,
    #[serde(default)]
    pub matches: Vec<String>,
    #[serde(default)]
    pub not_matches: Vec<String>,
}

impl FilterReport {
    /// Create a report stamped with the current unix time.
    pub fn new(filter_type: FilterKind) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        FilterReport {
            filter_date: now.to_string(),
            filter_type: filter_type.to_string(),
            matches: Vec::new(),
            not_matches: Vec::new(),
        }
    }

    /// Write the report next to `prefix`.
    ///
    /// If `prefix` is an existing directory the report lands at
    /// `<prefix>/report.filtered`, otherwise at `<prefix>-report.filtered`
    /// (creating parent directories as needed). Returns the written path.
    pub fn write<R: Runtime + ?Sized>(&mut self, runtime: &R, prefix: &Path) -> Result<PathBuf> {
        if prefix.as_os_str().is_empty() {
            bail!("Invalid report prefix");
        }

        self.matches.sort();
        self.not_matches.sort();

        let report_file = if runtime.is_dir(prefix) {
            prefix.join("report.filtered")
        } else {
            if let Some(parent) = prefix.parent()
                && !parent.as_os_str().is_empty()
                && !runtime.exists(parent)
            {
                runtime.create_dir_all(parent)?;
            }
            let name = prefix
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| anyhow::anyhow!("Invalid report prefix {:?}", prefix))?;
            prefix.with_file_name(format!("{}-report.filtered", name))
        };

        let content = serde_json::to_string_pretty(self)?;
        runtime
            .write(&report_file, content.as_bytes())
            .with_context(|| format!("Failed to write report to {:?}", report_file))?;

        Ok(report_file)
    }
}
