//! The filter run: scan, build the matrix, classify, report, delete.

use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::binhost;
use crate::http::Fetch;
use crate::report::FilterReport;
use crate::runtime::Runtime;
use crate::sark::{FilterKind, FilterSection, InjectorSection, SarkConfig};

use super::error::RunError;
use super::loader::ResourceLoader;
use super::{FilterMatrix, FilterResource, ResourceKind};

/// Options of a filter run.
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    /// Where to write the JSON report; `None` disables reporting.
    pub report_prefix: Option<PathBuf>,
    /// Classify and report only; never delete.
    pub dry_run: bool,
}

/// Orchestrates one filter run over a binhost directory.
pub struct Filter<'a, R: Runtime + ?Sized, F: Fetch + ?Sized> {
    runtime: &'a R,
    fetcher: &'a F,
    config: Option<SarkConfig>,
    options: FilterOptions,
}

impl<'a, R: Runtime + ?Sized, F: Fetch + ?Sized> Filter<'a, R, F> {
    pub fn new(
        runtime: &'a R,
        fetcher: &'a F,
        config: Option<SarkConfig>,
        options: FilterOptions,
    ) -> Self {
        Self {
            runtime,
            fetcher,
            config,
            options,
        }
    }

    /// Run the filter against `binhost_dir`.
    ///
    /// An empty binhost tree is a no-op success. Unless `dry_run` is set,
    /// the excluded side is deleted at the end: not-matches under a
    /// whitelist, matches under a blacklist. Every deletion is attempted;
    /// failures aggregate into [`RunError::Unlink`].
    pub async fn run(&self, binhost_dir: &Path) -> Result<(), RunError> {
        let start = Instant::now();
        let tree = binhost::scan(self.runtime, binhost_dir).map_err(|e| RunError::Scan {
            reason: format!("{:#}", e),
        })?;
        info!(
            "Analysis of binhost directory elapsed in {} µs.",
            start.elapsed().as_micros()
        );

        if tree.is_empty() {
            info!("No files found to filter. Nothing to do.");
            return Ok(());
        }

        let start = Instant::now();
        let mut matrix = self.create_matrix().await?;
        info!(
            "Creation of filter matrix ({}) elapsed in {} µs.",
            matrix.filter_type,
            start.elapsed().as_micros()
        );

        let start = Instant::now();
        matrix.check_matches(&tree)?;
        info!("Check matches elapsed in {} µs.", start.elapsed().as_micros());

        let matches = matrix.match_files();
        let not_matches = matrix.not_match_files();
        info!("Matched packages found {}.", matches.len());
        info!("Not matched packages found {}.", not_matches.len());

        if let Some(prefix) = &self.options.report_prefix {
            let mut report = FilterReport::new(matrix.filter_type);
            report.matches = paths_to_strings(&matches);
            report.not_matches = paths_to_strings(&not_matches);
            let written = report
                .write(self.runtime, prefix)
                .map_err(|e| RunError::Report {
                    reason: format!("{:#}", e),
                })?;
            info!("Report written to {:?}.", written);
        }

        if self.options.dry_run {
            info!("Dry run, nothing removed.");
            return Ok(());
        }

        match matrix.filter_type {
            FilterKind::Whitelist => self.unlink_files(&not_matches),
            FilterKind::Blacklist => self.unlink_files(&matches),
        }
    }

    /// Build the rule matrix from the configured policy.
    ///
    /// No config at all means an empty blacklist (nothing excluded). A
    /// config without an explicit filter type is treated as a whitelist of
    /// its build targets. Otherwise the declared type is used and the
    /// injection rules are resolved recursively.
    pub async fn create_matrix(&self) -> Result<FilterMatrix, RunError> {
        let mut config = match &self.config {
            None => {
                let mut config = SarkConfig::with_filter_type(FilterKind::Blacklist);
                config.id = "filter".to_string();
                config
            }
            Some(existing) => {
                let mut config = existing.clone();
                if config.injector.filter.filter_type.is_none() {
                    config.injector = InjectorSection {
                        filter: FilterSection {
                            filter_type: Some(FilterKind::Whitelist),
                            rules: Vec::new(),
                        },
                    };
                    config.id = "filter".to_string();
                }
                config
            }
        };
        if config.id.is_empty() {
            config.id = "filter".to_string();
        }

        let filter_type = config
            .injector
            .filter
            .filter_type
            .unwrap_or(FilterKind::Whitelist);
        let mut matrix = FilterMatrix::new(filter_type);

        if !config.injector.filter.rules.is_empty() {
            let loader = ResourceLoader::new(self.runtime, self.fetcher);
            loader
                .load_rules(
                    &mut matrix,
                    &config.id,
                    ResourceKind::Buildfile,
                    &config.injector.filter.rules,
                )
                .await?;
        } else if !config.build.target_pkgs.is_empty() {
            matrix.add_resource(FilterResource::with_packages(
                config.id.clone(),
                ResourceKind::Buildfile,
                config.build.target_pkgs.clone(),
            ))?;
        } else if filter_type == FilterKind::Whitelist {
            warn!("No packages defined and whitelist used. All packages will be filtered.");
        }

        matrix.create_branches()?;
        Ok(matrix)
    }

    /// Remove the given files, attempting every one before reporting.
    fn unlink_files(&self, files: &[PathBuf]) -> Result<(), RunError> {
        let mut failed = Vec::new();
        for path in files {
            info!("Removing file {:?}...", path);
            if let Err(e) = self.runtime.remove_file(path) {
                error!("Error on remove file {:?}: {:#}", path, e);
                failed.push(path.clone());
            }
        }

        if failed.is_empty() {
            info!("Removed {} files.", files.len());
            Ok(())
        } else {
            Err(RunError::Unlink {
                attempted: files.len(),
                failed,
            })
        }
    }
}

fn paths_to_strings(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect()
}
