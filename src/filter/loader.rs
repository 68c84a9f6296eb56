//! Recursive resolution of filter resources.
//!
//! Injection rules can pull in nested rule files and remote resources, which
//! in turn can reference further rules. Two independent guards keep that
//! graph finite: a hard depth cap of three levels, and deduplication by
//! resolved source identity. Either alone is insufficient (the depth cap
//! still allows wide duplication, dedup still allows unbounded
//! non-duplicating chains).

use futures_util::future::BoxFuture;
use log::{debug, warn};
use std::path::{Path, PathBuf};

use crate::http::Fetch;
use crate::pkglist;
use crate::runtime::{Runtime, abs_from_base};
use crate::sark::{FilterRule, SarkConfig};

use super::error::LoadError;
use super::{FilterMatrix, FilterResource, ResourceId, ResourceKind};

/// Nested rule expansion stops at this level.
const MAX_RULE_DEPTH: u32 = 3;

/// Resolves injection rules into [`FilterResource`]s on a matrix.
pub struct ResourceLoader<'a, R: Runtime + ?Sized, F: Fetch + ?Sized> {
    runtime: &'a R,
    fetcher: &'a F,
}

impl<'a, R: Runtime + ?Sized, F: Fetch + ?Sized> ResourceLoader<'a, R, F> {
    pub fn new(runtime: &'a R, fetcher: &'a F) -> Self {
        Self { runtime, fetcher }
    }

    /// Load a rule set originating from `source` into a fresh resource.
    ///
    /// A source that is already present is skipped with a warning to avoid
    /// circular injection.
    pub async fn load_rules(
        &self,
        matrix: &mut FilterMatrix,
        source: &str,
        kind: ResourceKind,
        rules: &[FilterRule],
    ) -> Result<(), LoadError> {
        if matrix.resource_by_source(source).is_some() {
            warn!(
                "Resource {} already loaded. Skip rules to avoid circular injection.",
                source
            );
            return Ok(());
        }

        let resource = matrix.add_resource(FilterResource::new(source, kind))?;
        for rule in rules {
            self.load_rule(matrix, resource, rule, 1).await?;
        }
        Ok(())
    }

    /// Fold one injection rule into `resource`.
    ///
    /// Inline categories/packages merge directly; `files` entries resolve
    /// relative to the resource origin and recurse; `urls` entries use the
    /// `buildfile|`/`pkglist|` schemes. At `level >= 3` the rule is a no-op.
    pub fn load_rule<'b>(
        &'b self,
        matrix: &'b mut FilterMatrix,
        resource: ResourceId,
        rule: &'b FilterRule,
        level: u32,
    ) -> BoxFuture<'b, Result<(), LoadError>> {
        Box::pin(async move {
            if level >= MAX_RULE_DEPTH {
                debug!(
                    "Rule {:?} at level {}: depth limit reached, skipped.",
                    rule.description, level
                );
                return Ok(());
            }

            {
                let res = matrix.resource_mut(resource);
                res.categories.extend(rule.categories.iter().cloned());
                res.packages.extend(rule.pkgs.iter().cloned());
            }

            let origin = PathBuf::from(&matrix.resource(resource).source);
            let base = origin.parent().map(Path::to_path_buf).unwrap_or_default();

            for file in &rule.files {
                let absfile = abs_from_base(&base, Path::new(file));
                let config =
                    SarkConfig::from_file(self.runtime, &absfile).map_err(|e| LoadError::File {
                        path: absfile.clone(),
                        reason: format!("{:#}", e),
                    })?;
                self.process_buildfile(matrix, &config, level, true).await?;
            }

            for url in &rule.urls {
                if matrix.resource_by_source(url).is_some() {
                    warn!("Url {} duplicated.", url);
                    continue;
                }

                if let Some(reference) = url.strip_prefix("buildfile|") {
                    let mut config =
                        SarkConfig::from_resource(self.runtime, self.fetcher, reference)
                            .await
                            .map_err(|e| LoadError::Resource {
                                url: url.clone(),
                                reason: format!("{:#}", e),
                            })?;
                    config.id = url.clone();
                    self.process_buildfile(matrix, &config, level, false).await?;
                } else if let Some(reference) = url.strip_prefix("pkglist|") {
                    let pkgs = pkglist::load_resource(self.runtime, self.fetcher, reference)
                        .await
                        .map_err(|e| LoadError::Resource {
                            url: url.clone(),
                            reason: format!("{:#}", e),
                        })?;
                    if !pkgs.is_empty() {
                        matrix.add_resource(FilterResource::with_packages(
                            url.clone(),
                            ResourceKind::Pkglist,
                            pkgs,
                        ))?;
                    }
                } else {
                    return Err(LoadError::InvalidRule(url.clone()));
                }
            }

            Ok(())
        })
    }

    /// Register a nested buildfile as a resource of its own and, when it was
    /// read from a local file, recurse into its injection rules.
    async fn process_buildfile(
        &self,
        matrix: &mut FilterMatrix,
        config: &SarkConfig,
        level: u32,
        from_file: bool,
    ) -> Result<(), LoadError> {
        if matrix.resource_by_source(&config.id).is_some() {
            debug!("Resource {} already loaded, skipped.", config.id);
            return Ok(());
        }
        if config.build.target_pkgs.is_empty() {
            return Ok(());
        }

        let resource = matrix.add_resource(FilterResource::with_packages(
            config.id.clone(),
            ResourceKind::Buildfile,
            config.build.target_pkgs.clone(),
        ))?;

        let level = level + 1;
        if from_file {
            for rule in &config.injector.filter.rules {
                self.load_rule(matrix, resource, rule, level).await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::MockFetch;
    use crate::runtime::MockRuntime;
    use crate::sark::FilterKind;
    use mockall::predicate::eq;

    fn rule(
        pkgs: &[&str],
        categories: &[&str],
        files: &[&str],
        urls: &[&str],
    ) -> FilterRule {
        FilterRule {
            description: String::new(),
            pkgs: pkgs.iter().map(|s| s.to_string()).collect(),
            categories: categories.iter().map(|s| s.to_string()).collect(),
            files: files.iter().map(|s| s.to_string()).collect(),
            urls: urls.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_inline_rule_merges_into_resource() {
        let runtime = MockRuntime::new();
        let fetcher = MockFetch::new();
        let loader = ResourceLoader::new(&runtime, &fetcher);
        let mut matrix = FilterMatrix::new(FilterKind::Whitelist);

        loader
            .load_rules(
                &mut matrix,
                "/etc/sark/build.yaml",
                ResourceKind::Buildfile,
                &[rule(&["net-libs/gnutls"], &["dev-node"], &[], &[])],
            )
            .await
            .unwrap();

        assert_eq!(matrix.resources().len(), 1);
        let res = matrix.resource(0);
        assert_eq!(res.packages, vec!["net-libs/gnutls"]);
        assert_eq!(res.categories, vec!["dev-node"]);
    }

    #[tokio::test]
    async fn test_duplicate_source_is_skipped_with_warning() {
        let runtime = MockRuntime::new();
        let fetcher = MockFetch::new();
        let loader = ResourceLoader::new(&runtime, &fetcher);
        let mut matrix = FilterMatrix::new(FilterKind::Whitelist);

        let rules = [rule(&["net-libs/gnutls"], &[], &[], &[])];
        loader
            .load_rules(&mut matrix, "src", ResourceKind::Buildfile, &rules)
            .await
            .unwrap();
        loader
            .load_rules(&mut matrix, "src", ResourceKind::Buildfile, &rules)
            .await
            .unwrap();

        assert_eq!(matrix.resources().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_url_scheme_fails() {
        let runtime = MockRuntime::new();
        let fetcher = MockFetch::new();
        let loader = ResourceLoader::new(&runtime, &fetcher);
        let mut matrix = FilterMatrix::new(FilterKind::Whitelist);

        let result = loader
            .load_rules(
                &mut matrix,
                "src",
                ResourceKind::Buildfile,
                &[rule(&[], &[], &[], &["gopher|example.org/list"])],
            )
            .await;

        assert!(matches!(result, Err(LoadError::InvalidRule(_))));
    }

    #[tokio::test]
    async fn test_pkglist_url_creates_resource() {
        let runtime = MockRuntime::new();
        let mut fetcher = MockFetch::new();
        fetcher
            .expect_fetch()
            .with(eq("https://example.org/list"))
            .returning(|_| Ok(b"dev-libs/mpc\n".to_vec()));

        let loader = ResourceLoader::new(&runtime, &fetcher);
        let mut matrix = FilterMatrix::new(FilterKind::Whitelist);

        loader
            .load_rules(
                &mut matrix,
                "src",
                ResourceKind::Buildfile,
                &[rule(&[], &[], &[], &["pkglist|https://example.org/list"])],
            )
            .await
            .unwrap();

        assert_eq!(matrix.resources().len(), 2);
        let res = matrix.resource(1);
        assert_eq!(res.kind, ResourceKind::Pkglist);
        assert_eq!(res.source, "pkglist|https://example.org/list");
        assert_eq!(res.packages, vec!["dev-libs/mpc"]);
    }

    #[tokio::test]
    async fn test_duplicate_url_is_skipped() {
        let runtime = MockRuntime::new();
        let mut fetcher = MockFetch::new();
        fetcher
            .expect_fetch()
            .with(eq("https://example.org/list"))
            .times(1)
            .returning(|_| Ok(b"dev-libs/mpc\n".to_vec()));

        let loader = ResourceLoader::new(&runtime, &fetcher);
        let mut matrix = FilterMatrix::new(FilterKind::Whitelist);

        loader
            .load_rules(
                &mut matrix,
                "src",
                ResourceKind::Buildfile,
                &[rule(
                    &[],
                    &[],
                    &[],
                    &[
                        "pkglist|https://example.org/list",
                        "pkglist|https://example.org/list",
                    ],
                )],
            )
            .await
            .unwrap();

        assert_eq!(matrix.resources().len(), 2);
    }

    #[tokio::test]
    async fn test_nested_file_resolves_relative_to_origin() {
        let mut runtime = MockRuntime::new();
        let fetcher = MockFetch::new();

        runtime
            .expect_read_to_string()
            .with(eq(Path::new("/etc/sark/extra.yaml")))
            .returning(|_| Ok("build:\n  target:\n    - app-misc/foo\n".to_string()));
        runtime
            .expect_canonicalize()
            .with(eq(Path::new("/etc/sark/extra.yaml")))
            .returning(|_| Ok(PathBuf::from("/etc/sark/extra.yaml")));

        let loader = ResourceLoader::new(&runtime, &fetcher);
        let mut matrix = FilterMatrix::new(FilterKind::Whitelist);

        loader
            .load_rules(
                &mut matrix,
                "/etc/sark/build.yaml",
                ResourceKind::Buildfile,
                &[rule(&[], &[], &["extra.yaml"], &[])],
            )
            .await
            .unwrap();

        assert_eq!(matrix.resources().len(), 2);
        let nested = matrix.resource(1);
        assert_eq!(nested.source, "/etc/sark/extra.yaml");
        assert_eq!(nested.packages, vec!["app-misc/foo"]);
    }

    #[tokio::test]
    async fn test_self_referencing_file_stays_bounded() {
        // extra.yaml pulls itself back in through its own rules; the dedup
        // guard stops the cycle and the depth cap bounds any chain.
        let mut runtime = MockRuntime::new();
        let fetcher = MockFetch::new();

        runtime
            .expect_read_to_string()
            .with(eq(Path::new("/etc/sark/extra.yaml")))
            .returning(|_| {
                Ok(concat!(
                    "build:\n",
                    "  target:\n",
                    "    - app-misc/foo\n",
                    "injector:\n",
                    "  filter:\n",
                    "    rules:\n",
                    "      - files:\n",
                    "          - extra.yaml\n",
                )
                .to_string())
            });
        runtime
            .expect_canonicalize()
            .with(eq(Path::new("/etc/sark/extra.yaml")))
            .returning(|_| Ok(PathBuf::from("/etc/sark/extra.yaml")));

        let loader = ResourceLoader::new(&runtime, &fetcher);
        let mut matrix = FilterMatrix::new(FilterKind::Whitelist);

        loader
            .load_rules(
                &mut matrix,
                "/etc/sark/build.yaml",
                ResourceKind::Buildfile,
                &[rule(&[], &[], &["extra.yaml"], &[])],
            )
            .await
            .unwrap();

        // the self reference is deduplicated, not expanded forever
        assert_eq!(matrix.resources().len(), 2);
    }

    #[tokio::test]
    async fn test_depth_cap_stops_deep_chains() {
        let mut runtime = MockRuntime::new();
        let fetcher = MockFetch::new();

        // top-level rules run at level 1, a.yaml's at 2, b.yaml's at 3:
        // the depth cap stops there, so c.yaml must never be read (any
        // attempt would hit an unexpected mock call and panic)
        runtime
            .expect_read_to_string()
            .with(eq(Path::new("/etc/sark/a.yaml")))
            .returning(|_| {
                Ok("build:\n  target: [cat-a/a]\ninjector:\n  filter:\n    rules:\n      - files: [b.yaml]\n".to_string())
            });
        runtime
            .expect_read_to_string()
            .with(eq(Path::new("/etc/sark/b.yaml")))
            .returning(|_| {
                Ok("build:\n  target: [cat-b/b]\ninjector:\n  filter:\n    rules:\n      - files: [c.yaml]\n".to_string())
            });
        runtime
            .expect_canonicalize()
            .returning(|p| Ok(p.to_path_buf()));

        let loader = ResourceLoader::new(&runtime, &fetcher);
        let mut matrix = FilterMatrix::new(FilterKind::Whitelist);

        loader
            .load_rules(
                &mut matrix,
                "/etc/sark/build.yaml",
                ResourceKind::Buildfile,
                &[rule(&[], &[], &["a.yaml"], &[])],
            )
            .await
            .unwrap();

        let sources: Vec<_> = matrix.resources().iter().map(|r| r.source.as_str()).collect();
        assert_eq!(
            sources,
            vec!["/etc/sark/build.yaml", "/etc/sark/a.yaml", "/etc/sark/b.yaml"]
        );
    }
}
