//! Binhost directory scanner.
//!
//! A binhost tree is a directory of category folders (`net-libs`,
//! `dev-python`, ...) containing `.tbz2` binary artifacts. The scanner turns
//! it into a `category -> [artifact path]` map; everything else in the tree
//! is ignored.

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use log::{debug, info};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

/// The scanned artifact tree, keyed by category.
pub type BinhostTree = BTreeMap<String, Vec<PathBuf>>;

lazy_static! {
    static ref CATEGORY_DIR: Regex = Regex::new(r"^[a-z]+-[a-z]+$").expect("category regex");
    static ref ARTIFACT: Regex = Regex::new(r"\.tbz2$").expect("artifact regex");
}

/// Scan a binhost directory into a [`BinhostTree`].
///
/// Only directories matching the category naming convention are descended
/// into; only `.tbz2` files are collected. Categories without artifacts are
/// omitted. File lists come back sorted.
pub fn scan<R: Runtime + ?Sized>(runtime: &R, binhost_dir: &Path) -> Result<BinhostTree> {
    let mut tree = BinhostTree::new();

    let entries = runtime
        .read_dir(binhost_dir)
        .with_context(|| format!("Failed to read binhost directory {:?}", binhost_dir))?;

    let mut category_dirs = Vec::new();
    for entry in entries {
        let Some(name) = entry.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !runtime.is_dir(&entry) {
            continue;
        }
        if !CATEGORY_DIR.is_match(name) {
            debug!("{} is not a category directory, skipped", name);
            continue;
        }
        category_dirs.push(entry);
    }

    if category_dirs.is_empty() {
        info!("No category directories found under {:?}.", binhost_dir);
        return Ok(tree);
    }

    for dir in category_dirs {
        scan_category(runtime, &dir, &mut tree)?;
    }

    Ok(tree)
}

fn scan_category<R: Runtime + ?Sized>(
    runtime: &R,
    dir: &Path,
    tree: &mut BinhostTree,
) -> Result<()> {
    let category = dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();

    let entries = runtime
        .read_dir(dir)
        .with_context(|| format!("Failed to read category directory {:?}", dir))?;

    let mut files = Vec::new();
    for entry in entries {
        let Some(name) = entry.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if runtime.is_dir(&entry) {
            continue;
        }
        if !ARTIFACT.is_match(name) {
            debug!("{}: file {} skipped", category, name);
            continue;
        }
        files.push(entry);
    }

    debug!("{}: found {} artifacts", category, files.len());
    if !files.is_empty() {
        files.sort();
        tree.insert(category, files);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;

    fn expect_dir(runtime: &mut MockRuntime, path: &str, is_dir: bool) {
        runtime
            .expect_is_dir()
            .with(eq(PathBuf::from(path)))
            .returning(move |_| is_dir);
    }

    #[test]
    fn test_scan_collects_artifacts_per_category() {
        let mut runtime = MockRuntime::new();
        let root = PathBuf::from("/binhost");

        runtime
            .expect_read_dir()
            .with(eq(root.clone()))
            .returning(|p| {
                Ok(vec![
                    p.join("net-libs"),
                    p.join("Packages"),
                    p.join("dev-libs"),
                ])
            });
        runtime
            .expect_read_dir()
            .with(eq(root.join("net-libs")))
            .returning(|p| Ok(vec![p.join("gnutls-1.1.1.tbz2"), p.join("README")]));
        runtime
            .expect_read_dir()
            .with(eq(root.join("dev-libs")))
            .returning(|p| Ok(vec![p.join("mpc-22.2.2.tbz2")]));

        expect_dir(&mut runtime, "/binhost/net-libs", true);
        expect_dir(&mut runtime, "/binhost/Packages", false);
        expect_dir(&mut runtime, "/binhost/dev-libs", true);
        expect_dir(&mut runtime, "/binhost/net-libs/gnutls-1.1.1.tbz2", false);
        expect_dir(&mut runtime, "/binhost/net-libs/README", false);
        expect_dir(&mut runtime, "/binhost/dev-libs/mpc-22.2.2.tbz2", false);

        let tree = scan(&runtime, &root).unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(
            tree["net-libs"],
            vec![PathBuf::from("/binhost/net-libs/gnutls-1.1.1.tbz2")]
        );
        assert_eq!(
            tree["dev-libs"],
            vec![PathBuf::from("/binhost/dev-libs/mpc-22.2.2.tbz2")]
        );
    }

    #[test]
    fn test_scan_skips_non_category_names() {
        let mut runtime = MockRuntime::new();
        let root = PathBuf::from("/binhost");

        runtime
            .expect_read_dir()
            .with(eq(root.clone()))
            .returning(|p| Ok(vec![p.join("virtual"), p.join("eclass2")]));
        expect_dir(&mut runtime, "/binhost/virtual", true);
        expect_dir(&mut runtime, "/binhost/eclass2", true);

        let tree = scan(&runtime, &root).unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn test_scan_omits_empty_categories() {
        let mut runtime = MockRuntime::new();
        let root = PathBuf::from("/binhost");

        runtime
            .expect_read_dir()
            .with(eq(root.clone()))
            .returning(|p| Ok(vec![p.join("net-libs")]));
        runtime
            .expect_read_dir()
            .with(eq(root.join("net-libs")))
            .returning(|_| Ok(vec![]));
        expect_dir(&mut runtime, "/binhost/net-libs", true);

        let tree = scan(&runtime, &root).unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn test_scan_missing_root_fails() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_dir()
            .returning(|_| Err(anyhow::anyhow!("no such directory")));

        assert!(scan(&runtime, Path::new("/missing")).is_err());
    }
}
