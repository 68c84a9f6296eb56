//! Branch compilation and artifact classification.

use log::debug;
use std::path::{Path, PathBuf};

use crate::atom::{Atom, ParseError};
use crate::binhost::BinhostTree;

use super::error::{BuildError, MatchError};
use super::{Branch, FilterMatrix, Leaf, PackageRule, ResourceId};

impl FilterMatrix {
    /// Compile the loaded resources into per-category branches.
    ///
    /// Every category string marks its branch as category-filtered (the
    /// catch-all flag); every package string is parsed into a rule atom and
    /// appended to its category's branch. A malformed package string aborts
    /// the whole build.
    pub fn create_branches(&mut self) -> Result<(), BuildError> {
        for id in 0..self.resources.len() {
            for category in self.resources[id].categories.clone() {
                let branch = self
                    .branches
                    .entry(category.clone())
                    .or_insert_with(|| Branch::new(category.clone()));
                if !branch.category_filtered {
                    branch.category_filtered = true;
                }
                branch.attach_resource(id);
                debug!("Branch for category {} admits the whole category.", category);
            }

            for pkg in self.resources[id].packages.clone() {
                let atom = Atom::parse(&pkg).map_err(|e| BuildError::InvalidPackage {
                    pkg: pkg.clone(),
                    source: self.resources[id].source.clone(),
                    cause: e,
                })?;
                let branch = self
                    .branches
                    .entry(atom.category.clone())
                    .or_insert_with(|| Branch::new(atom.category.clone()));
                debug!("Added package {} to category {}.", pkg, atom.category);
                branch.packages.push(PackageRule { atom, resource: id });
                branch.attach_resource(id);
            }
        }

        Ok(())
    }

    /// Classify every artifact of the scanned tree against its branch.
    ///
    /// Categories without a branch get a synthesized empty branch and all
    /// their files recorded as not matched: no rule and no wildcard means
    /// excluded by default.
    pub fn check_matches(&mut self, tree: &BinhostTree) -> Result<(), MatchError> {
        for (category, files) in tree {
            debug!("Analyzing category {}.", category);
            if let Some(branch) = self.branches.get_mut(category) {
                branch.check_packages(files)?;
            } else {
                let mut branch = Branch::new(category.clone());
                for file in files {
                    let package = parse_artifact(category, file)?;
                    branch.record(file.clone(), package, false, None);
                }
                self.branches.insert(category.clone(), branch);
            }
        }

        Ok(())
    }
}

impl Branch {
    /// Classify the given files against this branch's rules.
    ///
    /// Rules are scanned in order; the scan stops at the first same-named
    /// rule that rejects the candidate, even if a later rule would admit it.
    /// A category-filtered branch admits any package no rule names.
    pub fn check_packages(&mut self, files: &[PathBuf]) -> Result<(), MatchError> {
        for file in files {
            let concrete = parse_artifact(&self.category, file)?;

            let mut admitted = false;
            let mut has_pkg_rule = false;
            let mut deciding: Option<ResourceId> = None;

            for rule in &self.packages {
                if rule.atom.name != concrete.name {
                    continue;
                }
                has_pkg_rule = true;
                admitted = rule
                    .atom
                    .admit(&concrete)
                    .map_err(|e| MatchError::Admission {
                        path: file.clone(),
                        cause: e,
                    })?;
                deciding = Some(rule.resource);
                if !admitted {
                    break;
                }
            }

            if !admitted && self.category_filtered && !has_pkg_rule {
                admitted = true;
            }

            let resource = if has_pkg_rule { deciding } else { None };
            self.record(file.clone(), concrete, admitted, resource);
        }

        Ok(())
    }

    /// Record a classified artifact. A second classification of the same
    /// path overwrites the first.
    pub(crate) fn record(
        &mut self,
        path: PathBuf,
        package: Atom,
        admitted: bool,
        resource: Option<ResourceId>,
    ) {
        let leaf = Leaf {
            name: package.name.clone(),
            path: path.clone(),
            package,
            resource,
        };
        if admitted {
            debug!("Branch {}: matched {:?}", self.category, path);
            self.matches.insert(path, leaf);
        } else {
            debug!("Branch {}: not matched {:?}", self.category, path);
            self.not_matches.insert(path, leaf);
        }
    }
}

/// Parse an artifact filename into its concrete package atom
/// (`<category>/<stem>`).
fn parse_artifact(category: &str, file: &Path) -> Result<Atom, MatchError> {
    let stem = file
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| MatchError::Artifact {
            path: file.to_path_buf(),
            cause: ParseError::Empty,
        })?;
    Atom::parse(&format!("{}/{}", category, stem)).map_err(|e| MatchError::Artifact {
        path: file.to_path_buf(),
        cause: e,
    })
}
