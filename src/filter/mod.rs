//! The filter matrix: rule resolution and artifact classification.
//!
//! Filter resources (buildfiles, package lists) are loaded into a
//! [`FilterMatrix`], compiled into per-category [`Branch`]es, and every
//! artifact of a binhost tree is classified as matched or not matched. The
//! whitelist/blacklist policy then decides which side gets deleted.

pub mod error;
mod loader;
mod matrix;
mod runner;

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::atom::Atom;
use crate::sark::FilterKind;

pub use error::{BuildError, LoadError, MatchError, RunError};
pub use loader::ResourceLoader;
pub use runner::{Filter, FilterOptions};

/// Index of a resource inside its owning [`FilterMatrix`].
///
/// Branches and leaves refer back to resources through these indices instead
/// of shared ownership.
pub type ResourceId = usize;

/// Kind of origin a filter resource came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// A SARK build file (inline rules or `buildfile|` reference).
    Buildfile,
    /// A flat newline-delimited package list (`pkglist|` reference).
    Pkglist,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Buildfile => write!(f, "buildfile"),
            ResourceKind::Pkglist => write!(f, "pkglist"),
        }
    }
}

/// One origin contributing package/category rules to the matrix.
///
/// `source` is the origin identity (absolute file path or resource
/// reference) and is what deduplication keys on.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterResource {
    pub source: String,
    pub kind: ResourceKind,
    pub packages: Vec<String>,
    pub categories: Vec<String>,
}

impl FilterResource {
    pub fn new(source: impl Into<String>, kind: ResourceKind) -> Self {
        FilterResource {
            source: source.into(),
            kind,
            packages: Vec::new(),
            categories: Vec::new(),
        }
    }

    pub fn with_packages(source: impl Into<String>, kind: ResourceKind, packages: Vec<String>) -> Self {
        FilterResource {
            packages,
            ..Self::new(source, kind)
        }
    }
}

/// A package rule compiled into a branch, remembering which resource
/// supplied it.
#[derive(Debug, Clone)]
pub struct PackageRule {
    pub atom: Atom,
    pub resource: ResourceId,
}

/// A single classified artifact.
#[derive(Debug, Clone)]
pub struct Leaf {
    pub name: String,
    pub path: PathBuf,
    pub package: Atom,
    /// The resource whose rule decided admission, when a package rule was
    /// consulted. The owning branch is reachable through
    /// `package.category`.
    pub resource: Option<ResourceId>,
}

/// Per-category compiled rules plus classification results.
#[derive(Debug, Default)]
pub struct Branch {
    pub category: String,
    /// Set when the category was admitted wholesale by a bare category rule.
    pub category_filtered: bool,
    pub packages: Vec<PackageRule>,
    pub resources: Vec<ResourceId>,
    pub matches: BTreeMap<PathBuf, Leaf>,
    pub not_matches: BTreeMap<PathBuf, Leaf>,
}

impl Branch {
    pub fn new(category: impl Into<String>) -> Self {
        Branch {
            category: category.into(),
            ..Default::default()
        }
    }

    /// Attach a contributing resource, once.
    pub fn attach_resource(&mut self, resource: ResourceId) {
        if !self.resources.contains(&resource) {
            self.resources.push(resource);
        }
    }
}

/// The filter policy compiled into branches, plus the resources it owns.
#[derive(Debug)]
pub struct FilterMatrix {
    pub filter_type: FilterKind,
    resources: Vec<FilterResource>,
    pub branches: BTreeMap<String, Branch>,
}

impl FilterMatrix {
    pub fn new(filter_type: FilterKind) -> Self {
        FilterMatrix {
            filter_type,
            resources: Vec::new(),
            branches: BTreeMap::new(),
        }
    }

    /// Append a resource, returning its index. Resources are append-only and
    /// immutable once branches have been compiled.
    pub fn add_resource(&mut self, resource: FilterResource) -> Result<ResourceId, LoadError> {
        if resource.source.is_empty() {
            return Err(LoadError::InvalidSource);
        }
        self.resources.push(resource);
        Ok(self.resources.len() - 1)
    }

    pub fn resources(&self) -> &[FilterResource] {
        &self.resources
    }

    pub fn resource(&self, id: ResourceId) -> &FilterResource {
        &self.resources[id]
    }

    pub(crate) fn resource_mut(&mut self, id: ResourceId) -> &mut FilterResource {
        &mut self.resources[id]
    }

    /// Look up a resource index by its origin identity.
    pub fn resource_by_source(&self, source: &str) -> Option<ResourceId> {
        self.resources.iter().position(|r| r.source == source)
    }

    /// All matched leaves across branches.
    pub fn matches(&self) -> Vec<&Leaf> {
        self.branches
            .values()
            .flat_map(|b| b.matches.values())
            .collect()
    }

    /// All not-matched leaves across branches.
    pub fn not_matches(&self) -> Vec<&Leaf> {
        self.branches
            .values()
            .flat_map(|b| b.not_matches.values())
            .collect()
    }

    /// Paths of all matched artifacts, in deterministic order.
    pub fn match_files(&self) -> Vec<PathBuf> {
        self.branches
            .values()
            .flat_map(|b| b.matches.keys().cloned())
            .collect()
    }

    /// Paths of all not-matched artifacts, in deterministic order.
    pub fn not_match_files(&self) -> Vec<PathBuf> {
        self.branches
            .values()
            .flat_map(|b| b.not_matches.keys().cloned())
            .collect()
    }
}
