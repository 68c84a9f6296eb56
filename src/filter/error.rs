//! Error taxonomy of the filter engine.
//!
//! Rule resolution, branch construction and classification fail fast: a
//! malformed rule must never silently degrade the policy. Deletion is the
//! one partial-failure-tolerant phase; its failures aggregate into
//! [`RunError::Unlink`] after every eligible file has been attempted.

use std::path::PathBuf;

use thiserror::Error;

use crate::atom::{AdmitError, ParseError};

/// Failure while resolving filter resources (nested files, remote urls).
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("invalid rule {0:?}")]
    InvalidRule(String),
    #[error("invalid resource source")]
    InvalidSource,
    #[error("error on load file {path:?}: {reason}")]
    File { path: PathBuf, reason: String },
    #[error("error on load resource url {url}: {reason}")]
    Resource { url: String, reason: String },
}

/// Failure while compiling resources into category branches.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("invalid package string {pkg:?} in resource {source}")]
    InvalidPackage {
        pkg: String,
        source: String,
        #[source]
        cause: ParseError,
    },
}

/// Failure while classifying artifacts against branches.
#[derive(Error, Debug)]
pub enum MatchError {
    #[error("unparsable artifact name {path:?}")]
    Artifact {
        path: PathBuf,
        #[source]
        cause: ParseError,
    },
    #[error("admission check failed for {path:?}")]
    Admission {
        path: PathBuf,
        #[source]
        cause: AdmitError,
    },
}

/// Failure of a whole filter run.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("failed to scan binhost directory: {reason}")]
    Scan { reason: String },
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Match(#[from] MatchError),
    #[error("failed to write report: {reason}")]
    Report { reason: String },
    #[error("failed to remove {} of {attempted} files", failed.len())]
    Unlink {
        attempted: usize,
        failed: Vec<PathBuf>,
    },
}
