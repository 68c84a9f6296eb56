//! Package atoms and version-satisfaction checks.
//!
//! An atom is the textual package reference used across the Gentoo family
//! (`>=dev-lang/python-2.7`, `net-misc/ntp:1`, ...). This module parses atoms
//! into [`Atom`] values and decides whether a concrete package satisfies a
//! rule atom via [`Atom::admit`].

mod admit;
mod parse;
pub mod version;

use std::fmt;

use thiserror::Error;

pub use version::{OrderableVersion, VersionError, normalize};

/// Error raised while parsing an atom string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty package atom")]
    Empty,
    #[error("malformed atom {0:?}")]
    Malformed(String),
}

/// Error raised by [`Atom::admit`].
///
/// Admission is only defined between a rule and a candidate that refer to the
/// same `category/name`; anything else is a caller bug, not a `false`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmitError {
    #[error("category mismatch: rule {rule} vs candidate {candidate}")]
    CategoryMismatch { rule: String, candidate: String },
    #[error("package name mismatch: rule {rule} vs candidate {candidate}")]
    NameMismatch { rule: String, candidate: String },
    #[error(transparent)]
    Version(#[from] VersionError),
}

/// Version relation selected by the operator prefix of an atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Condition {
    /// No operator and no version: the atom constrains nothing.
    #[default]
    Invalid,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Equal,
    Not,
    /// `~` - any revision of the given version.
    AnyRevision,
    /// `=...*` - any version within the given prefix range.
    MatchVersion,
}

impl Condition {
    /// The operator token this condition was parsed from.
    pub fn prefix(&self) -> &'static str {
        match self {
            Condition::Invalid => "",
            Condition::Greater => ">",
            Condition::GreaterEqual => ">=",
            Condition::Less => "<",
            Condition::LessEqual => "<=",
            Condition::Equal | Condition::MatchVersion => "=",
            Condition::Not => "!",
            Condition::AnyRevision => "~",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

/// A parsed package specifier.
///
/// `name` never carries version, slot or repository fragments; those land in
/// their own fields. `slot` defaults to `"0"` and is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    pub name: String,
    pub category: String,
    pub version: String,
    pub version_suffix: String,
    pub version_build: String,
    pub slot: String,
    pub condition: Condition,
    pub repository: String,
    pub use_flags: Vec<String>,
}

impl Default for Atom {
    fn default() -> Self {
        Atom {
            name: String::new(),
            category: String::new(),
            version: String::new(),
            version_suffix: String::new(),
            version_build: String::new(),
            slot: "0".to_string(),
            condition: Condition::Invalid,
            repository: String::new(),
            use_flags: Vec::new(),
        }
    }
}

impl Atom {
    /// The `category/name` pair without any version or qualifier.
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.category, self.name)
    }

    /// Version and suffix as a single literal string (`"2.0.1-r1"`).
    pub fn version_with_suffix(&self) -> String {
        format!("{}{}", self.version, self.version_suffix)
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}", self.condition, self.category, self.name)?;
        if !self.version.is_empty() {
            write!(f, "-{}{}", self.version, self.version_suffix)?;
            if !self.version_build.is_empty() {
                write!(f, "+{}", self.version_build)?;
            }
        }
        if self.condition == Condition::MatchVersion {
            write!(f, "*")?;
        }
        if self.slot != "0" {
            write!(f, ":{}", self.slot)?;
        }
        if !self.repository.is_empty() {
            write!(f, "::{}", self.repository)?;
        }
        Ok(())
    }
}
