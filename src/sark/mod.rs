//! SARK build/injection configuration.
//!
//! The filter consumes a small slice of the SARK YAML schema: the build
//! target list and the injector filter section. Everything is deserialized
//! into typed structs here; the filter core never touches raw YAML.

mod load;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Filter policy: matched artifacts are kept (`whitelist`) or removed
/// (`blacklist`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Whitelist,
    Blacklist,
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterKind::Whitelist => write!(f, "whitelist"),
            FilterKind::Blacklist => write!(f, "blacklist"),
        }
    }
}

impl FromStr for FilterKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "whitelist" => Ok(FilterKind::Whitelist),
            "blacklist" => Ok(FilterKind::Blacklist),
            _ => anyhow::bail!("Invalid filter type: {}. Expected whitelist or blacklist.", s),
        }
    }
}

/// A SARK configuration document.
///
/// `id` is the origin identity of the document (absolute file path or the
/// resource reference it was fetched from); it is not part of the YAML and
/// is what the filter uses to deduplicate resources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SarkConfig {
    #[serde(skip)]
    pub id: String,
    #[serde(default)]
    pub build: BuildSection,
    #[serde(default)]
    pub injector: InjectorSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildSection {
    /// Packages this configuration builds; used as whitelist seeds when no
    /// injection rules are given.
    #[serde(default, rename = "target")]
    pub target_pkgs: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InjectorSection {
    #[serde(default)]
    pub filter: FilterSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSection {
    /// `whitelist` or `blacklist`; anything else is rejected at parse time.
    #[serde(default, rename = "type")]
    pub filter_type: Option<FilterKind>,
    #[serde(default)]
    pub rules: Vec<FilterRule>,
}

/// One injection rule: inline packages/categories plus nested rule files and
/// remote resources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterRule {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub pkgs: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub urls: Vec<String>,
}

impl SarkConfig {
    /// Construct an empty config with the given policy, used when the caller
    /// supplies no configuration at all.
    pub fn with_filter_type(filter_type: FilterKind) -> Self {
        SarkConfig {
            injector: InjectorSection {
                filter: FilterSection {
                    filter_type: Some(filter_type),
                    rules: Vec::new(),
                },
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_kind_display() {
        assert_eq!(FilterKind::Whitelist.to_string(), "whitelist");
        assert_eq!(FilterKind::Blacklist.to_string(), "blacklist");
    }

    #[test]
    fn test_with_filter_type() {
        let config = SarkConfig::with_filter_type(FilterKind::Blacklist);
        assert_eq!(
            config.injector.filter.filter_type,
            Some(FilterKind::Blacklist)
        );
        assert!(config.injector.filter.rules.is_empty());
        assert!(config.build.target_pkgs.is_empty());
    }
}
