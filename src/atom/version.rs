//! Orderable form of Gentoo-style version strings.
//!
//! Gentoo versions run one to five dotted numeric groups plus optional
//! suffixes (`_rc1`, `_p2`, `-r1`, ...). [`normalize`] rewrites the
//! underscore suffixes into dash form so a single dotted-version-with-
//! prerelease comparator can order everything. The ordering is deliberately
//! simplified: numeric segments compare with zero padding, a bare release
//! outranks any suffixed form of the same numbers, and two suffixes compare
//! lexically.

use std::cmp::Ordering;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unorderable version {0:?}")]
pub struct VersionError(pub String);

/// Rewrite underscore suffix markers into dash form (`2.0_rc1` -> `2.0-rc1`).
///
/// `_pre` must be rewritten before `_p` or the latter would eat its prefix.
pub fn normalize(version: &str) -> String {
    version
        .replace("_alpha", "-alpha")
        .replace("_beta", "-beta")
        .replace("_pre", "-pre")
        .replace("_rc", "-rc")
        .replace("_p", "-p")
}

/// A version parsed into comparable form.
#[derive(Debug, Clone)]
pub struct OrderableVersion {
    segments: Vec<u64>,
    suffix: String,
}

impl OrderableVersion {
    /// Parse a version string, accepting both underscore and dash suffixes.
    pub fn parse(version: &str) -> Result<Self, VersionError> {
        let normalized = normalize(version);
        let (base, suffix) = match normalized.find('-') {
            Some(idx) => (&normalized[..idx], &normalized[idx + 1..]),
            None => (normalized.as_str(), ""),
        };
        if base.is_empty() {
            return Err(VersionError(version.to_string()));
        }
        let segments = base
            .split('.')
            .map(|s| s.parse::<u64>().map_err(|_| VersionError(version.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(OrderableVersion {
            segments,
            suffix: suffix.to_string(),
        })
    }

    /// The version that closes the half-open range opened by a trailing `*`
    /// match: the last dotted segment incremented, suffix dropped.
    pub fn bump_last(&self) -> Self {
        let mut segments = self.segments.clone();
        if let Some(last) = segments.last_mut() {
            *last += 1;
        }
        OrderableVersion {
            segments,
            suffix: String::new(),
        }
    }
}

impl Ord for OrderableVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        for idx in 0..len {
            let a = self.segments.get(idx).copied().unwrap_or(0);
            let b = other.segments.get(idx).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        match (self.suffix.is_empty(), other.suffix.is_empty()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self.suffix.cmp(&other.suffix),
        }
    }
}

impl PartialOrd for OrderableVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OrderableVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OrderableVersion {}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> OrderableVersion {
        OrderableVersion::parse(s).unwrap()
    }

    #[test]
    fn test_normalize_suffixes() {
        assert_eq!(normalize("2.0_rc1"), "2.0-rc1");
        assert_eq!(normalize("2.0_alpha"), "2.0-alpha");
        assert_eq!(normalize("2.0_beta"), "2.0-beta");
        assert_eq!(normalize("2.0_pre"), "2.0-pre");
        assert_eq!(normalize("2.0_p1"), "2.0-p1");
        assert_eq!(normalize("2.0-r1"), "2.0-r1");
    }

    #[test]
    fn test_normalize_keeps_pre_intact() {
        // `_p` must not strip the head of `_pre`
        assert_eq!(normalize("1.2_pre2"), "1.2-pre2");
    }

    #[test]
    fn test_basic_ordering() {
        assert!(v("1.1.1.1") < v("1.1.1.2"));
        assert!(v("1.1.1.2") >= v("1.1.1.1"));
        assert!(v("3.0.1") < v("3.1.0"));
        assert!(v("171") < v("172"));
    }

    #[test]
    fn test_zero_padding_equality() {
        assert_eq!(v("2.0"), v("2.0.0"));
        assert_eq!(v("2.0.1"), v("2.0.1.0"));
        assert!(v("2.0") < v("2.0.1"));
    }

    #[test]
    fn test_release_outranks_suffixed() {
        assert!(v("2.0_rc1") < v("2.0"));
        assert!(v("2.0.1-r1") < v("2.0.1"));
        assert!(v("2.0.1") > v("2.0.1_beta"));
    }

    #[test]
    fn test_suffixes_compare_lexically() {
        assert!(v("1.0_alpha") < v("1.0_beta"));
        assert!(v("1.0-r1") < v("1.0-r2"));
    }

    #[test]
    fn test_bump_last() {
        assert_eq!(v("7.3").bump_last(), v("7.4"));
        assert_eq!(v("2.0.1").bump_last(), v("2.0.2"));
        assert_eq!(v("12.1.0.2").bump_last(), v("12.1.0.3"));
        assert_eq!(v("9").bump_last(), v("10"));
    }

    #[test]
    fn test_bump_last_drops_suffix() {
        assert_eq!(v("2.0_rc1").bump_last(), v("2.1"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(OrderableVersion::parse("").is_err());
        assert!(OrderableVersion::parse("abc").is_err());
        assert!(OrderableVersion::parse("1.x.2").is_err());
        assert!(OrderableVersion::parse("-r1").is_err());
    }
}
