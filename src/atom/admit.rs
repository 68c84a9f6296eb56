//! The satisfaction predicate between a rule atom and a concrete package.

use super::version::OrderableVersion;
use super::{AdmitError, Atom, Condition};

impl Atom {
    /// Decide whether `candidate` satisfies this rule atom.
    ///
    /// Both atoms must refer to the same `category/name`; a mismatch is an
    /// [`AdmitError`], never a plain `false`. A rule without a version admits
    /// every candidate. A versioned rule admits nothing about a candidate
    /// without a version.
    ///
    /// `Equal` (and the implicit `Invalid`-with-version case) compares the
    /// literal `version + suffix` strings, so `=p-2.0.1` does not admit
    /// `p-2.0.1-r1`. Every other condition compares normalized versions.
    pub fn admit(&self, candidate: &Atom) -> Result<bool, AdmitError> {
        if self.category != candidate.category {
            return Err(AdmitError::CategoryMismatch {
                rule: self.qualified_name(),
                candidate: candidate.qualified_name(),
            });
        }
        if self.name != candidate.name {
            return Err(AdmitError::NameMismatch {
                rule: self.qualified_name(),
                candidate: candidate.qualified_name(),
            });
        }

        if self.version.is_empty() {
            return Ok(true);
        }
        if candidate.version.is_empty() {
            return Ok(false);
        }

        let admitted = match self.condition {
            Condition::Invalid | Condition::Equal => {
                self.version_with_suffix() == candidate.version_with_suffix()
            }
            Condition::AnyRevision => {
                OrderableVersion::parse(&candidate.version)?
                    == OrderableVersion::parse(&self.version)?
            }
            Condition::MatchVersion => {
                let lower = OrderableVersion::parse(&self.version)?;
                let upper = lower.bump_last();
                let concrete = OrderableVersion::parse(&candidate.version)?;
                lower <= concrete && concrete < upper
            }
            Condition::Greater => self.ordered(candidate)?.is_gt(),
            Condition::GreaterEqual => self.ordered(candidate)?.is_ge(),
            Condition::Less => self.ordered(candidate)?.is_lt(),
            Condition::LessEqual => self.ordered(candidate)?.is_le(),
            Condition::Not => self.ordered(candidate)?.is_ne(),
        };

        Ok(admitted)
    }

    /// Ordering of the candidate's full version relative to the rule's.
    fn ordered(&self, candidate: &Atom) -> Result<std::cmp::Ordering, AdmitError> {
        let rule = OrderableVersion::parse(&self.version_with_suffix())?;
        let concrete = OrderableVersion::parse(&candidate.version_with_suffix())?;
        Ok(concrete.cmp(&rule))
    }
}
