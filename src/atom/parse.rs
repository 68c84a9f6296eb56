//! The atom parser.

use lazy_static::lazy_static;
use regex::Regex;

use super::{Atom, Condition, ParseError};

lazy_static! {
    /// Trailing version run: one to five dotted numeric groups, then any
    /// number of suffix tokens, then an optional `+build` trailer. Anchored
    /// at the end so names containing digits keep everything that is not a
    /// trailing run (`docker-py-3.7.1` -> name `docker-py`).
    static ref VERSION_RUN: Regex = Regex::new(
        r"-(?P<ver>\d+(?:\.\d+){0,4})(?P<suffix>(?:_(?:alpha|beta|pre\d*|rc\d*|p\d+)|-r\d+)*)(?:\+(?P<build>[0-9A-Za-z._]+))?$"
    )
    .expect("version run regex");
}

impl Atom {
    /// Parse an atom string into an [`Atom`].
    ///
    /// The optional operator prefix fixes [`Condition`]; a bare
    /// `category/name-version` implies [`Condition::Equal`]. Slot defaults
    /// to `"0"` when no `:slot` qualifier is present.
    pub fn parse(input: &str) -> Result<Atom, ParseError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseError::Empty);
        }

        let mut atom = Atom::default();
        let mut rest = input;

        if let Some(r) = rest.strip_prefix(">=") {
            atom.condition = Condition::GreaterEqual;
            rest = r;
        } else if let Some(r) = rest.strip_prefix("<=") {
            atom.condition = Condition::LessEqual;
            rest = r;
        } else if let Some(r) = rest.strip_prefix('>') {
            atom.condition = Condition::Greater;
            rest = r;
        } else if let Some(r) = rest.strip_prefix('<') {
            atom.condition = Condition::Less;
            rest = r;
        } else if let Some(r) = rest.strip_prefix('=') {
            if let Some(r) = r.strip_suffix('*') {
                atom.condition = Condition::MatchVersion;
                rest = r;
            } else {
                atom.condition = Condition::Equal;
                rest = r;
            }
        } else if let Some(r) = rest.strip_prefix('~') {
            atom.condition = Condition::AnyRevision;
            rest = r;
        } else if let Some(r) = rest.strip_prefix('!') {
            atom.condition = Condition::Not;
            rest = r;
        }
        let explicit_operator = atom.condition != Condition::Invalid;

        let words: Vec<&str> = rest.split('/').collect();
        if words.len() != 2 {
            return Err(ParseError::Malformed(input.to_string()));
        }
        atom.category = words[0].to_string();
        let mut token = words[1].to_string();

        // Use flags are spliced out first so `:slot` parsing never sees them.
        if let Some(open) = token.find('[') {
            let close = token[open..]
                .find(']')
                .map(|off| open + off)
                .ok_or_else(|| ParseError::Malformed(input.to_string()))?;
            atom.use_flags = token[open + 1..close]
                .split(',')
                .map(str::trim)
                .filter(|flag| !flag.is_empty())
                .map(str::to_string)
                .collect();
            token = format!("{}{}", &token[..open], &token[close + 1..]);
        }

        if let Some(idx) = token.find("::") {
            atom.repository = token[idx + 2..].to_string();
            token.truncate(idx);
        }

        if let Some(idx) = token.find(':') {
            atom.slot = token[idx + 1..].to_string();
            token.truncate(idx);
        }

        if let Some(caps) = VERSION_RUN.captures(&token) {
            let run = caps.get(0).expect("whole match");
            atom.version = caps["ver"].to_string();
            if let Some(suffix) = caps.name("suffix") {
                atom.version_suffix = suffix.as_str().to_string();
            }
            if let Some(build) = caps.name("build") {
                atom.version_build = build.as_str().to_string();
            }
            atom.name = token[..run.start()].to_string();
        } else {
            atom.name = token;
        }

        if atom.name.is_empty() || atom.category.is_empty() {
            return Err(ParseError::Malformed(input.to_string()));
        }

        if !explicit_operator && !atom.version.is_empty() {
            atom.condition = Condition::Equal;
        }

        Ok(atom)
    }
}
