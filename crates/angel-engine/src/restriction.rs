//! Forbidden giver/receiver pairs.

use std::collections::HashSet;

use database::validation::sanitize_name;
use thiserror::Error;

/// A pair of participants who must not be matched with each other,
/// in either direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restriction {
    pub first: String,
    pub second: String,
}

impl Restriction {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }
}

/// Symmetric set of restrictions for one assignment run.
#[derive(Debug, Clone, Default)]
pub struct RestrictionSet {
    pairs: HashSet<(String, String)>,
}

impl RestrictionSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(a: &str, b: &str) -> (String, String) {
        if a <= b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        }
    }

    /// Forbid `a` and `b` from being paired.
    pub fn insert(&mut self, a: &str, b: &str) {
        self.pairs.insert(Self::key(a, b));
    }

    /// Whether pairing `a` with `b`, in either orientation, is forbidden.
    pub fn forbids(&self, a: &str, b: &str) -> bool {
        self.pairs.contains(&Self::key(a, b))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl FromIterator<Restriction> for RestrictionSet {
    fn from_iter<I: IntoIterator<Item = Restriction>>(iter: I) -> Self {
        let mut set = Self::new();
        for restriction in iter {
            set.insert(&restriction.first, &restriction.second);
        }
        set
    }
}

/// Why restriction text was rejected. Any error rejects the whole input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RestrictionParseError {
    /// Line does not hold exactly two non-empty names separated by a comma.
    #[error("line {line} must be two names separated by a comma: {content}")]
    MalformedLine { line: usize, content: String },

    /// Name not present in the roster.
    #[error("unknown participant on line {line}: {name}")]
    UnknownParticipant { line: usize, name: String },

    /// Both names refer to the same participant.
    #[error("line {line} pairs {name} with themselves")]
    SelfPair { line: usize, name: String },
}

/// Parse admin-authored restrictions against the roster names.
///
/// One pair per line, `Name A, Name B`. Empty input or `none` means no
/// restrictions; blank lines are ignored. Names are matched ignoring case
/// and returned with the roster's spelling.
pub fn parse_restrictions(
    input: &str,
    roster: &[&str],
) -> Result<Vec<Restriction>, RestrictionParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return Ok(Vec::new());
    }

    let mut restrictions = Vec::new();
    for (index, raw_line) in trimmed.lines().enumerate() {
        let line = index + 1;
        let content = raw_line.trim();
        if content.is_empty() {
            continue;
        }

        let parts: Vec<&str> = content.split(',').map(str::trim).collect();
        if parts.len() != 2 || parts.iter().any(|p| p.is_empty()) {
            return Err(RestrictionParseError::MalformedLine {
                line,
                content: content.to_string(),
            });
        }

        let first = resolve(parts[0], roster).ok_or_else(|| {
            RestrictionParseError::UnknownParticipant {
                line,
                name: parts[0].to_string(),
            }
        })?;
        let second = resolve(parts[1], roster).ok_or_else(|| {
            RestrictionParseError::UnknownParticipant {
                line,
                name: parts[1].to_string(),
            }
        })?;

        if first == second {
            return Err(RestrictionParseError::SelfPair {
                line,
                name: first.to_string(),
            });
        }

        restrictions.push(Restriction::new(first, second));
    }

    Ok(restrictions)
}

/// Map typed text to a roster name: exact spelling first, then ignoring case.
fn resolve<'a>(typed: &str, roster: &[&'a str]) -> Option<&'a str> {
    // Stored names are escaped, so escape the typed one the same way.
    let candidate = sanitize_name(typed).ok()?;
    if let Some(exact) = roster.iter().find(|name| **name == candidate) {
        return Some(*exact);
    }
    let lowered = candidate.to_lowercase();
    roster
        .iter()
        .find(|name| name.to_lowercase() == lowered)
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROSTER: [&str; 4] = ["Alice", "Bob", "Carol", "Dave"];

    #[test]
    fn test_parse_two_lines() {
        let parsed = parse_restrictions("Alice, Bob\nCarol, Dave", &ROSTER).unwrap();
        assert_eq!(
            parsed,
            vec![Restriction::new("Alice", "Bob"), Restriction::new("Carol", "Dave")]
        );
    }

    #[test]
    fn test_none_and_empty() {
        assert!(parse_restrictions("", &ROSTER).unwrap().is_empty());
        assert!(parse_restrictions("  NONE ", &ROSTER).unwrap().is_empty());
        assert!(parse_restrictions("none", &ROSTER).unwrap().is_empty());
    }

    #[test]
    fn test_case_insensitive_names_use_roster_spelling() {
        let parsed = parse_restrictions("  alice ,BOB  ", &ROSTER).unwrap();
        assert_eq!(parsed, vec![Restriction::new("Alice", "Bob")]);
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let parsed = parse_restrictions("Alice, Bob\n\n  \nCarol, Dave\n", &ROSTER).unwrap();
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn test_unknown_name_rejects_everything() {
        let err = parse_restrictions("Alice, Bob\nCarol, Zed", &ROSTER).unwrap_err();
        assert_eq!(
            err,
            RestrictionParseError::UnknownParticipant {
                line: 2,
                name: "Zed".to_string()
            }
        );
    }

    #[test]
    fn test_malformed_lines() {
        assert!(matches!(
            parse_restrictions("Alice Bob", &ROSTER),
            Err(RestrictionParseError::MalformedLine { line: 1, .. })
        ));
        assert!(matches!(
            parse_restrictions("Alice, Bob, Carol", &ROSTER),
            Err(RestrictionParseError::MalformedLine { .. })
        ));
        assert!(matches!(
            parse_restrictions("Alice,", &ROSTER),
            Err(RestrictionParseError::MalformedLine { .. })
        ));
    }

    #[test]
    fn test_self_pair_rejected() {
        assert!(matches!(
            parse_restrictions("Alice, alice", &ROSTER),
            Err(RestrictionParseError::SelfPair { .. })
        ));
    }

    #[test]
    fn test_apostrophe_names_match_escaped_roster() {
        let stored = sanitize_name("O'Brien").unwrap();
        let roster = [stored.as_str(), "Alice"];
        let parsed = parse_restrictions("O'Brien, Alice", &roster).unwrap();
        assert_eq!(parsed[0].first, stored);
    }

    #[test]
    fn test_set_is_symmetric() {
        let set: RestrictionSet = vec![Restriction::new("Alice", "Bob")].into_iter().collect();
        assert!(set.forbids("Alice", "Bob"));
        assert!(set.forbids("Bob", "Alice"));
        assert!(!set.forbids("Alice", "Carol"));
        assert_eq!(set.len(), 1);
    }
}
