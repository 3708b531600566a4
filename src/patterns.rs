//! Glob and regular-expression matching behind the `=?`, `!?`, `=~` and `!~`
//! operators.

use regex::Regex;

/// Pattern-matching operator, invoked as a function rather than evaluated
/// natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternOp {
    /// `=?`
    Like,
    /// `!?`
    NotLike,
    /// `=~`
    Matches,
    /// `!~`
    NotMatches,
}

impl PatternOp {
    pub fn name(&self) -> &'static str {
        match self {
            PatternOp::Like => "Like",
            PatternOp::NotLike => "NotLike",
            PatternOp::Matches => "MatchesRegex",
            PatternOp::NotMatches => "DoesNotMatchRegex",
        }
    }

    pub fn is_regex(&self) -> bool {
        matches!(self, PatternOp::Matches | PatternOp::NotMatches)
    }

    /// Apply the operator, compiling the pattern on the spot when it is a regex.
    pub fn apply(&self, text: Option<&str>, pattern: Option<&str>) -> bool {
        match self {
            PatternOp::Like => like(text, pattern),
            PatternOp::NotLike => !like(text, pattern),
            PatternOp::Matches => matches_regex(text, pattern),
            PatternOp::NotMatches => !matches_regex(text, pattern),
        }
    }

    /// Apply a regex operator with a pattern compiled ahead of time.
    pub fn apply_compiled(&self, text: Option<&str>, regex: &Regex) -> bool {
        let found = regex.is_match(text.unwrap_or(""));
        if *self == PatternOp::NotMatches { !found } else { found }
    }
}

/// Glob match where `*` matches any run of characters and `?` exactly one.
///
/// Absent operands are treated as empty strings. Runs in
/// `O(|text| * |pattern|)` time and space.
pub fn like(text: Option<&str>, pattern: Option<&str>) -> bool {
    let text: Vec<char> = text.unwrap_or("").chars().collect();
    let pattern: Vec<char> = pattern.unwrap_or("").chars().collect();

    // lookup[i][j]: first i chars of text match first j chars of pattern
    let mut lookup = vec![vec![false; pattern.len() + 1]; text.len() + 1];
    lookup[0][0] = true;

    for j in 1..=pattern.len() {
        if pattern[j - 1] == '*' {
            lookup[0][j] = lookup[0][j - 1];
        }
    }

    for i in 1..=text.len() {
        for j in 1..=pattern.len() {
            lookup[i][j] = if pattern[j - 1] == '*' {
                lookup[i - 1][j] || lookup[i][j - 1]
            } else if pattern[j - 1] == '?' || pattern[j - 1] == text[i - 1] {
                lookup[i - 1][j - 1]
            } else {
                false
            };
        }
    }

    lookup[text.len()][pattern.len()]
}

/// Regex search. An unparsable pattern never matches.
pub fn matches_regex(text: Option<&str>, pattern: Option<&str>) -> bool {
    match Regex::new(pattern.unwrap_or("")) {
        Ok(regex) => regex.is_match(text.unwrap_or("")),
        Err(err) => {
            log::debug!("ignoring invalid runtime regex: {}", err);
            false
        }
    }
}

#[test]
fn test_like_empty() {
    assert!(like(None, None));
    assert!(like(Some(""), Some("***")));
    assert!(!like(Some(""), Some("?")));
}
