// tests/pattern_tests.rs

use sift_lang::patterns::{PatternOp, like, matches_regex};

#[test]
fn test_like() {
    // (pattern, text, expected)
    let cases = vec![
        ("", "", true),
        ("*", "", true),
        ("*****", "", true),
        ("*a", "", false),
        ("*a", "a", true),
        ("*a*", "a", true),
        ("a*", "a", true),
        ("abc*", "a", false),
        ("abc*", "abc*", true),
        ("a*c", "abc", true),
        ("a*c", "abbbbbbc", true),
        ("a*c*", "abbbbbbc*", true),
        ("*a*c*", "abbbbbbc", true),
        ("*a*c*", "xxxabbbbbbc", true),
        ("*a*b*c*d*e*f*", "a x b1c...depppffff", true),
        ("?", "", false),
        ("?", "a", true),
        ("?", "aa", false),
        ("??", "aa", true),
        ("bun*r", "bundlor", true),
        ("bun?r", "bundlor", false),
        ("a", "abc*", false),
    ];

    for (pattern, text, expected) in cases {
        assert_eq!(
            like(Some(text), Some(pattern)),
            expected,
            "like({:?}, {:?})",
            text,
            pattern
        );
    }
}

#[test]
fn test_like_is_case_sensitive() {
    assert!(!like(Some("ABC"), Some("a*")));
    assert!(like(Some("ABC"), Some("A*")));
}

#[test]
fn test_like_counts_characters_not_bytes() {
    assert!(like(Some("ü"), Some("?")));
    assert!(like(Some("grüße"), Some("gr??e")));
}

#[test]
fn test_like_treats_absent_as_empty() {
    assert!(like(None, Some("")));
    assert!(like(None, Some("*")));
    assert!(!like(None, Some("?")));
    assert!(like(Some(""), None));
    assert!(!like(Some("a"), None));
}

#[test]
fn test_matches_regex() {
    let pattern = Some(r"^[0-9a-z]*_\s+(a){1,2}$");
    assert!(matches_regex(Some("_ a"), pattern));
    assert!(matches_regex(Some("a0b1c2_  \taa"), pattern));
    assert!(!matches_regex(Some(""), pattern));
    assert!(!matches_regex(Some("a0b1c2_  aaa"), pattern));
    assert!(!matches_regex(Some("a__ \ta"), pattern));
}

#[test]
fn test_matches_regex_is_a_search() {
    assert!(matches_regex(Some("say hello there"), Some("hel+o")));
    assert!(!matches_regex(Some("say hello there"), Some("^hello")));
}

#[test]
fn test_invalid_regex_never_matches() {
    assert!(!matches_regex(Some("("), Some("(")));
    assert!(!PatternOp::Matches.apply(Some("abc"), Some("[a-")));
    assert!(PatternOp::NotMatches.apply(Some("abc"), Some("[a-")));
}

#[test]
fn test_negated_operators() {
    assert!(PatternOp::Like.apply(Some("bundlor"), Some("bun*")));
    assert!(!PatternOp::NotLike.apply(Some("bundlor"), Some("bun*")));
    assert!(PatternOp::NotLike.apply(Some("bundlor"), Some("x*")));
    assert!(!PatternOp::NotMatches.apply(Some("bundlor"), Some("d.o")));
}

#[test]
fn test_compiled_regex() {
    let regex = regex::Regex::new("^b").unwrap();
    assert!(PatternOp::Matches.apply_compiled(Some("bundlor"), &regex));
    assert!(PatternOp::NotMatches.apply_compiled(None, &regex));
}
