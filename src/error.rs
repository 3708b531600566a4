use std::ops::Range;

use thiserror::Error;

/// Amount of context kept on either side of the offending span.
const CONTEXT_CHARS: usize = 20;

const MAX_MESSAGE_CHARS: usize = 200;

/// Category of a compilation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnterminatedString,
    /// Malformed or overflowing numeric, time span or date time literal
    InvalidLiteral,
    UnexpectedCharacter,
    /// Missing, extra or misplaced token
    UnexpectedToken,
    MemberNotFound,
    AmbiguousMember,
    /// Operand types incompatible with an operator or function
    TypeMismatch,
    /// Nested query applied to a value that is not a sequence
    NotASequence,
    /// Iterator variable climbing past the top-level query
    IteratorDepth,
    UnknownFunction,
    InvalidPattern,
    /// Query (or nested query) that does not produce a boolean
    NotBoolean,
}

/// The single error produced while turning query text into a predicate.
///
/// `Display` renders the full report including the surrounding source line and
/// a caret marker under the offending span.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{report}")]
pub struct CompileError {
    kind: ErrorKind,
    span: Range<usize>,
    message: String,
    report: String,
}

impl CompileError {
    pub(crate) fn new(
        kind: ErrorKind,
        source: &str,
        span: Range<usize>,
        message: impl Into<String>,
    ) -> Self {
        let mut message = message.into();
        if message.chars().count() > MAX_MESSAGE_CHARS {
            message = message.chars().take(MAX_MESSAGE_CHARS).chain("...".chars()).collect();
        }
        let report = render_report(source, span.clone(), &message);
        CompileError {
            kind,
            span,
            message,
            report,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Byte offsets of the offending text in the query.
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    pub fn position(&self) -> usize {
        self.span.start
    }

    /// The message without the surrounding-text report.
    pub fn message(&self) -> &str {
        &self.message
    }
}

fn render_report(source: &str, span: Range<usize>, message: &str) -> String {
    let (line, marker) = if source.is_empty() {
        ("(empty input)".to_string(), String::new())
    } else {
        surrounding_line(source, span.clone())
    };

    format!(
        "Query compilation failed, error at position {}:\n  {}\n\nSurrounding text:\n  {}\n  {}",
        span.start, message, line, marker
    )
}

/// Extract the line holding the start of `span`, clipped to a bounded window,
/// and a caret marker aligned under the span.
fn surrounding_line(source: &str, span: Range<usize>) -> (String, String) {
    let start = span.start.min(source.len());
    let line_start = source[..start].rfind('\n').map_or(0, |i| i + 1);
    let line_end = source[start..].find('\n').map_or(source.len(), |i| start + i);
    let end = span.end.clamp(start, line_end);

    let before: Vec<char> = source[line_start..start].chars().collect();
    let inside: Vec<char> = source[start..end].chars().collect();
    let after: Vec<char> = source[end..line_end].chars().collect();

    let mut line = String::new();
    let mut offset = before.len();
    if before.len() > CONTEXT_CHARS {
        line.push_str("...");
        line.extend(&before[before.len() - CONTEXT_CHARS..]);
        offset = CONTEXT_CHARS + 3;
    } else {
        line.extend(&before);
    }

    if inside.len() > CONTEXT_CHARS {
        line.extend(&inside[..CONTEXT_CHARS]);
        line.push_str("...");
    } else {
        line.extend(&inside);
        if after.len() > CONTEXT_CHARS {
            line.extend(&after[..CONTEXT_CHARS]);
            line.push_str("...");
        } else {
            line.extend(&after);
        }
    }

    let carets = inside.len().clamp(1, CONTEXT_CHARS);
    let marker = format!("{}{}", " ".repeat(offset), "^".repeat(carets));
    (line, marker)
}

/// Quote of user text for a message, cut to the context window.
pub(crate) fn excerpt(text: &str) -> String {
    if text.chars().count() > CONTEXT_CHARS {
        let head: String = text.chars().take(CONTEXT_CHARS).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

#[test]
fn test_report_marks_span() {
    let err = CompileError::new(ErrorKind::UnexpectedCharacter, "a == #", 5..6, "Unexpected character '#'");
    let report = err.to_string();
    assert!(report.contains("error at position 5"));
    assert!(report.contains("  a == #\n       ^"));
}

#[test]
fn test_report_truncates_long_lines() {
    let source = format!("{}x{}", "a".repeat(100), "b".repeat(100));
    let err = CompileError::new(ErrorKind::UnexpectedToken, &source, 100..101, "boom");
    let report = err.to_string();
    let expected = format!("...{}x{}...", "a".repeat(20), "b".repeat(20));
    assert!(report.contains(&expected));
    assert!(report.ends_with(&format!("{}^", " ".repeat(23))));
}

#[test]
fn test_report_is_bounded_for_long_spans() {
    let source = format!("n{}", " + 1".repeat(5000));
    let err = CompileError::new(ErrorKind::NotBoolean, &source, 0..source.len(), "not a boolean");
    let report = err.to_string();
    assert!(report.len() < 200, "report grew to {} bytes", report.len());
    assert!(report.contains(&format!("  {}...\n", &source[..20])));
    assert!(report.ends_with(&format!("  {}", "^".repeat(20))));
}

#[test]
fn test_report_stops_at_line_break() {
    let err = CompileError::new(ErrorKind::NotBoolean, "n +\n 1", 0..6, "not a boolean");
    let report = err.to_string();
    assert!(report.ends_with("Surrounding text:\n  n +\n  ^^^"));
}

#[test]
fn test_long_messages_are_cut() {
    let err = CompileError::new(ErrorKind::UnexpectedToken, "x", 0..1, "m".repeat(1000));
    assert_eq!(err.message().len(), MAX_MESSAGE_CHARS + 3);
    assert!(err.message().ends_with("..."));
}

#[test]
fn test_excerpt() {
    assert_eq!(excerpt("short"), "short");
    assert_eq!(excerpt(&"x".repeat(50)), format!("{}...", "x".repeat(20)));
}
