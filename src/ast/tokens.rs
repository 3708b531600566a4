use std::borrow::Cow;
use std::fmt;

use chrono::{NaiveDateTime, TimeDelta};

use crate::schema::ValueType;
use crate::value::Value;

/// Kind of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Words
    /// Member or function name
    ///
    /// # Examples
    /// ```text
    /// loginattempts
    /// DateTime
    /// ```
    Identifier,

    /// `@now`, the timestamp captured when the query is compiled
    Now,

    /// One or more `$`, the run length selects the nesting level
    ///
    /// # Examples
    /// ```text
    /// $      // current element
    /// $$     // element of the enclosing query
    /// ```
    IteratorVariable,

    /// `any`, `all` or `count`
    NestedQueryOperator,

    /// String, number, boolean, time span or date time literal
    Literal,

    // Binary operators
    Or,
    And,
    BitwiseOr,
    BitwiseXor,
    BitwiseAnd,
    Equal,
    NotEqual,
    /// Glob match (`=?`)
    Like,
    /// Negated glob match (`!?`)
    NotLike,
    /// Regex match (`=~`)
    Matches,
    /// Negated regex match (`!~`)
    NotMatches,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    ShiftLeft,
    ShiftRight,
    Plus,
    /// Binary subtraction or unary negation
    Minus,
    Multiply,
    Divide,
    Modulo,

    // Unary operators
    Not,
    BitwiseNot,

    // Delimiters
    Dot,
    Comma,
    ParenthesisOpen,
    ParenthesisClose,
    BlockOpen,
    BlockClose,

    EndOfFile,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::Identifier => "identifier",
            TokenKind::Now => "'@now'",
            TokenKind::IteratorVariable => "iterator variable",
            TokenKind::NestedQueryOperator => "nested query operator",
            TokenKind::Literal => "literal",
            TokenKind::Or => "'||'",
            TokenKind::And => "'&&'",
            TokenKind::BitwiseOr => "'|'",
            TokenKind::BitwiseXor => "'^'",
            TokenKind::BitwiseAnd => "'&'",
            TokenKind::Equal => "'=='",
            TokenKind::NotEqual => "'!='",
            TokenKind::Like => "'=?'",
            TokenKind::NotLike => "'!?'",
            TokenKind::Matches => "'=~'",
            TokenKind::NotMatches => "'!~'",
            TokenKind::LessThan => "'<'",
            TokenKind::LessThanOrEqual => "'<='",
            TokenKind::GreaterThan => "'>'",
            TokenKind::GreaterThanOrEqual => "'>='",
            TokenKind::ShiftLeft => "'<<'",
            TokenKind::ShiftRight => "'>>'",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Multiply => "'*'",
            TokenKind::Divide => "'/'",
            TokenKind::Modulo => "'%'",
            TokenKind::Not => "'!'",
            TokenKind::BitwiseNot => "'~'",
            TokenKind::Dot => "'.'",
            TokenKind::Comma => "','",
            TokenKind::ParenthesisOpen => "'('",
            TokenKind::ParenthesisClose => "')'",
            TokenKind::BlockOpen => "'{'",
            TokenKind::BlockClose => "'}'",
            TokenKind::EndOfFile => "end of input",
        };
        f.write_str(text)
    }
}

/// Typed value of a literal token.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// `"hello"`, no escape processing
    String(String),
    /// `42`
    Integer(i32),
    /// `3.14`, `.5`
    Float(f64),
    /// `true`, `false`
    Boolean(bool),
    /// `1.02:30:00`, `12:30`, `00:00:01.250`
    TimeSpan(TimeDelta),
    /// `2023-04-01`, `2023-04-01 12:30:00`
    DateTime(NaiveDateTime),
}

impl LiteralValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            LiteralValue::String(_) => ValueType::String,
            LiteralValue::Integer(_) => ValueType::Integer,
            LiteralValue::Float(_) => ValueType::Float,
            LiteralValue::Boolean(_) => ValueType::Boolean,
            LiteralValue::TimeSpan(_) => ValueType::TimeSpan,
            LiteralValue::DateTime(_) => ValueType::DateTime,
        }
    }

    /// Runtime value, borrowing string contents from the literal
    pub fn to_value(&self) -> Value<'_> {
        match self {
            LiteralValue::String(s) => Value::String(Cow::Borrowed(s)),
            LiteralValue::Integer(n) => Value::Integer(i64::from(*n)),
            LiteralValue::Float(n) => Value::Float(*n),
            LiteralValue::Boolean(b) => Value::Boolean(*b),
            LiteralValue::TimeSpan(t) => Value::TimeSpan(*t),
            LiteralValue::DateTime(d) => Value::DateTime(*d),
        }
    }
}

/// A positioned token. Immutable once produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Byte offset of the first character
    pub start: usize,
    pub kind: TokenKind,
    pub lexeme: String,
    pub literal: Option<LiteralValue>,
}

impl Token {
    pub fn new(start: usize, kind: TokenKind, lexeme: impl Into<String>) -> Self {
        Token {
            start,
            kind,
            lexeme: lexeme.into(),
            literal: None,
        }
    }

    pub fn literal(start: usize, lexeme: impl Into<String>, value: LiteralValue) -> Self {
        Token {
            start,
            kind: TokenKind::Literal,
            lexeme: lexeme.into(),
            literal: Some(value),
        }
    }

    /// Byte offset one past the last character.
    pub fn end(&self) -> usize {
        self.start + self.lexeme.len()
    }
}
