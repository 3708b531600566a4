use regex::Regex;

use crate::ast::{BinOp, LiteralValue, UnaryOp};
use crate::functions::Function;
use crate::patterns::PatternOp;
use crate::schema::{Member, ValueType};

/// Node of the typed AST produced by the parser.
///
/// Every node knows its static [`ValueType`]; nodes are only built after
/// their operands were checked, so a well-formed tree cannot hit a type
/// error while it is evaluated.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub value_type: ValueType,
}

/// Binary operator stored in an [`ExprKind::BinaryOp`] node.
#[derive(Debug, Clone)]
pub enum BinaryOperator {
    Native(BinOp),
    /// Pattern match call; `regex` is compiled ahead of time when the pattern
    /// is a string literal
    Pattern { op: PatternOp, regex: Option<Regex> },
}

/// `any`, `all` or `count` over a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NestedQueryKind {
    Any,
    All,
    Count,
}

impl NestedQueryKind {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "any" => Some(NestedQueryKind::Any),
            "all" => Some(NestedQueryKind::All),
            "count" => Some(NestedQueryKind::Count),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    /// Member read from a record
    ///
    /// # Examples
    /// ```text
    /// loginattempts
    /// record.numberofbananas
    /// $$.name
    /// ```
    MemberAccess { base: Box<Expr>, member: Member },

    /// Input of the query at the given nesting depth (`$`, `$$`, ...)
    IteratorRef(usize),

    /// Literal value, including `@now` captured at compile time
    Literal(LiteralValue),

    UnaryOp { op: UnaryOp, operand: Box<Expr> },

    BinaryOp {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Named function call
    ///
    /// # Example
    /// ```text
    /// DateTime("2023-04-01 08:00")
    /// ```
    FunctionCall { function: Function, args: Vec<Expr> },

    /// Nested query over a sequence; `predicate` is evaluated with each
    /// element as the input at `depth`
    ///
    /// # Example
    /// ```text
    /// list any { number > 3 }
    /// ```
    NestedQuery {
        kind: NestedQueryKind,
        depth: usize,
        source: Box<Expr>,
        predicate: Box<Expr>,
    },
}

impl Expr {
    pub fn new(kind: ExprKind, value_type: ValueType) -> Self {
        Expr { kind, value_type }
    }

    pub fn literal(value: LiteralValue) -> Self {
        let value_type = value.value_type();
        Expr::new(ExprKind::Literal(value), value_type)
    }

    pub fn is_boolean(&self) -> bool {
        self.value_type == ValueType::Boolean
    }
}
