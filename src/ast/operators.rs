use crate::ast::TokenKind;
use crate::patterns::PatternOp;

/// Precedence floor that admits every binary operator.
pub const LOWEST_PRECEDENCE: i32 = i32::MIN;

/// Binary operators evaluated natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Logical
    /// Logical OR (`||`)
    Or,
    /// Logical AND (`&&`)
    And,

    // Bitwise
    /// Bitwise OR (`|`), non-short-circuit OR on booleans
    BitwiseOr,
    /// Bitwise XOR (`^`)
    BitwiseXor,
    /// Bitwise AND (`&`), non-short-circuit AND on booleans
    BitwiseAnd,

    // Comparison
    /// Equal (`==`)
    Equal,
    /// Not equal (`!=`)
    NotEqual,
    /// Less than (`<`)
    LessThan,
    /// Less than or equal (`<=`)
    LessEqual,
    /// Greater than (`>`)
    GreaterThan,
    /// Greater than or equal (`>=`)
    GreaterEqual,

    // Shift
    /// Left shift (`<<`)
    ShiftLeft,
    /// Right shift (`>>`)
    ShiftRight,

    // Arithmetic
    /// Addition or string concatenation (`+`)
    Add,
    /// Subtraction (`-`)
    Subtract,
    /// Multiplication (`*`)
    Multiply,
    /// Division (`/`)
    Divide,
    /// Modulo (`%`)
    Modulo,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Or => "||",
            BinOp::And => "&&",
            BinOp::BitwiseOr => "|",
            BinOp::BitwiseXor => "^",
            BinOp::BitwiseAnd => "&",
            BinOp::Equal => "==",
            BinOp::NotEqual => "!=",
            BinOp::LessThan => "<",
            BinOp::LessEqual => "<=",
            BinOp::GreaterThan => ">",
            BinOp::GreaterEqual => ">=",
            BinOp::ShiftLeft => "<<",
            BinOp::ShiftRight => ">>",
            BinOp::Add => "+",
            BinOp::Subtract => "-",
            BinOp::Multiply => "*",
            BinOp::Divide => "/",
            BinOp::Modulo => "%",
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Arithmetic negation (`-`)
    Negate,
    /// Logical not (`!`)
    Not,
    /// Bitwise complement on integers, logical not on booleans (`~`)
    BitwiseNot,
}

/// What a binary operator token turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorSemantics {
    Native(BinOp),
    /// Implemented as a call to a pattern-matching function
    Pattern(PatternOp),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryOperatorInfo {
    pub lexeme: &'static str,
    pub token_kind: TokenKind,
    pub precedence: i32,
    pub semantics: OperatorSemantics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnaryOperatorInfo {
    pub lexeme: char,
    pub token_kind: TokenKind,
    pub op: UnaryOp,
}

const fn native(lexeme: &'static str, token_kind: TokenKind, precedence: i32, op: BinOp) -> BinaryOperatorInfo {
    BinaryOperatorInfo {
        lexeme,
        token_kind,
        precedence,
        semantics: OperatorSemantics::Native(op),
    }
}

const fn pattern(lexeme: &'static str, token_kind: TokenKind, op: PatternOp) -> BinaryOperatorInfo {
    BinaryOperatorInfo {
        lexeme,
        token_kind,
        precedence: 60,
        semantics: OperatorSemantics::Pattern(op),
    }
}

/// Binary operators ordered by descending lexeme length, so a longest-match
/// scan never stops at a prefix (`<=` before `<`, `||` before `|`).
pub static BINARY_OPERATORS: [BinaryOperatorInfo; 22] = [
    native("||", TokenKind::Or, 0, BinOp::Or),
    native("&&", TokenKind::And, 10, BinOp::And),
    native("==", TokenKind::Equal, 60, BinOp::Equal),
    native("!=", TokenKind::NotEqual, 60, BinOp::NotEqual),
    pattern("=?", TokenKind::Like, PatternOp::Like),
    pattern("!?", TokenKind::NotLike, PatternOp::NotLike),
    pattern("=~", TokenKind::Matches, PatternOp::Matches),
    pattern("!~", TokenKind::NotMatches, PatternOp::NotMatches),
    native("<=", TokenKind::LessThanOrEqual, 70, BinOp::LessEqual),
    native(">=", TokenKind::GreaterThanOrEqual, 70, BinOp::GreaterEqual),
    native("<<", TokenKind::ShiftLeft, 80, BinOp::ShiftLeft),
    native(">>", TokenKind::ShiftRight, 80, BinOp::ShiftRight),
    native("|", TokenKind::BitwiseOr, 20, BinOp::BitwiseOr),
    native("^", TokenKind::BitwiseXor, 30, BinOp::BitwiseXor),
    native("&", TokenKind::BitwiseAnd, 40, BinOp::BitwiseAnd),
    native("<", TokenKind::LessThan, 70, BinOp::LessThan),
    native(">", TokenKind::GreaterThan, 70, BinOp::GreaterThan),
    native("+", TokenKind::Plus, 90, BinOp::Add),
    native("-", TokenKind::Minus, 90, BinOp::Subtract),
    native("*", TokenKind::Multiply, 100, BinOp::Multiply),
    native("/", TokenKind::Divide, 100, BinOp::Divide),
    native("%", TokenKind::Modulo, 100, BinOp::Modulo),
];

pub static UNARY_OPERATORS: [UnaryOperatorInfo; 3] = [
    UnaryOperatorInfo {
        lexeme: '-',
        token_kind: TokenKind::Minus,
        op: UnaryOp::Negate,
    },
    UnaryOperatorInfo {
        lexeme: '!',
        token_kind: TokenKind::Not,
        op: UnaryOp::Not,
    },
    UnaryOperatorInfo {
        lexeme: '~',
        token_kind: TokenKind::BitwiseNot,
        op: UnaryOp::BitwiseNot,
    },
];

pub fn binary_operator(kind: TokenKind) -> Option<&'static BinaryOperatorInfo> {
    BINARY_OPERATORS.iter().find(|info| info.token_kind == kind)
}

pub fn unary_operator(kind: TokenKind) -> Option<&'static UnaryOperatorInfo> {
    UNARY_OPERATORS.iter().find(|info| info.token_kind == kind)
}

#[test]
fn test_table_is_longest_first() {
    let lengths: Vec<usize> = BINARY_OPERATORS.iter().map(|op| op.lexeme.len()).collect();
    assert!(lengths.windows(2).all(|pair| pair[0] >= pair[1]));
}
