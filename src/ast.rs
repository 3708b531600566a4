//! # Sift Query Language - Abstract Syntax Tree
//!
//! Tokens, operator tables and the typed expression tree that the parser
//! builds from a query.
//!
//! - **[tokens]** - Lexical tokens and literal values produced by the lexer
//! - **[operators]** - Binary and unary operators with their precedences
//! - **[expressions]** - Typed expression nodes
//!
//! ## Quick Start
//!
//! ```text
//! first =? "j*" && loginattempts < 3 || list any { number > 3 }
//! ```
//!
//! ## Precedence
//!
//! From loosest to tightest:
//!
//! | Operators                          | Precedence |
//! |------------------------------------|-----------:|
//! | `\|\|`                             | 0          |
//! | `&&`                               | 10         |
//! | `\|`                               | 20         |
//! | `^`                                | 30         |
//! | `&`                                | 40         |
//! | `==` `!=` `=?` `!?` `=~` `!~`      | 60         |
//! | `<` `<=` `>` `>=`                  | 70         |
//! | `<<` `>>`                          | 80         |
//! | `+` `-`                            | 90         |
//! | `*` `/` `%`                        | 100        |
//!
//! Operators of equal precedence group to the left. A unary operator takes
//! everything up to the end of the enclosing expression as its operand, so
//! `!a && b` reads as `!(a && b)`.
pub mod expressions;
pub mod operators;
pub mod tokens;

pub use expressions::{BinaryOperator, Expr, ExprKind, NestedQueryKind};
pub use operators::{
    BINARY_OPERATORS, BinOp, BinaryOperatorInfo, LOWEST_PRECEDENCE, OperatorSemantics,
    UNARY_OPERATORS, UnaryOp, UnaryOperatorInfo, binary_operator, unary_operator,
};
pub use tokens::{LiteralValue, Token, TokenKind};
