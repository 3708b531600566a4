//! Sift compiles small boolean queries over typed records into predicates.
//!
//! ```
//! use sift_lang::{Schema, compile};
//!
//! struct Entry { number: i32 }
//! struct Sample { name: String, list: Vec<Entry> }
//!
//! let entry = Schema::<Entry>::builder("Entry")
//!     .field("Number", |e| e.number)
//!     .build();
//! let schema = Schema::<Sample>::builder("Sample")
//!     .text("Name", |s| s.name.as_str())
//!     .records("List", &entry, |s| s.list.as_slice())
//!     .build();
//!
//! let query = compile("name =~ \"^b\" && list count { number > 3 } == 1", &schema).unwrap();
//! let sample = Sample {
//!     name: "banana".to_string(),
//!     list: vec![Entry { number: 2 }, Entry { number: 5 }],
//! };
//! assert!(query.matches(&sample));
//! ```
pub mod ast;
pub mod cli;
pub mod compiler;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod json;
pub mod lexer;
pub mod parser;
pub mod patterns;
pub mod schema;
pub mod value;

pub use ast::{BinOp, BinaryOperator, Expr, ExprKind, LiteralValue, NestedQueryKind, Token, TokenKind, UnaryOp};
pub use compiler::{Predicate, compile, parse};
pub use error::{CompileError, ErrorKind};
pub use evaluator::{EvalContext, Evaluator};
pub use lexer::Lexer;
pub use parser::Parser;
pub use patterns::{PatternOp, like, matches_regex};
pub use schema::{Field, Member, RecordType, Schema, SchemaBuilder, ValueType};
pub use value::Value;
