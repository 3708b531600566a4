//! Entry point: turn query text into a reusable [`Predicate`].

use std::fmt;

use crate::{
    ast::Expr,
    error::CompileError,
    evaluator::Evaluator,
    lexer::Lexer,
    parser::Parser,
    schema::{Schema, ValueType},
};

/// Compile `query` into a predicate over values described by `schema`.
///
/// Fails on the first lexical, syntactic or type error; no partial predicate
/// is ever returned.
///
/// # Examples
///
/// ```
/// use sift_lang::{Schema, compile};
///
/// struct Account {
///     login_attempts: i32,
///     first: String,
/// }
///
/// let schema = Schema::<Account>::builder("Account")
///     .field("LoginAttempts", |a: &Account| a.login_attempts)
///     .text("First", |a| a.first.as_str())
///     .build();
///
/// let predicate = compile(r#"first =? "j*" && loginatt < 3"#, &schema).unwrap();
///
/// assert!(predicate.matches(&Account { login_attempts: 1, first: "joe".into() }));
/// assert!(!predicate.matches(&Account { login_attempts: 5, first: "joe".into() }));
/// ```
pub fn compile<T>(query: &str, schema: &Schema<T>) -> Result<Predicate<T>, CompileError> {
    let expression = parse(query, schema.value_type())?;
    log::debug!("Compiled query {:?} against {}", query, schema.value_type());

    Ok(Predicate {
        expression,
        schema: schema.clone(),
    })
}

/// Parse `query` into a typed expression tree without wrapping it in a
/// predicate. The root is always boolean.
pub fn parse(query: &str, input_type: &ValueType) -> Result<Expr, CompileError> {
    Parser::new(Lexer::new(query), input_type.clone()).parse()
}

/// A compiled query.
///
/// Holds no parser state and never mutates, so one predicate can be shared
/// between threads and evaluated any number of times.
pub struct Predicate<T> {
    expression: Expr,
    schema: Schema<T>,
}

impl<T> Predicate<T> {
    pub fn matches(&self, input: &T) -> bool {
        Evaluator::new().eval_predicate(&self.expression, self.schema.lift(input))
    }

    /// Keep the inputs the query matches, in order.
    pub fn filter<'t, I>(&self, inputs: I) -> Vec<&'t T>
    where
        I: IntoIterator<Item = &'t T>,
        T: 't,
    {
        inputs.into_iter().filter(|input| self.matches(input)).collect()
    }

    pub fn expression(&self) -> &Expr {
        &self.expression
    }

    pub fn schema(&self) -> &Schema<T> {
        &self.schema
    }
}

impl<T> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        Predicate {
            expression: self.expression.clone(),
            schema: self.schema.clone(),
        }
    }
}

impl<T> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("expression", &self.expression)
            .finish_non_exhaustive()
    }
}
