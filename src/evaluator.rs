use std::borrow::Cow;
use std::cmp::Ordering;

use crate::{
    ast::{BinOp, BinaryOperator, Expr, ExprKind, NestedQueryKind, UnaryOp},
    value::Value,
};

/// Inputs visible to an expression: the query input at depth 0, followed by
/// the current element of every enclosing nested query.
#[derive(Debug, Clone)]
pub struct EvalContext<'a> {
    frames: Vec<Value<'a>>,
}

impl<'a> EvalContext<'a> {
    pub fn new(input: Value<'a>) -> Self {
        EvalContext {
            frames: vec![input],
        }
    }

    /// Input at the given depth, `Null` when nothing is bound there.
    pub fn input(&self, depth: usize) -> &Value<'a> {
        self.frames.get(depth).unwrap_or(&Value::Null)
    }

    fn enter(&mut self, depth: usize, element: Value<'a>) {
        self.frames.truncate(depth);
        self.frames.push(element);
    }

    fn leave(&mut self, depth: usize) {
        self.frames.truncate(depth);
    }
}

/// Tree-walking evaluator for typed expressions.
///
/// Type checks all happen while parsing, so evaluation cannot fail; values
/// that cannot be computed (a missing field, integer division by zero, a date
/// out of range) become [`Value::Null`] and make comparisons false.
#[derive(Debug, Default, Clone, Copy)]
pub struct Evaluator;

impl Evaluator {
    pub fn new() -> Self {
        Evaluator
    }

    /// Evaluate a boolean expression against a single input.
    ///
    /// # Examples
    ///
    /// ```
    /// use sift_lang::{Evaluator, Lexer, Parser, Schema, Value};
    ///
    /// let schema = Schema::<i32>::scalar();
    /// let expr = Parser::new(Lexer::new("$ * 2 > 10"), schema.value_type().clone())
    ///     .parse()
    ///     .unwrap();
    ///
    /// assert!(Evaluator::new().eval_predicate(&expr, Value::Integer(6)));
    /// assert!(!Evaluator::new().eval_predicate(&expr, Value::Integer(5)));
    /// ```
    pub fn eval_predicate<'a>(&self, expr: &'a Expr, input: Value<'a>) -> bool {
        let mut context = EvalContext::new(input);
        self.eval_expr(expr, &mut context).as_bool()
    }

    pub fn eval_expr<'a>(&self, expr: &'a Expr, context: &mut EvalContext<'a>) -> Value<'a> {
        match &expr.kind {
            ExprKind::Literal(value) => value.to_value(),
            ExprKind::IteratorRef(depth) => context.input(*depth).clone(),
            ExprKind::MemberAccess { base, member } => match &base.kind {
                // Avoid cloning the whole input just to read one member.
                ExprKind::IteratorRef(depth) => member.read(context.input(*depth)),
                _ => {
                    let base = self.eval_expr(base, context);
                    member.read(&base)
                }
            },
            ExprKind::UnaryOp { op, operand } => {
                let operand = self.eval_expr(operand, context);
                apply_unary(*op, operand)
            }
            ExprKind::BinaryOp {
                op: BinaryOperator::Native(BinOp::And),
                left,
                right,
            } => {
                let result =
                    self.eval_expr(left, context).as_bool() && self.eval_expr(right, context).as_bool();
                Value::Boolean(result)
            }
            ExprKind::BinaryOp {
                op: BinaryOperator::Native(BinOp::Or),
                left,
                right,
            } => {
                let result =
                    self.eval_expr(left, context).as_bool() || self.eval_expr(right, context).as_bool();
                Value::Boolean(result)
            }
            ExprKind::BinaryOp {
                op: BinaryOperator::Native(op),
                left,
                right,
            } => {
                let left = self.eval_expr(left, context);
                let right = self.eval_expr(right, context);
                apply_binop(*op, left, right)
            }
            ExprKind::BinaryOp {
                op: BinaryOperator::Pattern { op, regex },
                left,
                right,
            } => {
                let text = self.eval_expr(left, context);
                let result = match regex {
                    Some(regex) => op.apply_compiled(text.as_str(), regex),
                    None => {
                        let pattern = self.eval_expr(right, context);
                        op.apply(text.as_str(), pattern.as_str())
                    }
                };
                Value::Boolean(result)
            }
            ExprKind::FunctionCall { function, args } => {
                let values: Vec<Value<'a>> = args.iter().map(|arg| self.eval_expr(arg, context)).collect();
                match function.apply(&values) {
                    Ok(value) => value,
                    Err(message) => {
                        log::trace!("{}() yielded null: {}", function.name(), message);
                        Value::Null
                    }
                }
            }
            ExprKind::NestedQuery {
                kind,
                depth,
                source,
                predicate,
            } => {
                let items = self.eval_expr(source, context).into_items();
                let result = self.eval_nested(*kind, *depth, items, predicate, context);
                context.leave(*depth);
                result
            }
        }
    }

    fn eval_nested<'a>(
        &self,
        kind: NestedQueryKind,
        depth: usize,
        items: Vec<Value<'a>>,
        predicate: &'a Expr,
        context: &mut EvalContext<'a>,
    ) -> Value<'a> {
        let mut count: i64 = 0;
        for item in items {
            context.enter(depth, item);
            let matched = self.eval_expr(predicate, context).as_bool();
            match kind {
                NestedQueryKind::Any if matched => return Value::Boolean(true),
                NestedQueryKind::All if !matched => return Value::Boolean(false),
                NestedQueryKind::Count if matched => count += 1,
                _ => {}
            }
        }

        match kind {
            NestedQueryKind::Any => Value::Boolean(false),
            NestedQueryKind::All => Value::Boolean(true),
            NestedQueryKind::Count => Value::Integer(count),
        }
    }
}

fn apply_unary(op: UnaryOp, operand: Value<'_>) -> Value<'_> {
    match (op, operand) {
        (UnaryOp::Negate, Value::Integer(n)) => Value::Integer(n.wrapping_neg()),
        (UnaryOp::Negate, Value::Float(n)) => Value::Float(-n),
        (UnaryOp::Negate, Value::TimeSpan(span)) => Value::TimeSpan(-span),
        (UnaryOp::Not, Value::Boolean(b)) => Value::Boolean(!b),
        (UnaryOp::BitwiseNot, Value::Integer(n)) => Value::Integer(!n),
        (UnaryOp::BitwiseNot, Value::Boolean(b)) => Value::Boolean(!b),
        _ => Value::Null,
    }
}

fn apply_binop<'a>(op: BinOp, left: Value<'a>, right: Value<'a>) -> Value<'a> {
    match op {
        BinOp::Equal => Value::Boolean(left.loose_eq(&right)),
        BinOp::NotEqual => Value::Boolean(!left.loose_eq(&right)),
        BinOp::LessThan => Value::Boolean(left.compare(&right) == Some(Ordering::Less)),
        BinOp::LessEqual => Value::Boolean(matches!(
            left.compare(&right),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinOp::GreaterThan => Value::Boolean(left.compare(&right) == Some(Ordering::Greater)),
        BinOp::GreaterEqual => Value::Boolean(matches!(
            left.compare(&right),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        BinOp::And => Value::Boolean(left.as_bool() && right.as_bool()),
        BinOp::Or => Value::Boolean(left.as_bool() || right.as_bool()),
        BinOp::BitwiseAnd | BinOp::BitwiseOr | BinOp::BitwiseXor => apply_bitwise(op, left, right),
        BinOp::ShiftLeft | BinOp::ShiftRight => match (left, right) {
            (Value::Integer(a), Value::Integer(b)) if op == BinOp::ShiftLeft => {
                Value::Integer(a.wrapping_shl(b as u32))
            }
            (Value::Integer(a), Value::Integer(b)) => Value::Integer(a.wrapping_shr(b as u32)),
            _ => Value::Null,
        },
        BinOp::Add => apply_add(left, right),
        BinOp::Subtract => apply_subtract(left, right),
        BinOp::Multiply | BinOp::Divide | BinOp::Modulo => apply_arithmetic(op, left, right),
    }
}

fn apply_bitwise<'a>(op: BinOp, left: Value<'a>, right: Value<'a>) -> Value<'a> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Value::Integer(match op {
            BinOp::BitwiseAnd => a & b,
            BinOp::BitwiseOr => a | b,
            _ => a ^ b,
        }),
        (Value::Boolean(a), Value::Boolean(b)) => Value::Boolean(match op {
            BinOp::BitwiseAnd => a & b,
            BinOp::BitwiseOr => a | b,
            _ => a ^ b,
        }),
        _ => Value::Null,
    }
}

fn apply_add<'a>(left: Value<'a>, right: Value<'a>) -> Value<'a> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Value::Integer(a.wrapping_add(b)),
        (Value::String(a), Value::String(b)) => {
            let mut joined = a.into_owned();
            joined.push_str(&b);
            Value::String(Cow::Owned(joined))
        }
        (Value::TimeSpan(a), Value::TimeSpan(b)) => a.checked_add(&b).map_or(Value::Null, Value::TimeSpan),
        (Value::DateTime(a), Value::TimeSpan(b)) => a
            .checked_add_signed(b)
            .map_or(Value::Null, Value::DateTime),
        (a, b) => match (a.as_float(), b.as_float()) {
            (Some(x), Some(y)) => Value::Float(x + y),
            _ => Value::Null,
        },
    }
}

fn apply_subtract<'a>(left: Value<'a>, right: Value<'a>) -> Value<'a> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Value::Integer(a.wrapping_sub(b)),
        (Value::TimeSpan(a), Value::TimeSpan(b)) => a.checked_sub(&b).map_or(Value::Null, Value::TimeSpan),
        (Value::DateTime(a), Value::DateTime(b)) => Value::TimeSpan(a.signed_duration_since(b)),
        (Value::DateTime(a), Value::TimeSpan(b)) => a
            .checked_sub_signed(b)
            .map_or(Value::Null, Value::DateTime),
        (a, b) => match (a.as_float(), b.as_float()) {
            (Some(x), Some(y)) => Value::Float(x - y),
            _ => Value::Null,
        },
    }
}

fn apply_arithmetic<'a>(op: BinOp, left: Value<'a>, right: Value<'a>) -> Value<'a> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => match op {
            BinOp::Multiply => Value::Integer(a.wrapping_mul(b)),
            _ if b == 0 => Value::Null,
            BinOp::Divide => Value::Integer(a.wrapping_div(b)),
            _ => Value::Integer(a.wrapping_rem(b)),
        },
        (a, b) => match (a.as_float(), b.as_float()) {
            (Some(x), Some(y)) => Value::Float(match op {
                BinOp::Multiply => x * y,
                BinOp::Divide => x / y,
                _ => x % y,
            }),
            _ => Value::Null,
        },
    }
}
