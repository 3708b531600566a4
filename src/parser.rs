use chrono::{Local, NaiveDateTime};
use regex::Regex;

use crate::{
    ast::{
        BinOp, BinaryOperator, BinaryOperatorInfo, Expr, ExprKind, LOWEST_PRECEDENCE, LiteralValue,
        NestedQueryKind, OperatorSemantics, Token, TokenKind, UnaryOp, binary_operator,
        unary_operator,
    },
    error::{CompileError, ErrorKind, excerpt},
    functions,
    lexer::{Lexer, describe},
    schema::{Member, ValueType},
    value::Value,
};

/// One level of query nesting: the top-level query is depth 0, every
/// `any`/`all`/`count` block opens the next one.
#[derive(Debug, Clone)]
struct ParserContext {
    depth: usize,
    input_type: ValueType,
}

/// Precedence-climbing parser producing a typed [`Expr`].
///
/// Contexts strictly nest with the recursive descent, so they live on a
/// stack indexed by depth; `$$` walks down that stack.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    contexts: Vec<ParserContext>,
    now: NaiveDateTime,
}

impl<'a> Parser<'a> {
    /// Parser for a query whose input has the given type.
    pub fn new(lexer: Lexer<'a>, input_type: ValueType) -> Self {
        Parser {
            lexer,
            contexts: vec![ParserContext {
                depth: 0,
                input_type,
            }],
            now: Local::now().naive_local(),
        }
    }

    fn context(&self) -> &ParserContext {
        &self.contexts[self.contexts.len() - 1]
    }

    fn error(&self, kind: ErrorKind, token: &Token, message: impl Into<String>) -> CompileError {
        self.lexer.token_error(kind, token, message)
    }

    /// Parse a complete query: one boolean expression followed by the end of
    /// the input.
    pub fn parse(&mut self) -> Result<Expr, CompileError> {
        let expr = self.parse_expression(LOWEST_PRECEDENCE)?;
        let end = self.lexer.require(TokenKind::EndOfFile)?;

        if !expr.is_boolean() {
            return Err(self.lexer.error(
                ErrorKind::NotBoolean,
                0,
                end.start,
                format!("Query must evaluate to a boolean, got {}", expr.value_type),
            ));
        }
        Ok(expr)
    }

    /// Parse an expression whose binary operators all bind tighter than
    /// `min_precedence`.
    pub fn parse_expression(&mut self, min_precedence: i32) -> Result<Expr, CompileError> {
        let primary = self.parse_primary()?;
        let mut left = self.parse_member_suffixes(primary)?;

        loop {
            if let Some(keyword) = self.lexer.try_pop(TokenKind::NestedQueryOperator)? {
                left = self.parse_nested_query(left, &keyword)?;
                continue;
            }

            let token = self.lexer.peek()?;
            let Some(info) = binary_operator(token.kind) else {
                return Ok(left);
            };
            if info.precedence <= min_precedence {
                return Ok(left);
            }

            self.lexer.pop()?;
            let right = self.parse_expression(info.precedence)?;
            left = self.build_binary(info, &token, left, right)?;
        }
    }

    /// Parse primary expressions (atoms): members, iterator variables,
    /// literals, function calls, parentheses and unary operators
    fn parse_primary(&mut self) -> Result<Expr, CompileError> {
        let token = self.lexer.pop()?;

        match token.kind {
            TokenKind::Identifier => {
                if self.lexer.peek()?.kind == TokenKind::ParenthesisOpen {
                    return self.parse_function_call(&token);
                }

                let context = self.context();
                let base = Expr::new(ExprKind::IteratorRef(context.depth), context.input_type.clone());
                self.member_access(base, &token)
            }

            TokenKind::Now => Ok(Expr::literal(LiteralValue::DateTime(self.now))),

            TokenKind::IteratorVariable => {
                let levels = token.lexeme.len() - 1;
                let depth = self.context().depth;
                if levels > depth {
                    return Err(self.error(
                        ErrorKind::IteratorDepth,
                        &token,
                        format!(
                            "'{}' climbs {} level(s) up, but the query is only nested to depth {}",
                            token.lexeme, levels, depth
                        ),
                    ));
                }

                let target = &self.contexts[depth - levels];
                Ok(Expr::new(
                    ExprKind::IteratorRef(target.depth),
                    target.input_type.clone(),
                ))
            }

            TokenKind::Literal => match token.literal.clone() {
                Some(value) => Ok(Expr::literal(value)),
                None => Err(self.error(ErrorKind::UnexpectedToken, &token, "Literal without a value")),
            },

            TokenKind::ParenthesisOpen => {
                let expr = self.parse_expression(LOWEST_PRECEDENCE)?;
                self.lexer.require(TokenKind::ParenthesisClose)?;
                Ok(expr)
            }

            kind => match unary_operator(kind) {
                // The operand extends over all following binary operators.
                Some(info) => {
                    let operand = self.parse_expression(LOWEST_PRECEDENCE)?;
                    self.build_unary(info.op, &token, operand)
                }
                None => Err(self.error(
                    ErrorKind::UnexpectedToken,
                    &token,
                    format!("Expected an expression but found {}", describe(&token)),
                )),
            },
        }
    }

    fn parse_member_suffixes(&mut self, mut expr: Expr) -> Result<Expr, CompileError> {
        while self.lexer.try_pop(TokenKind::Dot)?.is_some() {
            let name = self.lexer.require(TokenKind::Identifier)?;
            expr = self.member_access(expr, &name)?;
        }
        Ok(expr)
    }

    fn member_access(&self, base: Expr, name: &Token) -> Result<Expr, CompileError> {
        let member = self.resolve_member(&base.value_type, name)?;
        let value_type = member.value_type().clone();
        Ok(Expr::new(
            ExprKind::MemberAccess {
                base: Box::new(base),
                member,
            },
            value_type,
        ))
    }

    /// Exact case-insensitive match first, then a unique case-insensitive
    /// prefix.
    fn resolve_member(&self, owner: &ValueType, name: &Token) -> Result<Member, CompileError> {
        let members = owner.members();
        let wanted = name.lexeme.to_lowercase();

        if let Some(member) = members.iter().find(|m| m.name().to_lowercase() == wanted) {
            return Ok(member.clone());
        }

        let candidates: Vec<&Member> = members
            .iter()
            .filter(|m| m.name().to_lowercase().starts_with(&wanted))
            .collect();

        match candidates.as_slice() {
            [] => Err(self.error(
                ErrorKind::MemberNotFound,
                name,
                format!("Member '{}' not found on {}", excerpt(&name.lexeme), owner),
            )),
            [member] => {
                log::debug!("resolved shortcut '{}' to member '{}'", name.lexeme, member.name());
                Ok((*member).clone())
            }
            _ => {
                let names: Vec<&str> = candidates.iter().map(|m| m.name()).collect();
                Err(self.error(
                    ErrorKind::AmbiguousMember,
                    name,
                    format!("'{}' is ambiguous: {}", excerpt(&name.lexeme), names.join(", ")),
                ))
            }
        }
    }

    fn parse_function_call(&mut self, name: &Token) -> Result<Expr, CompileError> {
        self.lexer.require(TokenKind::ParenthesisOpen)?;

        let mut args = Vec::new();
        if self.lexer.try_pop(TokenKind::ParenthesisClose)?.is_none() {
            loop {
                args.push(self.parse_expression(LOWEST_PRECEDENCE)?);
                if self.lexer.try_pop(TokenKind::Comma)?.is_none() {
                    break;
                }
            }
            self.lexer.require(TokenKind::ParenthesisClose)?;
        }

        let Some(info) = functions::resolve(&name.lexeme, args.len()) else {
            return Err(self.error(
                ErrorKind::UnknownFunction,
                name,
                format!("Unknown function '{}' taking {} argument(s)", excerpt(&name.lexeme), args.len()),
            ));
        };
        let function = info.function;

        for arg in &args {
            if arg.value_type != function.parameter_type() {
                return Err(self.error(
                    ErrorKind::TypeMismatch,
                    name,
                    format!(
                        "Function '{}' expects {} arguments, got {}",
                        function.name(),
                        function.parameter_type(),
                        arg.value_type
                    ),
                ));
            }
        }

        // Calls on literals only are evaluated once, here.
        if args.iter().all(|arg| matches!(arg.kind, ExprKind::Literal(_))) {
            let values: Vec<Value<'_>> = args
                .iter()
                .filter_map(|arg| match &arg.kind {
                    ExprKind::Literal(value) => Some(value.to_value()),
                    _ => None,
                })
                .collect();
            let folded = match function.apply(&values) {
                Ok(Value::DateTime(date_time)) => LiteralValue::DateTime(date_time),
                Ok(Value::TimeSpan(span)) => LiteralValue::TimeSpan(span),
                Ok(_) => {
                    return Err(self.error(ErrorKind::TypeMismatch, name, "Unexpected function result"));
                }
                Err(message) => return Err(self.error(ErrorKind::InvalidLiteral, name, message)),
            };
            return Ok(Expr::literal(folded));
        }

        Ok(Expr::new(
            ExprKind::FunctionCall { function, args },
            function.result_type(),
        ))
    }

    fn parse_nested_query(&mut self, source: Expr, keyword: &Token) -> Result<Expr, CompileError> {
        let kind = NestedQueryKind::from_keyword(&keyword.lexeme).unwrap_or(NestedQueryKind::Any);

        let Some(element_type) = source.value_type.element_type().cloned() else {
            return Err(self.error(
                ErrorKind::NotASequence,
                keyword,
                format!(
                    "'{}' requires a sequence, but the operand is {}",
                    keyword.lexeme, source.value_type
                ),
            ));
        };

        self.lexer.require(TokenKind::BlockOpen)?;

        let depth = self.context().depth + 1;
        self.contexts.push(ParserContext {
            depth,
            input_type: element_type,
        });
        let predicate = self.parse_expression(LOWEST_PRECEDENCE);
        self.contexts.pop();
        let predicate = predicate?;

        if !predicate.is_boolean() {
            return Err(self.error(
                ErrorKind::NotBoolean,
                keyword,
                format!("Nested query must evaluate to a boolean, got {}", predicate.value_type),
            ));
        }

        self.lexer.require(TokenKind::BlockClose)?;

        let value_type = match kind {
            NestedQueryKind::Count => ValueType::Integer,
            NestedQueryKind::Any | NestedQueryKind::All => ValueType::Boolean,
        };
        Ok(Expr::new(
            ExprKind::NestedQuery {
                kind,
                depth,
                source: Box::new(source),
                predicate: Box::new(predicate),
            },
            value_type,
        ))
    }

    fn build_binary(
        &self,
        info: &BinaryOperatorInfo,
        token: &Token,
        left: Expr,
        right: Expr,
    ) -> Result<Expr, CompileError> {
        let mismatch = || {
            self.error(
                ErrorKind::TypeMismatch,
                token,
                format!(
                    "Operator '{}' cannot be applied to {} and {}",
                    info.lexeme, left.value_type, right.value_type
                ),
            )
        };

        let (op, value_type) = match info.semantics {
            OperatorSemantics::Native(op) => {
                let value_type = native_result_type(op, &left.value_type, &right.value_type)
                    .ok_or_else(mismatch)?;
                (BinaryOperator::Native(op), value_type)
            }
            OperatorSemantics::Pattern(op) => {
                if left.value_type != ValueType::String || right.value_type != ValueType::String {
                    return Err(mismatch());
                }
                let regex = match &right.kind {
                    ExprKind::Literal(LiteralValue::String(pattern)) if op.is_regex() => {
                        let regex = Regex::new(pattern).map_err(|err| {
                            self.error(
                                ErrorKind::InvalidPattern,
                                token,
                                format!("Invalid regular expression: {}", err),
                            )
                        })?;
                        Some(regex)
                    }
                    _ => None,
                };
                (BinaryOperator::Pattern { op, regex }, ValueType::Boolean)
            }
        };

        Ok(Expr::new(
            ExprKind::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            value_type,
        ))
    }

    fn build_unary(&self, op: UnaryOp, token: &Token, operand: Expr) -> Result<Expr, CompileError> {
        let value_type = match (op, &operand.value_type) {
            (UnaryOp::Negate, ValueType::Integer | ValueType::Float | ValueType::TimeSpan) => {
                operand.value_type.clone()
            }
            (UnaryOp::Not, ValueType::Boolean) => ValueType::Boolean,
            (UnaryOp::BitwiseNot, ValueType::Integer | ValueType::Boolean) => operand.value_type.clone(),
            (_, other) => {
                return Err(self.error(
                    ErrorKind::TypeMismatch,
                    token,
                    format!("Operator '{}' cannot be applied to {}", token.lexeme, other),
                ));
            }
        };

        Ok(Expr::new(
            ExprKind::UnaryOp {
                op,
                operand: Box::new(operand),
            },
            value_type,
        ))
    }
}

/// Static result type of a native binary operator, `None` when the operand
/// types are not supported.
fn native_result_type(op: BinOp, left: &ValueType, right: &ValueType) -> Option<ValueType> {
    use ValueType::*;

    let numeric = || match (left, right) {
        (Integer, Integer) => Some(Integer),
        (l, r) if l.is_numeric() && r.is_numeric() => Some(Float),
        _ => None,
    };

    match op {
        BinOp::And | BinOp::Or => match (left, right) {
            (Boolean, Boolean) => Some(Boolean),
            _ => None,
        },
        BinOp::BitwiseOr | BinOp::BitwiseXor | BinOp::BitwiseAnd => match (left, right) {
            (Integer, Integer) => Some(Integer),
            (Boolean, Boolean) => Some(Boolean),
            _ => None,
        },
        BinOp::Equal | BinOp::NotEqual => match (left, right) {
            (Boolean, Boolean) | (String, String) | (TimeSpan, TimeSpan) | (DateTime, DateTime) => {
                Some(Boolean)
            }
            _ => numeric().map(|_| Boolean),
        },
        BinOp::LessThan | BinOp::LessEqual | BinOp::GreaterThan | BinOp::GreaterEqual => {
            match (left, right) {
                (String, String) | (TimeSpan, TimeSpan) | (DateTime, DateTime) => Some(Boolean),
                _ => numeric().map(|_| Boolean),
            }
        }
        BinOp::ShiftLeft | BinOp::ShiftRight => match (left, right) {
            (Integer, Integer) => Some(Integer),
            _ => None,
        },
        BinOp::Add => match (left, right) {
            (String, String) => Some(String),
            (TimeSpan, TimeSpan) => Some(TimeSpan),
            (DateTime, TimeSpan) => Some(DateTime),
            _ => numeric(),
        },
        BinOp::Subtract => match (left, right) {
            (TimeSpan, TimeSpan) | (DateTime, DateTime) => Some(TimeSpan),
            (DateTime, TimeSpan) => Some(DateTime),
            _ => numeric(),
        },
        BinOp::Multiply | BinOp::Divide | BinOp::Modulo => numeric(),
    }
}
