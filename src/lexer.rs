use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

use crate::ast::{BINARY_OPERATORS, LiteralValue, Token, TokenKind, UNARY_OPERATORS};
use crate::error::{CompileError, ErrorKind, excerpt};

const NESTED_QUERY_OPERATORS: [&str; 3] = ["any", "all", "count"];

/// Scanner over an immutable query string.
///
/// The only state is a byte cursor, so [`Lexer::peek`] is a copy of the
/// cursor and never touches the source buffer.
#[derive(Debug, Clone, Copy)]
pub struct Lexer<'a> {
    source: &'a str,
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer {
            source,
            position: 0,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.source[self.position..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            self.position += ch.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn cut(&self, start: usize) -> &'a str {
        &self.source[start..self.position]
    }

    pub fn error(&self, kind: ErrorKind, start: usize, end: usize, message: impl Into<String>) -> CompileError {
        CompileError::new(kind, self.source, start..end, message)
    }

    /// Error pointing at `token`.
    pub fn token_error(&self, kind: ErrorKind, token: &Token, message: impl Into<String>) -> CompileError {
        self.error(kind, token.start, token.end(), message)
    }

    /// Next token without consuming it.
    pub fn peek(&self) -> Result<Token, CompileError> {
        let mut lookahead = *self;
        lookahead.pop()
    }

    /// Consume the next token if it has the given kind.
    pub fn try_pop(&mut self, kind: TokenKind) -> Result<Option<Token>, CompileError> {
        if self.peek()?.kind != kind {
            return Ok(None);
        }
        self.pop().map(Some)
    }

    /// Consume the next token, failing unless it has the given kind.
    pub fn require(&mut self, kind: TokenKind) -> Result<Token, CompileError> {
        let token = self.pop()?;
        if token.kind != kind {
            return Err(self.token_error(
                ErrorKind::UnexpectedToken,
                &token,
                format!("Expected {} but found {}", kind, describe(&token)),
            ));
        }
        Ok(token)
    }

    /// Scan the whole input, including the trailing end-of-file token.
    pub fn tokenize(source: &'a str) -> Result<Vec<Token>, CompileError> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.pop()?;
            let done = token.kind == TokenKind::EndOfFile;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    pub fn pop(&mut self) -> Result<Token, CompileError> {
        self.skip_whitespace();
        let start = self.position;
        let token = self.scan(start)?;
        log::trace!("token {:?} {:?} at {}", token.kind, token.lexeme, token.start);
        Ok(token)
    }

    fn scan(&mut self, start: usize) -> Result<Token, CompileError> {
        let Some(ch) = self.current_char() else {
            return Ok(Token::new(start, TokenKind::EndOfFile, ""));
        };

        if ch.is_alphabetic() || ch == '_' || ch == '@' {
            return Ok(self.read_word(start));
        }

        if ch == '$' {
            while self.current_char() == Some('$') {
                self.advance();
            }
            return Ok(Token::new(start, TokenKind::IteratorVariable, self.cut(start)));
        }

        if ch.is_ascii_digit() {
            return self.read_number(start);
        }

        if ch == '.' {
            self.advance();
            if !self.current_char().is_some_and(|c| c.is_ascii_digit()) {
                return Ok(Token::new(start, TokenKind::Dot, "."));
            }
            self.position = digit_run(self.source.as_bytes(), self.position);
            return self.float_token(start);
        }

        if ch == '"' {
            return self.read_string(start);
        }

        let rest = &self.source[self.position..];
        if let Some(info) = BINARY_OPERATORS.iter().find(|info| rest.starts_with(info.lexeme)) {
            self.position += info.lexeme.len();
            return Ok(Token::new(start, info.token_kind, info.lexeme));
        }

        if let Some(info) = UNARY_OPERATORS.iter().find(|info| info.lexeme == ch) {
            self.advance();
            return Ok(Token::new(start, info.token_kind, self.cut(start)));
        }

        let kind = match ch {
            '(' => TokenKind::ParenthesisOpen,
            ')' => TokenKind::ParenthesisClose,
            '{' => TokenKind::BlockOpen,
            '}' => TokenKind::BlockClose,
            ',' => TokenKind::Comma,
            _ => {
                return Err(self.error(
                    ErrorKind::UnexpectedCharacter,
                    start,
                    start + ch.len_utf8(),
                    format!("Unexpected character '{}'", ch),
                ));
            }
        };
        self.advance();
        Ok(Token::new(start, kind, self.cut(start)))
    }

    fn read_word(&mut self, start: usize) -> Token {
        self.advance();
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let word = self.cut(start);
        match word {
            "true" => Token::literal(start, word, LiteralValue::Boolean(true)),
            "false" => Token::literal(start, word, LiteralValue::Boolean(false)),
            _ if word.eq_ignore_ascii_case("@now") => Token::new(start, TokenKind::Now, word),
            _ if NESTED_QUERY_OPERATORS.iter().any(|op| op.eq_ignore_ascii_case(word)) => {
                Token::new(start, TokenKind::NestedQueryOperator, word)
            }
            _ => Token::new(start, TokenKind::Identifier, word),
        }
    }

    fn read_string(&mut self, start: usize) -> Result<Token, CompileError> {
        self.advance(); // opening quote
        while let Some(ch) = self.current_char() {
            if ch == '"' {
                self.advance();
                let lexeme = self.cut(start);
                let content = &lexeme[1..lexeme.len() - 1];
                return Ok(Token::literal(start, lexeme, LiteralValue::String(content.to_string())));
            }
            self.advance();
        }

        Err(self.error(
            ErrorKind::UnterminatedString,
            start,
            self.position,
            "Unterminated string literal",
        ))
    }

    /// Digits are tried as a time span, then a date time, then a plain number.
    fn read_number(&mut self, start: usize) -> Result<Token, CompileError> {
        let source = self.source;
        let bytes = source.as_bytes();

        let time_span = scan_time_span(bytes, start, true)
            .map_err(|message| self.literal_error(start, message))?;
        if let Some((span, end)) = time_span {
            self.position = end;
            return Ok(Token::literal(start, self.cut(start), LiteralValue::TimeSpan(span)));
        }

        let date_time = scan_date_time(bytes, start)
            .map_err(|message| self.literal_error(start, message))?;
        if let Some((date_time, end)) = date_time {
            self.position = end;
            return Ok(Token::literal(start, self.cut(start), LiteralValue::DateTime(date_time)));
        }

        self.position = digit_run(bytes, start);
        if bytes.get(self.position) == Some(&b'.')
            && bytes.get(self.position + 1).is_some_and(u8::is_ascii_digit)
        {
            self.position = digit_run(bytes, self.position + 1);
            return self.float_token(start);
        }

        let text = self.cut(start);
        let value = text.parse::<i32>().map_err(|_| {
            self.error(
                ErrorKind::InvalidLiteral,
                start,
                self.position,
                format!("Integer literal '{}' is out of range", excerpt(text)),
            )
        })?;
        Ok(Token::literal(start, text, LiteralValue::Integer(value)))
    }

    fn float_token(&self, start: usize) -> Result<Token, CompileError> {
        let text = self.cut(start);
        let value = text.parse::<f64>().map_err(|_| {
            self.error(
                ErrorKind::InvalidLiteral,
                start,
                self.position,
                format!("Invalid floating point literal '{}'", excerpt(text)),
            )
        })?;
        Ok(Token::literal(start, text, LiteralValue::Float(value)))
    }

    fn literal_error(&self, start: usize, message: &str) -> CompileError {
        let end = digit_run(self.source.as_bytes(), start);
        self.error(ErrorKind::InvalidLiteral, start, end, message)
    }
}

/// Human-readable description of a token for error messages.
pub(crate) fn describe(token: &Token) -> String {
    match token.kind {
        TokenKind::EndOfFile => "end of input".to_string(),
        _ => format!("'{}'", excerpt(&token.lexeme)),
    }
}

fn digit_run(bytes: &[u8], start: usize) -> usize {
    let mut end = start;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    end
}

fn digits_value(bytes: &[u8], range: std::ops::Range<usize>) -> Result<i64, &'static str> {
    bytes[range].iter().try_fold(0i64, |acc, digit| {
        acc.checked_mul(10)
            .and_then(|acc| acc.checked_add(i64::from(digit - b'0')))
            .ok_or("Numeric component is out of range")
    })
}

/// Scan `[days.]hh:mm[:ss[.fffffffff]]` at `start`.
///
/// `Ok(None)` means the text is not shaped like a time span at all; `Err` means
/// it is, but a component is out of range. The day prefix is only recognised
/// when it is followed by all of hours, minutes and seconds.
pub(crate) fn scan_time_span(
    bytes: &[u8],
    start: usize,
    allow_days: bool,
) -> Result<Option<(TimeDelta, usize)>, &'static str> {
    let first_end = digit_run(bytes, start);
    if first_end == start {
        return Ok(None);
    }

    let mut days = None;
    let mut hours_start = start;
    if allow_days && bytes.get(first_end) == Some(&b'.') {
        let after_dot = digit_run(bytes, first_end + 1);
        if after_dot > first_end + 1 && bytes.get(after_dot) == Some(&b':') {
            days = Some(start..first_end);
            hours_start = first_end + 1;
        }
    }

    let hours_end = digit_run(bytes, hours_start);
    if bytes.get(hours_end) != Some(&b':') {
        return Ok(None);
    }
    let minutes_end = digit_run(bytes, hours_end + 1);
    if minutes_end == hours_end + 1 {
        return Ok(None);
    }

    let mut end = minutes_end;
    let mut seconds = None;
    if bytes.get(end) == Some(&b':') {
        let seconds_end = digit_run(bytes, end + 1);
        if seconds_end > end + 1 {
            seconds = Some(end + 1..seconds_end);
            end = seconds_end;
        }
    }
    if days.is_some() && seconds.is_none() {
        return Ok(None);
    }

    let mut nanos = 0;
    if seconds.is_some() && bytes.get(end) == Some(&b'.') {
        let fraction_end = digit_run(bytes, end + 1);
        let width = fraction_end - (end + 1);
        if width > 9 {
            return Err("Time span fraction has more than nine digits");
        }
        if width > 0 {
            nanos = digits_value(bytes, end + 1..fraction_end)? * 10i64.pow((9 - width) as u32);
            end = fraction_end;
        }
    }

    let days = match days {
        Some(range) => digits_value(bytes, range)?,
        None => 0,
    };
    let hours = digits_value(bytes, hours_start..hours_end)?;
    let minutes = digits_value(bytes, hours_end + 1..minutes_end)?;
    let seconds = match seconds {
        Some(range) => digits_value(bytes, range)?,
        None => 0,
    };
    if hours >= 24 || minutes >= 60 || seconds >= 60 {
        return Err("Time span component is out of range");
    }

    let total = days
        .checked_mul(86_400)
        .and_then(|secs| secs.checked_add(hours * 3_600 + minutes * 60 + seconds))
        .and_then(TimeDelta::try_seconds)
        .and_then(|span| span.checked_add(&TimeDelta::nanoseconds(nanos)))
        .ok_or("Time span is out of range")?;

    Ok(Some((total, end)))
}

/// Scan `yyyy-MM-dd[ hh:mm[:ss[.fff]]]` at `start`.
pub(crate) fn scan_date_time(
    bytes: &[u8],
    start: usize,
) -> Result<Option<(NaiveDateTime, usize)>, &'static str> {
    let year_end = digit_run(bytes, start);
    if year_end - start != 4 || bytes.get(year_end) != Some(&b'-') {
        return Ok(None);
    }
    let month_end = digit_run(bytes, year_end + 1);
    if month_end - (year_end + 1) != 2 || bytes.get(month_end) != Some(&b'-') {
        return Ok(None);
    }
    let day_end = digit_run(bytes, month_end + 1);
    if day_end - (month_end + 1) != 2 {
        return Ok(None);
    }

    let year = digits_value(bytes, start..year_end)?;
    let month = digits_value(bytes, year_end + 1..month_end)?;
    let day = digits_value(bytes, month_end + 1..day_end)?;
    let midnight = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or("Invalid calendar date")?;

    if bytes.get(day_end) == Some(&b' ') {
        if let Some((time, end)) = scan_time_span(bytes, day_end + 1, false)? {
            let date_time = midnight
                .checked_add_signed(time)
                .ok_or("Date time is out of range")?;
            return Ok(Some((date_time, end)));
        }
    }

    Ok(Some((midnight, day_end)))
}

#[test]
fn test_keywords() {
    let tokens = Lexer::tokenize("true false ANY all count @now").unwrap();
    let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Literal,
            TokenKind::Literal,
            TokenKind::NestedQueryOperator,
            TokenKind::NestedQueryOperator,
            TokenKind::NestedQueryOperator,
            TokenKind::Now,
            TokenKind::EndOfFile,
        ]
    );
    assert_eq!(tokens[0].literal, Some(LiteralValue::Boolean(true)));
}

#[test]
fn test_peek_does_not_consume() {
    let mut lexer = Lexer::new("a == 1");
    assert_eq!(lexer.peek().unwrap().kind, TokenKind::Identifier);
    assert_eq!(lexer.peek().unwrap().kind, TokenKind::Identifier);
    assert_eq!(lexer.pop().unwrap().lexeme, "a");
    assert!(lexer.try_pop(TokenKind::NotEqual).unwrap().is_none());
    assert!(lexer.try_pop(TokenKind::Equal).unwrap().is_some());
    assert!(lexer.require(TokenKind::ParenthesisOpen).is_err());
}
