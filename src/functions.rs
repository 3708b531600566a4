//! Free functions callable from queries, e.g. `DateTime("2023-04-01")`.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

use crate::lexer::{scan_date_time, scan_time_span};
use crate::schema::ValueType;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    /// `DateTime(text)`
    ParseDateTime,
    /// `DateTime(text, format)` with a chrono format string
    ParseDateTimeWithFormat,
    /// `TimeSpan(text)`
    ParseTimeSpan,
}

#[derive(Debug, Clone, Copy)]
pub struct FunctionInfo {
    pub name: &'static str,
    pub arity: usize,
    pub function: Function,
}

pub static FUNCTIONS: [FunctionInfo; 3] = [
    FunctionInfo {
        name: "DateTime",
        arity: 1,
        function: Function::ParseDateTime,
    },
    FunctionInfo {
        name: "DateTime",
        arity: 2,
        function: Function::ParseDateTimeWithFormat,
    },
    FunctionInfo {
        name: "TimeSpan",
        arity: 1,
        function: Function::ParseTimeSpan,
    },
];

/// Look a function up by case-insensitive name and arity.
pub fn resolve(name: &str, arity: usize) -> Option<&'static FunctionInfo> {
    FUNCTIONS
        .iter()
        .find(|info| info.arity == arity && info.name.eq_ignore_ascii_case(name))
}

impl Function {
    pub fn name(&self) -> &'static str {
        match self {
            Function::ParseDateTime | Function::ParseDateTimeWithFormat => "DateTime",
            Function::ParseTimeSpan => "TimeSpan",
        }
    }

    /// Every parameter is a string.
    pub fn parameter_type(&self) -> ValueType {
        ValueType::String
    }

    pub fn result_type(&self) -> ValueType {
        match self {
            Function::ParseDateTime | Function::ParseDateTimeWithFormat => ValueType::DateTime,
            Function::ParseTimeSpan => ValueType::TimeSpan,
        }
    }

    /// Apply the function, reporting why the arguments could not be parsed.
    pub fn apply<'a>(&self, args: &[Value<'a>]) -> Result<Value<'a>, String> {
        let text = |index: usize| args.get(index).and_then(Value::as_str).unwrap_or("");
        match self {
            Function::ParseDateTime => parse_date_time(text(0)).map(Value::DateTime),
            Function::ParseDateTimeWithFormat => {
                parse_date_time_with_format(text(0), text(1)).map(Value::DateTime)
            }
            Function::ParseTimeSpan => parse_time_span(text(0)).map(Value::TimeSpan),
        }
    }
}

pub fn parse_date_time(text: &str) -> Result<NaiveDateTime, String> {
    let trimmed = text.trim();
    if let Ok(Some((date_time, end))) = scan_date_time(trimmed.as_bytes(), 0) {
        if end == trimmed.len() {
            return Ok(date_time);
        }
    }

    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M"))
        .map_err(|err| format!("'{}' is not a valid date time: {}", text, err))
}

pub fn parse_date_time_with_format(text: &str, format: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(text, format)
        .or_else(|err| {
            NaiveDate::parse_from_str(text, format)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .ok_or(err)
        })
        .map_err(|err| format!("'{}' does not match format '{}': {}", text, format, err))
}

/// Parse `[-][days.]hh:mm[:ss[.fff]]`, or a bare number of days.
pub fn parse_time_span(text: &str) -> Result<TimeDelta, String> {
    let trimmed = text.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let invalid = || format!("'{}' is not a valid time span", text);

    let span = if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        digits
            .parse::<i64>()
            .ok()
            .and_then(TimeDelta::try_days)
            .ok_or_else(invalid)?
    } else {
        match scan_time_span(digits.as_bytes(), 0, true) {
            Ok(Some((span, end))) if end == digits.len() => span,
            _ => return Err(invalid()),
        }
    };

    Ok(if negative { -span } else { span })
}

#[test]
fn test_resolve_is_case_insensitive() {
    assert_eq!(resolve("datetime", 1).map(|f| f.function), Some(Function::ParseDateTime));
    assert_eq!(resolve("DATETIME", 2).map(|f| f.function), Some(Function::ParseDateTimeWithFormat));
    assert!(resolve("timespan", 2).is_none());
}

#[test]
fn test_parse_time_span() {
    assert_eq!(parse_time_span("1.02:03:04"), Ok(TimeDelta::seconds(93_784)));
    assert_eq!(parse_time_span("-00:30"), Ok(TimeDelta::minutes(-30)));
    assert_eq!(parse_time_span("3"), Ok(TimeDelta::days(3)));
    assert!(parse_time_span("soon").is_err());
}
