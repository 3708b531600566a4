use std::any::Any;
use std::borrow::Cow;
use std::cmp::Ordering;

use chrono::{NaiveDateTime, TimeDelta};

/// A runtime value produced while evaluating a compiled query.
///
/// Values borrow from the record being evaluated wherever possible: records
/// are references into the host data, strings may be borrowed.
///
/// # Examples
///
/// ```
/// use sift_lang::Value;
///
/// let integer = Value::Integer(42);
/// let text = Value::from("hello");
/// let list = Value::Sequence(vec![Value::Integer(1), Value::Integer(2)]);
/// assert_eq!(text.as_str(), Some("hello"));
/// assert!(integer.compare(&Value::Float(41.5)).is_some());
/// assert_eq!(list.len(), Some(2));
/// ```
#[derive(Debug, Clone)]
pub enum Value<'a> {
    /// Absent value (`None` field, failed conversion, integer division by zero)
    Null,

    Boolean(bool),

    /// Integer number (preserved separately from floats)
    Integer(i64),

    Float(f64),

    String(Cow<'a, str>),

    TimeSpan(TimeDelta),

    DateTime(NaiveDateTime),

    /// Borrowed host record, read through the members of its record type
    Record(&'a dyn Any),

    Sequence(Vec<Value<'a>>),
}

impl<'a> Value<'a> {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as boolean; anything that is not a boolean counts as false
    pub fn as_bool(&self) -> bool {
        matches!(self, Value::Boolean(true))
    }

    /// Get as float, widening integers
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Sequence(items) => Some(items.len()),
            _ => None,
        }
    }

    /// Elements of a sequence; null counts as the empty sequence
    pub fn into_items(self) -> Vec<Value<'a>> {
        match self {
            Value::Sequence(items) => items,
            _ => Vec::new(),
        }
    }

    /// Equality as seen by `==`: numbers compare across integer and float,
    /// null equals only null.
    pub fn loose_eq(&self, other: &Value<'_>) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::TimeSpan(a), Value::TimeSpan(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => same_record(*a, *b),
            (Value::Sequence(a), Value::Sequence(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            (a, b) => match (a.as_float(), b.as_float()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }

    /// Ordering for relational operators; `None` when either side is null or
    /// the values are not comparable.
    pub fn compare(&self, other: &Value<'_>) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::TimeSpan(a), Value::TimeSpan(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            (a, b) => a.as_float()?.partial_cmp(&b.as_float()?),
        }
    }
}

fn same_record(a: &dyn Any, b: &dyn Any) -> bool {
    std::ptr::eq(a as *const dyn Any as *const (), b as *const dyn Any as *const ())
}

impl PartialEq for Value<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(_), Value::Float(_)) | (Value::Float(_), Value::Integer(_)) => false,
            (Value::Float(a), Value::Float(b)) => a == b,
            _ => self.loose_eq(other),
        }
    }
}

impl From<bool> for Value<'_> {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value<'_> {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value<'_> {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(s: &'a str) -> Self {
        Value::String(Cow::Borrowed(s))
    }
}

impl From<String> for Value<'_> {
    fn from(s: String) -> Self {
        Value::String(Cow::Owned(s))
    }
}
