//! Statically registered field-accessor tables.
//!
//! A query is compiled against the [`ValueType`] of its input. Record types
//! list their [`Member`]s explicitly, each with a static type and a reader
//! closure, so name resolution works without runtime introspection.
//!
//! ```
//! use sift_lang::Schema;
//!
//! struct Banana { ripeness: f64 }
//! struct Crate { label: String, bananas: Vec<Banana> }
//!
//! let banana = Schema::<Banana>::builder("Banana")
//!     .field("Ripeness", |b| b.ripeness)
//!     .build();
//! let schema = Schema::<Crate>::builder("Crate")
//!     .text("Label", |c| c.label.as_str())
//!     .records("Bananas", &banana, |c| c.bananas.as_slice())
//!     .build();
//!
//! assert_eq!(schema.value_type().members().len(), 2);
//! ```

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{NaiveDateTime, TimeDelta};

use crate::value::Value;

/// Type-erased member reader: host record in, value out.
pub type Reader = Arc<dyn for<'a> Fn(&'a dyn Any) -> Value<'a> + Send + Sync>;

type Lift<T> = Arc<dyn for<'a> Fn(&'a T) -> Value<'a> + Send + Sync>;

/// Box a closure as a [`Reader`], for members registered with
/// [`SchemaBuilder::member`].
pub fn reader<F>(read: F) -> Reader
where
    F: for<'a> Fn(&'a dyn Any) -> Value<'a> + Send + Sync + 'static,
{
    Arc::new(read)
}

fn lift<T, F>(lift: F) -> Lift<T>
where
    F: for<'a> Fn(&'a T) -> Value<'a> + Send + Sync + 'static,
{
    Arc::new(lift)
}

/// Static type of an expression or member.
#[derive(Debug, Clone)]
pub enum ValueType {
    Boolean,
    Integer,
    Float,
    String,
    TimeSpan,
    DateTime,
    Record(Arc<RecordType>),
    Sequence(Box<ValueType>),
}

impl ValueType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueType::Integer | ValueType::Float)
    }

    /// Members resolvable on a value of this type; empty for non-records
    pub fn members(&self) -> &[Member] {
        match self {
            ValueType::Record(record) => &record.members,
            _ => &[],
        }
    }

    pub fn element_type(&self) -> Option<&ValueType> {
        match self {
            ValueType::Sequence(element) => Some(element),
            _ => None,
        }
    }
}

impl PartialEq for ValueType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ValueType::Boolean, ValueType::Boolean)
            | (ValueType::Integer, ValueType::Integer)
            | (ValueType::Float, ValueType::Float)
            | (ValueType::String, ValueType::String)
            | (ValueType::TimeSpan, ValueType::TimeSpan)
            | (ValueType::DateTime, ValueType::DateTime) => true,
            (ValueType::Record(a), ValueType::Record(b)) => Arc::ptr_eq(a, b) || a.name == b.name,
            (ValueType::Sequence(a), ValueType::Sequence(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Boolean => write!(f, "boolean"),
            ValueType::Integer => write!(f, "integer"),
            ValueType::Float => write!(f, "float"),
            ValueType::String => write!(f, "string"),
            ValueType::TimeSpan => write!(f, "time span"),
            ValueType::DateTime => write!(f, "date time"),
            ValueType::Record(record) => write!(f, "{}", record.name),
            ValueType::Sequence(element) => write!(f, "sequence of {}", element),
        }
    }
}

/// A named record type with a fixed member list.
#[derive(Debug)]
pub struct RecordType {
    pub name: String,
    pub members: Vec<Member>,
}

/// A resolvable field of a record type.
#[derive(Clone)]
pub struct Member {
    name: String,
    value_type: ValueType,
    read: Reader,
}

impl Member {
    pub fn new(name: impl Into<String>, value_type: ValueType, read: Reader) -> Self {
        Member {
            name: name.into(),
            value_type,
            read,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    /// Read this member from a record value; null for anything else
    pub fn read<'a>(&self, base: &Value<'a>) -> Value<'a> {
        match base {
            Value::Record(record) => (self.read)(*record),
            _ => Value::Null,
        }
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .finish_non_exhaustive()
    }
}

/// Host types that can be exposed directly as member values.
pub trait Field {
    fn value_type() -> ValueType;
    fn into_value<'a>(self) -> Value<'a>;
}

macro_rules! integer_fields {
    ($($ty:ty),*) => {
        $(
            impl Field for $ty {
                fn value_type() -> ValueType {
                    ValueType::Integer
                }

                fn into_value<'a>(self) -> Value<'a> {
                    Value::Integer(i64::from(self))
                }
            }
        )*
    };
}

integer_fields!(i8, i16, i32, i64, u8, u16, u32);

impl Field for bool {
    fn value_type() -> ValueType {
        ValueType::Boolean
    }

    fn into_value<'a>(self) -> Value<'a> {
        Value::Boolean(self)
    }
}

impl Field for f32 {
    fn value_type() -> ValueType {
        ValueType::Float
    }

    fn into_value<'a>(self) -> Value<'a> {
        Value::Float(f64::from(self))
    }
}

impl Field for f64 {
    fn value_type() -> ValueType {
        ValueType::Float
    }

    fn into_value<'a>(self) -> Value<'a> {
        Value::Float(self)
    }
}

impl Field for String {
    fn value_type() -> ValueType {
        ValueType::String
    }

    fn into_value<'a>(self) -> Value<'a> {
        Value::String(Cow::Owned(self))
    }
}

impl Field for &'static str {
    fn value_type() -> ValueType {
        ValueType::String
    }

    fn into_value<'a>(self) -> Value<'a> {
        Value::String(Cow::Borrowed(self))
    }
}

impl Field for TimeDelta {
    fn value_type() -> ValueType {
        ValueType::TimeSpan
    }

    fn into_value<'a>(self) -> Value<'a> {
        Value::TimeSpan(self)
    }
}

impl Field for NaiveDateTime {
    fn value_type() -> ValueType {
        ValueType::DateTime
    }

    fn into_value<'a>(self) -> Value<'a> {
        Value::DateTime(self)
    }
}

/// `None` reads as null
impl<F: Field> Field for Option<F> {
    fn value_type() -> ValueType {
        F::value_type()
    }

    fn into_value<'a>(self) -> Value<'a> {
        self.map_or(Value::Null, F::into_value)
    }
}

impl<F: Field> Field for Vec<F> {
    fn value_type() -> ValueType {
        ValueType::Sequence(Box::new(F::value_type()))
    }

    fn into_value<'a>(self) -> Value<'a> {
        Value::Sequence(self.into_iter().map(F::into_value).collect())
    }
}

/// The type a query is compiled against, together with the conversion from
/// a host value into the evaluator's [`Value`].
pub struct Schema<T> {
    value_type: ValueType,
    lift: Lift<T>,
}

impl<T> Clone for Schema<T> {
    fn clone(&self) -> Self {
        Schema {
            value_type: self.value_type.clone(),
            lift: Arc::clone(&self.lift),
        }
    }
}

impl<T> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("value_type", &self.value_type)
            .finish_non_exhaustive()
    }
}

impl<T> Schema<T> {
    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    pub fn lift<'a>(&self, input: &'a T) -> Value<'a> {
        (self.lift)(input)
    }

    /// Build a schema from an already known type and conversion.
    pub fn from_parts<F>(value_type: ValueType, convert: F) -> Self
    where
        F: for<'a> Fn(&'a T) -> Value<'a> + Send + Sync + 'static,
    {
        Schema {
            value_type,
            lift: lift(convert),
        }
    }
}

impl<T: Any> Schema<T> {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder<T> {
        SchemaBuilder {
            name: name.into(),
            members: Vec::new(),
            _record: PhantomData,
        }
    }
}

impl<T: Field + Clone + 'static> Schema<T> {
    /// Schema for a bare value, reachable in queries only through `$`
    pub fn scalar() -> Self {
        Schema {
            value_type: T::value_type(),
            lift: lift(|input: &T| input.clone().into_value()),
        }
    }
}

/// Collects the members of a record type.
pub struct SchemaBuilder<T> {
    name: String,
    members: Vec<Member>,
    _record: PhantomData<fn(&T)>,
}

impl<T: Any> SchemaBuilder<T> {
    /// Expose a member computed from the record by value.
    pub fn field<V, F>(mut self, name: &str, read: F) -> Self
    where
        V: Field,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        let read = reader(move |record| match record.downcast_ref::<T>() {
            Some(record) => read(record).into_value(),
            None => Value::Null,
        });
        self.members.push(Member::new(name, V::value_type(), read));
        self
    }

    /// Expose a string member borrowed from the record.
    pub fn text<F>(mut self, name: &str, read: F) -> Self
    where
        F: for<'a> Fn(&'a T) -> &'a str + Send + Sync + 'static,
    {
        let read = reader(move |record| match record.downcast_ref::<T>() {
            Some(record) => Value::String(Cow::Borrowed(read(record))),
            None => Value::Null,
        });
        self.members.push(Member::new(name, ValueType::String, read));
        self
    }

    /// Expose a nested value described by its own schema.
    pub fn record<R, F>(mut self, name: &str, schema: &Schema<R>, read: F) -> Self
    where
        R: Any,
        F: for<'a> Fn(&'a T) -> &'a R + Send + Sync + 'static,
    {
        let element = Arc::clone(&schema.lift);
        let read = reader(move |record| match record.downcast_ref::<T>() {
            Some(record) => element(read(record)),
            None => Value::Null,
        });
        self.members.push(Member::new(name, schema.value_type.clone(), read));
        self
    }

    /// Expose a sequence of nested values, usable with `any`, `all` and `count`.
    pub fn records<R, F>(mut self, name: &str, schema: &Schema<R>, read: F) -> Self
    where
        R: Any,
        F: for<'a> Fn(&'a T) -> &'a [R] + Send + Sync + 'static,
    {
        let element = Arc::clone(&schema.lift);
        let read = reader(move |record| match record.downcast_ref::<T>() {
            Some(record) => Value::Sequence(read(record).iter().map(|item| element(item)).collect()),
            None => Value::Null,
        });
        let value_type = ValueType::Sequence(Box::new(schema.value_type.clone()));
        self.members.push(Member::new(name, value_type, read));
        self
    }

    /// Register a member with a hand-written reader.
    pub fn member(mut self, member: Member) -> Self {
        self.members.push(member);
        self
    }

    pub fn build(self) -> Schema<T> {
        let record = Arc::new(RecordType {
            name: self.name,
            members: self.members,
        });
        Schema {
            value_type: ValueType::Record(record),
            lift: lift(|input: &T| Value::Record(input as &dyn Any)),
        }
    }
}
