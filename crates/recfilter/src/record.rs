//! Record-type descriptors and runtime values.
//!
//! A filter is compiled against a [`RecordType`], which lists the readable
//! members of a record and their static [`FieldType`]s. At evaluation time the
//! compiled filter reads members through the [`Record`] trait.
//!
//! # Example
//!
//! ```
//! use recfilter::record::{Describe, Field, FieldType, Record, RecordType};
//!
//! struct Book {
//!     title: String,
//!     pages: i64,
//! }
//!
//! impl Record for Book {
//!     fn field(&self, name: &str) -> Option<Field<'_>> {
//!         match name {
//!             "Title" => Some(Field::value(self.title.as_str())),
//!             "Pages" => Some(Field::value(self.pages)),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! impl Describe for Book {
//!     fn record_type() -> RecordType {
//!         RecordType::new("Book")
//!             .field("Title", FieldType::String)
//!             .field("Pages", FieldType::Integer)
//!     }
//! }
//! ```

pub mod json;

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};

// ==================== Runtime Values ====================

/// A runtime value read from a record or produced from a literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent or null value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer. Enumeration members are read as their discriminant.
    Integer(i64),
    /// A 64-bit float.
    Float(f64),
    /// A string.
    String(String),
    /// A date/time instant.
    DateTime(DateTime<FixedOffset>),
    /// A sequence of values.
    List(Vec<Value>),
}

impl Value {
    /// Returns true if this is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Compares two values.
    ///
    /// Integers and floats compare numerically with each other. Date/times
    /// compare as instants regardless of their offsets. Returns `None` for
    /// values of unrelated kinds.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Integer(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Returns true if both values compare as equal.
    pub fn equals(&self, other: &Value) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }

    /// Tests containment: substring for strings, membership for lists.
    ///
    /// String containment is ordinal and case-sensitive.
    pub fn contains(&self, needle: &Value) -> bool {
        match (self, needle) {
            (Value::String(haystack), Value::String(needle)) => haystack.contains(needle.as_str()),
            (Value::List(items), needle) => items.iter().any(|item| item.equals(needle)),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => write!(f, "\"{s}\""),
            Value::DateTime(dt) => write!(f, "\"{}\"", dt.to_rfc3339()),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::String(value.clone())
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Value::DateTime(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::DateTime(value.into())
    }
}

impl<V: Into<Value>> From<Option<V>> for Value {
    fn from(value: Option<V>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl<V: Into<Value>> From<Vec<V>> for Value {
    fn from(value: Vec<V>) -> Self {
        Value::List(value.into_iter().map(Into::into).collect())
    }
}

impl<V: Clone + Into<Value>> From<&[V]> for Value {
    fn from(value: &[V]) -> Self {
        Value::List(value.iter().cloned().map(Into::into).collect())
    }
}

// ==================== Record Access ====================

/// A member read from a record: either a value or a nested record.
pub enum Field<'a> {
    /// A scalar or list value.
    Value(Value),
    /// A nested record, navigated by dotted paths.
    Record(Box<dyn Record + 'a>),
}

impl<'a> Field<'a> {
    /// Creates a value member.
    pub fn value(value: impl Into<Value>) -> Self {
        Field::Value(value.into())
    }

    /// Creates a nested record member.
    pub fn record<R: Record + 'a>(record: R) -> Self {
        Field::Record(Box::new(record))
    }

    /// Creates a member for an optional nested record. `None` reads as null.
    pub fn optional_record<R: Record + 'a>(record: Option<R>) -> Self {
        match record {
            Some(record) => Field::record(record),
            None => Field::Value(Value::Null),
        }
    }
}

impl fmt::Debug for Field<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Field::Record(_) => f.write_str("Record(..)"),
        }
    }
}

/// A record whose members can be read by name.
pub trait Record {
    /// Returns the member with the given name, or `None` if no such member exists.
    fn field(&self, name: &str) -> Option<Field<'_>>;
}

impl<R: Record + ?Sized> Record for &R {
    fn field(&self, name: &str) -> Option<Field<'_>> {
        (**self).field(name)
    }
}

impl<R: Record + ?Sized> Record for Box<R> {
    fn field(&self, name: &str) -> Option<Field<'_>> {
        (**self).field(name)
    }
}

impl<R: Record + ?Sized> Record for Arc<R> {
    fn field(&self, name: &str) -> Option<Field<'_>> {
        (**self).field(name)
    }
}

/// A record type with a statically known shape.
pub trait Describe: Record {
    /// Returns the descriptor of this record type.
    fn record_type() -> RecordType;
}

// ==================== Type Descriptors ====================

/// The static type of a record member.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// Boolean member.
    Bool,
    /// Integer member.
    Integer,
    /// Floating-point member.
    Float,
    /// String member.
    String,
    /// Date/time member.
    DateTime,
    /// Enumeration member, read as its integer discriminant.
    Enum(EnumType),
    /// Sequence member.
    List(Box<FieldType>),
    /// Member that may be null.
    Optional(Box<FieldType>),
    /// Nested record member.
    Record(RecordShape),
}

impl FieldType {
    /// Creates a list type.
    pub fn list(element: FieldType) -> Self {
        FieldType::List(Box::new(element))
    }

    /// Creates an optional type.
    pub fn optional(inner: FieldType) -> Self {
        FieldType::Optional(Box::new(inner))
    }

    /// Creates a nested record type.
    pub fn record(record_type: RecordType) -> Self {
        FieldType::Record(RecordShape::Inline(Arc::new(record_type)))
    }

    /// Creates a nested record type for a [`Describe`] implementor.
    ///
    /// The descriptor is built on demand, so a type may refer to itself.
    pub fn described<R: Describe>() -> Self {
        FieldType::Record(RecordShape::Deferred(R::record_type))
    }

    /// Returns the inner type of an optional type, or `self` otherwise.
    pub fn unwrap_optional(&self) -> &FieldType {
        match self {
            FieldType::Optional(inner) => inner.unwrap_optional(),
            other => other,
        }
    }

    /// Returns true if this type admits null.
    pub fn is_optional(&self) -> bool {
        matches!(self, FieldType::Optional(_))
    }

    /// Returns the record type if this (possibly optional) type is a nested record.
    pub fn record_type(&self) -> Option<Arc<RecordType>> {
        match self.unwrap_optional() {
            FieldType::Record(shape) => Some(shape.resolve()),
            _ => None,
        }
    }

    /// Returns true for types that hold a single value (not a list or a record).
    pub fn is_scalar(&self) -> bool {
        !matches!(
            self.unwrap_optional(),
            FieldType::List(_) | FieldType::Record(_)
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Bool => write!(f, "bool"),
            FieldType::Integer => write!(f, "integer"),
            FieldType::Float => write!(f, "float"),
            FieldType::String => write!(f, "string"),
            FieldType::DateTime => write!(f, "datetime"),
            FieldType::Enum(e) => write!(f, "enum {}", e.name()),
            FieldType::List(inner) => write!(f, "list<{inner}>"),
            FieldType::Optional(inner) => write!(f, "optional<{inner}>"),
            FieldType::Record(shape) => write!(f, "record {}", shape.resolve().name()),
        }
    }
}

/// How a nested record type is supplied.
#[derive(Clone)]
pub enum RecordShape {
    /// A descriptor built up front.
    Inline(Arc<RecordType>),
    /// A descriptor built when first needed.
    Deferred(fn() -> RecordType),
}

impl RecordShape {
    /// Returns the record type descriptor.
    pub fn resolve(&self) -> Arc<RecordType> {
        match self {
            RecordShape::Inline(record_type) => Arc::clone(record_type),
            RecordShape::Deferred(build) => Arc::new(build()),
        }
    }
}

impl PartialEq for RecordShape {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RecordShape::Inline(a), RecordShape::Inline(b)) => a == b,
            // Deferred descriptors may be recursive; compare by name only.
            (a, b) => a.resolve().name() == b.resolve().name(),
        }
    }
}

impl fmt::Debug for RecordShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordShape::Inline(record_type) => {
                f.debug_tuple("Inline").field(record_type).finish()
            }
            RecordShape::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// An enumeration with named variants and integer discriminants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    name: String,
    variants: Vec<(String, i64)>,
}

impl EnumType {
    /// Creates an enumeration with no variants.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variants: Vec::new(),
        }
    }

    /// Adds a variant.
    pub fn variant(mut self, name: impl Into<String>, discriminant: i64) -> Self {
        self.variants.push((name.into(), discriminant));
        self
    }

    /// Returns the enumeration name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the variants in declaration order.
    pub fn variants(&self) -> &[(String, i64)] {
        &self.variants
    }

    /// Looks up a variant's discriminant by name (case-insensitive).
    pub fn discriminant_of(&self, name: &str) -> Option<i64> {
        self.variants
            .iter()
            .find(|(variant, _)| variant.eq_ignore_ascii_case(name))
            .map(|(_, discriminant)| *discriminant)
    }
}

/// Describes the readable members of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordType {
    name: String,
    fields: Vec<(String, FieldType)>,
}

impl RecordType {
    /// Creates a record type with no members.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Adds a member.
    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push((name.into(), field_type));
        self
    }

    /// Returns the record type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the members in declaration order.
    pub fn fields(&self) -> &[(String, FieldType)] {
        &self.fields
    }

    /// Looks up a member by name.
    ///
    /// An exact match wins; otherwise the first case-insensitive match is
    /// returned. The returned name is the member's declared name.
    pub fn lookup(&self, name: &str) -> Option<(&str, &FieldType)> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .or_else(|| {
                self.fields
                    .iter()
                    .find(|(field, _)| field.eq_ignore_ascii_case(name))
            })
            .map(|(field, field_type)| (field.as_str(), field_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_compare_mixed_numbers() {
        assert_eq!(
            Value::Integer(50).compare(&Value::Float(100.5)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::Float(10.0).compare(&Value::Integer(10)),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn test_compare_unrelated_kinds() {
        assert_eq!(Value::String("1".into()).compare(&Value::Integer(1)), None);
        assert_eq!(Value::Null.compare(&Value::Integer(1)), None);
        assert!(!Value::Null.equals(&Value::Bool(false)));
        assert!(Value::Null.equals(&Value::Null));
    }

    #[test]
    fn test_compare_datetimes_across_offsets() {
        let paris = FixedOffset::east_opt(2 * 3600).unwrap();
        let a = paris.with_ymd_and_hms(2020, 1, 1, 2, 0, 0).unwrap();
        let b: DateTime<FixedOffset> = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap().into();
        assert!(Value::DateTime(a).equals(&Value::DateTime(b)));
    }

    #[test]
    fn test_contains_substring_is_case_sensitive() {
        let name = Value::from("Bonisseur de La Bath");
        assert!(name.contains(&Value::from("Bath")));
        assert!(!name.contains(&Value::from("bath")));
    }

    #[test]
    fn test_contains_list_membership() {
        let tags = Value::from(vec!["Tag1", "Tag2"]);
        assert!(tags.contains(&Value::from("Tag2")));
        assert!(!tags.contains(&Value::from("Tag3")));

        let numbers = Value::from(vec![1_i64, 2, 3]);
        assert!(numbers.contains(&Value::Float(2.0)));
    }

    #[test]
    fn test_option_into_value() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(8_i64)), Value::Integer(8));
    }

    #[test]
    fn test_lookup_prefers_exact_match() {
        let record_type = RecordType::new("Thing")
            .field("name", FieldType::Integer)
            .field("Name", FieldType::String);

        assert_eq!(record_type.lookup("Name"), Some(("Name", &FieldType::String)));
        assert_eq!(record_type.lookup("NAME"), Some(("name", &FieldType::Integer)));
        assert_eq!(record_type.lookup("Missing"), None);
    }

    #[test]
    fn test_enum_discriminant_lookup() {
        let status = EnumType::new("Status")
            .variant("Offline", 0)
            .variant("Online", 1);
        assert_eq!(status.discriminant_of("online"), Some(1));
        assert_eq!(status.discriminant_of("Away"), None);
    }

    #[test]
    fn test_field_type_display() {
        assert_eq!(
            FieldType::optional(FieldType::list(FieldType::String)).to_string(),
            "optional<list<string>>"
        );
        assert_eq!(
            FieldType::record(RecordType::new("Team")).to_string(),
            "record Team"
        );
    }

    #[test]
    fn test_unwrap_optional_and_scalar() {
        let optional_list = FieldType::optional(FieldType::list(FieldType::Integer));
        assert!(optional_list.is_optional());
        assert!(!optional_list.is_scalar());
        assert!(FieldType::optional(FieldType::Integer).is_scalar());
        assert_eq!(
            FieldType::optional(FieldType::Float).unwrap_optional(),
            &FieldType::Float
        );
    }
}
