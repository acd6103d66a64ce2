//! Compiled condition tree.
//!
//! A [`Condition`] is the typed output of compilation. It can be evaluated
//! directly against any [`Record`], or walked by a query provider that wants
//! to translate it into its own query language.

use std::cmp::Ordering;
use std::fmt;

use crate::record::{Field, FieldType, Record, Value};

/// A member path resolved against a record type.
///
/// Segments hold the declared member names, so lookups at evaluation time
/// are exact even when the query used a different case.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPath {
    segments: Vec<String>,
    field_type: FieldType,
}

impl ResolvedPath {
    pub(crate) fn new(segments: Vec<String>, field_type: FieldType) -> Self {
        Self {
            segments,
            field_type,
        }
    }

    /// Returns the declared member names along the path.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns the static type of the final member.
    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    /// Reads the member at this path.
    ///
    /// Missing members and null intermediate records read as [`Value::Null`].
    pub fn read(&self, record: &dyn Record) -> Value {
        read_from(record, &self.segments)
    }
}

impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

fn read_from(record: &dyn Record, segments: &[String]) -> Value {
    let Some((first, rest)) = segments.split_first() else {
        return Value::Null;
    };

    match record.field(first) {
        Some(Field::Value(value)) if rest.is_empty() => value,
        Some(Field::Record(nested)) if !rest.is_empty() => read_from(&*nested, rest),
        _ => Value::Null,
    }
}

/// Ordering and equality operators of a compiled comparison.
///
/// The property is always the left operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// Property equals the value.
    Equal,
    /// Property is greater than the value.
    GreaterThan,
    /// Property is less than the value.
    LessThan,
}

impl CompareOp {
    /// Returns the operator with its operands swapped.
    pub fn mirrored(self) -> Self {
        match self {
            CompareOp::Equal => CompareOp::Equal,
            CompareOp::GreaterThan => CompareOp::LessThan,
            CompareOp::LessThan => CompareOp::GreaterThan,
        }
    }

    fn test(self, actual: &Value, expected: &Value) -> bool {
        let target = match self {
            CompareOp::Equal => return actual.equals(expected),
            CompareOp::GreaterThan => Ordering::Greater,
            CompareOp::LessThan => Ordering::Less,
        };
        // Null has no order.
        !actual.is_null() && !expected.is_null() && actual.compare(expected) == Some(target)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Equal => write!(f, "eq"),
            CompareOp::GreaterThan => write!(f, "gt"),
            CompareOp::LessThan => write!(f, "lt"),
        }
    }
}

/// A compiled, typed condition over records.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Matches every record.
    Always,

    /// Compares a member with a value of the member's type.
    Compare {
        /// The member path.
        path: ResolvedPath,
        /// The operator, with the member on the left.
        operator: CompareOp,
        /// The coerced literal.
        value: Value,
    },

    /// The member (a string or list) contains the needle.
    Contains {
        /// The container member path.
        path: ResolvedPath,
        /// A substring or list element.
        needle: Value,
    },

    /// The member's value is one of the listed values.
    In {
        /// The member path.
        path: ResolvedPath,
        /// The candidate values.
        haystack: Vec<Value>,
    },

    /// Both conditions hold.
    And(Box<Condition>, Box<Condition>),

    /// Either condition holds.
    Or(Box<Condition>, Box<Condition>),
}

impl Condition {
    /// Evaluates the condition against a record.
    ///
    /// `And` and `Or` short-circuit.
    pub fn evaluate(&self, record: &dyn Record) -> bool {
        match self {
            Condition::Always => true,
            Condition::Compare {
                path,
                operator,
                value,
            } => operator.test(&path.read(record), value),
            Condition::Contains { path, needle } => path.read(record).contains(needle),
            Condition::In { path, haystack } => {
                let actual = path.read(record);
                haystack.iter().any(|candidate| candidate.equals(&actual))
            }
            Condition::And(left, right) => left.evaluate(record) && right.evaluate(record),
            Condition::Or(left, right) => left.evaluate(record) || right.evaluate(record),
        }
    }

    /// Returns true for [`Condition::Always`].
    pub fn is_always(&self) -> bool {
        matches!(self, Condition::Always)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Always => write!(f, "true"),
            Condition::Compare {
                path,
                operator,
                value,
            } => write!(f, "{path} {operator} {value}"),
            Condition::Contains { path, needle } => write!(f, "{path} contains {needle}"),
            Condition::In { path, haystack } => {
                write!(f, "{path} in {}", Value::List(haystack.clone()))
            }
            Condition::And(left, right) => write!(f, "({left} and {right})"),
            Condition::Or(left, right) => write!(f, "({left} or {right})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Leader;

    impl Record for Leader {
        fn field(&self, name: &str) -> Option<Field<'_>> {
            match name {
                "LastName" => Some(Field::value("Coty")),
                _ => None,
            }
        }
    }

    struct Team {
        leader: Option<Leader>,
    }

    impl Record for Team {
        fn field(&self, name: &str) -> Option<Field<'_>> {
            match name {
                "Leader" => Some(Field::optional_record(self.leader.as_ref())),
                "Size" => Some(Field::value(4_i64)),
                _ => None,
            }
        }
    }

    fn path(segments: &[&str], field_type: FieldType) -> ResolvedPath {
        ResolvedPath::new(
            segments.iter().map(|s| s.to_string()).collect(),
            field_type,
        )
    }

    #[test]
    fn test_read_nested_path() {
        let team = Team {
            leader: Some(Leader),
        };
        let last_name = path(&["Leader", "LastName"], FieldType::String);
        assert_eq!(last_name.read(&team), Value::from("Coty"));
    }

    #[test]
    fn test_read_through_null_is_null() {
        let team = Team { leader: None };
        let last_name = path(&["Leader", "LastName"], FieldType::String);
        assert_eq!(last_name.read(&team), Value::Null);
    }

    #[test]
    fn test_read_value_as_record_is_null() {
        let team = Team { leader: None };
        assert_eq!(path(&["Size", "Value"], FieldType::Integer).read(&team), Value::Null);
        assert_eq!(path(&["Missing"], FieldType::Integer).read(&team), Value::Null);
    }

    #[test]
    fn test_ordering_against_null_is_false() {
        let team = Team { leader: None };
        let condition = Condition::Compare {
            path: path(&["Leader", "LastName"], FieldType::String),
            operator: CompareOp::LessThan,
            value: Value::Null,
        };
        assert!(!condition.evaluate(&team));
    }

    #[test]
    fn test_null_equals_null() {
        let team = Team { leader: None };
        let condition = Condition::Compare {
            path: path(&["Leader", "LastName"], FieldType::optional(FieldType::String)),
            operator: CompareOp::Equal,
            value: Value::Null,
        };
        assert!(condition.evaluate(&team));
    }

    #[test]
    fn test_mirrored() {
        assert_eq!(CompareOp::GreaterThan.mirrored(), CompareOp::LessThan);
        assert_eq!(CompareOp::Equal.mirrored(), CompareOp::Equal);
    }

    #[test]
    fn test_display() {
        let condition = Condition::Or(
            Box::new(Condition::Compare {
                path: path(&["Size"], FieldType::Integer),
                operator: CompareOp::GreaterThan,
                value: Value::Integer(3),
            }),
            Box::new(Condition::In {
                path: path(&["Size"], FieldType::Integer),
                haystack: vec![Value::Integer(1), Value::Integer(2)],
            }),
        );
        assert_eq!(condition.to_string(), "(Size gt 3 or Size in [1, 2])");
    }
}
