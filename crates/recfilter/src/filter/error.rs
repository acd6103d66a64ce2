//! Error types for filter compilation.

use thiserror::Error;

/// A specialized Result type for filter compilation.
pub type FilterResult<T> = Result<T, FilterError>;

/// Errors that can occur while compiling a filter.
///
/// Every variant means the query is invalid; compilation is all-or-nothing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FilterError {
    /// The query contains no tokens, only unrecognized characters.
    #[error("filter expression is empty")]
    EmptyExpression,

    /// The query is longer than the configured bound.
    #[error("filter expression is too long ({length} bytes, at most {max} allowed)")]
    QueryTooLong {
        /// Length of the query in bytes.
        length: usize,
        /// The configured bound.
        max: usize,
    },

    /// Parentheses nest deeper than the configured bound.
    #[error("parentheses nest deeper than {max} levels at position {position}")]
    TooDeep {
        /// Byte position of the first parenthesis past the bound.
        position: usize,
        /// The configured bound.
        max: usize,
    },

    /// A closing parenthesis has no opening match, or an opening one is never closed.
    #[error("unbalanced parenthesis at position {position}")]
    UnbalancedParentheses {
        /// Byte position of the offending parenthesis.
        position: usize,
    },

    /// A list literal is unterminated or contains something other than literals.
    #[error("malformed list at position {position}")]
    MalformedList {
        /// Byte position of the offending token.
        position: usize,
    },

    /// A comparison operator does not sit between one property and one value.
    #[error("`{operator}` must compare a property with a value, found {left} and {right}")]
    MalformedComparison {
        /// The comparison operator.
        operator: String,
        /// Description of the left neighbor.
        left: String,
        /// Description of the right neighbor.
        right: String,
    },

    /// A boolean operator does not sit between two clauses.
    #[error("`{operator}` must join two conditions, found {left} and {right}")]
    MalformedBoolean {
        /// The boolean operator.
        operator: String,
        /// Description of the left neighbor.
        left: String,
        /// Description of the right neighbor.
        right: String,
    },

    /// A parenthesized group does not resolve to exactly one element.
    #[error("parenthesized group must contain exactly one condition, found {count}")]
    AmbiguousGroup {
        /// Number of elements left in the group.
        count: usize,
    },

    /// The query does not resolve to exactly one condition.
    #[error("filter expression must form a single condition, found {count} parts")]
    AmbiguousExpression {
        /// Number of top-level elements left.
        count: usize,
    },

    /// A part of the query is a bare operand rather than a condition.
    #[error("expected a condition, found {element}")]
    IncompleteExpression {
        /// Description of the element.
        element: String,
    },

    /// A property path does not resolve against the record type.
    #[error("unknown member `{member}` in `{path}`{}", suggestion_suffix(.suggestion))]
    UnknownMember {
        /// The full path as written.
        path: String,
        /// The segment that failed to resolve.
        member: String,
        /// A similarly named member, if any.
        suggestion: Option<String>,
    },

    /// The operator cannot apply to the property's type and the literal.
    #[error("cannot apply `{operator}` to `{path}` ({field_type}) and {literal}")]
    IncomparableTypes {
        /// The property path.
        path: String,
        /// The operator.
        operator: String,
        /// The property's static type.
        field_type: String,
        /// The literal as written.
        literal: String,
    },

    /// A literal cannot be converted to the property's type.
    #[error("invalid literal {literal}: expected {expected}")]
    InvalidLiteral {
        /// The literal as written.
        literal: String,
        /// The expected type.
        expected: String,
    },

    /// An ordering was requested without any keys.
    #[error("ordering requires at least one key")]
    EmptyOrdering,
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(". Did you mean `{s}`?"),
        None => String::new(),
    }
}

impl FilterError {
    /// Creates a malformed comparison error.
    pub fn malformed_comparison(
        operator: impl ToString,
        left: impl Into<String>,
        right: impl Into<String>,
    ) -> Self {
        FilterError::MalformedComparison {
            operator: operator.to_string(),
            left: left.into(),
            right: right.into(),
        }
    }

    /// Creates a malformed boolean error.
    pub fn malformed_boolean(
        operator: impl ToString,
        left: impl Into<String>,
        right: impl Into<String>,
    ) -> Self {
        FilterError::MalformedBoolean {
            operator: operator.to_string(),
            left: left.into(),
            right: right.into(),
        }
    }

    /// Creates an invalid literal error.
    pub fn invalid_literal(literal: impl ToString, expected: impl ToString) -> Self {
        FilterError::InvalidLiteral {
            literal: literal.to_string(),
            expected: expected.to_string(),
        }
    }
}
