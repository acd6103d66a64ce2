//! Elements produced and consumed by the parser.
//!
//! Raw tokens are promoted into [`Element`]s, which the parser passes then
//! rewrite into nested clauses.

use std::fmt;

use chrono::{DateTime, FixedOffset};

/// Boolean connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BooleanOperator {
    /// Logical AND (`and`).
    And,
    /// Logical OR (`or`).
    Or,
}

impl fmt::Display for BooleanOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BooleanOperator::And => write!(f, "and"),
            BooleanOperator::Or => write!(f, "or"),
        }
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    /// Equality (`eq`).
    Equal,
    /// Greater than (`gt`).
    GreaterThan,
    /// Less than (`lt`).
    LessThan,
    /// Containment (`in`).
    Contains,
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonOperator::Equal => write!(f, "eq"),
            ComparisonOperator::GreaterThan => write!(f, "gt"),
            ComparisonOperator::LessThan => write!(f, "lt"),
            ComparisonOperator::Contains => write!(f, "in"),
        }
    }
}

/// A literal value as written in the query.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// The `null` keyword.
    Null,
    /// `true` or `false`.
    Bool(bool),
    /// An integer or decimal number.
    Number(f64),
    /// A quoted string that is not a date/time.
    String(String),
    /// A quoted string that parsed as a date/time. The raw text is kept.
    DateTime {
        /// The parsed instant.
        instant: DateTime<FixedOffset>,
        /// The text between the quotes.
        raw: String,
    },
    /// A bracketed list of literals.
    List(Vec<Literal>),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "null"),
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Number(n) => write!(f, "{n}"),
            Literal::String(s) => write!(f, "\"{s}\""),
            Literal::DateTime { raw, .. } => write!(f, "\"{raw}\""),
            Literal::List(items) => {
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

/// A dotted member path such as `Team.Leader.LastName`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyPath(Vec<String>);

impl PropertyPath {
    /// Splits a dotted path into its segments. Empty segments are dropped.
    pub fn parse(text: &str) -> Self {
        Self(
            text.split('.')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Returns the path segments.
    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// A comparison between one property and one literal.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// The operator.
    pub operator: ComparisonOperator,
    /// The property operand.
    pub property: PropertyPath,
    /// The literal operand.
    pub literal: Literal,
    /// True if the literal was written on the left (`5 lt Score`).
    pub literal_first: bool,
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.literal_first {
            write!(f, "{} {} {}", self.literal, self.operator, self.property)
        } else {
            write!(f, "{} {} {}", self.property, self.operator, self.literal)
        }
    }
}

/// A parser element.
///
/// Pass 1 produces values, properties, operators and groups; later passes
/// fold them into clauses.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// A literal value.
    Value(Literal),

    /// A property reference.
    Property(PropertyPath),

    /// A boolean operator awaiting its operands.
    BooleanOperator(BooleanOperator),

    /// A comparison operator awaiting its operands.
    ComparisonOperator(ComparisonOperator),

    /// An unresolved parenthetical sub-expression.
    Group(Vec<Element>),

    /// A bound comparison.
    ComparisonClause(Comparison),

    /// A bound boolean combination of two clauses.
    BooleanClause {
        /// The connective.
        operator: BooleanOperator,
        /// The left operand.
        left: Box<Element>,
        /// The right operand.
        right: Box<Element>,
    },
}

impl Element {
    /// Creates a boolean clause from two elements.
    pub fn boolean(operator: BooleanOperator, left: Element, right: Element) -> Self {
        Element::BooleanClause {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Returns true for clauses and groups, the valid operands of a boolean operator.
    pub fn is_resolved(&self) -> bool {
        matches!(
            self,
            Element::ComparisonClause(_) | Element::BooleanClause { .. } | Element::Group(_)
        )
    }

    /// Returns true for comparison and boolean clauses.
    pub fn is_clause(&self) -> bool {
        matches!(
            self,
            Element::ComparisonClause(_) | Element::BooleanClause { .. }
        )
    }

    /// Splits a left-nested boolean chain into its leftmost operand and the
    /// links above it, innermost first.
    ///
    /// `a and b and c` binds as `(a and b) and c`, so chains grow on the left.
    /// Passes walk this spine in a loop and only recurse into right operands.
    pub(crate) fn into_left_spine(self) -> (Element, Vec<(BooleanOperator, Element)>) {
        let mut links = Vec::new();
        let mut current = self;
        while let Element::BooleanClause {
            operator,
            left,
            right,
        } = current
        {
            links.push((operator, *right));
            current = *left;
        }
        links.reverse();
        (current, links)
    }

    /// Describes the element for error messages.
    pub fn describe(&self) -> String {
        match self {
            Element::Value(literal) => format!("value {literal}"),
            Element::Property(path) => format!("property `{path}`"),
            Element::BooleanOperator(op) => format!("operator `{op}`"),
            Element::ComparisonOperator(op) => format!("operator `{op}`"),
            Element::Group(_) => "parenthesized group".to_string(),
            Element::ComparisonClause(comparison) => format!("clause `{comparison}`"),
            Element::BooleanClause { operator, .. } => format!("`{operator}` clause"),
        }
    }
}

/// Describes an optional neighbor for error messages.
pub(crate) fn describe_neighbor(element: Option<&Element>) -> String {
    element.map_or_else(|| "nothing".to_string(), Element::describe)
}
