//! Compiles parsed clauses into typed conditions.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, PoisonError, RwLock};

use strsim::levenshtein;
use tracing::{debug, trace};

use super::condition::{CompareOp, Condition, ResolvedPath};
use super::element::{
    BooleanOperator, Comparison, ComparisonOperator, Element, Literal, PropertyPath,
};
use super::error::{FilterError, FilterResult};
use super::parser::FilterParser;
use super::predicate::Filter;
use crate::config::CompilerConfig;
use crate::record::{Describe, FieldType, RecordType, Value};

/// Maximum Levenshtein distance to consider a member name as a suggestion.
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Compiles filter expressions for one record type.
///
/// Resolved member paths are cached, so a long-lived compiler pays for each
/// distinct path once. The compiler is `Send + Sync` and can be shared.
///
/// # Example
///
/// ```
/// use recfilter::filter::FilterCompiler;
/// use recfilter::record::{json::JsonRecord, FieldType, RecordType};
/// use serde_json::json;
///
/// let compiler = FilterCompiler::<JsonRecord>::with_record_type(
///     RecordType::new("User")
///         .field("Name", FieldType::String)
///         .field("Score", FieldType::Integer),
/// );
/// let filter = compiler.try_compile("Score gt 5 and Name in \"o\"").unwrap();
///
/// let bob = JsonRecord::new(json!({"Name": "Bob", "Score": 8}), compiler.record_type());
/// assert!(filter.matches(&bob));
/// ```
pub struct FilterCompiler<T> {
    record_type: Arc<RecordType>,
    config: CompilerConfig,
    paths: RwLock<HashMap<String, ResolvedPath>>,
    _record: PhantomData<fn(&T)>,
}

impl<T: Describe> FilterCompiler<T> {
    /// Creates a compiler for a statically described record type.
    pub fn new() -> Self {
        Self::with_record_type(T::record_type())
    }
}

impl<T: Describe> Default for FilterCompiler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FilterCompiler<T> {
    /// Creates a compiler for an explicit record type.
    pub fn with_record_type(record_type: impl Into<Arc<RecordType>>) -> Self {
        Self {
            record_type: record_type.into(),
            config: CompilerConfig::default(),
            paths: RwLock::new(HashMap::new()),
            _record: PhantomData,
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the record type filters are compiled against.
    pub fn record_type(&self) -> Arc<RecordType> {
        Arc::clone(&self.record_type)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compiles a query into a reusable filter.
    ///
    /// An empty or whitespace-only query compiles to a filter that matches
    /// every record.
    ///
    /// # Errors
    ///
    /// Returns a [`FilterError`] if the query is malformed, refers to an
    /// unknown member, or compares a member with a literal of the wrong type.
    pub fn try_compile(&self, query: &str) -> FilterResult<Filter<T>> {
        match self.compile_condition(query) {
            Ok(condition) => {
                debug!(query, condition = %condition, "compiled filter");
                Ok(Filter::new(condition))
            }
            Err(error) => {
                debug!(query, error = %error, "rejected filter");
                Err(error)
            }
        }
    }

    fn compile_condition(&self, query: &str) -> FilterResult<Condition> {
        if let Some(max) = self.config.max_query_length {
            if query.len() > max {
                return Err(FilterError::QueryTooLong {
                    length: query.len(),
                    max,
                });
            }
        }

        match FilterParser::new(&self.config).parse(query)? {
            Some(root) => self.compile_element(root),
            None => Ok(Condition::Always),
        }
    }

    fn compile_element(&self, element: Element) -> FilterResult<Condition> {
        let (first, links) = element.into_left_spine();
        let mut condition = match first {
            Element::ComparisonClause(comparison) => self.compile_comparison(&comparison)?,
            other => {
                return Err(FilterError::IncompleteExpression {
                    element: other.describe(),
                })
            }
        };
        for (operator, right) in links {
            let left = Box::new(condition);
            let right = Box::new(self.compile_element(right)?);
            condition = match operator {
                BooleanOperator::And => Condition::And(left, right),
                BooleanOperator::Or => Condition::Or(left, right),
            };
        }
        Ok(condition)
    }

    fn compile_comparison(&self, comparison: &Comparison) -> FilterResult<Condition> {
        let path = self.resolve(&comparison.property)?;
        trace!(path = %path, field_type = %path.field_type(), "resolved member");

        let operator = match comparison.operator {
            ComparisonOperator::Equal => CompareOp::Equal,
            ComparisonOperator::GreaterThan => CompareOp::GreaterThan,
            ComparisonOperator::LessThan => CompareOp::LessThan,
            ComparisonOperator::Contains => return compile_contains(path, comparison),
        };
        let operator = if comparison.literal_first {
            operator.mirrored()
        } else {
            operator
        };

        if !supports(operator, path.field_type()) {
            return Err(incomparable(&path, comparison));
        }
        let value = coerce(&comparison.literal, path.field_type())
            .map_err(|mismatch| mismatch.into_error(&path, comparison))?;
        if value.is_null() && operator != CompareOp::Equal {
            return Err(incomparable(&path, comparison));
        }

        Ok(Condition::Compare {
            path,
            operator,
            value,
        })
    }

    /// Resolves a dotted member path, consulting the cache first.
    pub(crate) fn resolve(&self, path: &PropertyPath) -> FilterResult<ResolvedPath> {
        let key = path.to_string();
        let cached = self
            .paths
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();
        if let Some(resolved) = cached {
            return Ok(resolved);
        }

        let resolved = resolve_path(&self.record_type, path)?;
        self.paths
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, resolved.clone());
        Ok(resolved)
    }

    #[cfg(test)]
    pub(crate) fn paths_cached(&self) -> usize {
        self.paths.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl<T> fmt::Debug for FilterCompiler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterCompiler")
            .field("record_type", &self.record_type.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// ==================== Path Resolution ====================

fn resolve_path(record_type: &Arc<RecordType>, path: &PropertyPath) -> FilterResult<ResolvedPath> {
    let mut current = Arc::clone(record_type);
    let mut segments = Vec::with_capacity(path.segments().len());
    let mut resolved: Option<FieldType> = None;

    for segment in path.segments() {
        if let Some(parent) = &resolved {
            current = parent
                .record_type()
                .ok_or_else(|| unknown_member(path, segment, None))?;
        }

        let (declared, field_type) = current.lookup(segment).ok_or_else(|| {
            let names = current.fields().iter().map(|(name, _)| name.as_str());
            unknown_member(path, segment, find_similar_name(segment, names))
        })?;
        segments.push(declared.to_string());
        resolved = Some(field_type.clone());
    }

    let field_type = resolved.ok_or_else(|| unknown_member(path, "", None))?;
    Ok(ResolvedPath::new(segments, field_type))
}

fn unknown_member(path: &PropertyPath, member: &str, suggestion: Option<String>) -> FilterError {
    FilterError::UnknownMember {
        path: path.to_string(),
        member: member.to_string(),
        suggestion,
    }
}

/// Finds the closest member name within [`MAX_SUGGESTION_DISTANCE`].
fn find_similar_name<'a>(query: &str, candidates: impl Iterator<Item = &'a str>) -> Option<String> {
    let query_lower = query.to_lowercase();

    let (best_match, best_distance) = candidates
        .map(|name| (name, levenshtein(&query_lower, &name.to_lowercase())))
        .min_by_key(|(_, distance)| *distance)?;

    if best_distance > 0 && best_distance <= MAX_SUGGESTION_DISTANCE {
        Some(best_match.to_string())
    } else {
        None
    }
}

// ==================== Typing ====================

/// Returns true if `operator` applies to members of `field_type`.
fn supports(operator: CompareOp, field_type: &FieldType) -> bool {
    match field_type.unwrap_optional() {
        FieldType::Integer | FieldType::Float | FieldType::DateTime | FieldType::Enum(_) => true,
        FieldType::Bool | FieldType::String => operator == CompareOp::Equal,
        FieldType::List(_) | FieldType::Record(_) | FieldType::Optional(_) => false,
    }
}

fn compile_contains(path: ResolvedPath, comparison: &Comparison) -> FilterResult<Condition> {
    let container = path.field_type().unwrap_optional().clone();

    match (&container, &comparison.literal) {
        (_, Literal::List(items)) if path.field_type().is_scalar() => {
            let haystack = items
                .iter()
                .map(|item| coerce(item, path.field_type()))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|mismatch| mismatch.into_error(&path, comparison))?;
            Ok(Condition::In { path, haystack })
        }
        (FieldType::String, Literal::String(text) | Literal::DateTime { raw: text, .. }) => {
            Ok(Condition::Contains {
                needle: Value::String(text.clone()),
                path,
            })
        }
        (FieldType::List(element), literal) if !matches!(literal, Literal::List(_)) => {
            let needle = coerce(literal, element)
                .map_err(|mismatch| mismatch.into_error(&path, comparison))?;
            Ok(Condition::Contains { path, needle })
        }
        _ => Err(incomparable(&path, comparison)),
    }
}

fn incomparable(path: &ResolvedPath, comparison: &Comparison) -> FilterError {
    FilterError::IncomparableTypes {
        path: path.to_string(),
        operator: comparison.operator.to_string(),
        field_type: path.field_type().to_string(),
        literal: comparison.literal.to_string(),
    }
}

/// Why a literal could not be coerced.
#[derive(Debug)]
enum Mismatch {
    /// The literal's kind never applies to the member's type.
    Incomparable,
    /// The literal has the right kind but its text does not parse.
    Invalid { literal: String, expected: String },
}

impl Mismatch {
    fn invalid(literal: &Literal, expected: impl fmt::Display) -> Self {
        Mismatch::Invalid {
            literal: literal.to_string(),
            expected: expected.to_string(),
        }
    }

    fn into_error(self, path: &ResolvedPath, comparison: &Comparison) -> FilterError {
        match self {
            Mismatch::Incomparable => incomparable(path, comparison),
            Mismatch::Invalid { literal, expected } => {
                FilterError::invalid_literal(literal, expected)
            }
        }
    }
}

/// Converts a literal to a value of the member's static type.
fn coerce(literal: &Literal, target: &FieldType) -> Result<Value, Mismatch> {
    match (target, literal) {
        (FieldType::Optional(_), Literal::Null) => Ok(Value::Null),
        (FieldType::Optional(inner), literal) => coerce(literal, inner),

        (FieldType::Bool, Literal::Bool(b)) => Ok(Value::Bool(*b)),
        (FieldType::Bool, Literal::String(text)) => match text.trim().to_lowercase().as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(Mismatch::invalid(literal, "a boolean")),
        },

        (FieldType::Integer, Literal::Number(n)) => Ok(number_value(*n)),
        (FieldType::Integer, Literal::String(text)) => {
            parse_number(text).ok_or_else(|| Mismatch::invalid(literal, "a number"))
        }

        (FieldType::Float, Literal::Number(n)) => Ok(Value::Float(*n)),
        (FieldType::Float, Literal::String(text)) => match parse_number(text) {
            Some(Value::Integer(i)) => Ok(Value::Float(i as f64)),
            Some(value) => Ok(value),
            None => Err(Mismatch::invalid(literal, "a number")),
        },

        (FieldType::String, Literal::String(text)) => Ok(Value::String(text.clone())),

        (FieldType::DateTime, Literal::DateTime { instant, .. }) => Ok(Value::DateTime(*instant)),
        (FieldType::DateTime, Literal::String(_)) => Err(Mismatch::invalid(literal, "a date/time")),

        (FieldType::Enum(enum_type), Literal::Number(n)) => match number_value(*n) {
            Value::Integer(discriminant) => Ok(Value::Integer(discriminant)),
            _ => Err(Mismatch::invalid(literal, format!("a variant of {}", enum_type.name()))),
        },
        (FieldType::Enum(enum_type), Literal::String(text)) => enum_type
            .discriminant_of(text.trim())
            .or_else(|| text.trim().parse::<i64>().ok())
            .map(Value::Integer)
            .ok_or_else(|| {
                Mismatch::invalid(literal, format!("a variant of {}", enum_type.name()))
            }),

        // A literal that merely looked like a date keeps its raw text.
        (_, Literal::DateTime { raw, .. }) => coerce(&Literal::String(raw.clone()), target),

        _ => Err(Mismatch::Incomparable),
    }
}

/// Maps an integral number to an integer value, anything else to a float.
fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 {
        Value::Integer(n as i64)
    } else {
        Value::Float(n)
    }
}

fn parse_number(text: &str) -> Option<Value> {
    let text = text.trim();
    if let Ok(i) = text.parse::<i64>() {
        return Some(Value::Integer(i));
    }
    text.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(Value::Float)
}
