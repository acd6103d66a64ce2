//! Multi-pass precedence parser for filter expressions.

use tracing::trace;

use super::element::{
    describe_neighbor, BooleanOperator, Comparison, ComparisonOperator, Element, Literal,
    PropertyPath,
};
use super::error::{FilterError, FilterResult};
use super::lexer::{Lexer, PositionedToken, Token};
use crate::config::CompilerConfig;

/// Parser for filter expressions.
///
/// Parsing runs in sequential passes over progressively more structured
/// element lists:
///
/// 1. **Classification** turns tokens into values, properties, operators and
///    parenthesized groups.
/// 2. **Comparison binding** folds `operand op operand` triples into
///    comparison clauses.
/// 3. **Boolean binding** folds `clause and clause` to completion, then
///    `clause or clause`, so AND binds tighter than OR. Both are
///    left-associative.
///
/// Finally every group collapses into its single child.
///
/// # Grammar
///
/// ```text
/// expr       ::= or_expr
/// or_expr    ::= and_expr ("or" and_expr)*
/// and_expr   ::= comparison ("and" comparison)*
/// comparison ::= operand ("eq" | "lt" | "gt" | "in") operand | "(" expr ")"
/// operand    ::= literal | property_path
/// literal    ::= quoted_string | number | "true" | "false" | "null" | list
/// list       ::= "[" literal ("," literal)* "]"
/// ```
///
/// Keywords are case-insensitive.
///
/// # Example
///
/// ```
/// use recfilter::filter::{Element, FilterParser};
/// use recfilter::CompilerConfig;
///
/// let config = CompilerConfig::default();
/// let root = FilterParser::new(&config).parse("A eq 1 or B eq 2").unwrap();
/// assert!(matches!(root, Some(Element::BooleanClause { .. })));
/// ```
pub struct FilterParser<'c> {
    config: &'c CompilerConfig,
}

impl<'c> FilterParser<'c> {
    /// Creates a parser that interprets literals using `config`.
    pub fn new(config: &'c CompilerConfig) -> Self {
        Self { config }
    }

    /// Parses a query into its root clause.
    ///
    /// Returns `Ok(None)` for an empty or whitespace-only query, which
    /// matches every record.
    ///
    /// # Errors
    ///
    /// Returns a [`FilterError`] describing the first structural problem found.
    pub fn parse(&self, input: &str) -> FilterResult<Option<Element>> {
        if input.trim().is_empty() {
            return Ok(None);
        }

        let tokens: Vec<PositionedToken> = Lexer::new(input).collect();
        if tokens.is_empty() {
            return Err(FilterError::EmptyExpression);
        }

        let mut cursor = 0;
        let elements = self.classify(&tokens, &mut cursor, None, 0)?;
        trace!(count = elements.len(), "classified elements");

        let elements = bind_comparisons(elements)?;
        let elements = bind_boolean(elements, BooleanOperator::And)?;
        let elements = bind_boolean(elements, BooleanOperator::Or)?;
        trace!(count = elements.len(), "bound elements");

        let root = single_root(elements)?;
        Ok(Some(root))
    }

    // ==================== Pass 1: Classification ====================

    /// Classifies tokens until the end of input or the `)` closing `opened_at`.
    ///
    /// `depth` counts the groups enclosing this one. Later passes recurse once
    /// per group, so nesting past `max_depth` is rejected here.
    fn classify(
        &self,
        tokens: &[PositionedToken],
        cursor: &mut usize,
        opened_at: Option<usize>,
        depth: usize,
    ) -> FilterResult<Vec<Element>> {
        let mut elements = Vec::new();

        while let Some(positioned) = tokens.get(*cursor) {
            *cursor += 1;
            let position = positioned.position;

            match &positioned.token {
                Token::Close => {
                    return match opened_at {
                        Some(_) => Ok(elements),
                        None => Err(FilterError::UnbalancedParentheses { position }),
                    };
                }
                Token::Open => {
                    let max = self.config.max_depth;
                    if depth >= max {
                        return Err(FilterError::TooDeep { position, max });
                    }
                    let children = self.classify(tokens, cursor, Some(position), depth + 1)?;
                    elements.push(Element::Group(children));
                }
                Token::OpenBracket => {
                    let items = self.read_list(tokens, cursor, position)?;
                    elements.push(Element::Value(Literal::List(items)));
                }
                Token::CloseBracket => return Err(FilterError::MalformedList { position }),
                Token::QuotedLiteral(text) => {
                    elements.push(Element::Value(self.quoted_literal(text)));
                }
                Token::NumericLiteral(text) => {
                    elements.push(Element::Value(number_literal(text)?));
                }
                Token::Identifier(word) => elements.push(classify_word(word)?),
            }
        }

        match opened_at {
            Some(position) => Err(FilterError::UnbalancedParentheses { position }),
            None => Ok(elements),
        }
    }

    /// Reads literals up to the `]` closing the list opened at `opened_at`.
    fn read_list(
        &self,
        tokens: &[PositionedToken],
        cursor: &mut usize,
        opened_at: usize,
    ) -> FilterResult<Vec<Literal>> {
        let mut items = Vec::new();

        while let Some(positioned) = tokens.get(*cursor) {
            *cursor += 1;
            let position = positioned.position;

            let item = match &positioned.token {
                Token::CloseBracket => return Ok(items),
                Token::QuotedLiteral(text) => self.quoted_literal(text),
                Token::NumericLiteral(text) => number_literal(text)?,
                Token::Identifier(word) => match classify_word(word)? {
                    Element::Value(literal) => literal,
                    _ => return Err(FilterError::MalformedList { position }),
                },
                Token::Open | Token::Close | Token::OpenBracket => {
                    return Err(FilterError::MalformedList { position });
                }
            };
            items.push(item);
        }

        Err(FilterError::MalformedList {
            position: opened_at,
        })
    }

    /// Reinterprets a quoted literal as a date/time when it parses as one.
    fn quoted_literal(&self, text: &str) -> Literal {
        match self.config.parse_datetime(text) {
            Some(instant) => Literal::DateTime {
                instant,
                raw: text.to_string(),
            },
            None => Literal::String(text.to_string()),
        }
    }
}

/// Classifies a word token, case-insensitively.
///
/// Precedence: boolean operator, comparison operator, boolean literal,
/// `null`, integer literal, property path.
fn classify_word(word: &str) -> FilterResult<Element> {
    let element = match word.to_lowercase().as_str() {
        "and" => Element::BooleanOperator(BooleanOperator::And),
        "or" => Element::BooleanOperator(BooleanOperator::Or),
        "eq" => Element::ComparisonOperator(ComparisonOperator::Equal),
        "gt" => Element::ComparisonOperator(ComparisonOperator::GreaterThan),
        "lt" => Element::ComparisonOperator(ComparisonOperator::LessThan),
        "in" => Element::ComparisonOperator(ComparisonOperator::Contains),
        "true" => Element::Value(Literal::Bool(true)),
        "false" => Element::Value(Literal::Bool(false)),
        "null" => Element::Value(Literal::Null),
        _ if word.chars().all(|c| c.is_ascii_digit()) => Element::Value(number_literal(word)?),
        _ => Element::Property(PropertyPath::parse(word)),
    };
    Ok(element)
}

fn number_literal(text: &str) -> FilterResult<Literal> {
    match text.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(Literal::Number(n)),
        _ => Err(FilterError::invalid_literal(text, "a finite number")),
    }
}

// ==================== Pass 2: Comparison Binding ====================

/// Folds each comparison operator with its neighbors into a comparison clause.
///
/// The left operand is the element accumulated just before the operator, the
/// right operand the element just after it. Groups are processed recursively.
pub(crate) fn bind_comparisons(elements: Vec<Element>) -> FilterResult<Vec<Element>> {
    let mut bound = Vec::with_capacity(elements.len());
    let mut rest = elements.into_iter();

    while let Some(element) = rest.next() {
        match element {
            Element::Group(children) => bound.push(Element::Group(bind_comparisons(children)?)),
            Element::ComparisonOperator(operator) => {
                let left = bound.pop();
                let right = rest.next();
                bound.push(Element::ComparisonClause(bind_comparison(
                    operator, left, right,
                )?));
            }
            other => bound.push(other),
        }
    }

    Ok(bound)
}

fn bind_comparison(
    operator: ComparisonOperator,
    left: Option<Element>,
    right: Option<Element>,
) -> FilterResult<Comparison> {
    match (left, right) {
        (Some(Element::Property(property)), Some(Element::Value(literal))) => Ok(Comparison {
            operator,
            property,
            literal,
            literal_first: false,
        }),
        (Some(Element::Value(literal)), Some(Element::Property(property))) => Ok(Comparison {
            operator,
            property,
            literal,
            literal_first: true,
        }),
        (left, right) => Err(FilterError::malformed_comparison(
            operator,
            describe_neighbor(left.as_ref()),
            describe_neighbor(right.as_ref()),
        )),
    }
}

// ==================== Pass 3: Boolean Binding ====================

/// Folds every `operator` of one kind with its neighbors into boolean clauses.
///
/// Groups and existing boolean clauses are normalized first. The leftmost
/// operator is then collapsed and the scan restarts, which binds repeated
/// operators left to right.
pub(crate) fn bind_boolean(
    elements: Vec<Element>,
    operator: BooleanOperator,
) -> FilterResult<Vec<Element>> {
    let mut elements = elements
        .into_iter()
        .map(|element| normalize(element, operator))
        .collect::<FilterResult<Vec<_>>>()?;

    while let Some(index) = elements
        .iter()
        .position(|element| matches!(element, Element::BooleanOperator(op) if *op == operator))
    {
        let left = index.checked_sub(1).and_then(|i| elements.get(i));
        let right = elements.get(index + 1);
        let bindable =
            left.is_some_and(Element::is_resolved) && right.is_some_and(Element::is_resolved);
        if !bindable {
            return Err(FilterError::malformed_boolean(
                operator,
                describe_neighbor(left),
                describe_neighbor(right),
            ));
        }

        let right = elements.remove(index + 1);
        elements.remove(index);
        let left = elements.remove(index - 1);
        elements.insert(index - 1, Element::boolean(operator, left, right));
    }

    Ok(elements)
}

/// Applies boolean binding inside groups and the operands of existing clauses.
fn normalize(element: Element, operator: BooleanOperator) -> FilterResult<Element> {
    let (first, links) = element.into_left_spine();
    let mut normalized = match first {
        Element::Group(children) => Element::Group(bind_boolean(children, operator)?),
        other => other,
    };
    for (existing, right) in links {
        normalized = Element::boolean(existing, normalized, normalize(right, operator)?);
    }
    Ok(normalized)
}

// ==================== Group Collapse ====================

/// Replaces every group with its single child.
///
/// The operands of a boolean clause must themselves collapse to clauses.
pub(crate) fn collapse_groups(element: Element) -> FilterResult<Element> {
    match element {
        Element::Group(children) => {
            let count = children.len();
            let mut children = children.into_iter();
            match (children.next(), children.next()) {
                (Some(only), None) => collapse_groups(only),
                _ => Err(FilterError::AmbiguousGroup { count }),
            }
        }
        Element::BooleanClause { .. } => {
            let (first, links) = element.into_left_spine();
            let mut collapsed = collapse_clause(first)?;
            for (operator, right) in links {
                collapsed = Element::boolean(operator, collapsed, collapse_clause(right)?);
            }
            Ok(collapsed)
        }
        other => Ok(other),
    }
}

/// Collapses groups and requires the result to be a clause.
fn collapse_clause(element: Element) -> FilterResult<Element> {
    let element = collapse_groups(element)?;
    if element.is_clause() {
        Ok(element)
    } else {
        Err(FilterError::IncompleteExpression {
            element: element.describe(),
        })
    }
}

/// Reduces the top-level elements to a single root clause.
fn single_root(elements: Vec<Element>) -> FilterResult<Element> {
    let count = elements.len();
    let mut elements = elements.into_iter();
    match (elements.next(), elements.next()) {
        (Some(root), None) => collapse_clause(root),
        (None, _) => Err(FilterError::EmptyExpression),
        _ => Err(FilterError::AmbiguousExpression { count }),
    }
}
