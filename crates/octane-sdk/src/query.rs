// crates/octane-sdk/src/query.rs
// ============================================================================
// Module: Octane Queries
// Description: Builder for Octane REST query expressions.
// Purpose: Render filter expressions for the `query` URL parameter.
// Dependencies: none
// ============================================================================

//! ## Overview
//! Octane filters collections with expressions such as
//! `name EQ ^Login fails^;severity EQ {id EQ ^list_node.severity.high^}`.
//! [`Query`] renders those expressions; the surrounding double quotes of the
//! `query` parameter are added by the entity list.
//! Invariants:
//! - String literals are wrapped in `^` with `\` and `^` backslash-escaped.
//! - Conjunction is `;`, disjunction is `||`, negation is a `!` prefix.
//! - Operands of a different compound kind are parenthesized.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

// ============================================================================
// SECTION: Values
// ============================================================================

/// Literal values accepted in query statements.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    /// String literal.
    String(String),
    /// Integer literal.
    Integer(i64),
    /// Floating point literal.
    Float(f64),
    /// Boolean literal.
    Bool(bool),
    /// `null`
    Null,
    /// Pre-rendered literal (dates, server functions).
    Raw(String),
}

impl QueryValue {
    /// Renders the literal in Octane query syntax.
    fn render(&self) -> String {
        match self {
            Self::String(value) => format!("^{}^", escape_literal(value)),
            Self::Integer(value) => value.to_string(),
            Self::Float(value) => value.to_string(),
            Self::Bool(value) => value.to_string(),
            Self::Null => "null".to_string(),
            Self::Raw(value) => value.clone(),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for QueryValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for QueryValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMethod {
    /// `EQ`
    EqualTo,
    /// `LT`
    LessThan,
    /// `GT`
    GreaterThan,
    /// `LE`
    LessEqualThan,
    /// `GE`
    GreaterEqualThan,
}

impl QueryMethod {
    /// Returns the operator keyword.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::EqualTo => "EQ",
            Self::LessThan => "LT",
            Self::GreaterThan => "GT",
            Self::LessEqualThan => "LE",
            Self::GreaterEqualThan => "GE",
        }
    }
}

// ============================================================================
// SECTION: Query
// ============================================================================

/// Shape of the outermost expression, used to decide on parentheses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// Single statement or negation.
    Simple,
    /// `a;b`
    And,
    /// `a||b`
    Or,
}

/// Rendered Octane query expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Rendered expression.
    expression: String,
    /// Outermost shape.
    shape: Shape,
}

impl Query {
    /// Creates a comparison statement, e.g. `id GT 1001`.
    #[must_use]
    pub fn statement(field: &str, method: QueryMethod, value: impl Into<QueryValue>) -> Self {
        Self::simple(format!("{field} {} {}", method.keyword(), value.into().render()))
    }

    /// Creates an equality statement.
    #[must_use]
    pub fn equal_to(field: &str, value: impl Into<QueryValue>) -> Self {
        Self::statement(field, QueryMethod::EqualTo, value)
    }

    /// Creates an `IN` statement, e.g. `name IN ^defect^,^story^`.
    #[must_use]
    pub fn in_list<I, V>(field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<QueryValue>,
    {
        let rendered: Vec<String> = values.into_iter().map(|value| value.into().render()).collect();
        Self::simple(format!("{field} IN {}", rendered.join(",")))
    }

    /// Creates a range statement, e.g. `creation_time BTW ^a^...^b^`.
    #[must_use]
    pub fn between(field: &str, low: impl Into<QueryValue>, high: impl Into<QueryValue>) -> Self {
        Self::simple(format!("{field} BTW {}...{}", low.into().render(), high.into().render()))
    }

    /// Creates a cross-filter on a reference field, e.g. `release EQ {id EQ 1001}`.
    #[must_use]
    pub fn cross_filter(field: &str, subquery: &Self) -> Self {
        Self::simple(format!("{field} EQ {{{}}}", subquery.expression))
    }

    /// Combines two queries with a logical AND.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        let left = self.operand_for(Shape::And);
        let right = other.operand_for(Shape::And);
        Self {
            expression: format!("{left};{right}"),
            shape: Shape::And,
        }
    }

    /// Combines two queries with a logical OR.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        let left = self.operand_for(Shape::Or);
        let right = other.operand_for(Shape::Or);
        Self {
            expression: format!("{left}||{right}"),
            shape: Shape::Or,
        }
    }

    /// Negates the query.
    #[must_use]
    pub fn negate(self) -> Self {
        let inner = match self.shape {
            Shape::Simple => self.expression,
            Shape::And | Shape::Or => format!("({})", self.expression),
        };
        Self::simple(format!("!{inner}"))
    }

    /// Returns the rendered expression.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.expression
    }

    /// Wraps an expression as a simple query.
    const fn simple(expression: String) -> Self {
        Self {
            expression,
            shape: Shape::Simple,
        }
    }

    /// Returns the expression, parenthesized when its shape differs from `parent`.
    fn operand_for(self, parent: Shape) -> String {
        if self.shape == Shape::Simple || self.shape == parent {
            self.expression
        } else {
            format!("({})", self.expression)
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

/// Escapes backslashes and carets inside string literals.
fn escape_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch == '\\' || ch == '^' {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::Query;
    use super::QueryMethod;
    use super::QueryValue;

    #[test]
    fn statements_render_literals() {
        assert_eq!(Query::equal_to("name", "Login").as_str(), "name EQ ^Login^");
        assert_eq!(Query::statement("id", QueryMethod::GreaterThan, 1001_i64).as_str(), "id GT 1001");
        assert_eq!(Query::equal_to("blocked", true).as_str(), "blocked EQ true");
        assert_eq!(Query::equal_to("owner", QueryValue::Null).as_str(), "owner EQ null");
    }

    #[test]
    fn string_literals_are_escaped() {
        assert_eq!(Query::equal_to("name", r"a^b\c").as_str(), r"name EQ ^a\^b\\c^");
    }

    #[test]
    fn in_list_and_between() {
        assert_eq!(Query::in_list("name", ["defect", "story"]).as_str(), "name IN ^defect^,^story^");
        assert_eq!(Query::between("id", 1_i64, 9_i64).as_str(), "id BTW 1...9");
    }

    #[test]
    fn compound_expressions_parenthesize_mixed_operands() {
        let either = Query::equal_to("a", 1).or(Query::equal_to("b", 2));
        let both = either.and(Query::equal_to("c", 3));
        assert_eq!(both.as_str(), "(a EQ 1||b EQ 2);c EQ 3");
        let chained = Query::equal_to("a", 1).and(Query::equal_to("b", 2)).and(Query::equal_to("c", 3));
        assert_eq!(chained.as_str(), "a EQ 1;b EQ 2;c EQ 3");
    }

    #[test]
    fn negation_and_cross_filters() {
        assert_eq!(Query::equal_to("id", 5).negate().as_str(), "!id EQ 5");
        let sub = Query::equal_to("id", 1001);
        let cross = Query::cross_filter("release", &sub);
        assert_eq!(cross.as_str(), "release EQ {id EQ 1001}");
        let negated = Query::equal_to("a", 1).or(Query::equal_to("b", 2)).negate();
        assert_eq!(negated.as_str(), "!(a EQ 1||b EQ 2)");
    }
}
