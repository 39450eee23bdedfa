use std::cmp::Ordering;

use chrono::NaiveDate;
use metaforge_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::PropertyPath;

/// Comparison operator tags for query conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    /// Equality comparison.
    Equals,
    /// Inequality comparison.
    NotEquals,
    /// Membership in a set of values.
    InList,
    /// Exclusion from a set of values.
    NotInList,
    /// Case-insensitive `%`-wildcard text match.
    Like,
    /// Value is missing or null.
    IsNull,
    /// Value is present and not null.
    IsNotNull,
    /// Inclusive range between two operands.
    Range,
    /// Greater-than comparison.
    GreaterThan,
    /// Greater-than-or-equal comparison.
    GreaterOrEquals,
    /// Less-than comparison.
    LessThan,
    /// Less-than-or-equal comparison.
    LessOrEquals,
}

impl ConditionOperator {
    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "eq",
            Self::NotEquals => "neq",
            Self::InList => "in",
            Self::NotInList => "not_in",
            Self::Like => "like",
            Self::IsNull => "is_null",
            Self::IsNotNull => "is_not_null",
            Self::Range => "between",
            Self::GreaterThan => "gt",
            Self::GreaterOrEquals => "gte",
            Self::LessThan => "lt",
            Self::LessOrEquals => "lte",
        }
    }

    /// Parses a transport value into an operator.
    pub fn parse_transport(value: &str) -> AppResult<Self> {
        match value {
            "eq" => Ok(Self::Equals),
            "neq" => Ok(Self::NotEquals),
            "in" => Ok(Self::InList),
            "not_in" => Ok(Self::NotInList),
            "like" => Ok(Self::Like),
            "is_null" => Ok(Self::IsNull),
            "is_not_null" => Ok(Self::IsNotNull),
            "between" => Ok(Self::Range),
            "gt" => Ok(Self::GreaterThan),
            "gte" => Ok(Self::GreaterOrEquals),
            "lt" => Ok(Self::LessThan),
            "lte" => Ok(Self::LessOrEquals),
            _ => Err(AppError::Validation(format!(
                "unknown condition operator '{value}'"
            ))),
        }
    }
}

/// A typed filter condition carrying its operands.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryCondition {
    /// Value equals the operand.
    Equals(Value),
    /// Value differs from the operand.
    NotEquals(Value),
    /// Value is one of the operands.
    InList(Vec<Value>),
    /// Value is none of the operands.
    NotInList(Vec<Value>),
    /// Text value matches a `%`-wildcard pattern, case-insensitively.
    Like(String),
    /// Value is missing or null.
    IsNull,
    /// Value is present and not null.
    IsNotNull,
    /// Value lies inclusively between the two operands.
    Range(Value, Value),
    /// Value is greater than the operand.
    GreaterThan(Value),
    /// Value is greater than or equal to the operand.
    GreaterOrEquals(Value),
    /// Value is less than the operand.
    LessThan(Value),
    /// Value is less than or equal to the operand.
    LessOrEquals(Value),
}

impl QueryCondition {
    /// Creates an equality condition.
    #[must_use]
    pub fn eq(value: impl Into<Value>) -> Self {
        Self::Equals(value.into())
    }

    /// Creates an inequality condition.
    #[must_use]
    pub fn neq(value: impl Into<Value>) -> Self {
        Self::NotEquals(value.into())
    }

    /// Creates a membership condition.
    #[must_use]
    pub fn in_list(values: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Self::InList(values.into_iter().map(Into::into).collect())
    }

    /// Creates an exclusion condition.
    #[must_use]
    pub fn not_in_list(values: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Self::NotInList(values.into_iter().map(Into::into).collect())
    }

    /// Creates a wildcard text condition.
    #[must_use]
    pub fn like(pattern: impl Into<String>) -> Self {
        Self::Like(pattern.into())
    }

    /// Creates an inclusive range condition.
    #[must_use]
    pub fn between(lower: impl Into<Value>, upper: impl Into<Value>) -> Self {
        Self::Range(lower.into(), upper.into())
    }

    /// Creates a greater-than condition.
    #[must_use]
    pub fn gt(value: impl Into<Value>) -> Self {
        Self::GreaterThan(value.into())
    }

    /// Creates a greater-than-or-equal condition.
    #[must_use]
    pub fn gte(value: impl Into<Value>) -> Self {
        Self::GreaterOrEquals(value.into())
    }

    /// Creates a less-than condition.
    #[must_use]
    pub fn lt(value: impl Into<Value>) -> Self {
        Self::LessThan(value.into())
    }

    /// Creates a less-than-or-equal condition.
    #[must_use]
    pub fn lte(value: impl Into<Value>) -> Self {
        Self::LessOrEquals(value.into())
    }

    /// Creates an inclusive range condition over ISO-8601 dates.
    #[must_use]
    pub fn date_between(lower: NaiveDate, upper: NaiveDate) -> Self {
        Self::Range(
            Value::String(lower.to_string()),
            Value::String(upper.to_string()),
        )
    }

    /// Creates a greater-than-or-equal condition over an ISO-8601 date.
    #[must_use]
    pub fn date_from(lower: NaiveDate) -> Self {
        Self::GreaterOrEquals(Value::String(lower.to_string()))
    }

    /// Creates a less-than-or-equal condition over an ISO-8601 date.
    #[must_use]
    pub fn date_until(upper: NaiveDate) -> Self {
        Self::LessOrEquals(Value::String(upper.to_string()))
    }

    /// Builds a condition from a transport operator and its operands.
    ///
    /// Operand arity must match the operator tag; a mismatch is a programmer
    /// error surfaced as [`AppError::InvalidConditionArity`].
    pub fn from_operands(operator: ConditionOperator, operands: Vec<Value>) -> AppResult<Self> {
        let operand_count = operands.len();
        let arity_error = |expected: &str| {
            AppError::InvalidConditionArity(format!(
                "operator '{}' requires {expected} operand(s), got {operand_count}",
                operator.as_str(),
            ))
        };

        match operator {
            ConditionOperator::IsNull | ConditionOperator::IsNotNull => {
                if !operands.is_empty() {
                    return Err(arity_error("zero"));
                }
                Ok(match operator {
                    ConditionOperator::IsNull => Self::IsNull,
                    _ => Self::IsNotNull,
                })
            }
            ConditionOperator::Range => {
                let mut operands = operands;
                if operands.len() != 2 {
                    return Err(arity_error("exactly two"));
                }
                let upper = operands.remove(1);
                let lower = operands.remove(0);
                Ok(Self::Range(lower, upper))
            }
            ConditionOperator::InList | ConditionOperator::NotInList => {
                if operands.is_empty() {
                    return Err(arity_error("at least one"));
                }
                Ok(match operator {
                    ConditionOperator::InList => Self::InList(operands),
                    _ => Self::NotInList(operands),
                })
            }
            ConditionOperator::Like => {
                let mut operands = operands;
                if operands.len() != 1 {
                    return Err(arity_error("exactly one"));
                }
                match operands.remove(0) {
                    Value::String(pattern) => Ok(Self::Like(pattern)),
                    other => Err(AppError::Validation(format!(
                        "like operand must be a string, got {other}"
                    ))),
                }
            }
            _ => {
                let mut operands = operands;
                if operands.len() != 1 {
                    return Err(arity_error("exactly one"));
                }
                let operand = operands.remove(0);
                Ok(match operator {
                    ConditionOperator::Equals => Self::Equals(operand),
                    ConditionOperator::NotEquals => Self::NotEquals(operand),
                    ConditionOperator::GreaterThan => Self::GreaterThan(operand),
                    ConditionOperator::GreaterOrEquals => Self::GreaterOrEquals(operand),
                    ConditionOperator::LessThan => Self::LessThan(operand),
                    _ => Self::LessOrEquals(operand),
                })
            }
        }
    }

    /// Returns the operator tag for this condition.
    #[must_use]
    pub fn operator(&self) -> ConditionOperator {
        match self {
            Self::Equals(_) => ConditionOperator::Equals,
            Self::NotEquals(_) => ConditionOperator::NotEquals,
            Self::InList(_) => ConditionOperator::InList,
            Self::NotInList(_) => ConditionOperator::NotInList,
            Self::Like(_) => ConditionOperator::Like,
            Self::IsNull => ConditionOperator::IsNull,
            Self::IsNotNull => ConditionOperator::IsNotNull,
            Self::Range(_, _) => ConditionOperator::Range,
            Self::GreaterThan(_) => ConditionOperator::GreaterThan,
            Self::GreaterOrEquals(_) => ConditionOperator::GreaterOrEquals,
            Self::LessThan(_) => ConditionOperator::LessThan,
            Self::LessOrEquals(_) => ConditionOperator::LessOrEquals,
        }
    }

    /// Evaluates this condition against a resolved candidate value.
    ///
    /// Value-comparing operators fail on a missing or null candidate; only
    /// `IsNull` treats that case as a match.
    #[must_use]
    pub fn matches(&self, candidate: Option<&Value>) -> bool {
        let present = candidate.filter(|value| !value.is_null());

        match self {
            Self::IsNull => present.is_none(),
            Self::IsNotNull => present.is_some(),
            Self::Equals(expected) => {
                present.map(|value| values_equal(value, expected)) == Some(true)
            }
            Self::NotEquals(expected) => {
                present.map(|value| !values_equal(value, expected)) == Some(true)
            }
            Self::InList(expected) => present
                .map(|value| expected.iter().any(|entry| values_equal(value, entry)))
                == Some(true),
            Self::NotInList(expected) => present
                .map(|value| !expected.iter().any(|entry| values_equal(value, entry)))
                == Some(true),
            Self::Like(pattern) => present
                .and_then(Value::as_str)
                .map(|text| like_matches(pattern, text))
                == Some(true),
            Self::Range(lower, upper) => present
                .map(|value| {
                    compare_values(value, lower)
                        .map(Ordering::is_ge)
                        .unwrap_or(false)
                        && compare_values(value, upper)
                            .map(Ordering::is_le)
                            .unwrap_or(false)
                })
                == Some(true),
            Self::GreaterThan(expected) => ordering_matches(present, expected, Ordering::is_gt),
            Self::GreaterOrEquals(expected) => ordering_matches(present, expected, Ordering::is_ge),
            Self::LessThan(expected) => ordering_matches(present, expected, Ordering::is_lt),
            Self::LessOrEquals(expected) => ordering_matches(present, expected, Ordering::is_le),
        }
    }
}

fn ordering_matches(
    candidate: Option<&Value>,
    expected: &Value,
    accepts: fn(Ordering) -> bool,
) -> bool {
    candidate
        .and_then(|value| compare_values(value, expected))
        .map(accepts)
        == Some(true)
}

/// Compares two JSON values when they share an orderable shape.
///
/// Numbers compare numerically, strings lexicographically (which covers
/// ISO-8601 dates), booleans false-before-true. Mixed shapes are unordered.
#[must_use]
pub fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64().partial_cmp(&b.as_f64()),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}

fn like_matches(pattern: &str, text: &str) -> bool {
    let pattern = pattern.to_lowercase();
    let text = text.to_lowercase();

    if !pattern.contains('%') {
        return pattern == text;
    }

    let starts_anchored = !pattern.starts_with('%');
    let ends_anchored = !pattern.ends_with('%');
    let parts: Vec<&str> = pattern.split('%').filter(|part| !part.is_empty()).collect();

    if parts.is_empty() {
        return true;
    }

    let mut cursor = 0usize;
    for (index, part) in parts.iter().enumerate() {
        if index == 0 && starts_anchored {
            if !text.starts_with(part) {
                return false;
            }
            cursor = part.len();
            continue;
        }

        match text[cursor..].find(part) {
            Some(position) => cursor += position + part.len(),
            None => return false,
        }
    }

    if ends_anchored {
        return text.ends_with(parts[parts.len() - 1]);
    }

    true
}

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

impl SortDirection {
    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Sort instruction applied to query results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySort {
    field: String,
    direction: SortDirection,
}

impl QuerySort {
    /// Creates a sort instruction.
    #[must_use]
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Returns the sorted field path.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns the sort direction.
    #[must_use]
    pub fn direction(&self) -> SortDirection {
        self.direction
    }
}

/// An ordered mapping from field paths to filter conditions.
///
/// Insertion order is preserved and defines the priority order used by query
/// builders. Adding a condition under an existing name overwrites it in
/// place without disturbing that order.
#[derive(Debug, Clone, Default)]
pub struct QueryParameters {
    entries: Vec<(String, QueryCondition)>,
    sort: Option<QuerySort>,
    max_results: Option<usize>,
    offset: usize,
}

impl QueryParameters {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a parameter set with a single condition.
    #[must_use]
    pub fn with(name: impl Into<String>, condition: QueryCondition) -> Self {
        let mut parameters = Self::new();
        parameters.add(name, condition);
        parameters
    }

    /// Inserts or overwrites the condition registered under `name`.
    pub fn add(&mut self, name: impl Into<String>, condition: QueryCondition) -> &mut Self {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = condition,
            None => self.entries.push((name, condition)),
        }
        self
    }

    /// Returns whether a condition is registered under `name`.
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.entries.iter().any(|(existing, _)| existing == name)
    }

    /// Returns the condition registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&QueryCondition> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, condition)| condition)
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryCondition)> {
        self.entries
            .iter()
            .map(|(name, condition)| (name.as_str(), condition))
    }

    /// Returns whether no conditions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of registered conditions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Sets the sort instruction for query results.
    pub fn order_by(&mut self, field: impl Into<String>, direction: SortDirection) -> &mut Self {
        self.sort = Some(QuerySort::new(field, direction));
        self
    }

    /// Caps the number of returned rows.
    pub fn paginate(&mut self, max_results: usize) -> &mut Self {
        self.max_results = Some(max_results);
        self
    }

    /// Skips the first `offset` matching rows.
    pub fn skip(&mut self, offset: usize) -> &mut Self {
        self.offset = offset;
        self
    }

    /// Returns the optional sort instruction.
    #[must_use]
    pub fn sort(&self) -> Option<&QuerySort> {
        self.sort.as_ref()
    }

    /// Returns the optional row cap.
    #[must_use]
    pub fn max_results(&self) -> Option<usize> {
        self.max_results
    }

    /// Returns the pagination offset.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Evaluates every condition against a JSON record with AND semantics.
    ///
    /// Field paths resolve through nested objects at arbitrary depth; a
    /// missing or null intermediate makes that condition fail the match,
    /// never an error.
    #[must_use]
    pub fn matches_record(&self, record: &Value) -> bool {
        self.entries.iter().all(|(name, condition)| {
            let resolved = PropertyPath::parse(name)
                .ok()
                .and_then(|path| path.resolve(record).cloned());
            condition.matches(resolved.as_ref())
        })
    }
}
