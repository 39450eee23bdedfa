use metaforge_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::PropertyPath;

/// A single declarative validation rule on a field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "rule", content = "limit")]
pub enum ConstraintRule {
    /// The value must be present and non-null.
    Required,
    /// Strings and arrays must contain at least one element.
    NotEmpty,
    /// Numeric values must be at least the limit.
    Min(f64),
    /// Numeric values must be at most the limit.
    Max(f64),
}

impl ConstraintRule {
    /// Checks one resolved value against this rule.
    ///
    /// Absent values only violate `Required`; the remaining rules pass when
    /// the field is missing so they compose with an explicit `Required`.
    #[must_use]
    pub fn check(&self, value: Option<&Value>) -> bool {
        match self {
            Self::Required => value.is_some(),
            Self::NotEmpty => match value {
                None => true,
                Some(Value::String(text)) => !text.trim().is_empty(),
                Some(Value::Array(items)) => !items.is_empty(),
                Some(_) => true,
            },
            Self::Min(limit) => match value.and_then(Value::as_f64) {
                None => value.is_none(),
                Some(number) => number >= *limit,
            },
            Self::Max(limit) => match value.and_then(Value::as_f64) {
                None => value.is_none(),
                Some(number) => number <= *limit,
            },
        }
    }

    fn describe(&self, field: &str) -> String {
        match self {
            Self::Required => format!("field '{field}' is required"),
            Self::NotEmpty => format!("field '{field}' must not be empty"),
            Self::Min(limit) => format!("field '{field}' must be at least {limit}"),
            Self::Max(limit) => format!("field '{field}' must be at most {limit}"),
        }
    }
}

/// All rules declared for one (possibly dotted) field of an entity class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConstraint {
    field: NonEmptyString,
    rules: Vec<ConstraintRule>,
}

impl FieldConstraint {
    /// Creates a constraint for a field, validating the path shape.
    pub fn new(field: impl Into<String>, rules: Vec<ConstraintRule>) -> AppResult<Self> {
        let field = NonEmptyString::new(field)?;
        PropertyPath::parse(field.as_str())?;

        Ok(Self { field, rules })
    }

    /// Returns the constrained field path.
    #[must_use]
    pub fn field(&self) -> &str {
        self.field.as_str()
    }

    /// Returns the declared rules in order.
    #[must_use]
    pub fn rules(&self) -> &[ConstraintRule] {
        &self.rules
    }
}

/// Validates a record against a constraint set.
///
/// Every violation is collected before reporting so callers see the full
/// picture in one round trip.
pub fn validate_record(record: &Value, constraints: &[FieldConstraint]) -> AppResult<()> {
    let mut violations = Vec::new();
    for constraint in constraints {
        let path = PropertyPath::parse(constraint.field())?;
        let value = path.resolve(record);
        for rule in constraint.rules() {
            if !rule.check(value) {
                violations.push(rule.describe(constraint.field()));
            }
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(violations.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ConstraintRule, FieldConstraint, validate_record};

    fn constraint(field: &str, rules: Vec<ConstraintRule>) -> FieldConstraint {
        FieldConstraint::new(field, rules).unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn required_rejects_missing_and_null() {
        let constraints = vec![constraint("name", vec![ConstraintRule::Required])];

        assert!(validate_record(&json!({}), &constraints).is_err());
        assert!(validate_record(&json!({"name": null}), &constraints).is_err());
        assert!(validate_record(&json!({"name": "x"}), &constraints).is_ok());
    }

    #[test]
    fn min_and_max_bound_numbers_inclusively() {
        let constraints = vec![constraint(
            "age",
            vec![ConstraintRule::Min(18.0), ConstraintRule::Max(65.0)],
        )];

        assert!(validate_record(&json!({"age": 18}), &constraints).is_ok());
        assert!(validate_record(&json!({"age": 65}), &constraints).is_ok());
        assert!(validate_record(&json!({"age": 17}), &constraints).is_err());
        assert!(validate_record(&json!({"age": 66}), &constraints).is_err());
    }

    #[test]
    fn not_empty_rejects_blank_strings_and_empty_arrays() {
        let constraints = vec![constraint("tags", vec![ConstraintRule::NotEmpty])];

        assert!(validate_record(&json!({"tags": []}), &constraints).is_err());
        assert!(validate_record(&json!({"tags": ["a"]}), &constraints).is_ok());

        let constraints = vec![constraint("name", vec![ConstraintRule::NotEmpty])];
        assert!(validate_record(&json!({"name": "  "}), &constraints).is_err());
    }

    #[test]
    fn all_violations_are_collected() {
        let constraints = vec![
            constraint("name", vec![ConstraintRule::Required]),
            constraint("age", vec![ConstraintRule::Min(0.0)]),
        ];

        let error = validate_record(&json!({"age": -1}), &constraints);
        let message = format!("{}", error.unwrap_err());
        assert!(message.contains("name"));
        assert!(message.contains("age"));
    }

    #[test]
    fn non_required_rules_pass_when_field_is_absent() {
        let constraints = vec![constraint("age", vec![ConstraintRule::Min(18.0)])];
        assert!(validate_record(&json!({}), &constraints).is_ok());
    }
}
