use std::str::FromStr;

use metaforge_core::AppError;
use serde::{Deserialize, Serialize};

use crate::ConditionOperator;

/// Declared kind of a filterable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// UTF-8 string field.
    Text,
    /// Numeric field.
    Number,
    /// Boolean field.
    Boolean,
    /// Date-only field, ISO-8601 string.
    Date,
    /// Date-time field, ISO-8601 string.
    DateTime,
    /// Closed set of named values.
    Enum,
    /// Many-to-one entity reference.
    Reference,
    /// Arbitrary JSON payload.
    Json,
}

impl FieldKind {
    /// Returns the stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Enum => "enum",
            Self::Reference => "reference",
            Self::Json => "json",
        }
    }
}

impl FromStr for FieldKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "text" => Ok(Self::Text),
            "number" => Ok(Self::Number),
            "boolean" => Ok(Self::Boolean),
            "date" => Ok(Self::Date),
            "datetime" => Ok(Self::DateTime),
            "enum" => Ok(Self::Enum),
            "reference" => Ok(Self::Reference),
            "json" => Ok(Self::Json),
            _ => Err(AppError::Validation(format!(
                "unknown field kind '{value}'"
            ))),
        }
    }
}

const TEXT_OPERATORS: &[ConditionOperator] = &[
    ConditionOperator::Equals,
    ConditionOperator::NotEquals,
    ConditionOperator::Like,
    ConditionOperator::IsNull,
    ConditionOperator::IsNotNull,
];

const ORDERED_OPERATORS: &[ConditionOperator] = &[
    ConditionOperator::Equals,
    ConditionOperator::NotEquals,
    ConditionOperator::Range,
    ConditionOperator::GreaterThan,
    ConditionOperator::GreaterOrEquals,
    ConditionOperator::LessThan,
    ConditionOperator::LessOrEquals,
    ConditionOperator::IsNull,
    ConditionOperator::IsNotNull,
];

const BOOLEAN_OPERATORS: &[ConditionOperator] = &[ConditionOperator::Equals];

const ENUM_OPERATORS: &[ConditionOperator] = &[
    ConditionOperator::Equals,
    ConditionOperator::NotEquals,
    ConditionOperator::InList,
];

const REFERENCE_OPERATORS: &[ConditionOperator] =
    &[ConditionOperator::Equals, ConditionOperator::InList];

/// Returns the fixed, ordered set of operators applicable to a field kind.
///
/// Pure function with no error path; kinds that cannot be filtered (raw JSON
/// payloads) return an empty slice and callers must treat that as "no
/// filtering available".
#[must_use]
pub fn applicable_operators(kind: FieldKind) -> &'static [ConditionOperator] {
    match kind {
        FieldKind::Text => TEXT_OPERATORS,
        FieldKind::Number | FieldKind::Date | FieldKind::DateTime => ORDERED_OPERATORS,
        FieldKind::Boolean => BOOLEAN_OPERATORS,
        FieldKind::Enum => ENUM_OPERATORS,
        FieldKind::Reference => REFERENCE_OPERATORS,
        FieldKind::Json => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldKind, applicable_operators};
    use crate::ConditionOperator;

    #[test]
    fn reference_fields_expose_exactly_equals_then_in_list() {
        let operators = applicable_operators(FieldKind::Reference);

        assert_eq!(operators.len(), 2);
        assert_eq!(operators[0], ConditionOperator::Equals);
        assert_eq!(operators[1], ConditionOperator::InList);
    }

    #[test]
    fn boolean_fields_only_support_equality() {
        assert_eq!(
            applicable_operators(FieldKind::Boolean),
            &[ConditionOperator::Equals]
        );
    }

    #[test]
    fn ordered_kinds_include_range_operators() {
        for kind in [FieldKind::Number, FieldKind::Date, FieldKind::DateTime] {
            let operators = applicable_operators(kind);
            assert!(operators.contains(&ConditionOperator::Range));
            assert!(operators.contains(&ConditionOperator::GreaterThan));
        }
    }

    #[test]
    fn json_fields_cannot_be_filtered() {
        assert!(applicable_operators(FieldKind::Json).is_empty());
    }
}
