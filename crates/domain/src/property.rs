use metaforge_core::{AppError, AppResult};
use serde_json::Value;

/// A parsed dotted property path over nested JSON records.
///
/// Paths are parsed once and reused; resolution walks the object graph and
/// reports "no value" on a missing key or a null intermediate instead of
/// failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPath {
    raw: String,
    segments: Vec<String>,
}

impl PropertyPath {
    /// Parses a dotted path, rejecting empty or blank segments.
    pub fn parse(raw: impl Into<String>) -> AppResult<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(AppError::Validation(
                "property path must not be empty".to_owned(),
            ));
        }

        let segments: Vec<String> = raw.split('.').map(str::to_owned).collect();
        if segments.iter().any(|segment| segment.trim().is_empty()) {
            return Err(AppError::Validation(format!(
                "property path '{raw}' contains an empty segment"
            )));
        }

        Ok(Self { raw, segments })
    }

    /// Returns the original dotted path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the path segments in order.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns the path with dots replaced by underscores.
    ///
    /// Used for projection column aliases and bind-parameter names.
    #[must_use]
    pub fn alias(&self) -> String {
        self.raw.replace('.', "_")
    }

    /// Resolves the path against a JSON record.
    ///
    /// Returns `None` when any segment is missing or a non-terminal segment
    /// resolves to null or a non-object.
    #[must_use]
    pub fn resolve<'a>(&self, record: &'a Value) -> Option<&'a Value> {
        let mut current = record;
        for segment in &self.segments {
            current = current.as_object()?.get(segment)?;
            if current.is_null() {
                return None;
            }
        }

        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::PropertyPath;

    #[test]
    fn resolves_nested_objects() {
        let record = json!({"customer": {"address": {"city": "Bogota"}}});
        let path = PropertyPath::parse("customer.address.city").unwrap_or_else(|_| unreachable!());

        assert_eq!(path.resolve(&record), Some(&json!("Bogota")));
    }

    #[test]
    fn null_intermediate_yields_no_value() {
        let record = json!({"customer": null});
        let path = PropertyPath::parse("customer.name").unwrap_or_else(|_| unreachable!());

        assert_eq!(path.resolve(&record), None);
    }

    #[test]
    fn missing_key_yields_no_value() {
        let record = json!({"name": "x"});
        let path = PropertyPath::parse("age").unwrap_or_else(|_| unreachable!());

        assert_eq!(path.resolve(&record), None);
    }

    #[test]
    fn rejects_blank_segments() {
        assert!(PropertyPath::parse("a..b").is_err());
        assert!(PropertyPath::parse("").is_err());
    }

    #[test]
    fn alias_replaces_dots() {
        let path = PropertyPath::parse("subentity.name").unwrap_or_else(|_| unreachable!());
        assert_eq!(path.alias(), "subentity_name");
    }
}
