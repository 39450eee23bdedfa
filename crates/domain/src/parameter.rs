use metaforge_core::{AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted application setting addressed by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    id: Uuid,
    name: NonEmptyString,
    value: String,
    description: Option<String>,
    cacheable: bool,
}

impl Parameter {
    /// Creates a cacheable parameter with a fresh id.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            name: NonEmptyString::new(name)?,
            value: value.into(),
            description: None,
            cacheable: true,
        })
    }

    /// Sets a human-friendly description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Opts the parameter out of read-through caching.
    #[must_use]
    pub fn not_cacheable(mut self) -> Self {
        self.cacheable = false;
        self
    }

    /// Returns the unique id.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the lookup name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the stored value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replaces the stored value.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// Returns the optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns whether reads may be served from cache.
    #[must_use]
    pub fn is_cacheable(&self) -> bool {
        self.cacheable
    }
}

#[cfg(test)]
mod tests {
    use super::Parameter;

    #[test]
    fn parameters_default_to_cacheable() {
        let parameter = Parameter::new("smtp.host", "mail.local").unwrap_or_else(|_| unreachable!());

        assert!(parameter.is_cacheable());
        assert_eq!(parameter.value(), "mail.local");
    }

    #[test]
    fn cacheability_can_be_opted_out() {
        let parameter = Parameter::new("token", "abc")
            .unwrap_or_else(|_| unreachable!())
            .not_cacheable();

        assert!(!parameter.is_cacheable());
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(Parameter::new("  ", "x").is_err());
    }
}
