use std::collections::HashSet;
use std::str::FromStr;

use metaforge_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::FieldKind;

/// Supported view kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    /// Tabular listing view.
    Table,
    /// Single-record edit view.
    Form,
    /// Hierarchical tree view.
    Tree,
    /// Configuration view.
    Config,
}

impl ViewKind {
    /// Returns the stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Form => "form",
            Self::Tree => "tree",
            Self::Config => "config",
        }
    }
}

impl FromStr for ViewKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "table" => Ok(Self::Table),
            "form" => Ok(Self::Form),
            "tree" => Ok(Self::Tree),
            "config" => Ok(Self::Config),
            _ => Err(AppError::Validation(format!("unknown view kind '{value}'"))),
        }
    }
}

/// One displayable field inside a view descriptor.
///
/// A dotted name or an explicit `path` override denotes a property reached
/// through a to-one relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewField {
    name: NonEmptyString,
    label: Option<String>,
    path: Option<String>,
    kind: FieldKind,
    visible: bool,
}

impl ViewField {
    /// Creates a visible field with the given name and declared kind.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> AppResult<Self> {
        Ok(Self {
            name: NonEmptyString::new(name)?,
            label: None,
            path: None,
            kind,
            visible: true,
        })
    }

    /// Sets a human-friendly label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets a relation path override used by projection builders.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Marks the field as hidden.
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the optional label.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Returns the optional relation path override.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Returns the declared field kind.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Returns whether the field is rendered and projected.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

/// A declarative, ordered field list for one entity class and view kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewDescriptor {
    entity_class: NonEmptyString,
    kind: ViewKind,
    fields: Vec<ViewField>,
}

impl ViewDescriptor {
    /// Creates a descriptor, rejecting duplicate field names.
    pub fn new(
        entity_class: impl Into<String>,
        kind: ViewKind,
        fields: Vec<ViewField>,
    ) -> AppResult<Self> {
        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.name().to_owned()) {
                return Err(AppError::Validation(format!(
                    "duplicate view field '{}'",
                    field.name()
                )));
            }
        }

        Ok(Self {
            entity_class: NonEmptyString::new(entity_class)?,
            kind,
            fields,
        })
    }

    /// Returns the fully qualified target entity class name.
    #[must_use]
    pub fn entity_class(&self) -> &str {
        self.entity_class.as_str()
    }

    /// Returns the view kind.
    #[must_use]
    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    /// Returns all fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[ViewField] {
        &self.fields
    }

    /// Iterates visible fields in declaration order.
    pub fn visible_fields(&self) -> impl Iterator<Item = &ViewField> {
        self.fields.iter().filter(|field| field.is_visible())
    }
}
