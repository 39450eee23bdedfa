use metaforge_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Interaction mode of a CRUD controller.
///
/// No generic transition function is defined; transitions belong to the
/// hosting controller. The engine only needs membership tests when filtering
/// actions for dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrudState {
    /// A new entity is being captured.
    Create,
    /// Entities are being browsed.
    Read,
    /// An existing entity is being edited.
    Update,
    /// An entity is being removed.
    Delete,
}

impl CrudState {
    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Parses a transport value into a state.
    pub fn parse_transport(value: &str) -> AppResult<Self> {
        match value {
            "create" => Ok(Self::Create),
            "read" => Ok(Self::Read),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            _ => Err(AppError::Validation(format!(
                "unknown crud state '{value}'"
            ))),
        }
    }

    /// Returns every state in declaration order.
    #[must_use]
    pub fn all() -> &'static [CrudState] {
        &[Self::Create, Self::Read, Self::Update, Self::Delete]
    }

    /// Tests whether `current` is allowed by an applicability set.
    ///
    /// `None` or an empty set means "applicable in all states".
    #[must_use]
    pub fn applies(states: Option<&[CrudState]>, current: CrudState) -> bool {
        match states {
            None => true,
            Some(states) if states.is_empty() => true,
            Some(states) => states.contains(&current),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CrudState;

    #[test]
    fn unspecified_states_apply_everywhere() {
        assert!(CrudState::applies(None, CrudState::Delete));
        assert!(CrudState::applies(Some(&[]), CrudState::Create));
    }

    #[test]
    fn explicit_states_restrict_membership() {
        let states = [CrudState::Read, CrudState::Update];
        assert!(CrudState::applies(Some(&states), CrudState::Read));
        assert!(!CrudState::applies(Some(&states), CrudState::Delete));
    }

    #[test]
    fn transport_values_round_trip() {
        for state in CrudState::all() {
            let parsed = CrudState::parse_transport(state.as_str());
            assert_eq!(parsed.ok(), Some(*state));
        }
    }
}
