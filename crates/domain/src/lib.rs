//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod constraint;
mod filter;
mod navigation;
mod parameter;
mod property;
mod query;
mod state;
mod view;

pub use constraint::{ConstraintRule, FieldConstraint, validate_record};
pub use filter::{FieldKind, applicable_operators};
pub use navigation::{Module, NavigationElement, Page, PageGroup};
pub use parameter::Parameter;
pub use property::PropertyPath;
pub use query::{
    ConditionOperator, QueryCondition, QueryParameters, QuerySort, SortDirection, compare_values,
};
pub use state::CrudState;
pub use view::{ViewDescriptor, ViewField, ViewKind};
