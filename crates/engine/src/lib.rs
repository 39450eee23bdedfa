//! Engine services and ports.

#![forbid(unsafe_code)]

mod actions;
mod crud;
mod navigation;
mod parameters;
mod projection;

pub use actions::{
    Action, ActionCommandProvider, ActionEvent, ActionRegistry, ActionRenderer, FastAction,
};
pub use crud::{CrudEventKind, CrudListener, CrudService, CrudServiceExt, Entity, TransactionWork};
pub use navigation::{
    ModuleContainer, ModuleProvider, NavigationRestriction, NavigationRestrictions,
    NoVisibleRestriction,
};
pub use parameters::{ParameterRepository, ParameterService};
pub use projection::QueryProjectionBuilder;
