use std::collections::HashMap;
use std::sync::Arc;

use metaforge_core::{AppError, AppResult, NonEmptyString, kebab_case};
use metaforge_domain::CrudState;
use serde_json::Value;

/// Marker for a UI-layer widget that renders an action trigger.
///
/// The engine never interprets renderers; it only carries them from
/// registration to the hosting view layer.
pub trait ActionRenderer: Send + Sync {}

/// Invocation context handed to an executing action.
#[derive(Debug, Clone, Default)]
pub struct ActionEvent {
    data: Option<Value>,
    params: HashMap<String, Value>,
}

impl ActionEvent {
    /// Creates an event around the currently selected record, if any.
    #[must_use]
    pub fn new(data: Option<Value>) -> Self {
        Self {
            data,
            params: HashMap::new(),
        }
    }

    /// Attaches a named parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: Value) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    /// Returns the selected record.
    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Returns a named parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }
}

/// A user-triggerable operation attached to CRUD views.
pub trait Action: Send + Sync {
    /// Display name of the action.
    fn name(&self) -> &str;

    /// Stable identifier, the kebab-case form of the name by default.
    fn id(&self) -> String {
        kebab_case(self.name())
    }

    /// Optional longer description.
    fn description(&self) -> Option<&str> {
        None
    }

    /// Optional icon or image hint for the hosting UI layer.
    fn image(&self) -> Option<&str> {
        None
    }

    /// Ordering position among sibling actions.
    fn position(&self) -> i32 {
        0
    }

    /// Optional renderer override; `None` means the host's default trigger.
    fn renderer(&self) -> Option<Arc<dyn ActionRenderer>> {
        None
    }

    /// Entity class this action applies to; `None` means every class.
    fn applicable_class(&self) -> Option<&str> {
        None
    }

    /// CRUD states this action applies in; `None` or empty means all.
    fn applicable_states(&self) -> Option<&[CrudState]> {
        None
    }

    /// Runs the action.
    fn execute(&self, event: &ActionEvent) -> AppResult<()>;
}

type ActionHandler = dyn Fn(&ActionEvent) -> AppResult<()> + Send + Sync;

/// Closure-backed [`Action`] for registering behavior without a dedicated
/// type per action.
#[derive(Clone)]
pub struct FastAction {
    name: NonEmptyString,
    description: Option<String>,
    image: Option<String>,
    position: i32,
    renderer: Option<Arc<dyn ActionRenderer>>,
    applicable_class: Option<String>,
    applicable_states: Option<Vec<CrudState>>,
    handler: Arc<ActionHandler>,
}

impl FastAction {
    /// Creates an action from a name and a handler closure.
    pub fn new(
        name: impl Into<String>,
        handler: impl Fn(&ActionEvent) -> AppResult<()> + Send + Sync + 'static,
    ) -> AppResult<Self> {
        Ok(Self {
            name: NonEmptyString::new(name)?,
            description: None,
            image: None,
            position: 0,
            renderer: None,
            applicable_class: None,
            applicable_states: None,
            handler: Arc::new(handler),
        })
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the icon or image hint.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Sets the ordering position.
    #[must_use]
    pub fn with_position(mut self, position: i32) -> Self {
        self.position = position;
        self
    }

    /// Sets a renderer override.
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn ActionRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Restricts the action to one entity class.
    #[must_use]
    pub fn for_class(mut self, class_name: impl Into<String>) -> Self {
        self.applicable_class = Some(class_name.into());
        self
    }

    /// Restricts the action to the given states.
    #[must_use]
    pub fn in_states(mut self, states: Vec<CrudState>) -> Self {
        self.applicable_states = Some(states);
        self
    }
}

impl Action for FastAction {
    fn name(&self) -> &str {
        self.name.as_str()
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    fn position(&self) -> i32 {
        self.position
    }

    fn renderer(&self) -> Option<Arc<dyn ActionRenderer>> {
        self.renderer.clone()
    }

    fn applicable_class(&self) -> Option<&str> {
        self.applicable_class.as_deref()
    }

    fn applicable_states(&self) -> Option<&[CrudState]> {
        self.applicable_states.as_deref()
    }

    fn execute(&self, event: &ActionEvent) -> AppResult<()> {
        (self.handler)(event)
    }
}

/// Contributes a batch of actions at registration time.
///
/// Providers replace per-action wiring: a module implements one provider
/// and hands all of its commands to the registry in one call.
pub trait ActionCommandProvider: Send + Sync {
    /// Returns the contributed actions.
    fn action_commands(&self) -> Vec<Arc<dyn Action>>;
}

/// Registry of all known actions with eligibility filtering and dispatch.
#[derive(Clone, Default)]
pub struct ActionRegistry {
    actions: Vec<Arc<dyn Action>>,
}

impl ActionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a single action.
    pub fn register(&mut self, action: Arc<dyn Action>) -> &mut Self {
        self.actions.push(action);
        self
    }

    /// Registers every action contributed by a provider.
    pub fn register_commands(&mut self, provider: &dyn ActionCommandProvider) -> &mut Self {
        for action in provider.action_commands() {
            self.register(action);
        }
        self
    }

    /// Returns every registered action.
    #[must_use]
    pub fn all(&self) -> &[Arc<dyn Action>] {
        &self.actions
    }

    /// Finds an action by display name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<Arc<dyn Action>> {
        self.actions
            .iter()
            .find(|action| action.name() == name)
            .cloned()
    }

    /// Returns the actions applicable to a class in a state, ordered by
    /// position then name.
    #[must_use]
    pub fn eligible(&self, class_name: &str, state: CrudState) -> Vec<Arc<dyn Action>> {
        let mut eligible: Vec<Arc<dyn Action>> = self
            .actions
            .iter()
            .filter(|action| {
                action
                    .applicable_class()
                    .is_none_or(|class| class == class_name)
                    && CrudState::applies(action.applicable_states(), state)
            })
            .cloned()
            .collect();

        eligible.sort_by(|a, b| {
            a.position()
                .cmp(&b.position())
                .then_with(|| a.name().cmp(b.name()))
        });
        eligible
    }

    /// Executes every eligible action for the event.
    ///
    /// Validation failures do not stop later actions; their messages are
    /// collected and reported together. Any other error aborts dispatch
    /// immediately.
    pub fn dispatch_all(
        &self,
        class_name: &str,
        state: CrudState,
        event: &ActionEvent,
    ) -> AppResult<()> {
        let mut failures = Vec::new();
        for action in self.eligible(class_name, state) {
            match action.execute(event) {
                Ok(()) => {}
                Err(AppError::Validation(message)) => failures.push(message),
                Err(other) => return Err(other),
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(failures.join("; ")))
        }
    }
}
