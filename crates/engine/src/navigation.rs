use std::sync::Arc;

use metaforge_core::{AppError, AppResult};
use metaforge_domain::{Module, NavigationElement, Page};

/// Contributes navigation modules at installation time.
pub trait ModuleProvider: Send + Sync {
    /// Returns the contributed modules.
    fn modules(&self) -> Vec<Module>;
}

/// Holds every installed module and resolves pages by path.
///
/// Installing a module whose id is already present merges the newcomer's
/// page groups into the existing module instead of replacing it, so several
/// providers can contribute to one logical module.
#[derive(Debug, Clone, Default)]
pub struct ModuleContainer {
    modules: Vec<Module>,
}

impl ModuleContainer {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs one module, merging on id collision.
    pub fn install_module(&mut self, module: Module) -> &mut Self {
        match self
            .modules
            .iter_mut()
            .find(|existing| existing.id() == module.id())
        {
            Some(existing) => existing.merge_from(module),
            None => self.modules.push(module),
        }
        self
    }

    /// Installs every module contributed by a provider.
    pub fn install(&mut self, provider: &dyn ModuleProvider) -> &mut Self {
        for module in provider.modules() {
            self.install_module(module);
        }
        self
    }

    /// Returns installed modules ordered by position then id.
    #[must_use]
    pub fn modules(&self) -> Vec<&Module> {
        let mut modules: Vec<&Module> = self.modules.iter().collect();
        modules.sort_by(|a, b| a.position().cmp(&b.position()).then_with(|| a.id().cmp(b.id())));
        modules
    }

    /// Finds a module by id.
    #[must_use]
    pub fn find_module(&self, id: &str) -> Option<&Module> {
        self.modules.iter().find(|module| module.id() == id)
    }

    /// Resolves a page by its full virtual path.
    pub fn find_page(&self, virtual_path: &str) -> AppResult<&Page> {
        self.modules
            .iter()
            .find_map(|module| module.find_page(virtual_path))
            .ok_or_else(|| AppError::PageNotFound(virtual_path.to_owned()))
    }

    /// Resolves a page by its full pretty virtual path.
    pub fn find_page_by_pretty_path(&self, pretty_path: &str) -> AppResult<&Page> {
        self.modules
            .iter()
            .find_map(|module| module.find_page_by_pretty_path(pretty_path))
            .ok_or_else(|| AppError::PageNotFound(pretty_path.to_owned()))
    }
}

/// One vote on whether a navigation element may be shown.
pub trait NavigationRestriction: Send + Sync {
    /// Evaluation order; lower runs first.
    fn order(&self) -> i32;

    /// Returns `Some(allowed)` to decide, or `None` to abstain.
    fn allows(&self, element: &dyn NavigationElement) -> Option<bool>;
}

/// Hides elements flagged as not visible. Runs last so explicit grants from
/// other restrictions win.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVisibleRestriction;

impl NavigationRestriction for NoVisibleRestriction {
    fn order(&self) -> i32 {
        i32::MAX
    }

    fn allows(&self, element: &dyn NavigationElement) -> Option<bool> {
        if element.is_visible() { None } else { Some(false) }
    }
}

/// Ordered chain of restrictions; the first non-abstaining vote wins.
#[derive(Clone, Default)]
pub struct NavigationRestrictions {
    restrictions: Vec<Arc<dyn NavigationRestriction>>,
}

impl NavigationRestrictions {
    /// Creates an empty chain that allows everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a chain pre-loaded with the built-in visibility check.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut restrictions = Self::new();
        restrictions.add(Arc::new(NoVisibleRestriction));
        restrictions
    }

    /// Adds a restriction, keeping the chain sorted by ascending order.
    pub fn add(&mut self, restriction: Arc<dyn NavigationRestriction>) -> &mut Self {
        self.restrictions.push(restriction);
        self.restrictions
            .sort_by_key(|restriction| restriction.order());
        self
    }

    /// Evaluates the chain; elements nobody vetoes are allowed.
    #[must_use]
    pub fn allows(&self, element: &dyn NavigationElement) -> bool {
        for restriction in &self.restrictions {
            if let Some(decision) = restriction.allows(element) {
                return decision;
            }
        }
        true
    }

    /// Evaluates the chain and reports a veto as an error.
    pub fn check(&self, element: &dyn NavigationElement) -> AppResult<()> {
        if self.allows(element) {
            Ok(())
        } else {
            Err(AppError::NavigationNotAllowed(
                element.virtual_path().to_owned(),
            ))
        }
    }
}
