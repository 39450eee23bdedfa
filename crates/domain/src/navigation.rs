use metaforge_core::{AppResult, NonEmptyString, kebab_case};
use serde::{Deserialize, Serialize};

/// Common surface of every node in the navigation tree.
pub trait NavigationElement {
    /// Stable id, unique within the parent's namespace.
    fn id(&self) -> &str;
    /// Human-friendly display name.
    fn name(&self) -> &str;
    /// `/`-joined id chain from the root module to this node.
    fn virtual_path(&self) -> &str;
    /// `/`-joined kebab-case display-name chain from the root module.
    fn pretty_virtual_path(&self) -> &str;
    /// Whether the node should be rendered in navigation menus.
    fn is_visible(&self) -> bool;
}

/// A navigable leaf pointing at a rendering path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    id: NonEmptyString,
    name: NonEmptyString,
    render_path: Option<String>,
    position: i32,
    visible: bool,
    virtual_path: String,
    pretty_virtual_path: String,
}

impl Page {
    /// Creates a visible page. Virtual paths are finalized on attachment.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> AppResult<Self> {
        let id = NonEmptyString::new(id)?;
        let name = NonEmptyString::new(name)?;
        let virtual_path = id.as_str().to_owned();
        let pretty_virtual_path = kebab_case(name.as_str());

        Ok(Self {
            id,
            name,
            render_path: None,
            position: 0,
            visible: true,
            virtual_path,
            pretty_virtual_path,
        })
    }

    /// Sets the rendering path consumed by the hosting UI layer.
    #[must_use]
    pub fn with_render_path(mut self, render_path: impl Into<String>) -> Self {
        self.render_path = Some(render_path.into());
        self
    }

    /// Sets the ordering position inside the parent group.
    #[must_use]
    pub fn with_position(mut self, position: i32) -> Self {
        self.position = position;
        self
    }

    /// Marks the page as hidden from navigation menus.
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Returns the rendering path.
    #[must_use]
    pub fn render_path(&self) -> Option<&str> {
        self.render_path.as_deref()
    }

    /// Returns the ordering position.
    #[must_use]
    pub fn position(&self) -> i32 {
        self.position
    }

    fn attach(&mut self, parent_virtual: &str, parent_pretty: &str) {
        self.virtual_path = format!("{parent_virtual}/{}", self.id.as_str());
        self.pretty_virtual_path = format!("{parent_pretty}/{}", kebab_case(self.name.as_str()));
    }
}

impl NavigationElement for Page {
    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }

    fn virtual_path(&self) -> &str {
        &self.virtual_path
    }

    fn pretty_virtual_path(&self) -> &str {
        &self.pretty_virtual_path
    }

    fn is_visible(&self) -> bool {
        self.visible
    }
}

/// An ordered grouping of pages with optional nested groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageGroup {
    id: NonEmptyString,
    name: NonEmptyString,
    position: i32,
    visible: bool,
    virtual_path: String,
    pretty_virtual_path: String,
    pages: Vec<Page>,
    groups: Vec<PageGroup>,
}

impl PageGroup {
    /// Creates an empty visible group. Virtual paths are finalized on
    /// attachment.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> AppResult<Self> {
        let id = NonEmptyString::new(id)?;
        let name = NonEmptyString::new(name)?;
        let virtual_path = id.as_str().to_owned();
        let pretty_virtual_path = kebab_case(name.as_str());

        Ok(Self {
            id,
            name,
            position: 0,
            visible: true,
            virtual_path,
            pretty_virtual_path,
            pages: Vec::new(),
            groups: Vec::new(),
        })
    }

    /// Sets the ordering position inside the parent.
    #[must_use]
    pub fn with_position(mut self, position: i32) -> Self {
        self.position = position;
        self
    }

    /// Marks the group as hidden from navigation menus.
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Appends a page, skipping it when the id is already taken.
    pub fn add_page(&mut self, mut page: Page) -> &mut Self {
        if self.pages.iter().any(|existing| existing.id() == page.id()) {
            return self;
        }

        page.attach(&self.virtual_path, &self.pretty_virtual_path);
        self.pages.push(page);
        self
    }

    /// Appends a nested group, merging into an existing same-id group.
    pub fn add_group(&mut self, mut group: PageGroup) -> &mut Self {
        group.attach(&self.virtual_path, &self.pretty_virtual_path);
        match self
            .groups
            .iter_mut()
            .find(|existing| existing.id() == group.id())
        {
            Some(existing) => existing.merge_from(group),
            None => self.groups.push(group),
        }
        self
    }

    /// Returns directly contained pages in insertion order.
    #[must_use]
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Returns nested groups in insertion order.
    #[must_use]
    pub fn groups(&self) -> &[PageGroup] {
        &self.groups
    }

    /// Returns the ordering position.
    #[must_use]
    pub fn position(&self) -> i32 {
        self.position
    }

    pub(crate) fn merge_from(&mut self, other: PageGroup) {
        for page in other.pages {
            self.add_page(page);
        }
        for group in other.groups {
            self.add_group(group);
        }
    }

    pub(crate) fn attach(&mut self, parent_virtual: &str, parent_pretty: &str) {
        self.virtual_path = format!("{parent_virtual}/{}", self.id.as_str());
        self.pretty_virtual_path = format!("{parent_pretty}/{}", kebab_case(self.name.as_str()));

        let virtual_path = self.virtual_path.clone();
        let pretty_virtual_path = self.pretty_virtual_path.clone();
        for page in &mut self.pages {
            page.attach(&virtual_path, &pretty_virtual_path);
        }
        for group in &mut self.groups {
            group.attach(&virtual_path, &pretty_virtual_path);
        }
    }

    fn collect_pages<'a>(&'a self, out: &mut Vec<&'a Page>) {
        out.extend(self.pages.iter());
        for group in &self.groups {
            group.collect_pages(out);
        }
    }
}

impl NavigationElement for PageGroup {
    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }

    fn virtual_path(&self) -> &str {
        &self.virtual_path
    }

    fn pretty_virtual_path(&self) -> &str {
        &self.pretty_virtual_path
    }

    fn is_visible(&self) -> bool {
        self.visible
    }
}

/// Root of a navigation subtree contributed by one functional module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    id: NonEmptyString,
    name: NonEmptyString,
    description: Option<String>,
    icon: Option<String>,
    position: i32,
    visible: bool,
    pretty_virtual_path: String,
    page_groups: Vec<PageGroup>,
}

impl Module {
    /// Creates an empty visible module.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> AppResult<Self> {
        let id = NonEmptyString::new(id)?;
        let name = NonEmptyString::new(name)?;
        let pretty_virtual_path = kebab_case(name.as_str());

        Ok(Self {
            id,
            name,
            description: None,
            icon: None,
            position: 0,
            visible: true,
            pretty_virtual_path,
            page_groups: Vec::new(),
        })
    }

    /// Sets a human-friendly description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets an icon hint for the hosting UI layer.
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Sets the ordering position among modules.
    #[must_use]
    pub fn with_position(mut self, position: i32) -> Self {
        self.position = position;
        self
    }

    /// Appends a page group, merging into an existing same-id group
    /// (unioning its pages and nested groups) instead of duplicating.
    pub fn add_page_group(&mut self, mut group: PageGroup) -> &mut Self {
        group.attach(self.id.as_str(), &self.pretty_virtual_path);
        match self
            .page_groups
            .iter_mut()
            .find(|existing| existing.id() == group.id())
        {
            Some(existing) => existing.merge_from(group),
            None => self.page_groups.push(group),
        }
        self
    }

    /// Returns top-level page groups in insertion order.
    #[must_use]
    pub fn page_groups(&self) -> &[PageGroup] {
        &self.page_groups
    }

    /// Returns the optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the optional icon hint.
    #[must_use]
    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    /// Returns the ordering position.
    #[must_use]
    pub fn position(&self) -> i32 {
        self.position
    }

    /// Returns every page in the subtree, depth-first in insertion order.
    #[must_use]
    pub fn pages(&self) -> Vec<&Page> {
        let mut pages = Vec::new();
        for group in &self.page_groups {
            group.collect_pages(&mut pages);
        }
        pages
    }

    /// Finds a page by its full virtual path.
    #[must_use]
    pub fn find_page(&self, virtual_path: &str) -> Option<&Page> {
        self.pages()
            .into_iter()
            .find(|page| page.virtual_path() == virtual_path)
    }

    /// Finds a page by its full pretty virtual path.
    #[must_use]
    pub fn find_page_by_pretty_path(&self, pretty_path: &str) -> Option<&Page> {
        self.pages()
            .into_iter()
            .find(|page| page.pretty_virtual_path() == pretty_path)
    }

    /// Unions another same-id module's page groups into this one.
    pub fn merge_from(&mut self, other: Module) {
        for group in other.page_groups {
            self.add_page_group(group);
        }
    }
}

impl NavigationElement for Module {
    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }

    fn virtual_path(&self) -> &str {
        self.id.as_str()
    }

    fn pretty_virtual_path(&self) -> &str {
        &self.pretty_virtual_path
    }

    fn is_visible(&self) -> bool {
        self.visible
    }
}
