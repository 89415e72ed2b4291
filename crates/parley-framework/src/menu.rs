//! Menu trees for guided, button-driven navigation.
//!
//! Menus are described with the owned [`Menu`] builder and frozen into a
//! [`MenuTree`] when the bot definition is built. Because submenus are
//! moved into their parent, the resulting graph is always a tree; each node
//! records its parent only so the "go back" entry can be offered.
//!
//! ```rust,ignore
//! let menu = Menu::new("Main")
//!     .command("Weather", "/weather")
//!     .submenu(Menu::new("Settings").command("Units", "/units"));
//! ```
//!
//! Displaying a node lists its entry labels in declaration order followed by
//! the parent's name, if any:
//!
//! ```text
//! Main:      [Weather] [Settings]
//! Settings:  [Units] [Main]
//! ```

use crate::error::{DefinitionError, DefinitionResult};

/// Builder for one menu level.
#[derive(Debug, Clone)]
pub struct Menu {
    name: String,
    items: Vec<MenuItem>,
}

#[derive(Debug, Clone)]
enum MenuItem {
    Command { label: String, command: String },
    Submenu(Menu),
}

impl Menu {
    /// Creates an empty menu. `name` is shown as its "go back" label inside
    /// submenus and also navigates to it when typed.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
        }
    }

    /// Adds an entry that starts the command registered as `command`.
    pub fn command(mut self, label: impl Into<String>, command: impl Into<String>) -> Self {
        self.items.push(MenuItem::Command {
            label: label.into(),
            command: command.into(),
        });
        self
    }

    /// Adds a nested menu, labelled with its name.
    pub fn submenu(mut self, submenu: Menu) -> Self {
        self.items.push(MenuItem::Submenu(submenu));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Index of a node inside a [`MenuTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MenuId(usize);

/// What a menu entry leads to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuTarget {
    /// Starts the named command.
    Command(String),
    /// Descends into a submenu.
    Submenu(MenuId),
}

/// One selectable entry of a menu node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: String,
    pub target: MenuTarget,
}

/// One frozen menu level.
#[derive(Debug, Clone)]
pub struct MenuNode {
    name: String,
    entries: Vec<MenuEntry>,
    parent: Option<MenuId>,
}

impl MenuNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    pub fn parent(&self) -> Option<MenuId> {
        self.parent
    }
}

/// An immutable menu tree stored as a flat arena. The root is always the
/// first node.
#[derive(Debug, Clone)]
pub struct MenuTree {
    nodes: Vec<MenuNode>,
}

impl MenuTree {
    /// Freezes a menu builder, assigning parent links.
    pub fn build(root: Menu) -> DefinitionResult<Self> {
        let mut tree = Self { nodes: Vec::new() };
        tree.insert(root, None)?;
        Ok(tree)
    }

    fn insert(&mut self, menu: Menu, parent: Option<MenuId>) -> DefinitionResult<MenuId> {
        if menu.name.is_empty() {
            return Err(DefinitionError::EmptyMenuLabel {
                menu: parent
                    .map(|p| self.nodes[p.0].name.clone())
                    .unwrap_or_default(),
            });
        }

        let id = MenuId(self.nodes.len());
        self.nodes.push(MenuNode {
            name: menu.name,
            entries: Vec::with_capacity(menu.items.len()),
            parent,
        });

        for item in menu.items {
            let entry = match item {
                MenuItem::Command { label, command } => {
                    if label.is_empty() {
                        return Err(DefinitionError::EmptyMenuLabel {
                            menu: self.nodes[id.0].name.clone(),
                        });
                    }
                    MenuEntry {
                        label,
                        target: MenuTarget::Command(command),
                    }
                }
                MenuItem::Submenu(submenu) => {
                    let label = submenu.name.clone();
                    let child = self.insert(submenu, Some(id))?;
                    MenuEntry {
                        label,
                        target: MenuTarget::Submenu(child),
                    }
                }
            };
            self.nodes[id.0].entries.push(entry);
        }

        Ok(id)
    }

    pub fn root(&self) -> MenuId {
        MenuId(0)
    }

    pub fn node(&self, id: MenuId) -> &MenuNode {
        &self.nodes[id.0]
    }

    /// Returns the parent node of `id`, `None` for the root.
    pub fn parent(&self, id: MenuId) -> Option<&MenuNode> {
        self.node(id).parent.map(|parent| self.node(parent))
    }

    /// Iterates over all nodes, root first.
    pub fn nodes(&self) -> impl Iterator<Item = &MenuNode> {
        self.nodes.iter()
    }

    /// Option labels shown for `id`: entries in declaration order, then the
    /// parent's name as the "go back" option.
    pub fn keyboard(&self, id: MenuId) -> Vec<String> {
        let node = self.node(id);
        let mut keyboard: Vec<String> = node.entries.iter().map(|e| e.label.clone()).collect();
        if let Some(parent) = self.parent(id) {
            keyboard.push(parent.name.clone());
        }
        keyboard
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MenuTree {
        MenuTree::build(
            Menu::new("Main")
                .command("Weather", "/weather")
                .submenu(
                    Menu::new("Settings")
                        .command("Units", "/units")
                        .submenu(Menu::new("Advanced").command("Reset", "/reset")),
                ),
        )
        .unwrap()
    }

    #[test]
    fn test_root_keyboard_has_no_back_entry() {
        let tree = sample();
        assert_eq!(tree.keyboard(tree.root()), ["Weather", "Settings"]);
        assert!(tree.parent(tree.root()).is_none());
    }

    #[test]
    fn test_parent_links_assigned() {
        let tree = sample();
        let settings = match tree.node(tree.root()).entries()[1].target {
            MenuTarget::Submenu(id) => id,
            _ => panic!("expected submenu"),
        };
        assert_eq!(tree.node(settings).name(), "Settings");
        assert_eq!(tree.parent(settings).map(MenuNode::name), Some("Main"));
        assert_eq!(tree.keyboard(settings), ["Units", "Advanced", "Main"]);

        let advanced = match tree.node(settings).entries()[1].target {
            MenuTarget::Submenu(id) => id,
            _ => panic!("expected submenu"),
        };
        assert_eq!(tree.keyboard(advanced), ["Reset", "Settings"]);
    }

    #[test]
    fn test_keyboard_is_deterministic() {
        let tree = sample();
        assert_eq!(tree.keyboard(tree.root()), tree.keyboard(tree.root()));
        assert_eq!(tree.nodes().count(), 3);
    }

    #[test]
    fn test_empty_labels_rejected() {
        let err = MenuTree::build(Menu::new("Main").command("", "/x")).unwrap_err();
        assert_eq!(
            err,
            DefinitionError::EmptyMenuLabel {
                menu: "Main".into()
            }
        );
        assert!(MenuTree::build(Menu::new("Main").submenu(Menu::new(""))).is_err());
    }
}
