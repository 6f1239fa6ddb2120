use crate::workspace::{BufferSwap, Workspace};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub filename: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabAction {
    Activate(String),
    Close(String),
}

impl TabAction {
    pub fn apply(&self, workspace: &mut Workspace) -> Option<BufferSwap> {
        match self {
            Self::Activate(filename) => workspace.open_tab(filename),
            Self::Close(filename) => workspace.close_tab(filename),
        }
    }
}

/// Tab controls derived from the workspace's open set. Rebuilt after every
/// mutation; never edited directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabStrip {
    pub tabs: Vec<Tab>,
}

impl TabStrip {
    pub fn derive(workspace: &Workspace) -> Self {
        let current = workspace.current_file();
        Self {
            tabs: workspace
                .open_files()
                .iter()
                .map(|filename| Tab {
                    filename: filename.clone(),
                    active: current == Some(filename.as_str()),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{TabAction, TabStrip};
    use crate::workspace::{BufferSwap, Workspace};

    #[test]
    fn one_tab_per_open_file_with_single_active() {
        let mut workspace = Workspace::new();
        for name in ["a.js", "b.js", "c.js"] {
            workspace.upsert(name, "", None, None);
        }
        workspace.open_tab("a.js");
        workspace.open_tab("c.js");

        let strip = TabStrip::derive(&workspace);
        let names: Vec<&str> = strip.tabs.iter().map(|tab| tab.filename.as_str()).collect();
        assert_eq!(names, vec!["a.js", "c.js"]);
        let active: Vec<&str> = strip
            .tabs
            .iter()
            .filter(|tab| tab.active)
            .map(|tab| tab.filename.as_str())
            .collect();
        assert_eq!(active, vec!["c.js"]);
    }

    #[test]
    fn actions_route_to_workspace_operations() {
        let mut workspace = Workspace::new();
        workspace.upsert("a.js", "", None, None);
        workspace.upsert("b.js", "", None, None);

        let swap = TabAction::Activate("b.js".to_string()).apply(&mut workspace);
        assert_eq!(swap, Some(BufferSwap::Show("b.js".to_string())));
        let swap = TabAction::Close("b.js".to_string()).apply(&mut workspace);
        assert_eq!(swap, Some(BufferSwap::Clear));
        assert_eq!(TabStrip::derive(&workspace), TabStrip::default());
    }
}
