//! Tool catalog
//!
//! Holds the sorted tool list fetched from the bridge plus the filter and
//! selection the presentation layer binds to. A failed refresh keeps the
//! previous list visible and only records the error.

use serde::Serialize;
use tracing::{debug, warn};

use crate::core::ToolDescriptor;
use crate::error::Result;

use super::effect::Effect;

/// Catalog actions
#[derive(Debug)]
pub enum CatalogAction {
    Refresh,
    SetFilter(String),
    Select(ToolDescriptor),
    ClearSelection,
    ToolsLoaded {
        epoch: u64,
        result: Result<Vec<ToolDescriptor>>,
    },
}

/// Notifications for sibling components
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEvent {
    Loaded,
    Selected(ToolDescriptor),
}

/// Catalog state
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ToolCatalog {
    /// Sorted by name, ascending, case-sensitive
    pub tools: Vec<ToolDescriptor>,
    pub is_loading: bool,
    pub filter_text: String,
    pub selected_name: Option<String>,
    pub last_error: Option<String>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// `epoch` is the current connection epoch; results tagged with any
    /// other epoch are discarded.
    pub fn reduce(&mut self, action: CatalogAction, epoch: u64) -> (Vec<Effect>, Option<CatalogEvent>) {
        match action {
            CatalogAction::Refresh => {
                debug!("Refreshing tool catalog");
                self.is_loading = true;
                self.last_error = None;
                (vec![Effect::ListTools { epoch }], None)
            }

            CatalogAction::SetFilter(text) => {
                self.filter_text = text;
                (vec![], None)
            }

            CatalogAction::Select(tool) => {
                self.selected_name = Some(tool.name.clone());
                (vec![], Some(CatalogEvent::Selected(tool)))
            }

            CatalogAction::ClearSelection => {
                self.selected_name = None;
                (vec![], None)
            }

            CatalogAction::ToolsLoaded { epoch: loaded, result } => {
                if loaded != epoch {
                    warn!("Discarding tool list from stale connection");
                    return (vec![], None);
                }
                self.is_loading = false;
                match result {
                    Ok(mut tools) => {
                        tools.sort_by(|a, b| a.name.cmp(&b.name));
                        debug!("Loaded {} tools", tools.len());
                        self.tools = tools;
                        (vec![], Some(CatalogEvent::Loaded))
                    }
                    Err(e) => {
                        warn!("Tool refresh failed: {}", e);
                        self.last_error = Some(e.to_string());
                        (vec![], None)
                    }
                }
            }
        }
    }

    /// Tools whose name or description contains the filter, ignoring case
    pub fn filtered_tools(&self) -> Vec<&ToolDescriptor> {
        if self.filter_text.is_empty() {
            return self.tools.iter().collect();
        }
        let query = self.filter_text.to_lowercase();
        self.tools
            .iter()
            .filter(|tool| {
                tool.name.to_lowercase().contains(&query)
                    || tool
                        .description
                        .as_deref()
                        .map_or(false, |d| d.to_lowercase().contains(&query))
            })
            .collect()
    }

    /// Look up a loaded tool by name
    pub fn tool(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    /// Drop everything tied to the connection; the filter is user input and stays
    pub(crate) fn reset(&mut self) {
        self.tools.clear();
        self.is_loading = false;
        self.selected_name = None;
        self.last_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn names(tools: &[&ToolDescriptor]) -> Vec<String> {
        tools.iter().map(|t| t.name.clone()).collect()
    }

    fn loaded(tools: Vec<ToolDescriptor>) -> ToolCatalog {
        let mut catalog = ToolCatalog::new();
        catalog.reduce(CatalogAction::Refresh, 1);
        catalog.reduce(CatalogAction::ToolsLoaded { epoch: 1, result: Ok(tools) }, 1);
        catalog
    }

    #[test]
    fn test_refresh_sorts_case_sensitive() {
        let mut catalog = ToolCatalog::new();

        let (effects, _) = catalog.reduce(CatalogAction::Refresh, 3);
        assert_eq!(effects, vec![Effect::ListTools { epoch: 3 }]);
        assert!(catalog.is_loading);

        let (_, event) = catalog.reduce(
            CatalogAction::ToolsLoaded {
                epoch: 3,
                result: Ok(vec![
                    ToolDescriptor::new("beta"),
                    ToolDescriptor::new("Gamma"),
                    ToolDescriptor::new("alpha"),
                ]),
            },
            3,
        );

        assert_eq!(event, Some(CatalogEvent::Loaded));
        assert!(!catalog.is_loading);
        let sorted: Vec<&str> = catalog.tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(sorted, vec!["Gamma", "alpha", "beta"]);
    }

    #[test]
    fn test_refresh_failure_keeps_tools() {
        let mut catalog = loaded(vec![ToolDescriptor::new("Build")]);

        catalog.reduce(CatalogAction::Refresh, 1);
        let (_, event) = catalog.reduce(
            CatalogAction::ToolsLoaded {
                epoch: 1,
                result: Err(Error::Transport("pipe closed".into())),
            },
            1,
        );

        assert_eq!(event, None);
        assert!(!catalog.is_loading);
        assert_eq!(catalog.tools, vec![ToolDescriptor::new("Build")]);
        assert_eq!(catalog.last_error.as_deref(), Some("Transport error: pipe closed"));

        // Next refresh clears the error
        catalog.reduce(CatalogAction::Refresh, 1);
        assert_eq!(catalog.last_error, None);
    }

    #[test]
    fn test_stale_result_discarded() {
        let mut catalog = ToolCatalog::new();
        catalog.reduce(CatalogAction::Refresh, 1);

        let (_, event) = catalog.reduce(
            CatalogAction::ToolsLoaded {
                epoch: 1,
                result: Ok(vec![ToolDescriptor::new("Build")]),
            },
            2,
        );
        assert_eq!(event, None);
        assert!(catalog.tools.is_empty());
    }

    #[test]
    fn test_filter_matches_name_case_insensitive() {
        let mut catalog = loaded(vec![
            ToolDescriptor::new("Build"),
            ToolDescriptor::new("Test"),
            ToolDescriptor::new("Rebuild"),
        ]);

        catalog.reduce(CatalogAction::SetFilter("build".into()), 1);
        assert_eq!(names(&catalog.filtered_tools()), vec!["Build", "Rebuild"]);
    }

    #[test]
    fn test_filter_matches_description() {
        let mut catalog = loaded(vec![
            ToolDescriptor::new("RunTests").with_description("Run the XCTest suite"),
            ToolDescriptor::new("Build"),
        ]);

        catalog.reduce(CatalogAction::SetFilter("xctest".into()), 1);
        assert_eq!(names(&catalog.filtered_tools()), vec!["RunTests"]);

        catalog.reduce(CatalogAction::SetFilter(String::new()), 1);
        assert_eq!(catalog.filtered_tools().len(), 2);
    }

    #[test]
    fn test_select_records_name_and_emits() {
        let mut catalog = loaded(vec![ToolDescriptor::new("Build")]);

        let (effects, event) = catalog.reduce(CatalogAction::Select(ToolDescriptor::new("Build")), 1);
        assert!(effects.is_empty());
        assert_eq!(event, Some(CatalogEvent::Selected(ToolDescriptor::new("Build"))));
        assert_eq!(catalog.selected_name.as_deref(), Some("Build"));

        catalog.reduce(CatalogAction::ClearSelection, 1);
        assert_eq!(catalog.selected_name, None);
    }
}
