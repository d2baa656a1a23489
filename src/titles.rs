//! Human-readable titles for agent names.

use std::collections::BTreeMap;

/// Title used for agents without a registered title.
pub const DEFAULT_TITLE: &str = "Processing";

/// Maps an agent name to the title shown when that agent takes over.
pub trait TitleLookup: Send + Sync {
    /// Returns the title for `agent_name`; unknown names get a default title.
    fn title(&self, agent_name: &str) -> String;
}

/// A table of agent titles with a fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentTitles {
    titles: BTreeMap<String, String>,
    default_title: String,
}

impl AgentTitles {
    /// Creates an empty table that answers every lookup with `default_title`.
    pub fn empty(default_title: impl Into<String>) -> Self {
        Self {
            titles: BTreeMap::new(),
            default_title: default_title.into(),
        }
    }

    /// Registers or replaces the title of one agent.
    pub fn with_title(mut self, agent_name: impl Into<String>, title: impl Into<String>) -> Self {
        self.titles.insert(agent_name.into(), title.into());
        self
    }

    /// Registers every entry of `overrides`, replacing existing titles.
    pub fn with_overrides<'a>(
        mut self,
        overrides: impl IntoIterator<Item = (&'a String, &'a String)>,
    ) -> Self {
        for (name, title) in overrides {
            self.titles.insert(name.clone(), title.clone());
        }
        self
    }
}

impl Default for AgentTitles {
    fn default() -> Self {
        Self::empty(DEFAULT_TITLE)
            .with_title("root_agent", "Planning the response")
            .with_title("research_agent", "Researching")
            .with_title("researcher", "Researching")
            .with_title("rag_agent", "Searching internal documents")
            .with_title("seo_agent", "Analyzing search visibility")
            .with_title("slides_agent", "Building slides")
    }
}

impl TitleLookup for AgentTitles {
    fn title(&self, agent_name: &str) -> String {
        self.titles
            .get(agent_name)
            .cloned()
            .unwrap_or_else(|| self.default_title.clone())
    }
}
