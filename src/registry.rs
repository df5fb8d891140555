//! Registry of the automations this dashboard manages
//!
//! The registry is built once at startup (defaults or a YAML/JSON file) and
//! handed to the clients and the assistant; nothing reads it as global state.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Display metadata for one managed workflow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowMeta {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowRegistry {
    entries: Vec<WorkflowMeta>,
}

impl WorkflowRegistry {
    pub fn new(entries: Vec<WorkflowMeta>) -> Self {
        Self { entries }
    }

    /// Load entries from a YAML (or JSON, which YAML accepts) list.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read workflow registry {}", path.display()))?;
        let entries: Vec<WorkflowMeta> =
            serde_yaml::from_str(&raw).context("Failed to parse workflow registry")?;
        Ok(Self::new(entries))
    }

    pub fn get(&self, id: &str) -> Option<&WorkflowMeta> {
        self.entries.iter().find(|m| m.id == id)
    }

    /// Registered name, or the id itself for unregistered workflows (e.g. copies).
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).map(|m| m.name.as_str()).unwrap_or(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkflowMeta> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for WorkflowRegistry {
    fn default() -> Self {
        let meta = |id: &str, name: &str, description: &str, icon: &str| WorkflowMeta {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
        };

        Self::new(vec![
            meta(
                "LGzQHIALne_MHAHWtdBIQ",
                "New Customer",
                "Captures new Shopify customers and logs them to tracking sheet",
                "user-plus",
            ),
            meta(
                "u4sSYc8PDieJxX_g6VMWl",
                "AI Voice Agent",
                "Calls new customers via Vapi.ai to welcome them and gather feedback",
                "phone",
            ),
            meta(
                "ETQm3I9t8ypv6V7eYAVyv",
                "Purchases",
                "Tracks Shopify orders and updates customer purchase history",
                "shopping-cart",
            ),
            meta(
                "lO1Z5m781nQe3HsPYUTch",
                "Blog Creator",
                "Writes and publishes SEO blog posts to Shopify daily",
                "pencil",
            ),
        ])
    }
}
