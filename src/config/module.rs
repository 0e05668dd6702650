// src/config/module.rs
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Load order for modules whose configuration omits `order`.
pub const DEFAULT_ORDER: i64 = 1000;

fn bool_true() -> bool {
    true
}

/// Per-module configuration, read from `<module>/<config dir>/index.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfiguration {
    pub name: String,

    /// Names of modules this one expects to be active. Not used for ordering.
    #[serde(default)]
    pub relations: BTreeSet<String>,

    /// Alias key -> path relative to the module root.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,

    /// Same shape as `aliases`; applied after them, so a replacement wins over
    /// an alias of the same key declared by the same module.
    #[serde(default)]
    pub replacements: BTreeMap<String, String>,

    #[serde(default)]
    pub plugins: Vec<PluginSpec>,

    /// Global stylesheets, relative to the module root.
    #[serde(default)]
    pub css: Vec<String>,

    #[serde(default)]
    pub order: Option<i64>,
}

impl ModuleConfiguration {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            relations: BTreeSet::new(),
            aliases: BTreeMap::new(),
            replacements: BTreeMap::new(),
            plugins: Vec::new(),
            css: Vec::new(),
            order: None,
        }
    }

    pub fn effective_order(&self) -> i64 {
        self.order.unwrap_or(DEFAULT_ORDER)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSpec {
    /// Plugin source relative to the module root, without the `.js` extension.
    pub src: String,

    /// Whether the plugin also runs during server-side rendering.
    #[serde(default = "bool_true")]
    pub ssr: bool,
}
