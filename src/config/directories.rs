// src/config/directories.rs
use serde::{Deserialize, Serialize};

/// Directory names used inside every module tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Directories {
    pub assets: String,
    pub components: String,
    pub config: String,
    pub layouts: String,
    pub locales: String,
    pub middleware: String,
    pub pages: String,
    pub plugins: String,
    pub services: String,
    pub store: String,
}

impl Default for Directories {
    fn default() -> Self {
        Self {
            assets: "assets".to_string(),
            components: "components".to_string(),
            config: "config".to_string(),
            layouts: "layouts".to_string(),
            locales: "locales".to_string(),
            middleware: "middleware".to_string(),
            pages: "pages".to_string(),
            plugins: "plugins".to_string(),
            services: "services".to_string(),
            store: "store".to_string(),
        }
    }
}
