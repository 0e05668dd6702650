// src/config/mod.rs

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};

pub mod directories;
pub mod module;

pub use directories::Directories;
pub use module::{ModuleConfiguration, PluginSpec, DEFAULT_ORDER};

pub const DEFAULT_OPTIONS_FILE: &str = "modweave.toml";

/// Small helpers for serde defaults.
fn default_modules_dir() -> PathBuf {
    PathBuf::from("modules")
}

fn default_vendor_dir() -> PathBuf {
    PathBuf::from("vendor")
}

fn default_node_modules_dir() -> PathBuf {
    PathBuf::from("node_modules")
}

fn bool_true() -> bool {
    true
}

/// Module names requested by the host, split by source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModulesList {
    #[serde(default)]
    pub local: Vec<String>,

    #[serde(default)]
    pub npm: Vec<String>,
}

impl ModulesList {
    pub fn is_empty(&self) -> bool {
        self.local.is_empty() && self.npm.is_empty()
    }
}

/// Global options shared by every phase and handed to lifecycle hooks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    #[serde(default)]
    pub modules: ModulesList,

    /// Names that must all be present among the resolved modules.
    #[serde(default)]
    pub required: Vec<String>,

    /// Anchor for relative `modules_dir` and `vendor_dir`.
    #[serde(default)]
    pub src_dir: Option<PathBuf>,

    #[serde(default = "default_modules_dir")]
    pub modules_dir: PathBuf,

    /// Holds symlinks to the npm packages under `node_modules_dir`.
    #[serde(default = "default_vendor_dir")]
    pub vendor_dir: PathBuf,

    #[serde(default = "default_node_modules_dir")]
    pub node_modules_dir: PathBuf,

    #[serde(default, alias = "vuex")]
    pub state_management: bool,

    /// Locale codes to build merged bundles for.
    #[serde(default)]
    pub i18n: Vec<String>,

    #[serde(default)]
    pub is_dev: bool,

    #[serde(default)]
    pub log_loaded_modules: bool,

    #[serde(default = "bool_true")]
    pub verbose: bool,

    #[serde(default)]
    pub directories: Directories,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            modules: ModulesList::default(),
            required: Vec::new(),
            src_dir: None,
            modules_dir: default_modules_dir(),
            vendor_dir: default_vendor_dir(),
            node_modules_dir: default_node_modules_dir(),
            state_management: false,
            i18n: Vec::new(),
            is_dev: false,
            log_loaded_modules: false,
            verbose: true,
            directories: Directories::default(),
        }
    }
}

impl Options {
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read options file {}", path.display()))?;
        let opts: Options = toml::from_str(&text)
            .with_context(|| format!("failed to parse options file {}", path.display()))?;
        Ok(opts)
    }

    /// Resolve relative directories against `root`.
    ///
    /// `modules_dir` and `vendor_dir` live under `src_dir` when one is set;
    /// `node_modules_dir` always sits next to the options file.
    pub fn anchored(mut self, root: &Path) -> Self {
        let src = match self.src_dir.as_deref() {
            Some(dir) => root.join(dir),
            None => root.to_path_buf(),
        };

        self.modules_dir = src.join(&self.modules_dir);
        self.vendor_dir = src.join(&self.vendor_dir);
        self.node_modules_dir = root.join(&self.node_modules_dir);
        self
    }
}
