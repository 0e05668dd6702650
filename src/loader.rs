//! Loading of per-module configuration and lifecycle entry points.
//!
//! How a module is physically loaded is behind [`ModuleLoader`]; the pipeline
//! only sees descriptors going in and configurations/entries coming out.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use regex::Regex;
use tokio::task::JoinSet;
use tracing::debug;

use crate::{
    config::ModuleConfiguration,
    error::{Error, Result},
    lifecycle::{HookRegistry, LifecycleEntry},
    resolve::ModuleDescriptor,
};

/// File name of the configuration inside a module's config directory.
pub const CONFIG_FILE: &str = "index.toml";

pub trait ModuleLoader: Send + Sync {
    fn load_config(
        &self,
        module: &ModuleDescriptor,
        config_dir: &str,
    ) -> Result<ModuleConfiguration>;

    fn load_lifecycle(&self, module: &ModuleDescriptor) -> Result<Arc<LifecycleEntry>>;
}

/// Reads TOML configuration from disk and takes lifecycle entries from a
/// registry compiled into the host.
pub struct FsLoader {
    hooks: HookRegistry,
}

impl FsLoader {
    pub fn new(hooks: HookRegistry) -> Self {
        Self { hooks }
    }

    pub fn config_path(module: &ModuleDescriptor, config_dir: &str) -> PathBuf {
        module.path.join(config_dir).join(CONFIG_FILE)
    }
}

impl ModuleLoader for FsLoader {
    fn load_config(
        &self,
        module: &ModuleDescriptor,
        config_dir: &str,
    ) -> Result<ModuleConfiguration> {
        let path = Self::config_path(module, config_dir);
        if !path.is_file() {
            return Err(Error::MissingConfiguration {
                module: module.name.clone(),
                path,
            });
        }

        let text = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        toml::from_str(&text).map_err(|e| Error::InvalidConfiguration {
            module: module.name.clone(),
            path,
            message: e.to_string(),
        })
    }

    fn load_lifecycle(&self, module: &ModuleDescriptor) -> Result<Arc<LifecycleEntry>> {
        self.hooks.entry_for(&module.name)
    }
}

/// Load every module's configuration concurrently.
///
/// Results come back in descriptor order. The first failure to arrive wins and
/// the remaining loads are abandoned.
pub async fn load_configurations(
    loader: Arc<dyn ModuleLoader>,
    modules: &[ModuleDescriptor],
    config_dir: &str,
) -> Result<Vec<ModuleConfiguration>> {
    let mut set = JoinSet::new();

    for (idx, module) in modules.iter().cloned().enumerate() {
        let loader = Arc::clone(&loader);
        let config_dir = config_dir.to_string();
        set.spawn_blocking(move || {
            let res = loader.load_config(&module, &config_dir);
            (idx, module.name, res)
        });
    }

    let mut slots: Vec<Option<ModuleConfiguration>> = vec![None; modules.len()];

    while let Some(joined) = set.join_next().await {
        let (idx, name, res) = joined?;
        let cfg = res?;

        if cfg.name != name {
            return Err(Error::ModuleNameMismatch {
                module: name,
                declared: cfg.name,
            });
        }

        debug!(module = %name, order = ?cfg.order, "configuration loaded");
        slots[idx] = Some(cfg);
    }

    slots
        .into_iter()
        .zip(modules)
        .map(|(slot, m)| {
            slot.ok_or_else(|| Error::Internal(format!("no configuration loaded for [{}]", m.name)))
        })
        .collect()
}

/// Files under `<module>/<suffix>` whose file name matches `pattern`, sorted.
///
/// A module without the `suffix` directory yields an empty list.
pub fn find_paths_in(
    module: &ModuleDescriptor,
    suffix: &str,
    pattern: &Regex,
) -> Result<Vec<PathBuf>> {
    let dir = module.path.join(suffix);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let glob_pattern = format!("{}/**/*", glob::Pattern::escape(&dir.to_string_lossy()));
    let entries = glob::glob(&glob_pattern)
        .map_err(|e| Error::Internal(format!("bad search pattern {glob_pattern}: {e}")))?;

    let mut out = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            Error::io(path, e.into_error())
        })?;
        if path.is_file() && file_name_matches(&path, pattern) {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

/// [`find_paths_in`] for every module concurrently, one list per module.
pub async fn find_paths(
    modules: &[ModuleDescriptor],
    suffix: &str,
    pattern: &Regex,
) -> Result<Vec<Vec<PathBuf>>> {
    let mut set = JoinSet::new();

    for (idx, module) in modules.iter().cloned().enumerate() {
        let suffix = suffix.to_string();
        let pattern = pattern.clone();
        set.spawn_blocking(move || (idx, find_paths_in(&module, &suffix, &pattern)));
    }

    let mut slots = vec![Vec::new(); modules.len()];
    while let Some(joined) = set.join_next().await {
        let (idx, res) = joined?;
        slots[idx] = res?;
    }
    Ok(slots)
}

fn file_name_matches(path: &Path, pattern: &Regex) -> bool {
    path.file_name()
        .map(|n| pattern.is_match(&n.to_string_lossy()))
        .unwrap_or(false)
}
