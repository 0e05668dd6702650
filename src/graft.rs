//! The host build state modules are grafted into, and the per-module
//! contributions (aliases, replacements, plugins, css) applied to it.

use std::{
    collections::BTreeMap,
    ffi::OsString,
    path::{Path, PathBuf},
};

use serde::Serialize;
use tracing::debug;

use crate::{
    config::ModuleConfiguration,
    error::{Error, Result},
    host::HostContext,
    report::PhaseReport,
    resolve::{module_relative, normalize, ModuleDescriptor},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginRegistration {
    /// Source file. For generated glue plugins this is the generated file name.
    pub src: PathBuf,
    /// Name of the file in the build output.
    pub file_name: String,
    pub ssr: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedTemplate {
    pub file_name: String,
    pub contents: String,
}

/// Mutable host build state for one build. Single owner, mutated in sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildGraft {
    pub aliases: BTreeMap<String, PathBuf>,
    pub css: Vec<PathBuf>,
    pub plugins: Vec<PluginRegistration>,
    #[serde(skip)]
    pub templates: Vec<RenderedTemplate>,
}

impl BuildGraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last writer wins; collisions are not an error.
    pub fn set_alias(&mut self, key: &str, target: PathBuf) {
        if let Some(prev) = self.aliases.insert(key.to_string(), target) {
            debug!(alias = %key, previous = ?prev, "alias overwritten");
        }
    }

    /// Append-only; duplicates are kept.
    pub fn push_css(&mut self, path: PathBuf) {
        self.css.push(path);
    }

    /// Idempotent per file name.
    pub fn add_plugin(&mut self, reg: PluginRegistration) {
        match self.plugins.iter_mut().find(|p| p.file_name == reg.file_name) {
            Some(existing) => *existing = reg,
            None => self.plugins.push(reg),
        }
    }

    /// Idempotent per file name.
    pub fn add_template(&mut self, tpl: RenderedTemplate) {
        match self.templates.iter_mut().find(|t| t.file_name == tpl.file_name) {
            Some(existing) => *existing = tpl,
            None => self.templates.push(tpl),
        }
    }

    pub fn template(&self, file_name: &str) -> Option<&RenderedTemplate> {
        self.templates.iter().find(|t| t.file_name == file_name)
    }

    pub fn plugin(&self, file_name: &str) -> Option<&PluginRegistration> {
        self.plugins.iter().find(|p| p.file_name == file_name)
    }
}

/// Module name reduced to ASCII letters, usable as a path segment.
pub fn sanitize_module_name(name: &str) -> String {
    name.chars().filter(|c| c.is_ascii_alphabetic()).collect()
}

/// Apply every module's contributions, in load order.
pub fn graft_modules(
    ctx: &mut HostContext<'_>,
    modules: &[ModuleDescriptor],
    configs: &[ModuleConfiguration],
) -> Result<PhaseReport> {
    let pairs = pair_with_configs(modules, configs)?;
    let mut report = PhaseReport::new("Prepare modules");

    report.push(set_aliases(ctx, &pairs));
    report.push(set_plugins(ctx, &pairs));
    report.push(set_css(ctx, &pairs));

    Ok(report)
}

/// A module paired with its loaded configuration.
type Contribution<'m> = (&'m ModuleDescriptor, &'m ModuleConfiguration);

fn pair_with_configs<'m>(
    modules: &'m [ModuleDescriptor],
    configs: &'m [ModuleConfiguration],
) -> Result<Vec<Contribution<'m>>> {
    modules
        .iter()
        .map(|m| {
            configs
                .iter()
                .find(|c| c.name == m.name)
                .map(|c| (m, c))
                .ok_or_else(|| {
                    Error::Internal(format!("module [{}] has no loaded configuration", m.name))
                })
        })
        .collect()
}

fn set_aliases(ctx: &mut HostContext<'_>, pairs: &[Contribution<'_>]) -> String {
    ctx.extend_build(|graft| {
        for (module, cfg) in pairs {
            for (key, target) in cfg.aliases.iter().chain(cfg.replacements.iter()) {
                graft.set_alias(key, module_relative(&module.path, target));
            }
        }
    });
    "All aliases set".to_string()
}

fn set_plugins(ctx: &mut HostContext<'_>, pairs: &[Contribution<'_>]) -> String {
    for (module, cfg) in pairs {
        let namespace = sanitize_module_name(&cfg.name);
        for plugin in &cfg.plugins {
            ctx.add_plugin(PluginRegistration {
                src: with_js_extension(&module_relative(&module.path, &plugin.src)),
                file_name: plugin_file_name(&namespace, &plugin.src),
                ssr: plugin.ssr,
            });
        }
    }
    "All plugins set".to_string()
}

fn set_css(ctx: &mut HostContext<'_>, pairs: &[Contribution<'_>]) -> String {
    for (module, cfg) in pairs {
        for path in &cfg.css {
            ctx.push_css(module_relative(&module.path, path));
        }
    }
    "All global css set".to_string()
}

fn with_js_extension(path: &Path) -> PathBuf {
    let mut s = OsString::from(path.as_os_str());
    s.push(".js");
    PathBuf::from(s)
}

/// `modules/<namespace>/<src>.js`, lexically normalized and `/`-separated.
fn plugin_file_name(namespace: &str, src: &str) -> String {
    let joined = Path::new("modules")
        .join(namespace)
        .join(format!("{}.js", src.trim_matches('/')));

    normalize(&joined)
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
