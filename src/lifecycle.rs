//! Per-module lifecycle hooks and the sequential runner that invokes them.

use std::{collections::BTreeMap, fmt, sync::Arc};

use serde::Serialize;
use tracing::{debug, info};

use crate::{
    error::{Error, HookStage, Result},
    host::HostContext,
    loader::ModuleLoader,
    report::PhaseReport,
    resolve::ModuleDescriptor,
};

pub type Hook = Box<dyn Fn(&mut HostContext<'_>) -> anyhow::Result<()> + Send + Sync>;

/// A module's lifecycle entry point: a required main hook plus optional
/// hooks around it.
#[derive(Default)]
pub struct LifecycleEntry {
    pub before_module: Option<Hook>,
    pub main: Option<Hook>,
    pub after_module: Option<Hook>,
}

impl LifecycleEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn before_module<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut HostContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.before_module = Some(Box::new(f));
        self
    }

    pub fn main<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut HostContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.main = Some(Box::new(f));
        self
    }

    pub fn after_module<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut HostContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.after_module = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for LifecycleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleEntry")
            .field("before_module", &self.before_module.is_some())
            .field("main", &self.main.is_some())
            .field("after_module", &self.after_module.is_some())
            .finish()
    }
}

/// Lifecycle entries compiled into the host, keyed by module name.
#[derive(Debug, Default)]
pub struct HookRegistry {
    entries: BTreeMap<String, Arc<LifecycleEntry>>,
    declarative: bool,
}

impl HookRegistry {
    /// Modules without a registered entry are rejected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Modules without a registered entry get a no-op main hook; they only
    /// contribute what their configuration declares.
    pub fn declarative() -> Self {
        Self {
            entries: BTreeMap::new(),
            declarative: true,
        }
    }

    pub fn register(&mut self, name: impl Into<String>, entry: LifecycleEntry) -> &mut Self {
        self.entries.insert(name.into(), Arc::new(entry));
        self
    }

    pub fn with(mut self, name: impl Into<String>, entry: LifecycleEntry) -> Self {
        self.register(name, entry);
        self
    }

    pub fn entry_for(&self, name: &str) -> Result<Arc<LifecycleEntry>> {
        if let Some(entry) = self.entries.get(name) {
            return Ok(Arc::clone(entry));
        }
        if self.declarative {
            return Ok(Arc::new(LifecycleEntry::new().main(|_| Ok(()))));
        }
        Err(Error::InvalidModuleExport {
            module: name.to_string(),
            reason: "no lifecycle entry registered".to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LifecycleResult {
    pub module_name: String,
    pub succeeded: bool,
    pub message: String,
}

/// Load and run each module's hooks, strictly one module after another.
///
/// The first failing hook aborts the whole run; nothing already applied to
/// the build is rolled back.
pub fn run_lifecycle(
    loader: &dyn ModuleLoader,
    ctx: &mut HostContext<'_>,
    modules: &[ModuleDescriptor],
) -> Result<Vec<LifecycleResult>> {
    let mut results = Vec::with_capacity(modules.len());

    for module in modules {
        let entry = loader.load_lifecycle(module)?;
        let main = entry.main.as_ref().ok_or_else(|| Error::InvalidModuleExport {
            module: module.name.clone(),
            reason: "missing main hook".to_string(),
        })?;

        if let Some(before) = entry.before_module.as_ref() {
            invoke(module, HookStage::Before, before, ctx)?;
        }
        invoke(module, HookStage::Main, main, ctx)?;
        if let Some(after) = entry.after_module.as_ref() {
            invoke(module, HookStage::After, after, ctx)?;
        }

        info!(module = %module.name, order = module.order, "module loaded");
        results.push(LifecycleResult {
            module_name: module.name.clone(),
            succeeded: true,
            message: format!("Module [{}] loaded", module.name),
        });
    }

    Ok(results)
}

fn invoke(
    module: &ModuleDescriptor,
    stage: HookStage,
    hook: &Hook,
    ctx: &mut HostContext<'_>,
) -> Result<()> {
    debug!(module = %module.name, %stage, "running hook");
    hook(ctx).map_err(|source| Error::Hook {
        module: module.name.clone(),
        stage,
        source,
    })
}

/// Per-module lines when `log_loaded_modules` is set, a single summary otherwise.
pub fn lifecycle_report(results: &[LifecycleResult], log_loaded_modules: bool) -> PhaseReport {
    let mut report = PhaseReport::new("Load modules");
    if log_loaded_modules {
        for r in results {
            report.push(r.message.clone());
        }
    } else {
        report.push("All modules loaded");
    }
    report
}
