//! The four-phase module pipeline:
//! pre-flight -> configuration -> lifecycle -> aggregation.

use std::sync::Arc;

use tracing::info;

use crate::{
    aggregate,
    config::{ModuleConfiguration, Options},
    error::{Error, Result},
    graft::{graft_modules, BuildGraft},
    host::HostContext,
    lifecycle::{lifecycle_report, run_lifecycle, LifecycleResult},
    loader::{load_configurations, ModuleLoader},
    order::plan_order,
    preflight,
    relations::check_relations,
    report::PhaseReport,
    resolve::{ModuleDescriptor, PathResolver},
};

/// Outcome of a finished build.
#[derive(Debug)]
pub struct BuildReport {
    pub graft: BuildGraft,
    pub load_order: Vec<ModuleDescriptor>,
    pub lifecycle: Vec<LifecycleResult>,
    pub phases: Vec<PhaseReport>,
}

#[derive(Debug)]
pub enum PipelineOutcome {
    /// No modules were requested.
    Skipped,
    Completed(BuildReport),
}

/// Modules resolved, configured, validated and ordered; nothing grafted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModulePlan {
    pub load_order: Vec<ModuleDescriptor>,
    pub configurations: Vec<ModuleConfiguration>,
}

pub struct Pipeline {
    options: Options,
    loader: Arc<dyn ModuleLoader>,
}

impl Pipeline {
    pub fn new(options: Options, loader: Arc<dyn ModuleLoader>) -> Self {
        Self { options, loader }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Run every phase into a fresh [`BuildGraft`].
    pub async fn run(&self) -> Result<PipelineOutcome> {
        self.run_with(BuildGraft::new()).await
    }

    /// Run every phase, grafting onto `graft` (e.g. host css already present).
    ///
    /// Any failure aborts the remaining phases; mutations already applied to
    /// the graft are not undone.
    pub async fn run_with(&self, mut graft: BuildGraft) -> Result<PipelineOutcome> {
        let opts = &self.options;
        let mut phases = Vec::new();

        let (modules, before) = match self.preflight() {
            Ok(v) => v,
            Err(Error::Configuration) => {
                info!("no modules to load");
                return Ok(PipelineOutcome::Skipped);
            }
            Err(e) => return Err(e),
        };
        info!(modules = modules.len(), "module pipeline started");
        before.emit(opts.verbose);
        phases.push(before);

        let config_dir = &opts.directories.config;
        let configs = load_configurations(Arc::clone(&self.loader), &modules, config_dir).await?;
        let relations = check_relations(&configs)?;
        let load_order = plan_order(&modules, &configs)?;

        let mut ctx = HostContext::new(opts, &mut graft);

        let mut prepare = graft_modules(&mut ctx, &load_order, &configs)?;
        prepare.logs.insert(0, relations);
        prepare.emit(opts.verbose);
        phases.push(prepare);

        let lifecycle = run_lifecycle(self.loader.as_ref(), &mut ctx, &load_order)?;
        let loaded = lifecycle_report(&lifecycle, opts.log_loaded_modules);
        loaded.emit(opts.verbose);
        phases.push(loaded);

        let after = aggregate::register_all(&mut ctx, &load_order).await?;
        after.emit(opts.verbose);
        phases.push(after);

        info!(modules = load_order.len(), "module pipeline finished");
        Ok(PipelineOutcome::Completed(BuildReport {
            graft,
            load_order,
            lifecycle,
            phases,
        }))
    }

    /// Resolve, check, load and order modules without touching a build.
    ///
    /// Returns [`Error::Configuration`] when no modules are requested.
    pub async fn plan(&self) -> Result<ModulePlan> {
        let (modules, _) = self.preflight()?;
        let config_dir = &self.options.directories.config;
        let configurations =
            load_configurations(Arc::clone(&self.loader), &modules, config_dir).await?;
        check_relations(&configurations)?;
        let load_order = plan_order(&modules, &configurations)?;

        Ok(ModulePlan {
            load_order,
            configurations,
        })
    }

    fn preflight(&self) -> Result<(Vec<ModuleDescriptor>, PhaseReport)> {
        let modules = PathResolver::new(&self.options).resolve()?;
        let report = preflight::run(&self.options, &modules)?;
        Ok((modules, report))
    }
}
