pub mod aggregate;
pub mod cli;
pub mod config;
pub mod emit;
pub mod error;
pub mod graft;
pub mod host;
pub mod lifecycle;
pub mod loader;
pub mod order;
pub mod pipeline;
pub mod preflight;
pub mod relations;
pub mod report;
pub mod resolve;
pub mod templates;

// Convenience re-exports (optional, but nice)
pub use config::{ModuleConfiguration, Options};
pub use error::{Error, Result};
pub use graft::BuildGraft;
pub use host::HostContext;
pub use lifecycle::{HookRegistry, LifecycleEntry, LifecycleResult};
pub use loader::{FsLoader, ModuleLoader};
pub use pipeline::{BuildReport, ModulePlan, Pipeline, PipelineOutcome};
pub use resolve::{ModuleDescriptor, ModuleType};
