//! Error types for the module pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Which module source a missing directory was declared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryKind {
    Modules,
    Vendor,
}

impl std::fmt::Display for DirectoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DirectoryKind::Modules => f.write_str("Local modules"),
            DirectoryKind::Vendor => f.write_str("Vendor"),
        }
    }
}

/// Lifecycle hook stage, used to tag hook failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStage {
    Before,
    Main,
    After,
}

impl std::fmt::Display for HookStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HookStage::Before => f.write_str("before_module"),
            HookStage::Main => f.write_str("main"),
            HookStage::After => f.write_str("after_module"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// Nothing to load. Callers usually treat this as a no-op.
    #[error("no modules to load")]
    Configuration,

    #[error("Module [{module}] configuration file does not exist: {}", path.display())]
    MissingConfiguration { module: String, path: PathBuf },

    #[error("Module [{module}] configuration is invalid ({}): {message}", path.display())]
    InvalidConfiguration {
        module: String,
        path: PathBuf,
        message: String,
    },

    #[error("Module [{module}] declares name [{declared}] in its configuration")]
    ModuleNameMismatch { module: String, declared: String },

    #[error(
        "Module [{module}] has relation with [{relation}]. Module [{relation}] does not exist."
    )]
    UnsatisfiedRelation { module: String, relation: String },

    #[error("Required module [{module}] does not exist.")]
    RequiredModuleMissing { module: String },

    #[error("Module [{module}] is declared more than once")]
    DuplicateModule { module: String },

    #[error("Module [{module}] has an invalid lifecycle entry: {reason}")]
    InvalidModuleExport { module: String, reason: String },

    #[error("{kind} directory [{}] does not exist.", path.display())]
    DirectoryMissing { kind: DirectoryKind, path: PathBuf },

    #[error("Module [{module}] failed in {stage} hook")]
    Hook {
        module: String,
        stage: HookStage,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to render template {name}")]
    Template {
        name: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("invalid locale file {}", path.display())]
    Locale {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error at {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("internal consistency error: {0}")]
    Internal(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// True for the "nothing to do" outcome that callers may turn into a no-op.
    pub fn is_noop(&self) -> bool {
        matches!(self, Error::Configuration)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
