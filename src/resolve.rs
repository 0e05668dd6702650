use std::{
    collections::BTreeSet,
    fmt,
    path::{Path, PathBuf},
};

use serde::Serialize;
use tracing::debug;

use crate::{
    config::{Options, DEFAULT_ORDER},
    error::{Error, Result},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    Local,
    Npm,
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleType::Local => f.write_str("local"),
            ModuleType::Npm => f.write_str("npm"),
        }
    }
}

/// Resolved identity and location of one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleDescriptor {
    pub name: String,
    pub kind: ModuleType,
    pub path: PathBuf,
    pub order: i64,
}

impl ModuleDescriptor {
    pub fn new(name: impl Into<String>, kind: ModuleType, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            kind,
            path: path.into(),
            order: DEFAULT_ORDER,
        }
    }

    pub fn with_order(&self, order: i64) -> Self {
        Self {
            order,
            ..self.clone()
        }
    }
}

/// Computes module paths from the global options.
pub struct PathResolver<'a> {
    pub opts: &'a Options,
}

impl<'a> PathResolver<'a> {
    pub fn new(opts: &'a Options) -> Self {
        Self { opts }
    }

    /// One descriptor per requested module: local modules first, then npm,
    /// each in declaration order.
    pub fn resolve(&self) -> Result<Vec<ModuleDescriptor>> {
        let modules = &self.opts.modules;
        if modules.is_empty() {
            return Err(Error::Configuration);
        }

        let mut seen = BTreeSet::new();
        let mut out = Vec::with_capacity(modules.local.len() + modules.npm.len());

        let local = modules
            .local
            .iter()
            .map(|name| ModuleDescriptor::new(name, ModuleType::Local, self.local_path(name)));
        let npm = modules
            .npm
            .iter()
            .map(|name| ModuleDescriptor::new(name, ModuleType::Npm, self.npm_path(name)));

        for desc in local.chain(npm) {
            if !seen.insert(desc.name.clone()) {
                return Err(Error::DuplicateModule { module: desc.name });
            }
            debug!(module = %desc.name, kind = %desc.kind, path = ?desc.path, "resolved module");
            out.push(desc);
        }

        Ok(out)
    }

    /// `<modulesDir>/<name>/src` when present, else `<modulesDir>/<name>`.
    pub fn local_path(&self, name: &str) -> PathBuf {
        let root = self.opts.modules_dir.join(name);
        let src = root.join("src");
        if src.is_dir() {
            src
        } else {
            root
        }
    }

    /// `<vendorDir>/<name>/src`; the vendor entry is a symlink into node_modules.
    pub fn npm_path(&self, name: &str) -> PathBuf {
        self.opts.vendor_dir.join(name).join("src")
    }
}

/// Join a module-relative target onto the module root, dropping any trailing slash.
pub fn module_relative(module_path: &Path, target: &str) -> PathBuf {
    let joined = normalize(&module_path.join(target));
    let s = joined.to_string_lossy();
    let trimmed = s.trim_end_matches('/');
    if trimmed.is_empty() {
        PathBuf::from("/")
    } else {
        PathBuf::from(trimmed)
    }
}

/// Lexically fold `.` and `..` components, like a path join would.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModulesList;

    fn options(local: &[&str], npm: &[&str], root: &Path) -> Options {
        Options {
            modules: ModulesList {
                local: local.iter().map(|s| s.to_string()).collect(),
                npm: npm.iter().map(|s| s.to_string()).collect(),
            },
            ..Options::default()
        }
        .anchored(root)
    }

    #[test]
    fn empty_request_is_configuration_error() {
        let opts = options(&[], &[], Path::new("/p"));
        let err = PathResolver::new(&opts).resolve().unwrap_err();
        assert!(err.is_noop());
    }

    #[test]
    fn local_prefers_src_directory() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("modules/with-src/src")).unwrap();
        std::fs::create_dir_all(tmp.path().join("modules/plain")).unwrap();

        let opts = options(&["with-src", "plain"], &["@scope/pkg"], tmp.path());
        let mods = PathResolver::new(&opts).resolve().unwrap();

        assert_eq!(mods[0].path, tmp.path().join("modules/with-src/src"));
        assert_eq!(mods[1].path, tmp.path().join("modules/plain"));
        assert_eq!(mods[2].kind, ModuleType::Npm);
        assert_eq!(mods[2].path, tmp.path().join("vendor/@scope/pkg/src"));
        assert!(mods.iter().all(|m| m.order == DEFAULT_ORDER));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let opts = options(&["foo"], &["foo"], Path::new("/p"));
        let err = PathResolver::new(&opts).resolve().unwrap_err();
        assert!(matches!(err, Error::DuplicateModule { module } if module == "foo"));
    }

    #[test]
    fn module_relative_strips_trailing_slash() {
        let root = Path::new("/app/modules/foo/src");
        assert_eq!(module_relative(root, "./"), PathBuf::from("/app/modules/foo/src"));
        assert_eq!(
            module_relative(root, "components/"),
            PathBuf::from("/app/modules/foo/src/components")
        );
        assert_eq!(
            module_relative(root, "../assets/main.scss"),
            PathBuf::from("/app/modules/foo/assets/main.scss")
        );
    }
}
