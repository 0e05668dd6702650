//! Shared helpers for pipeline integration tests.
#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use modweave::{config::ModulesList, FsLoader, HookRegistry, Options, Pipeline};
use tempfile::TempDir;

/// Isolated project tree: `modules/`, `node_modules/` and `vendor/` under a temp dir.
pub struct TestProject {
    pub temp: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            temp: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    /// Write a file relative to the project root.
    pub fn write_file(&self, relative_path: &str, content: &str) -> PathBuf {
        let path = self.root().join(relative_path);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    /// A local module under `modules/<name>/src` with the given config body
    /// appended after `name = "<name>"`.
    pub fn local_module(&self, name: &str, config: &str) {
        self.write_file(
            &format!("modules/{name}/src/config/index.toml"),
            &format!("name = \"{name}\"\n{config}"),
        );
    }

    /// An npm package under `node_modules/<name>/src`.
    pub fn npm_module(&self, name: &str, config: &str) {
        self.write_file(
            &format!("node_modules/{name}/src/config/index.toml"),
            &format!("name = \"{name}\"\n{config}"),
        );
    }

    pub fn options(&self, local: &[&str], npm: &[&str]) -> Options {
        Options {
            modules: ModulesList {
                local: local.iter().map(|s| s.to_string()).collect(),
                npm: npm.iter().map(|s| s.to_string()).collect(),
            },
            verbose: false,
            ..Options::default()
        }
        .anchored(self.root())
    }

    pub fn module_path(&self, name: &str) -> PathBuf {
        self.root().join("modules").join(name).join("src")
    }
}

pub fn pipeline(opts: Options, hooks: HookRegistry) -> Pipeline {
    Pipeline::new(opts, Arc::new(FsLoader::new(hooks)))
}
