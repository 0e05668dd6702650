//! Checks and preparation that run before any module configuration is read.

use std::{fs, io, path::Path};

use tracing::{debug, warn};

use crate::{
    config::Options,
    error::{DirectoryKind, Error, Result},
    report::PhaseReport,
    resolve::ModuleDescriptor,
};

/// Run every pre-flight step in order, stopping at the first failure.
pub fn run(opts: &Options, modules: &[ModuleDescriptor]) -> Result<PhaseReport> {
    let mut report = PhaseReport::new("Before all modules");

    report.push(check_required_modules(opts, modules)?);
    if let Some(msg) = prepare_symlinks(opts)? {
        report.push(msg);
    }
    report.push(check_directories(opts)?);

    Ok(report)
}

pub fn check_required_modules(opts: &Options, modules: &[ModuleDescriptor]) -> Result<String> {
    for required in &opts.required {
        if !modules.iter().any(|m| &m.name == required) {
            return Err(Error::RequiredModuleMissing {
                module: required.clone(),
            });
        }
    }
    Ok("All required modules exist".to_string())
}

pub fn check_directories(opts: &Options) -> Result<String> {
    if !opts.modules.local.is_empty() && !opts.modules_dir.exists() {
        return Err(Error::DirectoryMissing {
            kind: DirectoryKind::Modules,
            path: opts.modules_dir.clone(),
        });
    }
    if !opts.modules.npm.is_empty() && !opts.vendor_dir.exists() {
        return Err(Error::DirectoryMissing {
            kind: DirectoryKind::Vendor,
            path: opts.vendor_dir.clone(),
        });
    }
    // A dangling or skipped vendor link counts as missing.
    for name in &opts.modules.npm {
        let entry = opts.vendor_dir.join(name);
        if !entry.exists() {
            return Err(Error::DirectoryMissing {
                kind: DirectoryKind::Vendor,
                path: entry,
            });
        }
    }
    Ok("Directories checked".to_string())
}

/// Point `<vendorDir>/<name>` at `<nodeModulesDir>/<name>` for every npm module.
///
/// Packages missing from node_modules are skipped; the directory check
/// reports them afterwards.
pub fn prepare_symlinks(opts: &Options) -> Result<Option<String>> {
    if opts.modules.npm.is_empty() {
        return Ok(None);
    }

    fs::create_dir_all(&opts.vendor_dir).map_err(|e| Error::io(&opts.vendor_dir, e))?;

    for name in &opts.modules.npm {
        let src = opts.node_modules_dir.join(name);
        let dst = opts.vendor_dir.join(name);

        if !src.exists() {
            warn!(module = %name, path = ?src, "npm package not found, skipping symlink");
            continue;
        }

        remove_existing(&dst).map_err(|e| Error::io(&dst, e))?;
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        symlink_dir(&src, &dst).map_err(|e| Error::io(&dst, e))?;
        debug!(module = %name, from = ?dst, to = ?src, "vendor symlink created");
    }

    Ok(Some("Symlinks created".to_string()))
}

fn remove_existing(path: &Path) -> io::Result<()> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    if meta.file_type().is_symlink() || meta.is_file() {
        fs::remove_file(path).or_else(|e| {
            // Windows directory junctions are removed as directories.
            if cfg!(windows) {
                fs::remove_dir(path)
            } else {
                Err(e)
            }
        })
    } else {
        fs::remove_dir_all(path)
    }
}

#[cfg(unix)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

#[cfg(windows)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(src, dst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ModulesList, resolve::PathResolver};

    fn opts(root: &Path, local: &[&str], npm: &[&str], required: &[&str]) -> Options {
        Options {
            modules: ModulesList {
                local: local.iter().map(|s| s.to_string()).collect(),
                npm: npm.iter().map(|s| s.to_string()).collect(),
            },
            required: required.iter().map(|s| s.to_string()).collect(),
            ..Options::default()
        }
        .anchored(root)
    }

    #[test]
    fn missing_required_module_is_named() {
        let tmp = tempfile::tempdir().unwrap();
        let o = opts(tmp.path(), &["only"], &[], &["missing"]);
        let mods = PathResolver::new(&o).resolve().unwrap();

        let err = check_required_modules(&o, &mods).unwrap_err();
        assert!(matches!(err, Error::RequiredModuleMissing { module } if module == "missing"));
    }

    #[test]
    fn missing_modules_dir_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let o = opts(tmp.path(), &["foo"], &[], &[]);

        let err = check_directories(&o).unwrap_err();
        assert!(matches!(
            err,
            Error::DirectoryMissing {
                kind: DirectoryKind::Modules,
                ..
            }
        ));
    }

    #[test]
    fn no_npm_modules_means_no_symlinks() {
        let tmp = tempfile::tempdir().unwrap();
        let o = opts(tmp.path(), &["foo"], &[], &[]);

        assert_eq!(prepare_symlinks(&o).unwrap(), None);
        assert!(!o.vendor_dir.exists());
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_point_into_node_modules() {
        let tmp = tempfile::tempdir().unwrap();
        let pkg_src = tmp.path().join("node_modules/@shop/cart/src/config");
        fs::create_dir_all(&pkg_src).unwrap();
        fs::write(pkg_src.join("index.toml"), "name = \"@shop/cart\"").unwrap();

        let o = opts(tmp.path(), &[], &["@shop/cart", "absent"], &[]);
        prepare_symlinks(&o).unwrap();
        // A second run replaces the existing link instead of failing.
        prepare_symlinks(&o).unwrap();

        let link = tmp.path().join("vendor/@shop/cart");
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert!(link.join("src/config/index.toml").exists());
        assert!(!tmp.path().join("vendor/absent").exists());

        let err = check_directories(&o).unwrap_err();
        assert!(matches!(
            err,
            Error::DirectoryMissing { kind: DirectoryKind::Vendor, ref path }
                if path == &tmp.path().join("vendor/absent")
        ));

        let linked = opts(tmp.path(), &[], &["@shop/cart"], &[]);
        assert_eq!(check_directories(&linked).unwrap(), "Directories checked");
    }

    #[test]
    fn npm_module_without_package_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let o = opts(tmp.path(), &[], &["@shop/cart"], &[]);

        prepare_symlinks(&o).unwrap();
        let err = check_directories(&o).unwrap_err();
        assert!(matches!(
            err,
            Error::DirectoryMissing { kind: DirectoryKind::Vendor, ref path }
                if path == &tmp.path().join("vendor/@shop/cart")
        ));
    }
}
