//! Post-load phase: gathers route, extend, middleware, store and locale files
//! from every module and emits one merged artifact for each kind.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use regex::Regex;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::{
    config::Options,
    error::{Error, Result},
    host::HostContext,
    loader::find_paths,
    report::PhaseReport,
    resolve::ModuleDescriptor,
    templates,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedPath {
    pub name: String,
    pub path: String,
}

/// Everything the scans found, in module order. Each scan succeeds or fails
/// on its own.
struct Discovered {
    routes: Result<Vec<PathBuf>>,
    extends: Result<Vec<PathBuf>>,
    middleware: Result<Vec<PathBuf>>,
    /// `None` when state management is disabled.
    store: Result<Option<Vec<(String, PathBuf)>>>,
    locales: Result<Vec<(String, Value)>>,
}

/// Scan all modules concurrently, then register every merged artifact.
///
/// Every step runs even if another one failed; the first error is returned
/// once all of them are done.
pub async fn register_all(
    ctx: &mut HostContext<'_>,
    modules: &[ModuleDescriptor],
) -> Result<PhaseReport> {
    let opts = ctx.options();
    let found = discover(opts, modules).await?;

    let steps: Vec<Result<String>> = vec![
        found.routes.and_then(|r| register_router(ctx, &r)),
        found.extends.and_then(|e| register_extends(ctx, &e)),
        found.middleware.and_then(|m| register_middleware(ctx, &m)),
        register_plugins(ctx),
        found.store.and_then(|store| match store {
            Some(store) => register_store(ctx, &store),
            None => Ok(String::new()),
        }),
        found.locales.and_then(|l| register_i18n(ctx, &l)),
    ];

    let mut report = PhaseReport::new("After all modules");
    let mut first_err: Option<Error> = None;
    for step in steps {
        match step {
            Ok(msg) => report.push(msg),
            Err(e) => {
                warn!(error = %e, "artifact registration failed");
                first_err.get_or_insert(e);
            }
        }
    }

    match first_err {
        Some(e) => Err(e),
        None => Ok(report),
    }
}

async fn discover(opts: &Options, modules: &[ModuleDescriptor]) -> Result<Discovered> {
    let dirs = &opts.directories;
    let routes_re = pattern(r"^routes\.js$")?;
    let extends_re = pattern(r"^extends\.js$")?;
    let middleware_re = pattern(r"\.global\.js$")?;
    let store_re = pattern(r"^index\.js$")?;

    let store_scan = async {
        if opts.state_management {
            find_paths(modules, &dirs.store, &store_re).await.map(Some)
        } else {
            Ok(None)
        }
    };

    let (routes, extends, middleware, store, locales) = tokio::join!(
        find_paths(modules, &dirs.config, &routes_re),
        find_paths(modules, &dirs.config, &extends_re),
        find_paths(modules, &dirs.middleware, &middleware_re),
        store_scan,
        merge_locales(modules, &dirs.locales, &opts.i18n),
    );

    let store = store.map(|scan| {
        scan.map(|per_module| {
            modules
                .iter()
                .zip(per_module)
                .flat_map(|(m, files)| {
                    let root = m.path.join(&dirs.store);
                    files
                        .into_iter()
                        .map(move |f| (store_name(&m.name, &root, &f), f))
                        .collect::<Vec<_>>()
                })
                .collect()
        })
    });

    Ok(Discovered {
        routes: routes.map(flatten),
        extends: extends.map(flatten),
        middleware: middleware.map(flatten),
        store,
        locales,
    })
}

/// Per-module lists into one list; modules without matches drop out.
fn flatten(per_module: Vec<Vec<PathBuf>>) -> Vec<PathBuf> {
    per_module.into_iter().flatten().collect()
}

fn pattern(re: &str) -> Result<Regex> {
    Regex::new(re).map_err(|e| Error::Internal(format!("bad file pattern {re}: {e}")))
}

/// One merged bundle per locale code, in the order the codes were configured.
async fn merge_locales(
    modules: &[ModuleDescriptor],
    locales_dir: &str,
    codes: &[String],
) -> Result<Vec<(String, Value)>> {
    let mut set = JoinSet::new();

    for (idx, code) in codes.iter().cloned().enumerate() {
        let modules = modules.to_vec();
        let locales_dir = locales_dir.to_string();
        set.spawn(async move {
            let re = pattern(&format!(r"(?i)^{}\.json$", regex::escape(&code)))?;
            let files = find_paths(&modules, &locales_dir, &re).await?;

            let mut merged = Value::Object(Map::new());
            for file in files.into_iter().flatten() {
                let text = tokio::fs::read_to_string(&file)
                    .await
                    .map_err(|e| Error::io(&file, e))?;
                let fragment: Value = serde_json::from_str(&text).map_err(|source| Error::Locale {
                    path: file.clone(),
                    source,
                })?;
                debug!(locale = %code, file = ?file, "merging locale fragment");
                deep_merge(&mut merged, fragment);
            }
            Ok::<_, Error>((idx, code, merged))
        });
    }

    let mut slots: Vec<Option<(String, Value)>> = vec![None; codes.len()];
    while let Some(joined) = set.join_next().await {
        let (idx, code, merged) = joined??;
        slots[idx] = Some((code, merged));
    }
    Ok(slots.into_iter().flatten().collect())
}

/// Merge `src` into `dst`: objects recurse, arrays concatenate, anything else
/// is replaced by the later value.
pub fn deep_merge(dst: &mut Value, src: Value) {
    match (dst, src) {
        (Value::Object(d), Value::Object(s)) => {
            for (k, v) in s {
                match d.get_mut(&k) {
                    Some(existing) => deep_merge(existing, v),
                    None => {
                        d.insert(k, v);
                    }
                }
            }
        }
        (Value::Array(d), Value::Array(s)) => d.extend(s),
        (d, s) => *d = s,
    }
}

fn register_router(ctx: &mut HostContext<'_>, routes: &[PathBuf]) -> Result<String> {
    ctx.add_template(
        templates::ROUTER.file_name,
        templates::ROUTER.source,
        &json!({ "router": display_all(routes) }),
    )?;
    Ok("Router registered".to_string())
}

fn register_extends(ctx: &mut HostContext<'_>, extends: &[PathBuf]) -> Result<String> {
    ctx.add_template(
        templates::EXTENDS.file_name,
        templates::EXTENDS.source,
        &json!({ "extend": display_all(extends) }),
    )?;
    ctx.add_template(
        templates::ROUTER_HELPER.file_name,
        templates::ROUTER_HELPER.source,
        &json!({}),
    )?;
    Ok("Extends registered".to_string())
}

fn register_middleware(ctx: &mut HostContext<'_>, files: &[PathBuf]) -> Result<String> {
    let middleware: Vec<NamedPath> = files
        .iter()
        .map(|f| NamedPath {
            name: middleware_name(f),
            path: f.to_string_lossy().into_owned(),
        })
        .collect();
    note_collisions("middleware", &middleware);

    ctx.add_template(
        templates::MIDDLEWARE.file_name,
        templates::MIDDLEWARE.source,
        &json!({ "middleware": middleware }),
    )?;
    Ok("Middleware registered".to_string())
}

fn register_store(ctx: &mut HostContext<'_>, store: &[(String, PathBuf)]) -> Result<String> {
    let store: Vec<NamedPath> = store
        .iter()
        .map(|(name, path)| NamedPath {
            name: name.clone(),
            path: path.to_string_lossy().into_owned(),
        })
        .collect();
    note_collisions("store", &store);

    ctx.add_template(
        templates::STORE.file_name,
        templates::STORE.source,
        &json!({ "store": store }),
    )?;
    Ok("Store registered".to_string())
}

fn register_i18n(ctx: &mut HostContext<'_>, locales: &[(String, Value)]) -> Result<String> {
    if locales.is_empty() {
        return Ok(String::new());
    }

    for (code, bundle) in locales {
        let body = serde_json::to_string_pretty(bundle)
            .map_err(|e| Error::Internal(format!("locale {code} is not serializable: {e}")))?;
        ctx.add_template(
            &templates::locale_file_name(code),
            templates::I18N_SOURCE,
            &json!({ "i18n": body }),
        )?;
    }
    Ok("I18n registered".to_string())
}

/// The runtime glue plugin always; the state glue only with state management.
fn register_plugins(ctx: &mut HostContext<'_>) -> Result<String> {
    ctx.add_plugin_template(
        templates::PLUGIN.file_name,
        templates::PLUGIN.source,
        &json!({}),
        true,
    )?;
    if ctx.options().state_management {
        ctx.add_plugin_template(
            templates::PLUGIN_STATE.file_name,
            templates::PLUGIN_STATE.source,
            &json!({}),
            true,
        )?;
    }
    Ok("Plugins registered".to_string())
}

/// Names that occur more than once; the later entry wins in the generated
/// object, so each overwrite is logged.
fn note_collisions(kind: &str, entries: &[NamedPath]) -> Vec<String> {
    let mut seen: BTreeMap<&str, &str> = BTreeMap::new();
    let mut collided = Vec::new();
    for entry in entries {
        if let Some(previous) = seen.insert(&entry.name, &entry.path) {
            debug!(
                kind,
                name = %entry.name,
                previous = %previous,
                replacement = %entry.path,
                "generated key overwritten"
            );
            collided.push(entry.name.clone());
        }
    }
    collided
}

fn display_all(paths: &[PathBuf]) -> Vec<String> {
    paths.iter().map(|p| p.to_string_lossy().into_owned()).collect()
}

/// `auth.global.js` -> `auth`
fn middleware_name(path: &Path) -> String {
    let file = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    file.strip_suffix(".global.js").unwrap_or(&file).to_string()
}

/// Store namespace: the index file's directory below the store root, or the
/// module name for a root-level index.
fn store_name(module: &str, store_root: &Path, index: &Path) -> String {
    let rel = index
        .parent()
        .and_then(|dir| dir.strip_prefix(store_root).ok())
        .map(|rel| {
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default();

    if rel.is_empty() {
        module.to_string()
    } else {
        rel
    }
}
