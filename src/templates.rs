use minijinja::{AutoEscape, Environment};
use serde::Serialize;

use crate::error::{Error, Result};

/// A built-in template and the file name it is generated under.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinTemplate {
    pub file_name: &'static str,
    pub source: &'static str,
}

pub const ROUTER: BuiltinTemplate = BuiltinTemplate {
    file_name: "router.modules.js",
    source: include_str!("../templates/router.js.j2"),
};

pub const EXTENDS: BuiltinTemplate = BuiltinTemplate {
    file_name: "extends.modules.js",
    source: include_str!("../templates/extends.js.j2"),
};

pub const ROUTER_HELPER: BuiltinTemplate = BuiltinTemplate {
    file_name: "routerHelper.modules.js",
    source: include_str!("../templates/routerHelper.js.j2"),
};

pub const MIDDLEWARE: BuiltinTemplate = BuiltinTemplate {
    file_name: "middleware.modules.js",
    source: include_str!("../templates/middleware.js.j2"),
};

pub const STORE: BuiltinTemplate = BuiltinTemplate {
    file_name: "store.modules.js",
    source: include_str!("../templates/store.js.j2"),
};

pub const PLUGIN: BuiltinTemplate = BuiltinTemplate {
    file_name: "plugin.modules.js",
    source: include_str!("../templates/plugin.js.j2"),
};

pub const PLUGIN_STATE: BuiltinTemplate = BuiltinTemplate {
    file_name: "pluginVuex.modules.js",
    source: include_str!("../templates/pluginVuex.js.j2"),
};

/// Source for `locales/<code>.json`; expects a pre-serialized `i18n` string.
pub const I18N_SOURCE: &str = include_str!("../templates/i18n.json.j2");

pub fn locale_file_name(code: &str) -> String {
    format!("locales/{code}.json")
}

/// Render `source` with `data` as the template context.
///
/// Output is never auto-escaped; string literals meant for JS go through the
/// `tojson` filter instead.
pub fn render<S: Serialize>(name: &str, source: &str, data: &S) -> Result<String> {
    render_minijinja(name, source, data).map_err(|source| Error::Template {
        name: name.to_string(),
        source,
    })
}

fn render_minijinja<S: Serialize>(
    name: &str,
    source: &str,
    data: &S,
) -> std::result::Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::None);

    // JSON literal for any value, e.g. a quoted and escaped import path.
    env.add_filter(
        "tojson",
        |v: minijinja::Value| -> std::result::Result<String, minijinja::Error> {
            serde_json::to_string(&v).map_err(|e| {
                minijinja::Error::new(minijinja::ErrorKind::InvalidOperation, e.to_string())
            })
        },
    );

    env.add_template(name, source)?;
    let tpl = env.get_template(name)?;
    tpl.render(minijinja::Value::from_serialize(data))
}
