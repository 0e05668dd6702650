use std::path::PathBuf;

use serde::Serialize;
use tracing::debug;

use crate::{
    config::Options,
    error::Result,
    graft::{BuildGraft, PluginRegistration, RenderedTemplate},
    templates,
};

/// What lifecycle hooks and the pipeline phases see of the host build.
///
/// Every registration lands in the [`BuildGraft`] borrowed for this build.
pub struct HostContext<'a> {
    options: &'a Options,
    graft: &'a mut BuildGraft,
}

impl<'a> HostContext<'a> {
    pub fn new(options: &'a Options, graft: &'a mut BuildGraft) -> Self {
        Self { options, graft }
    }

    pub fn options(&self) -> &'a Options {
        self.options
    }

    pub fn graft(&self) -> &BuildGraft {
        &*self.graft
    }

    /// Render `source` with `data` and register it under `file_name`.
    /// Registering the same file name again replaces the earlier output.
    pub fn add_template<S: Serialize>(
        &mut self,
        file_name: &str,
        source: &str,
        data: &S,
    ) -> Result<()> {
        let contents = templates::render(file_name, source, data)?;
        debug!(file = %file_name, bytes = contents.len(), "template registered");
        self.graft.add_template(RenderedTemplate {
            file_name: file_name.to_string(),
            contents,
        });
        Ok(())
    }

    pub fn add_plugin(&mut self, reg: PluginRegistration) {
        debug!(file = %reg.file_name, src = ?reg.src, ssr = reg.ssr, "plugin registered");
        self.graft.add_plugin(reg);
    }

    /// Render a glue plugin into the build and register the generated file.
    pub fn add_plugin_template<S: Serialize>(
        &mut self,
        file_name: &str,
        source: &str,
        data: &S,
        ssr: bool,
    ) -> Result<()> {
        self.add_template(file_name, source, data)?;
        self.add_plugin(PluginRegistration {
            src: PathBuf::from(file_name),
            file_name: file_name.to_string(),
            ssr,
        });
        Ok(())
    }

    /// Give `f` direct access to the build state, e.g. the alias table.
    pub fn extend_build<F>(&mut self, f: F)
    where
        F: FnOnce(&mut BuildGraft),
    {
        f(&mut *self.graft);
    }

    pub fn push_css(&mut self, path: PathBuf) {
        self.graft.push_css(path);
    }
}
