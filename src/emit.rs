use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{
    error::{Error, Result},
    graft::BuildGraft,
};

/// Name of the manifest listing aliases, css and plugins.
pub const MANIFEST_FILE: &str = "graft.json";

/// Write every generated template under `out_dir`, plus the graft manifest.
/// Returns the written paths, manifest last.
pub fn write_graft(graft: &BuildGraft, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(graft.templates.len() + 1);

    for tpl in &graft.templates {
        let path = out_dir.join(&tpl.file_name);
        write_file(&path, &tpl.contents)?;
        debug!(file = ?path, "generated file written");
        written.push(path);
    }

    let manifest = serde_json::to_string_pretty(graft)
        .map_err(|e| Error::Internal(format!("graft manifest is not serializable: {e}")))?;
    let path = out_dir.join(MANIFEST_FILE);
    write_file(&path, &manifest)?;
    written.push(path);

    Ok(written)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    fs::write(path, contents).map_err(|e| Error::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graft::RenderedTemplate;

    #[test]
    fn writes_templates_and_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        let mut graft = BuildGraft::new();
        graft.set_alias("@Core", PathBuf::from("/m/core"));
        graft.add_template(RenderedTemplate {
            file_name: "locales/en.json".into(),
            contents: "{}".into(),
        });

        let written = write_graft(&graft, tmp.path()).unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(fs::read_to_string(tmp.path().join("locales/en.json")).unwrap(), "{}");

        let text = fs::read_to_string(tmp.path().join(MANIFEST_FILE)).unwrap();
        let manifest: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(manifest["aliases"]["@Core"], "/m/core");
        assert!(manifest.get("templates").is_none());
    }
}
