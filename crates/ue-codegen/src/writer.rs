//! Writes rendered modules to disk.

use camino::{Utf8Path, Utf8PathBuf};
use tracing::info;

use crate::emitter::ModuleSources;
use crate::error::CodegenError;

/// Writes each module into `<output_dir>/<module>/`.
///
/// Generated files are overwritten. An existing `__init__.py` is left alone
/// so hand-written package code survives regeneration.
///
/// Returns the paths written, in order.
///
/// # Errors
///
/// Returns [`CodegenError::Write`] for the first directory or file that
/// cannot be written.
pub fn write_modules(output_dir: &Utf8Path, modules: &[ModuleSources]) -> Result<Vec<Utf8PathBuf>, CodegenError> {
    let mut written = Vec::new();

    for module in modules {
        let dir = output_dir.join(&module.module);
        std::fs::create_dir_all(&dir).map_err(|e| CodegenError::write(&dir, e))?;

        let init = dir.join("__init__.py");
        if !init.exists() {
            std::fs::write(&init, "").map_err(|e| CodegenError::write(&init, e))?;
            written.push(init);
        }

        for (name, contents) in module.files() {
            let path = dir.join(name);
            std::fs::write(&path, contents).map_err(|e| CodegenError::write(&path, e))?;
            written.push(path);
        }
        info!(module = %module.module, dir = %dir, "module written");
    }

    Ok(written)
}
