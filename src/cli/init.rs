//! `roleaudit init` - scaffold a roleaudit.toml

use crate::config::{example_config, CONFIG_FILE_NAME};
use anyhow::{bail, Context, Result};
use std::path::Path;

pub fn run(dir: &Path) -> Result<()> {
    let target = dir.join(CONFIG_FILE_NAME);
    if target.exists() {
        bail!("{} already exists, not overwriting", target.display());
    }
    std::fs::write(&target, example_config())
        .with_context(|| format!("failed to write {}", target.display()))?;
    println!("Wrote {}", target.display());
    Ok(())
}
