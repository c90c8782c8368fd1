use anyhow::{Result, bail};

use crate::config;

/// `pagediff init`: create .pagediff/config.toml.
pub fn init(force: bool) -> Result<()> {
    if !force && config::config_file_exists() {
        bail!(".pagediff/config.toml already exists (use --force to overwrite)");
    }

    config::write_template()?;

    let verb = if force { "Regenerated" } else { "Created" };
    println!("{verb} .pagediff/config.toml");
    Ok(())
}
