use std::path::Path;

use anyhow::{Context, Result};

use super::{CONFIG_DIR, CONFIG_FILE};

/// Hand-crafted config template with every key commented out, so
/// `pagediff init` shows the available knobs while keeping the defaults.
const CONFIG_TEMPLATE: &str = r#"# ─────────────────────────────────────────────────────────
# Rendering: resolution used when rasterizing PDF pages.
# ─────────────────────────────────────────────────────────
[render]
# dpi = 150                         # higher = finer diffs, slower

# ─────────────────────────────────────────────────────────
# Comparison: all fields optional.
# ─────────────────────────────────────────────────────────
[diff]
# threshold = 0                     # per-channel tolerance 0-255 (0 = exact)
# merge_gap = 2                     # merge regions this many pixels apart
# noise_floor = 10                  # drop regions with box area <= this
# weighting = "page-mean"           # "page-mean" | "pixel-weighted"

# ─────────────────────────────────────────────────────────
# Annotated page images (HTML and PDF reports, --output-images).
# ─────────────────────────────────────────────────────────
[highlight]
# color = [255, 0, 0]
# stroke_width = 3
# mask_tint = [255, 0, 0]           # fill colour for differing pixels, or false

[run]
# parallel = 4                      # pages compared concurrently
"#;

pub fn config_file_exists() -> bool {
    Path::new(CONFIG_DIR).join(CONFIG_FILE).exists()
}

/// Write the commented template. Used by `pagediff init`.
pub fn write_template() -> Result<()> {
    let dir = Path::new(CONFIG_DIR);
    std::fs::create_dir_all(dir).context("Failed to create .pagediff directory")?;
    let path = dir.join(CONFIG_FILE);
    std::fs::write(&path, CONFIG_TEMPLATE)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_parses_to_defaults() {
        let config = super::super::parse(CONFIG_TEMPLATE, Path::new("template")).unwrap();
        assert_eq!(config.render.dpi, None);
        assert_eq!(config.diff.threshold, None);
        assert_eq!(config.run.parallel, None);
    }
}
