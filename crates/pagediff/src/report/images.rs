use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use super::image_file_name;

/// Write each annotated page as `diff_page_NNN.png` into `dir`, creating it if needed.
/// `images[i]` belongs to page index `i`; `None` entries are skipped.
pub fn write(dir: &Path, images: &[Option<Vec<u8>>]) -> Result<usize> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut written = 0;
    for (index, png) in images.iter().enumerate() {
        let Some(png) = png else { continue };
        let path = dir.join(image_file_name(index));
        std::fs::write(&path, png)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        written += 1;
    }
    debug!(dir = %dir.display(), written, "annotated pages written");
    Ok(written)
}
