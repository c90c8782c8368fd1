use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use image::RgbImage;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::debug;

use super::load_rgb;

/// Per-page rasterization timeout. Large pages at high DPI can take a while.
const RENDER_TIMEOUT: Duration = Duration::from_secs(120);

/// PDF rasterized page by page with poppler's `pdftoppm`.
///
/// Each page is written as a PNG into a private scratch directory, decoded,
/// and deleted; the directory itself goes away when the document is dropped.
pub struct PdfDocument {
    path: PathBuf,
    dpi: u32,
    pages: usize,
    scratch: TempDir,
}

impl PdfDocument {
    pub async fn open(path: &Path, dpi: u32) -> Result<Self> {
        let output = Command::new("pdfinfo")
            .arg(path)
            .output()
            .await
            .context("Failed to run pdfinfo (is poppler-utils installed?)")?;
        if !output.status.success() {
            bail!(
                "pdfinfo failed for {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let pages = parse_page_count(&stdout)
            .with_context(|| format!("pdfinfo reported no page count for {}", path.display()))?;

        let scratch = tempfile::Builder::new()
            .prefix("pagediff-")
            .tempdir()
            .context("Failed to create scratch directory")?;

        debug!(path = %path.display(), pages, dpi, "pdf opened");
        Ok(Self {
            path: path.to_path_buf(),
            dpi,
            pages,
            scratch,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn page_count(&self) -> usize {
        self.pages
    }

    pub async fn render_page(&self, index: usize) -> Result<RgbImage> {
        if index >= self.pages {
            bail!(
                "Page {index} does not exist in {} ({} pages)",
                self.path.display(),
                self.pages
            );
        }

        // pdftoppm numbers pages from 1; -singlefile writes exactly `<prefix>.png`.
        let number = (index + 1).to_string();
        let prefix = self.scratch.path().join(format!("page-{number}"));
        let png = prefix.with_extension("png");

        let mut cmd = Command::new("pdftoppm");
        cmd.args(["-png", "-singlefile", "-r"])
            .arg(self.dpi.to_string())
            .args(["-f", number.as_str(), "-l", number.as_str()])
            .arg(&self.path)
            .arg(&prefix)
            .kill_on_drop(true);
        let output = tokio::time::timeout(RENDER_TIMEOUT, cmd.output())
            .await
            .with_context(|| {
                format!(
                    "Rendering page {number} of {} timed out after {}s",
                    self.path.display(),
                    RENDER_TIMEOUT.as_secs()
                )
            })?
            .context("Failed to run pdftoppm (is poppler-utils installed?)")?;
        if !output.status.success() {
            bail!(
                "pdftoppm failed on page {number} of {}: {}",
                self.path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let image = load_rgb(png.clone()).await;
        let _ = tokio::fs::remove_file(&png).await;
        image
    }
}

/// Extract `Pages:` from `pdfinfo` output.
fn parse_page_count(info: &str) -> Option<usize> {
    info.lines()
        .find_map(|line| line.strip_prefix("Pages:"))
        .and_then(|rest| rest.trim().parse().ok())
}
