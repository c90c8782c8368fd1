mod normalize;
mod pdf;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use image::RgbImage;
use tracing::debug;

pub use self::normalize::{SizeMismatch, normalize};
use self::pdf::PdfDocument;

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

/// A paginated input: a PDF, a single image, or a directory of page images.
pub enum Document {
    Images { path: PathBuf, pages: Vec<PathBuf> },
    Pdf(PdfDocument),
}

impl Document {
    pub async fn open(path: &Path, dpi: u32) -> Result<Self> {
        if !path.exists() {
            bail!("Document not found: {}", path.display());
        }

        let doc = if path.is_dir() {
            Self::Images {
                path: path.to_path_buf(),
                pages: list_page_images(path)?,
            }
        } else if has_extension(path, &["pdf"]) {
            Self::Pdf(PdfDocument::open(path, dpi).await?)
        } else {
            Self::Images {
                path: path.to_path_buf(),
                pages: vec![path.to_path_buf()],
            }
        };

        debug!(path = %path.display(), pages = doc.page_count(), "document opened");
        Ok(doc)
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Images { path, .. } => path,
            Self::Pdf(pdf) => pdf.path(),
        }
    }

    pub fn page_count(&self) -> usize {
        match self {
            Self::Images { pages, .. } => pages.len(),
            Self::Pdf(pdf) => pdf.page_count(),
        }
    }

    /// Rasterize page `index` (0-based) as RGB.
    pub async fn render_page(&self, index: usize) -> Result<RgbImage> {
        match self {
            Self::Images { pages, path } => {
                let page = pages.get(index).with_context(|| {
                    format!(
                        "Page {index} does not exist in {} ({} pages)",
                        path.display(),
                        pages.len()
                    )
                })?;
                load_rgb(page.clone()).await
            }
            Self::Pdf(pdf) => pdf.render_page(index).await,
        }
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

/// Image files directly inside `dir`, sorted by file name.
fn list_page_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))?;
    let mut pages: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file() && has_extension(p, &IMAGE_EXTENSIONS))
        .collect();
    pages.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(pages)
}

/// Decode an image file on the blocking pool, dropping any alpha channel.
pub(crate) async fn load_rgb(path: PathBuf) -> Result<RgbImage> {
    tokio::task::spawn_blocking(move || {
        let img = image::open(&path)
            .with_context(|| format!("Failed to decode {}", path.display()))?;
        Ok(img.to_rgb8())
    })
    .await
    .context("Image decode task panicked")?
}
