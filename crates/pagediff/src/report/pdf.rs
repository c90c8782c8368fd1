//! Printable diff document: summary text first, then one annotated image per
//! compared page, built with printpdf's op-list API.

use std::path::Path;

use anyhow::{Context, Result};
use pagediff_engine::{ComparisonSummary, PageComparison};
use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, RawImage,
    RawImageData, RawImageFormat, TextItem, XObjectTransform,
};
use tracing::debug;

use super::{ReportMeta, page_label, text};

const PAGE_W: Mm = Mm(210.0);
const PAGE_H: Mm = Mm(297.0);
const MARGIN_MM: f32 = 15.0;
const FONT_SIZE_PT: f32 = 10.0;
const LINE_HEIGHT_PT: f32 = 13.0;
const HEADING_SIZE_PT: f32 = 12.0;

fn text_line(ops: &mut Vec<Op>, line: &str, x: f32, y: f32, size: f32) {
    ops.push(Op::StartTextSection);
    ops.push(Op::SetTextCursor {
        pos: Point { x: Pt(x), y: Pt(y) },
    });
    ops.push(Op::SetFontSizeBuiltinFont {
        size: Pt(size),
        font: BuiltinFont::Courier,
    });
    ops.push(Op::WriteTextBuiltinFont {
        items: vec![TextItem::Text(line.to_string())],
        font: BuiltinFont::Courier,
    });
    ops.push(Op::EndTextSection);
}

/// Split `line` into chunks of at most `max` characters.
fn wrap_line(line: &str, max: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars.chunks(max.max(1)).map(|c| c.iter().collect()).collect()
}

/// Summary text laid out top to bottom, breaking onto as many pages as needed.
fn summary_pages(summary_text: &str) -> Vec<PdfPage> {
    let margin_pt = Mm(MARGIN_MM).into_pt().0;
    let page_h_pt = PAGE_H.into_pt().0;
    let usable_w_pt = PAGE_W.into_pt().0 - 2.0 * margin_pt;
    // Courier advances 0.6 em per glyph.
    let max_chars = (usable_w_pt / (0.6 * FONT_SIZE_PT)) as usize;
    let lines_per_page = ((page_h_pt - 2.0 * margin_pt) / LINE_HEIGHT_PT) as usize;

    let lines: Vec<String> = summary_text
        .lines()
        .flat_map(|l| wrap_line(l, max_chars))
        .collect();

    lines
        .chunks(lines_per_page.max(1))
        .map(|chunk| {
            let mut ops = Vec::new();
            for (i, line) in chunk.iter().enumerate() {
                let y = page_h_pt - margin_pt - FONT_SIZE_PT - i as f32 * LINE_HEIGHT_PT;
                text_line(&mut ops, line, margin_pt, y, FONT_SIZE_PT);
            }
            PdfPage::new(PAGE_W, PAGE_H, ops)
        })
        .collect()
}

fn page_heading(page: &PageComparison) -> String {
    if page.is_identical {
        format!("{}: IDENTICAL", page_label(page.page_index))
    } else {
        format!(
            "{}: DIFFERENT ({:.2}% similar, {} region(s))",
            page_label(page.page_index),
            page.similarity_percentage,
            page.region_count()
        )
    }
}

/// One page: heading, then the annotated image scaled down to fit below it.
fn image_page(doc: &mut PdfDocument, page: &PageComparison, png: &[u8], dpi: u32) -> Result<PdfPage> {
    let rgb = image::load_from_memory(png)
        .with_context(|| format!("Failed to decode annotated {}", page_label(page.page_index)))?
        .to_rgb8();
    let (width, height) = (rgb.width() as usize, rgb.height() as usize);
    let id = doc.add_image(&RawImage {
        pixels: RawImageData::U8(rgb.into_raw()),
        width,
        height,
        data_format: RawImageFormat::RGB8,
        tag: Vec::new(),
    });

    let margin_pt = Mm(MARGIN_MM).into_pt().0;
    let page_w_pt = PAGE_W.into_pt().0;
    let page_h_pt = PAGE_H.into_pt().0;
    let heading_y = page_h_pt - margin_pt - HEADING_SIZE_PT;
    let usable_w = page_w_pt - 2.0 * margin_pt;
    let usable_h = heading_y - LINE_HEIGHT_PT - margin_pt;

    let dpi = dpi.max(1) as f32;
    let img_w = width as f32 / dpi * 72.0;
    let img_h = height as f32 / dpi * 72.0;
    let scale = (usable_w / img_w).min(usable_h / img_h).min(1.0);
    let x = margin_pt + (usable_w - img_w * scale) / 2.0;
    let y = margin_pt + usable_h - img_h * scale;

    let mut ops = Vec::new();
    text_line(&mut ops, &page_heading(page), margin_pt, heading_y, HEADING_SIZE_PT);
    ops.push(Op::UseXobject {
        id,
        transform: XObjectTransform {
            translate_x: Some(Pt(x)),
            translate_y: Some(Pt(y)),
            scale_x: Some(scale),
            scale_y: Some(scale),
            dpi: Some(dpi),
            rotate: None,
        },
    });
    Ok(PdfPage::new(PAGE_W, PAGE_H, ops))
}

/// `images[i]` is the annotated PNG for page index `i`; pages without one are skipped.
pub fn build(
    meta: &ReportMeta,
    summary: &ComparisonSummary,
    images: &[Option<Vec<u8>>],
) -> Result<Vec<u8>> {
    let mut doc = PdfDocument::new("pagediff report");
    let mut pages = summary_pages(&text::build(meta, summary));

    for page in &summary.page_results {
        if let Some(Some(png)) = images.get(page.page_index) {
            pages.push(image_page(&mut doc, page, png, meta.dpi)?);
        }
    }

    debug!(pages = pages.len(), "pdf report laid out");
    doc.with_pages(pages);

    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    Ok(doc.save(&PdfSaveOptions::default(), &mut warnings))
}

pub fn write(
    path: &Path,
    meta: &ReportMeta,
    summary: &ComparisonSummary,
    images: &[Option<Vec<u8>>],
) -> Result<()> {
    let bytes = build(meta, summary, images)?;
    std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}
