use std::path::Path;

use anyhow::{Context, Result};
use base64::Engine;
use pagediff_engine::{ComparisonSummary, PageComparison};

use super::{ReportMeta, page_label};

fn timestamp() -> String {
    let d = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    let secs = d.as_secs();
    let (s, m, h) = (secs % 60, (secs / 60) % 60, (secs / 3600) % 24);
    let (y, mo, d) = epoch_days_to_ymd(secs / 86400);
    format!("{y:04}-{mo:02}-{d:02}T{h:02}:{m:02}:{s:02}Z")
}

fn page_row(page: &PageComparison, png: Option<&[u8]>) -> String {
    let (badge, details) = if page.is_identical {
        (r#"<span class="badge same">IDENTICAL</span>"#, String::new())
    } else {
        let regions: String = page
            .regions
            .iter()
            .map(|r| {
                format!(
                    "<li>({}, {}) &middot; {}&times;{} &middot; {} px</li>",
                    r.x, r.y, r.width, r.height, r.pixel_count
                )
            })
            .collect();
        (
            r#"<span class="badge diff">DIFFERENT</span>"#,
            format!(
                r#"<div class="stats">Similarity {:.2}% &middot; {} / {} pixels differ &middot; {} region(s)</div>
          <ul class="regions">{regions}</ul>"#,
                page.similarity_percentage,
                page.differing_pixel_count,
                page.total_pixel_count,
                page.region_count(),
            ),
        )
    };

    let image = match png {
        Some(bytes) => {
            let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
            format!(
                r#"<img src="data:image/png;base64,{encoded}" alt="{label}" loading="lazy" />"#,
                label = html_escape(&page_label(page.page_index)),
            )
        }
        None => r#"<div class="missing">no image</div>"#.to_string(),
    };

    format!(
        r#"        <tr>
          <td class="name">{label} {badge}
          {details}</td>
          <td>{image}</td>
        </tr>
"#,
        label = page_label(page.page_index),
    )
}

/// Self-contained HTML report. `images[i]` is the annotated PNG for page index `i`.
pub fn build(meta: &ReportMeta, summary: &ComparisonSummary, images: &[Option<Vec<u8>>]) -> String {
    let body_rows: String = summary
        .page_results
        .iter()
        .map(|page| {
            let png = images.get(page.page_index).and_then(|p| p.as_deref());
            page_row(page, png)
        })
        .collect();

    let verdict = if summary.are_identical {
        r#"<span class="badge same">IDENTICAL</span>"#
    } else {
        r#"<span class="badge diff">DIFFERENT</span>"#
    };
    let mismatch = match summary.page_count_mismatch {
        Some(m) => format!(
            r#"<div class="warning">Page counts differ: {} vs {}. Extra pages were not compared.</div>"#,
            m.doc1_pages, m.doc2_pages
        ),
        None => String::new(),
    };

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <title>pagediff report</title>
  <style>
    :root {{ color-scheme: light; }}
    body {{
      font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif;
      margin: 0; padding: 24px;
      background: #f6f7f9; color: #1f2933;
    }}
    h1 {{ margin: 0 0 8px; font-size: 22px; }}
    .meta {{ margin-bottom: 16px; color: #52606d; font-size: 14px; }}
    .summary {{ margin-bottom: 16px; font-size: 15px; }}
    .warning {{ margin-bottom: 16px; padding: 8px 12px; background: #fef3c7; color: #92400e; border-radius: 4px; }}
    table {{ width: 100%; border-collapse: collapse; background: #fff; box-shadow: 0 2px 6px rgba(0,0,0,0.05); }}
    th, td {{ border: 1px solid #e4e7eb; padding: 8px; vertical-align: top; text-align: left; }}
    th {{ background: #f0f4f8; font-weight: 600; font-size: 14px; }}
    td img {{ max-width: 100%; height: auto; display: block; background: #fff; }}
    td.name {{ font-size: 13px; width: 30%; }}
    .stats {{ margin-top: 8px; color: #52606d; }}
    .regions {{ margin: 4px 0 0; padding-left: 18px; color: #52606d; }}
    .missing {{ color: #c81e1e; font-style: italic; font-size: 13px; }}
    .badge {{ font-size: 11px; padding: 1px 6px; border-radius: 3px; font-weight: 600; }}
    .badge.same {{ background: #dcfce7; color: #166534; }}
    .badge.diff {{ background: #fee2e2; color: #991b1b; }}
  </style>
</head>
<body>
  <h1>pagediff report</h1>
  <div class="meta">Generated at {created_at} &middot; {doc1} ({doc1_pages} pages) vs {doc2} ({doc2_pages} pages) &middot; DPI {dpi}, threshold {threshold}</div>
  <div class="summary">{verdict} Overall similarity {overall:.2}% &middot; {compared} compared, {identical} identical, {different} different</div>
  {mismatch}
  <table>
    <thead>
      <tr>
        <th>Page</th>
        <th>Annotated</th>
      </tr>
    </thead>
    <tbody>
{body_rows}    </tbody>
  </table>
</body>
</html>"##,
        created_at = timestamp(),
        doc1 = html_escape(&meta.doc1.display().to_string()),
        doc2 = html_escape(&meta.doc2.display().to_string()),
        doc1_pages = meta.doc1_pages,
        doc2_pages = meta.doc2_pages,
        dpi = meta.dpi,
        threshold = meta.threshold,
        overall = summary.overall_similarity,
        compared = summary.pages_compared,
        identical = summary.pages_identical,
        different = summary.pages_different,
    )
}

pub fn write(
    path: &Path,
    meta: &ReportMeta,
    summary: &ComparisonSummary,
    images: &[Option<Vec<u8>>],
) -> Result<()> {
    std::fs::write(path, build(meta, summary, images))
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Convert days since Unix epoch to (year, month, day).
fn epoch_days_to_ymd(mut days: u64) -> (u64, u64, u64) {
    // Civil calendar algorithm (Howard Hinnant)
    days += 719468;
    let era = days / 146097;
    let doe = days - era * 146097;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = if m <= 2 { y + 1 } else { y };
    (y, m, d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures;

    #[test]
    fn embeds_images_and_stats() {
        let images = vec![None, Some(vec![0x89, b'P', b'N', b'G'])];
        let html = build(&fixtures::meta(2, 2), &fixtures::summary(2, 2), &images);
        assert!(html.contains("data:image/png;base64,iVBORw=="));
        assert!(html.contains("Page 2 <span class=\"badge diff\">DIFFERENT</span>"));
        assert!(html.contains("Similarity 99.00%"));
        assert!(html.contains("(12, 30) &middot; 10&times;10"));
        assert!(html.contains("no image"));
        assert!(!html.contains("Page counts differ"));
    }

    #[test]
    fn warns_about_page_count_mismatch() {
        let html = build(&fixtures::meta(3, 2), &fixtures::summary(3, 2), &[]);
        assert!(html.contains("Page counts differ: 3 vs 2"));
    }

    #[test]
    fn escapes_paths() {
        assert_eq!(html_escape("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
    }

    #[test]
    fn epoch_conversion() {
        assert_eq!(epoch_days_to_ymd(0), (1970, 1, 1));
        assert_eq!(epoch_days_to_ymd(19_723), (2024, 1, 1));
    }
}
