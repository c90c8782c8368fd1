pub mod resolve;
pub mod template;

use std::path::Path;

use anyhow::{Context, Result, bail};
use pagediff_engine::{
    HighlightStyle, PageOptions, RegionConfig, SimilarityWeighting, Threshold,
};
use serde::{Deserialize, Serialize};

pub use self::resolve::{CliOverrides, ResolvedRunConfig};
pub use self::template::{config_file_exists, write_template};

pub(crate) const CONFIG_DIR: &str = ".pagediff";
const CONFIG_FILE: &str = "config.toml";

pub const DEFAULT_DPI: u32 = 150;
const MAX_DPI: u32 = 1200;
const MAX_DEFAULT_PARALLEL: usize = 8;

pub fn parse_threshold(s: &str) -> Result<Threshold, String> {
    let v: i64 = s.parse().map_err(|e| format!("{e}"))?;
    Threshold::new(v).map_err(|e| e.to_string())
}

pub fn validate_dpi(v: u32) -> Result<u32, String> {
    if !(1..=MAX_DPI).contains(&v) {
        return Err(format!("dpi must be between 1 and {MAX_DPI}, got {v}"));
    }
    Ok(v)
}

fn parse_dpi(s: &str) -> Result<u32, String> {
    let v: u32 = s.parse().map_err(|e| format!("{e}"))?;
    validate_dpi(v)
}

fn parse_parallel(s: &str) -> Result<usize, String> {
    let v: usize = s.parse().map_err(|e| format!("{e}"))?;
    if v == 0 {
        return Err("parallel must be at least 1".into());
    }
    Ok(v)
}

pub fn parse_weighting(s: &str) -> Result<SimilarityWeighting, String> {
    match s {
        "page-mean" => Ok(SimilarityWeighting::PageMean),
        "pixel-weighted" => Ok(SimilarityWeighting::PixelWeighted),
        other => Err(format!(
            "unknown weighting '{other}' (expected page-mean or pixel-weighted)"
        )),
    }
}

/// Rasterization settings handed to the document loader.
#[derive(Clone, Debug, Default, clap::Args, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Rendering resolution for PDF pages (default 150)
    #[arg(long, value_parser = parse_dpi)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpi: Option<u32>,
}

impl RenderConfig {
    pub fn merge(&mut self, other: &RenderConfig) {
        if other.dpi.is_some() {
            self.dpi = other.dpi;
        }
    }

    pub fn dpi(&self) -> u32 {
        self.dpi.unwrap_or(DEFAULT_DPI)
    }
}

/// Comparison settings.
///
/// Fields are `Option`; `None` means "use default".
/// Serves both TOML deserialization (`[diff]`) and CLI argument parsing.
#[derive(Clone, Debug, Default, clap::Args, Serialize, Deserialize)]
pub struct DiffConfig {
    /// Per-channel tolerance 0-255; 0 requires an exact match
    #[arg(long, short = 't', value_parser = parse_threshold)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<Threshold>,

    /// Merge difference regions separated by at most this many pixels
    #[arg(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_gap: Option<u32>,

    /// Drop difference regions whose box area is at most this many pixels
    #[arg(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noise_floor: Option<u64>,

    /// How page similarities combine: page-mean or pixel-weighted
    #[arg(long, value_parser = parse_weighting)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weighting: Option<SimilarityWeighting>,
}

impl DiffConfig {
    /// Overlay non-None fields from `other` onto self.
    pub fn merge(&mut self, other: &DiffConfig) {
        if other.threshold.is_some() {
            self.threshold = other.threshold;
        }
        if other.merge_gap.is_some() {
            self.merge_gap = other.merge_gap;
        }
        if other.noise_floor.is_some() {
            self.noise_floor = other.noise_floor;
        }
        if other.weighting.is_some() {
            self.weighting = other.weighting;
        }
    }

    pub fn page_options(&self) -> PageOptions {
        let defaults = RegionConfig::default();
        PageOptions {
            threshold: self.threshold.unwrap_or_default(),
            regions: RegionConfig {
                merge_gap: self.merge_gap.unwrap_or(defaults.merge_gap),
                noise_floor: self.noise_floor.unwrap_or(defaults.noise_floor),
            },
        }
    }

    pub fn weighting(&self) -> SimilarityWeighting {
        self.weighting.unwrap_or_default()
    }
}

#[derive(Clone, Debug, Default, clap::Args, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of pages compared concurrently
    #[arg(long, short = 'p', value_parser = parse_parallel)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel: Option<usize>,
}

impl RunConfig {
    pub fn merge(&mut self, other: &RunConfig) {
        if other.parallel.is_some() {
            self.parallel = other.parallel;
        }
    }

    pub fn parallel(&self) -> usize {
        self.parallel.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map_or(1, |n| n.get())
                .min(MAX_DEFAULT_PARALLEL)
        })
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub diff: DiffConfig,
    #[serde(default)]
    pub highlight: HighlightStyle,
    #[serde(default)]
    pub run: RunConfig,
}

impl Config {
    /// Validate semantic constraints that serde cannot express.
    fn validate(&self) -> Result<()> {
        if let Some(dpi) = self.render.dpi {
            validate_dpi(dpi).map_err(|e| anyhow::anyhow!("render.{e}"))?;
        }
        if self.highlight.stroke_width == 0 {
            bail!("highlight.stroke_width must be at least 1");
        }
        if self.run.parallel == Some(0) {
            bail!("run.parallel must be at least 1");
        }
        Ok(())
    }
}

fn parse(content: &str, origin: &Path) -> Result<Config> {
    let config: Config =
        toml::from_str(content).with_context(|| format!("Failed to parse {}", origin.display()))?;
    config.validate()?;
    Ok(config)
}

/// Load `.pagediff/config.toml`; a missing file means all defaults.
pub fn load() -> Result<Config> {
    let path = Path::new(CONFIG_DIR).join(CONFIG_FILE);
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse(&content, &path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(s: &str) -> Result<Config> {
        parse(s, Path::new("test.toml"))
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let c = parse_str("").unwrap();
        assert_eq!(c.render.dpi(), DEFAULT_DPI);
        assert_eq!(c.diff.page_options(), PageOptions::default());
        assert_eq!(c.diff.weighting(), SimilarityWeighting::PageMean);
        assert_eq!(c.highlight, HighlightStyle::default());
    }

    #[test]
    fn full_file_parses() {
        let c = parse_str(
            r#"
            [render]
            dpi = 300

            [diff]
            threshold = 8
            merge_gap = 5
            noise_floor = 0
            weighting = "pixel-weighted"

            [highlight]
            color = [0, 0, 255]
            stroke_width = 1

            [run]
            parallel = 2
            "#,
        )
        .unwrap();
        assert_eq!(c.render.dpi(), 300);
        let opts = c.diff.page_options();
        assert_eq!(opts.threshold.value(), 8);
        assert_eq!(opts.regions.merge_gap, 5);
        assert_eq!(opts.regions.noise_floor, 0);
        assert_eq!(c.diff.weighting(), SimilarityWeighting::PixelWeighted);
        assert_eq!(c.highlight.color, [0, 0, 255]);
        assert_eq!(c.highlight.stroke_width, 1);
        assert_eq!(c.highlight.mask_tint, Some([255, 0, 0]));
        assert_eq!(c.run.parallel(), 2);
    }

    #[test]
    fn mask_tint_can_be_disabled() {
        let c = parse_str("[highlight]\nmask_tint = false").unwrap();
        assert_eq!(c.highlight.mask_tint, None);
        assert_eq!(c.highlight.stroke_width, 3);
    }

    #[test]
    fn out_of_range_values_rejected() {
        assert!(parse_str("[diff]\nthreshold = 300").is_err());
        assert!(parse_str("[render]\ndpi = 0").is_err());
        assert!(parse_str("[highlight]\nstroke_width = 0").is_err());
        assert!(parse_str("[run]\nparallel = 0").is_err());
    }

    #[test]
    fn merge_overlays_only_set_fields() {
        let mut base = DiffConfig {
            threshold: Some(Threshold::from(3)),
            merge_gap: Some(1),
            noise_floor: None,
            weighting: None,
        };
        base.merge(&DiffConfig {
            threshold: None,
            merge_gap: Some(9),
            noise_floor: Some(0),
            weighting: None,
        });
        assert_eq!(base.threshold, Some(Threshold::from(3)));
        assert_eq!(base.merge_gap, Some(9));
        assert_eq!(base.noise_floor, Some(0));
    }

    #[test]
    fn value_parsers() {
        assert_eq!(parse_threshold("0").unwrap(), Threshold::EXACT);
        assert!(parse_threshold("-1").is_err());
        assert!(parse_threshold("abc").is_err());
        assert!(parse_dpi("1201").is_err());
        assert_eq!(parse_dpi("72").unwrap(), 72);
        assert!(parse_parallel("0").is_err());
        assert!(parse_weighting("median").is_err());
    }

    #[test]
    fn default_parallel_is_bounded() {
        let p = RunConfig::default().parallel();
        assert!((1..=MAX_DEFAULT_PARALLEL).contains(&p));
    }
}
