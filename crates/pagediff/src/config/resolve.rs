use std::str::FromStr;

use anyhow::{Context, Result};
use pagediff_engine::{HighlightStyle, PageOptions, SimilarityWeighting, Threshold};

use super::{DiffConfig, RenderConfig, RunConfig, load, parse_parallel, validate_dpi};

/// Values extracted from the CLI that participate in the merge.
#[derive(Debug)]
pub struct CliOverrides {
    pub render: RenderConfig,
    pub diff: DiffConfig,
    pub run: RunConfig,
}

/// Fully resolved config after CLI > env > file > defaults merge.
#[derive(Debug)]
pub struct ResolvedRunConfig {
    pub dpi: u32,
    pub page: PageOptions,
    pub weighting: SimilarityWeighting,
    pub highlight: HighlightStyle,
    pub parallel: usize,
}

fn env_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(name)
        .map(|v| v.trim().parse::<T>())
        .transpose()
        .with_context(|| format!("{name} must be a valid number"))
}

/// Overrides read from `PAGEDIFF_*` variables through `lookup`.
fn env_overrides(lookup: impl Fn(&str) -> Option<String>) -> Result<CliOverrides> {
    let threshold = env_var::<i64>(&lookup, "PAGEDIFF_THRESHOLD")?
        .map(Threshold::new)
        .transpose()
        .context("Invalid PAGEDIFF_THRESHOLD")?;
    let dpi = env_var::<u32>(&lookup, "PAGEDIFF_DPI")?;
    let parallel = lookup("PAGEDIFF_PARALLEL")
        .map(|v| parse_parallel(v.trim()))
        .transpose()
        .map_err(|e| anyhow::anyhow!("Invalid PAGEDIFF_PARALLEL: {e}"))?;

    Ok(CliOverrides {
        render: RenderConfig { dpi },
        diff: DiffConfig {
            threshold,
            ..DiffConfig::default()
        },
        run: RunConfig { parallel },
    })
}

impl ResolvedRunConfig {
    pub fn new(cli: CliOverrides) -> Result<Self> {
        // 1. File layer (optional)
        let file = load()?;

        // 2. Env layer
        let env = env_overrides(|name| std::env::var(name).ok())?;

        // 3. Overlay env, then CLI (highest priority last)
        let mut render = file.render;
        let mut diff = file.diff;
        let mut run = file.run;
        for layer in [&env, &cli] {
            render.merge(&layer.render);
            diff.merge(&layer.diff);
            run.merge(&layer.run);
        }

        let dpi = validate_dpi(render.dpi()).map_err(|e| anyhow::anyhow!("{e}"))?;

        Ok(Self {
            dpi,
            page: diff.page_options(),
            weighting: diff.weighting(),
            highlight: file.highlight,
            parallel: run.parallel(),
        })
    }
}
