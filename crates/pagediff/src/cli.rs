use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{DiffConfig, RenderConfig, RunConfig};

#[derive(Parser)]
#[command(
    name = "pagediff",
    version,
    about = "Compare two documents page by page and report visual differences"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn verbose(&self) -> bool {
        matches!(&self.command, Command::Compare(args) if args.verbose)
    }

    pub fn quiet(&self) -> bool {
        matches!(&self.command, Command::Compare(args) if args.quiet)
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Create .pagediff/config.toml with default settings
    Init {
        /// Overwrite an existing config
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Compare two documents (exit 0 = identical, 1 = different, 2 = error)
    Compare(CompareArgs),
}

#[derive(Args)]
pub struct CompareArgs {
    /// First document: a PDF, an image, or a directory of page images
    pub doc1: PathBuf,
    /// Second document
    pub doc2: PathBuf,

    #[command(flatten)]
    pub render: RenderConfig,
    #[command(flatten)]
    pub diff: DiffConfig,
    #[command(flatten)]
    pub run: RunConfig,

    /// Write statistics as JSON
    #[arg(long, value_name = "FILE")]
    pub output_json: Option<PathBuf>,
    /// Write a self-contained HTML report with annotated pages
    #[arg(long, value_name = "FILE")]
    pub output_html: Option<PathBuf>,
    /// Write a PDF with a summary page and one annotated page per compared page
    #[arg(long, value_name = "FILE", alias = "output-diff")]
    pub output_pdf: Option<PathBuf>,
    /// Write a plain-text summary
    #[arg(long, value_name = "FILE")]
    pub output_text: Option<PathBuf>,
    /// Write one annotated PNG per compared page into DIR
    #[arg(long, value_name = "DIR")]
    pub output_images: Option<PathBuf>,

    /// Print nothing; only set the exit code
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,
    /// Show per-page statistics and debug logs
    #[arg(long, short = 'v')]
    pub verbose: bool,
    /// Disable the progress indicator
    #[arg(long)]
    pub no_progress: bool,
}

impl CompareArgs {
    /// Annotated page images are only produced when a report needs them.
    pub fn wants_images(&self) -> bool {
        self.output_html.is_some() || self.output_pdf.is_some() || self.output_images.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_compare_flags() {
        let cli = Cli::try_parse_from([
            "pagediff",
            "compare",
            "a.pdf",
            "b.pdf",
            "--dpi",
            "200",
            "--threshold",
            "12",
            "--merge-gap",
            "4",
            "--weighting",
            "pixel-weighted",
            "-p",
            "3",
            "--output-json",
            "out.json",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose());
        let Command::Compare(args) = cli.command else {
            panic!("expected compare");
        };
        assert_eq!(args.doc1, PathBuf::from("a.pdf"));
        assert_eq!(args.render.dpi, Some(200));
        assert_eq!(args.diff.threshold.map(|t| t.value()), Some(12));
        assert_eq!(args.diff.merge_gap, Some(4));
        assert_eq!(
            args.diff.weighting,
            Some(pagediff_engine::SimilarityWeighting::PixelWeighted)
        );
        assert_eq!(args.run.parallel, Some(3));
        assert!(!args.wants_images());
    }

    #[test]
    fn pdf_output_needs_images() {
        for flag in ["--output-pdf", "--output-diff"] {
            let cli = Cli::try_parse_from(["pagediff", "compare", "a", "b", flag, "diff.pdf"])
                .unwrap();
            let Command::Compare(args) = cli.command else {
                panic!("expected compare");
            };
            assert_eq!(args.output_pdf, Some(PathBuf::from("diff.pdf")));
            assert!(args.wants_images());
        }
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let res = Cli::try_parse_from(["pagediff", "compare", "a", "b", "--threshold", "256"]);
        assert!(res.is_err());
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        let res = Cli::try_parse_from(["pagediff", "compare", "a", "b", "-q", "-v"]);
        assert!(res.is_err());
    }
}
