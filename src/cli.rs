//! Command-line interface definitions for trend_lens.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Storage settings can be provided via command-line flags or environment
//! variables; everything else falls back to the configuration file.

use crate::analysis::{MatchPolicy, TokenizerMode};
use crate::pipeline::{InputSource, OutputTarget};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for trend_lens.
///
/// # Examples
///
/// ```sh
/// # Analyze a local headlines file
/// trend_lens analyze 36kr_headlines.txt --keywords 数字化 人工智能 SaaS --output report.png
///
/// # Analyze the latest uploaded headlines and upload the chart
/// BUCKET_NAME=reports trend_lens analyze --remote --keywords 人工智能 --json
///
/// # Weekly job: collect, then analyze
/// trend_lens weekly --output-dir ./weekly
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Object storage bucket for uploads and remote input
    #[arg(long, env = "BUCKET_NAME", global = true)]
    pub bucket_name: Option<String>,

    /// Object storage region
    #[arg(long, env = "TENCENTCLOUD_REGION", global = true)]
    pub region: Option<String>,

    /// Custom S3-compatible endpoint
    #[arg(long, env = "COS_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Count keywords in a headlines file and chart the result
    Analyze(AnalyzeArgs),

    /// Collect headlines into a text file, one per line
    Scrape {
        /// Output text file
        #[arg(short, long)]
        output: PathBuf,

        /// Also upload the file and mark it as the latest headlines
        #[arg(long)]
        upload: bool,
    },

    /// Collect headlines, then analyze them
    Weekly {
        /// Concepts to count (defaults to the configured keywords)
        #[arg(short, long, num_args = 1..)]
        keywords: Vec<String>,

        /// Directory for the headlines file, chart and JSON report
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Upload headlines and chart to the object store
        #[arg(long)]
        upload: bool,
    },
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Headlines file (an object key with --remote); the latest uploaded
    /// headlines when omitted
    pub file: Option<String>,

    /// Concepts to count
    #[arg(short, long, num_args = 1.., required = true)]
    pub keywords: Vec<String>,

    /// Output image file (`.png` or `.svg`)
    #[arg(short, long, default_value = "analysis_chart.png")]
    pub output: String,

    /// Tokenization strategy (overrides the configuration)
    #[arg(long, value_enum)]
    pub mode: Option<TokenizerMode>,

    /// Matching policy (overrides the configuration)
    #[arg(long, value_enum)]
    pub policy: Option<MatchPolicy>,

    /// Read input from and upload the chart to the object store
    #[arg(long)]
    pub remote: bool,

    /// Print the JSON report envelope
    #[arg(long)]
    pub json: bool,
}

impl AnalyzeArgs {
    pub fn input_source(&self) -> InputSource {
        match (&self.file, self.remote) {
            (Some(file), false) => InputSource::LocalFile(PathBuf::from(file)),
            (Some(key), true) => InputSource::RemoteKey(key.clone()),
            (None, _) => InputSource::LatestRemote,
        }
    }

    pub fn output_target(&self) -> OutputTarget {
        if self.remote {
            OutputTarget::Remote
        } else {
            OutputTarget::LocalFile(PathBuf::from(&self.output))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(args: &[&str]) -> AnalyzeArgs {
        let mut argv = vec!["trend_lens", "analyze"];
        argv.extend_from_slice(args);
        match Cli::parse_from(argv).command {
            Command::Analyze(args) => args,
            other => panic!("expected analyze, got {other:?}"),
        }
    }

    #[test]
    fn test_analyze_parsing() {
        let args = analyze(&["headlines.txt", "--keywords", "数字化", "人工智能", "--output", "out.svg"]);
        assert_eq!(args.file.as_deref(), Some("headlines.txt"));
        assert_eq!(args.keywords, vec!["数字化", "人工智能"]);
        assert_eq!(args.output, "out.svg");
        assert_eq!(args.input_source(), InputSource::LocalFile("headlines.txt".into()));
        assert_eq!(args.output_target(), OutputTarget::LocalFile("out.svg".into()));
    }

    #[test]
    fn test_analyze_defaults() {
        let args = analyze(&["h.txt", "-k", "SaaS"]);
        assert_eq!(args.output, "analysis_chart.png");
        assert!(args.mode.is_none());
        assert!(!args.json);
    }

    #[test]
    fn test_analyze_requires_keywords() {
        assert!(Cli::try_parse_from(["trend_lens", "analyze", "h.txt"]).is_err());
    }

    #[test]
    fn test_analyze_remote_sources() {
        let args = analyze(&["--remote", "-k", "SaaS", "--mode", "words", "--policy", "stemmed"]);
        assert_eq!(args.input_source(), InputSource::LatestRemote);
        assert_eq!(args.output_target(), OutputTarget::Remote);
        assert_eq!(args.mode, Some(TokenizerMode::Words));
        assert_eq!(args.policy, Some(MatchPolicy::Stemmed));

        let args = analyze(&["headlines/a.txt", "--remote", "-k", "SaaS"]);
        assert_eq!(args.input_source(), InputSource::RemoteKey("headlines/a.txt".to_string()));
    }

    #[test]
    fn test_weekly_defaults() {
        let cli = Cli::parse_from(["trend_lens", "weekly"]);
        match cli.command {
            Command::Weekly { keywords, output_dir, upload } => {
                assert!(keywords.is_empty());
                assert_eq!(output_dir, PathBuf::from("."));
                assert!(!upload);
            }
            other => panic!("expected weekly, got {other:?}"),
        }
    }

    #[test]
    fn test_scrape_short_flags() {
        let cli = Cli::parse_from(["trend_lens", "scrape", "-o", "/tmp/headlines.txt", "--upload"]);
        match cli.command {
            Command::Scrape { output, upload } => {
                assert_eq!(output, PathBuf::from("/tmp/headlines.txt"));
                assert!(upload);
            }
            other => panic!("expected scrape, got {other:?}"),
        }
    }
}
