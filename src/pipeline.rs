//! End-to-end runs: read input, analyze, render, persist.
//!
//! Stages run strictly one after another. Each run owns its analyzer,
//! tokens and result; the only shared pieces are the read-only
//! [`AppConfig`] and [`ChartRenderer`] built at startup.

use crate::analysis::{Analyzer, MatchPolicy, TokenizerMode};
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::models::{AnalysisReport, WeeklyRun};
use crate::outputs::chart::ChartRenderer;
use crate::outputs::json;
use crate::outputs::storage::{read_local_text, ChartDestination, RemoteStore};
use crate::scrapers::headlines::{collect_headlines, write_headlines};
use crate::utils::truncate_for_log;
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument, warn};

/// Where the text to analyze comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    LocalFile(PathBuf),
    /// An object key in the configured bucket.
    RemoteKey(String),
    /// Whatever the latest-headlines pointer names.
    LatestRemote,
}

/// Where the chart goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    LocalFile(PathBuf),
    Remote,
}

/// One analysis request.
#[derive(Debug, Clone)]
pub struct AnalyzeRequest {
    pub input: InputSource,
    pub keywords: Vec<String>,
    pub output: OutputTarget,
    pub mode: TokenizerMode,
    pub policy: MatchPolicy,
}

/// Lazily connects to the object store on first remote use.
struct LazyRemote<'a> {
    config: &'a AppConfig,
    store: Option<RemoteStore>,
}

impl<'a> LazyRemote<'a> {
    fn new(config: &'a AppConfig) -> Self {
        Self { config, store: None }
    }

    fn get(&mut self) -> Result<&RemoteStore> {
        if self.store.is_none() {
            self.store = Some(RemoteStore::from_config(&self.config.storage)?);
        }
        self.store
            .as_ref()
            .ok_or(Error::ConfigMissing("BUCKET_NAME"))
    }

    fn take(mut self) -> Result<RemoteStore> {
        self.get()?;
        self.store.take().ok_or(Error::ConfigMissing("BUCKET_NAME"))
    }
}

/// Run one analysis and return its success envelope.
///
/// Reads the input, counts the requested keywords, renders the chart and
/// persists it. The object store is only contacted when the input or the
/// output is remote.
///
/// # Arguments
///
/// * `config` - Synonym table and storage settings
/// * `renderer` - Chart renderer built once at startup
/// * `request` - Input, keywords, output and analysis strategy
///
/// # Returns
///
/// An [`AnalysisReport`] with code 200, the chart location and the counts.
///
/// # Errors
///
/// [`Error::InputMissing`] for absent input, [`Error::ConfigMissing`] when
/// remote storage is needed without a bucket, and render or storage errors
/// as they occur. Nothing is retried.
#[instrument(level = "info", skip_all, fields(mode = %request.mode, policy = %request.policy, keywords = request.keywords.len()))]
pub async fn run_analysis(
    config: &AppConfig,
    renderer: &ChartRenderer,
    request: &AnalyzeRequest,
) -> Result<AnalysisReport> {
    let mut remote = LazyRemote::new(config);

    let text = match &request.input {
        InputSource::LocalFile(path) => read_local_text(path).await?,
        InputSource::RemoteKey(key) => remote.get()?.fetch_text(key).await?,
        InputSource::LatestRemote => {
            let store = remote.get()?;
            let key = store.latest_headlines_key().await?;
            info!(%key, "Resolved latest headlines");
            store.fetch_text(&key).await?
        }
    };
    info!(bytes = text.len(), "Loaded input text");
    debug!(preview = %truncate_for_log(&text, 120), "Input preview");

    let synonyms = &config.analysis.synonyms;
    if request.policy == MatchPolicy::Alias && !synonyms.is_empty() {
        for keyword in request.keywords.iter().filter(|k| !synonyms.contains_concept(k)) {
            warn!(%keyword, "Keyword has no synonym entry and will count zero");
        }
    }

    let analyzer = Analyzer::new(request.mode, request.policy, synonyms);
    let results = analyzer.analyze(&text, &request.keywords);
    for (concept, count) in results.iter() {
        info!(%concept, count, "Concept frequency");
    }

    let bytes = renderer.render(&results)?;
    let destination = match &request.output {
        OutputTarget::LocalFile(path) => ChartDestination::Local(path.clone()),
        OutputTarget::Remote => ChartDestination::Remote(remote.take()?),
    };
    let chart_url = destination
        .save(bytes, renderer.format(), Local::now())
        .await?;

    Ok(AnalysisReport::success(chart_url, results))
}

/// Collect headlines into `path`, optionally publishing them to the store.
///
/// Returns the number of headlines written; an empty collection is an
/// [`Error::InputMissing`] and leaves no file behind.
#[instrument(level = "info", skip(config), fields(path = %path.display()))]
pub async fn run_scrape(config: &AppConfig, path: &Path, upload: bool) -> Result<usize> {
    let headlines = collect_headlines(&config.scraper).await?;
    if headlines.is_empty() {
        warn!("No headlines collected");
        return Err(Error::InputMissing("no headlines collected".to_string()));
    }
    write_headlines(path, &headlines).await?;

    if upload {
        let store = RemoteStore::from_config(&config.storage)?;
        store.publish_headlines(path, Local::now()).await?;
    }
    Ok(headlines.len())
}

/// Weekly job: collect, then analyze only if collection produced input.
///
/// Files are named after the local date:
/// ```text
/// output_dir/
/// ├── 36kr_headlines_2025-08-16.txt
/// ├── report_2025-08-16.png
/// └── 2025-08-16/
///     └── report.json
/// ```
/// With `upload`, headlines are published and the chart goes to the store
/// instead of `output_dir`.
///
/// # Errors
///
/// Stops at the first failing stage. An empty collection is
/// [`Error::InputMissing`] and skips analysis entirely.
#[instrument(level = "info", skip(config, renderer, keywords), fields(output_dir = %output_dir.display()))]
pub async fn run_weekly(
    config: &AppConfig,
    renderer: &ChartRenderer,
    output_dir: &Path,
    keywords: Vec<String>,
    upload: bool,
) -> Result<WeeklyRun> {
    let date = Local::now().format("%Y-%m-%d").to_string();
    let headlines_file = output_dir.join(format!("36kr_headlines_{date}.txt"));

    info!(path = %headlines_file.display(), "[collect] starting");
    let headline_count = match run_scrape(config, &headlines_file, upload).await {
        Ok(count) => count,
        Err(e) => {
            error!(error = %e, "[collect] failed; weekly job aborted");
            return Err(e);
        }
    };
    info!(count = headline_count, "[collect] done");

    let report_file = output_dir.join(format!(
        "report_{date}.{}",
        renderer.format().extension()
    ));
    let request = AnalyzeRequest {
        input: InputSource::LocalFile(headlines_file.clone()),
        keywords,
        output: if upload {
            OutputTarget::Remote
        } else {
            OutputTarget::LocalFile(report_file)
        },
        mode: config.analysis.mode,
        policy: config.analysis.policy,
    };
    info!(keywords = ?request.keywords, "[analyze] starting");
    let report = match run_analysis(config, renderer, &request).await {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "[analyze] failed");
            return Err(e);
        }
    };

    let run = WeeklyRun {
        date,
        headlines_file: headlines_file.display().to_string(),
        headline_count,
        report,
    };
    json::write_weekly_run(&run, output_dir).await?;
    info!("[weekly] complete");
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChartConfig, HeadlineSource, ScraperConfig};
    use crate::outputs::chart::ChartFormat;

    fn svg_renderer() -> ChartRenderer {
        ChartRenderer::new(&ChartConfig {
            format: ChartFormat::Svg,
            ..ChartConfig::default()
        })
        .unwrap()
    }

    fn request(input: InputSource, output: OutputTarget, keywords: &[&str]) -> AnalyzeRequest {
        AnalyzeRequest {
            input,
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            output,
            mode: TokenizerMode::Dictionary,
            policy: MatchPolicy::Alias,
        }
    }

    #[tokio::test]
    async fn test_local_analysis_writes_chart_and_counts() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("36kr_headlines.txt");
        std::fs::write(&input, "大模型公司完成融资\n云服务厂商发布SaaS新品\n").unwrap();
        let chart = dir.path().join("report.svg");

        let report = run_analysis(
            &AppConfig::default(),
            &svg_renderer(),
            &request(
                InputSource::LocalFile(input),
                OutputTarget::LocalFile(chart.clone()),
                &["人工智能", "SaaS", "资本"],
            ),
        )
        .await
        .unwrap();

        let data = report.data.unwrap();
        assert_eq!(data.chart_url, chart.display().to_string());
        assert_eq!(data.analysis_results.get("人工智能"), Some(1));
        assert_eq!(data.analysis_results.get("SaaS"), Some(2));
        assert_eq!(data.analysis_results.get("资本"), Some(0));
        assert!(std::fs::read_to_string(&chart).unwrap().contains("<svg"));
    }

    #[tokio::test]
    async fn test_missing_input_file() {
        let err = run_analysis(
            &AppConfig::default(),
            &svg_renderer(),
            &request(
                InputSource::LocalFile("/nonexistent/36kr_headlines.txt".into()),
                OutputTarget::LocalFile("/tmp/unused.svg".into()),
                &["人工智能"],
            ),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::InputMissing(_)));
    }

    #[tokio::test]
    async fn test_remote_output_without_bucket_fails_at_render_time() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("headlines.txt");
        std::fs::write(&input, "大模型").unwrap();

        let err = run_analysis(
            &AppConfig::default(),
            &svg_renderer(),
            &request(InputSource::LocalFile(input), OutputTarget::Remote, &["人工智能"]),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::ConfigMissing("BUCKET_NAME")));
    }

    #[tokio::test]
    async fn test_remote_input_without_bucket_is_config_missing() {
        let err = run_analysis(
            &AppConfig::default(),
            &svg_renderer(),
            &request(InputSource::LatestRemote, OutputTarget::Remote, &["人工智能"]),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::ConfigMissing(_)));
    }

    #[tokio::test]
    async fn test_weekly_stops_when_collection_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.scraper = ScraperConfig {
            sources: vec![HeadlineSource {
                name: "broken".to_string(),
                url: "not a url".to_string(),
                selector: "a".to_string(),
            }],
            ..ScraperConfig::default()
        };

        let err = run_weekly(&config, &svg_renderer(), dir.path(), vec!["资本".to_string()], false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InputMissing(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
