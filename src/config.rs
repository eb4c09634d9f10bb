//! Runtime configuration.
//!
//! Configuration is built once at startup from an optional YAML file and the
//! CLI/environment overrides, then passed by reference to every stage. There
//! is no process-global client or font state.
//!
//! ```yaml
//! analysis:
//!   mode: dictionary
//!   policy: alias
//!   strict_aliases: true
//!   keywords: [数字化, 人工智能, SaaS]
//!   synonyms:
//!     人工智能: [人工智能, ai, 大模型]
//! chart:
//!   format: png
//!   font_family: WenQuanYi Zen Hei
//!   font_files: [/usr/share/fonts/truetype/wqy/wqy-zenhei.ttc]
//! storage:
//!   region: ap-beijing
//! scraper:
//!   sources:
//!     - name: 36kr
//!       url: https://36kr.com/information/web_news
//!       selector: a.article-item-title
//! ```

use crate::analysis::{AliasTable, MatchPolicy, TokenizerMode};
use crate::error::{Error, Result};
use crate::outputs::chart::ChartFormat;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub analysis: AnalysisConfig,
    pub chart: ChartConfig,
    pub storage: StorageConfig,
    pub scraper: ScraperConfig,
}

/// Tokenization, matching and the synonym knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub mode: TokenizerMode,
    pub policy: MatchPolicy,
    /// Reject synonym tables where two concepts share a surface form.
    pub strict_aliases: bool,
    /// Concepts used when the command line names none.
    pub keywords: Vec<String>,
    pub synonyms: AliasTable,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            mode: TokenizerMode::Dictionary,
            policy: MatchPolicy::Alias,
            strict_aliases: true,
            keywords: ["数字化", "人工智能", "SaaS", "创新", "资本"]
                .into_iter()
                .map(String::from)
                .collect(),
            synonyms: default_synonyms(),
        }
    }
}

/// The built-in concept table for Chinese tech headlines.
pub fn default_synonyms() -> AliasTable {
    [
        (
            "数字化",
            vec![
                "数字化", "数字经济", "数智", "数转", "数字产业", "数字基础设施", "数字治理",
                "数字转型", "数字平台",
            ],
        ),
        (
            "人工智能",
            vec![
                "人工智能", "ai", "智能", "大模型", "机器学习", "深度学习", "算法", "智能化",
                "智能系统", "智能应用", "智能硬件", "智能制造",
            ],
        ),
        (
            "SaaS",
            vec![
                "saas", "软件服务", "云服务", "云平台", "paas", "iaas", "订阅制", "企业服务",
                "云计算", "云解决方案",
            ],
        ),
    ]
    .into_iter()
    .collect()
}

/// Chart appearance and output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub format: ChartFormat,
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Bar colour as `#RRGGBB`.
    pub bar_color: String,
    /// Title colour as `#RRGGBB`.
    pub title_color: String,
    /// Font family used for every label.
    pub font_family: String,
    /// Extra font files loaded for rasterization, on top of system fonts.
    pub font_files: Vec<PathBuf>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            format: ChartFormat::Png,
            width: 1200,
            height: 700,
            title: "科技趋势关键词频率分析".to_string(),
            x_label: "核心概念".to_string(),
            y_label: "提及频率".to_string(),
            bar_color: "#0052FF".to_string(),
            title_color: "#1F2937".to_string(),
            font_family: "WenQuanYi Zen Hei".to_string(),
            font_files: Vec::new(),
        }
    }
}

/// Object storage settings. The bucket is only required once a remote
/// read or write is attempted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub bucket: Option<String>,
    pub region: String,
    /// Custom S3-compatible endpoint (e.g. `https://cos.ap-beijing.myqcloud.com`).
    pub endpoint: Option<String>,
    pub reports_prefix: String,
    pub headlines_prefix: String,
    /// Object holding the key of the most recent headlines upload.
    pub latest_pointer: String,
    pub url_expiry_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            region: "ap-beijing".to_string(),
            endpoint: None,
            reports_prefix: "reports/".to_string(),
            headlines_prefix: "headlines/".to_string(),
            latest_pointer: "metadata/latest_headlines_path.txt".to_string(),
            url_expiry_secs: 3600,
        }
    }
}

/// A page to collect headlines from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadlineSource {
    pub name: String,
    pub url: String,
    /// CSS selector matching one headline element each.
    pub selector: String,
}

/// Headline collection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub sources: Vec<HeadlineSource>,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            sources: vec![HeadlineSource {
                name: "36kr".to_string(),
                url: "https://36kr.com/information/web_news".to_string(),
                selector: "a.article-item-title".to_string(),
            }],
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36".to_string(),
            timeout_secs: 30,
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`, or the defaults when `path` is `None`.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
                let config = Self::from_yaml(&raw)?;
                info!(path = %path.display(), "Loaded configuration file");
                config
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML document; absent sections keep their defaults.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw).map_err(|e| Error::Config(e.to_string()))
    }

    /// Reject overlapping synonym tables when `strict_aliases` is set.
    pub fn validate(&self) -> Result<()> {
        if !self.analysis.strict_aliases {
            return Ok(());
        }
        let overlaps = self.analysis.synonyms.overlaps();
        if overlaps.is_empty() {
            Ok(())
        } else {
            Err(Error::Config(format!(
                "overlapping synonyms: {}",
                overlaps.iter().join("; ")
            )))
        }
    }

    /// Apply command-line / environment overrides for storage.
    pub fn with_storage_overrides(
        mut self,
        bucket: Option<String>,
        region: Option<String>,
        endpoint: Option<String>,
    ) -> Self {
        if bucket.is_some() {
            self.storage.bucket = bucket;
        }
        if let Some(region) = region {
            self.storage.region = region;
        }
        if endpoint.is_some() {
            self.storage.endpoint = endpoint;
        }
        self
    }
}
