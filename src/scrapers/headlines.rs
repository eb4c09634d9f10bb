//! CSS-selector headline collector.
//!
//! Fetches a listing page over plain HTTP and keeps the text of every
//! element matching the source's selector. Pages that only fill in their
//! listing through client-side scrolling yield the server-rendered part.

use crate::config::{HeadlineSource, ScraperConfig};
use crate::error::{Error, Result};
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use reqwest::Client;
use scraper::{Html, Selector};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Build the HTTP client shared by every source of one run.
pub fn build_client(config: &ScraperConfig) -> Result<Client> {
    Ok(Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?)
}

/// Extract headline texts from `html`.
///
/// Whitespace inside each element is collapsed, empty matches are skipped
/// and repeats are dropped, keeping the first occurrence.
pub fn parse_headlines(html: &str, selector: &str) -> Result<Vec<String>> {
    let selector = Selector::parse(selector)
        .map_err(|e| Error::Config(format!("invalid selector '{selector}': {e}")))?;
    let document = Html::parse_document(html);

    let headlines = document
        .select(&selector)
        .map(|element| element.text().collect::<Vec<_>>().join(" "))
        .map(|text| text.split_whitespace().join(" "))
        .filter(|text| !text.is_empty())
        .unique()
        .collect();
    Ok(headlines)
}

/// Fetch one source and parse its headlines.
///
/// # Arguments
///
/// * `client` - Shared HTTP client from [`build_client`]
/// * `source` - Page URL and headline selector
///
/// # Returns
///
/// The headlines in page order, possibly empty.
///
/// # Errors
///
/// Fails on an invalid URL or selector, a transport error, or a non-2xx
/// status.
#[instrument(level = "info", skip(client), fields(source = %source.name))]
pub async fn fetch_headlines(client: &Client, source: &HeadlineSource) -> Result<Vec<String>> {
    let url = Url::parse(&source.url)
        .map_err(|e| Error::Config(format!("invalid url '{}': {e}", source.url)))?;
    let body = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    let headlines = parse_headlines(&body, &source.selector)?;
    info!(count = headlines.len(), url = %source.url, "Parsed headlines");
    Ok(headlines)
}

/// Collect headlines from every configured source, one after another.
///
/// A failing source is logged and skipped; the rest still contribute.
/// Headlines repeated across sources are kept once.
///
/// # Returns
///
/// All collected headlines. An empty vector means every source failed or
/// came back empty; deciding whether that is fatal is up to the caller.
///
/// # Errors
///
/// Only fails when the HTTP client itself cannot be built.
#[instrument(level = "info", skip_all, fields(sources = config.sources.len()))]
pub async fn collect_headlines(config: &ScraperConfig) -> Result<Vec<String>> {
    let client = build_client(config)?;
    let per_source: Vec<Vec<String>> = stream::iter(config.sources.iter())
        .then(|source| {
            let client = &client;
            async move {
                match fetch_headlines(client, source).await {
                    Ok(headlines) if headlines.is_empty() => {
                        warn!(source = %source.name, "Source produced no headlines");
                        Vec::new()
                    }
                    Ok(headlines) => headlines,
                    Err(e) => {
                        error!(source = %source.name, error = %e, "Headline fetch failed");
                        Vec::new()
                    }
                }
            }
        })
        .collect()
        .await;

    let headlines: Vec<String> = per_source.into_iter().flatten().unique().collect();
    info!(count = headlines.len(), "Collected headlines");
    debug!(headlines = ?headlines, "Headlines");
    Ok(headlines)
}

/// Write one headline per line.
///
/// # Arguments
///
/// * `path` - Destination text file; missing parent directories are created
/// * `headlines` - Lines to write, UTF-8, newline-terminated
///
/// # Returns
///
/// `Ok(())` on success, or the I/O error from directory creation or the write.
#[instrument(level = "info", skip(headlines), fields(count = headlines.len()))]
pub async fn write_headlines(path: &Path, headlines: &[String]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let mut body = headlines.join("\n");
    body.push('\n');
    fs::write(path, body).await?;
    info!(path = %path.display(), "Wrote headlines file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><body>
          <div class="list">
            <a class="article-item-title" href="/p/1">大模型公司
               完成新一轮融资</a>
            <a class="article-item-title" href="/p/2">数字经济新政发布</a>
            <a class="article-item-title" href="/p/3">   </a>
            <a class="article-item-title" href="/p/4">数字经济新政发布</a>
            <a class="other" href="/p/5">Advertisement</a>
          </div>
        </body></html>
    "#;

    #[test]
    fn test_parse_headlines_collapses_and_dedupes() {
        let headlines = parse_headlines(LISTING, "a.article-item-title").unwrap();
        assert_eq!(headlines, vec!["大模型公司 完成新一轮融资", "数字经济新政发布"]);
    }

    #[test]
    fn test_parse_headlines_rejects_bad_selector() {
        let err = parse_headlines(LISTING, "a[").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_parse_headlines_without_matches() {
        assert!(parse_headlines("<html></html>", "a.article-item-title").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bad_source_url_is_skipped() {
        let config = ScraperConfig {
            sources: vec![HeadlineSource {
                name: "broken".to_string(),
                url: "not a url".to_string(),
                selector: "a".to_string(),
            }],
            ..ScraperConfig::default()
        };
        assert!(collect_headlines(&config).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_headlines_one_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("36kr_headlines.txt");
        write_headlines(&path, &["a".to_string(), "b".to_string()]).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\nb\n");
    }
}
