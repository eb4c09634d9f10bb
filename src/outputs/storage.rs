//! Chart persistence and input retrieval.
//!
//! A chart goes either to a local file or to an S3-compatible object store.
//! Remote uploads get a timestamped key under the reports prefix and come
//! back with a time-limited signed URL. The same store serves the headline
//! files written by the `scrape` command, together with a small pointer
//! object naming the most recent upload.
//!
//! Writes are best-effort: a failed upload is reported to the caller and
//! nothing is rolled back or retried.

use crate::config::StorageConfig;
use crate::error::{Error, Result};
use crate::outputs::chart::ChartFormat;
use chrono::{DateTime, Local};
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use object_store::signer::Signer;
use object_store::{Attribute, AttributeValue, Attributes, ObjectStore, PutOptions, PutPayload};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tracing::{info, instrument, warn};
use url::Url;

/// Object key for a chart rendered at `now`.
///
/// ```ignore
/// report_key("reports/", now, ChartFormat::Png) // "reports/report_20250816093000.png"
/// ```
pub fn report_key(prefix: &str, now: DateTime<Local>, format: ChartFormat) -> String {
    format!(
        "{prefix}report_{}.{}",
        now.format("%Y%m%d%H%M%S"),
        format.extension()
    )
}

/// Read a local text file.
///
/// # Errors
///
/// A missing file is [`Error::InputMissing`]; any other I/O failure is
/// [`Error::Io`].
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn read_local_text(path: &Path) -> Result<String> {
    match fs::read_to_string(path).await {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(Error::InputMissing(path.display().to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Virtual-hosted endpoint for `bucket`: `https://cos.example.com` becomes
/// `https://{bucket}.cos.example.com`. Endpoints that already start with
/// the bucket are returned unchanged.
fn bucket_endpoint(endpoint: &str, bucket: &str) -> Result<String> {
    let mut url = Url::parse(endpoint)
        .map_err(|e| Error::Config(format!("invalid endpoint '{endpoint}': {e}")))?;
    let host = url
        .host_str()
        .ok_or_else(|| Error::Config(format!("endpoint '{endpoint}' has no host")))?
        .to_string();
    if !host.starts_with(&format!("{bucket}.")) {
        url.set_host(Some(&format!("{bucket}.{host}")))
            .map_err(|e| Error::Config(format!("invalid endpoint '{endpoint}': {e}")))?;
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// S3 client settings for `settings`, credentials taken from the environment.
///
/// A custom endpoint is addressed virtual-hosted style, with the bucket
/// folded into the host name.
fn s3_builder(settings: &StorageConfig) -> Result<AmazonS3Builder> {
    let bucket = settings
        .bucket
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .ok_or(Error::ConfigMissing("BUCKET_NAME"))?;

    let mut builder = AmazonS3Builder::from_env()
        .with_bucket_name(bucket)
        .with_region(&settings.region);
    if let Some(endpoint) = settings.endpoint.as_deref().filter(|e| !e.trim().is_empty()) {
        builder = builder
            .with_endpoint(bucket_endpoint(endpoint.trim(), bucket)?)
            .with_virtual_hosted_style_request(true);
    }
    Ok(builder)
}

/// Where a rendered chart ends up.
#[derive(Debug)]
pub enum ChartDestination {
    /// Write to this exact file path.
    Local(PathBuf),
    /// Upload under a timestamped key.
    Remote(RemoteStore),
}

impl ChartDestination {
    /// Persist `bytes` and return where they can be fetched from: the file
    /// path for local output, a signed URL (or the bare key when the store
    /// cannot sign) for remote output.
    #[instrument(level = "info", skip_all, fields(bytes = bytes.len(), %format))]
    pub async fn save(
        &self,
        bytes: Vec<u8>,
        format: ChartFormat,
        now: DateTime<Local>,
    ) -> Result<String> {
        match self {
            ChartDestination::Local(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent).await?;
                }
                fs::write(path, &bytes).await?;
                info!(path = %path.display(), "Wrote chart");
                Ok(path.display().to_string())
            }
            ChartDestination::Remote(store) => {
                let key = store.put_chart(bytes, format, now).await?;
                store.url_for(&key).await
            }
        }
    }
}

/// An object store plus the settings needed to name and sign objects.
pub struct RemoteStore {
    store: Arc<dyn ObjectStore>,
    signer: Option<Arc<dyn Signer>>,
    settings: StorageConfig,
}

impl fmt::Debug for RemoteStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteStore")
            .field("store", &self.store.to_string())
            .field("signs_urls", &self.signer.is_some())
            .field("bucket", &self.settings.bucket)
            .finish()
    }
}

impl RemoteStore {
    /// Connect to the S3-compatible bucket named in `settings`.
    ///
    /// Credentials come from the usual `AWS_*` environment variables.
    ///
    /// # Arguments
    ///
    /// * `settings` - Bucket, region, optional endpoint and key prefixes
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigMissing`] when no bucket is configured,
    /// [`Error::Config`] for an unparsable endpoint, and [`Error::Storage`]
    /// when the client cannot be built.
    #[instrument(level = "info", skip_all, fields(region = %settings.region))]
    pub fn from_config(settings: &StorageConfig) -> Result<Self> {
        let s3 = s3_builder(settings)?.build()?;
        info!(bucket = ?settings.bucket, "Object store client ready");
        Ok(Self::from_s3(s3, settings))
    }

    fn from_s3(s3: AmazonS3, settings: &StorageConfig) -> Self {
        let s3 = Arc::new(s3);
        let store: Arc<dyn ObjectStore> = s3.clone();
        let signer: Arc<dyn Signer> = s3;
        Self::with_store(store, Some(signer), settings)
    }

    /// Wrap an existing store. Without a signer, URLs fall back to keys.
    pub fn with_store(
        store: Arc<dyn ObjectStore>,
        signer: Option<Arc<dyn Signer>>,
        settings: &StorageConfig,
    ) -> Self {
        Self {
            store,
            signer,
            settings: settings.clone(),
        }
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &'static str) -> Result<()> {
        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, AttributeValue::from(content_type));
        let options = PutOptions {
            attributes,
            ..PutOptions::default()
        };
        self.store
            .put_opts(&ObjectPath::from(key), PutPayload::from(bytes), options)
            .await?;
        Ok(())
    }

    /// Upload a chart under `{reports_prefix}report_{timestamp}.{ext}`.
    ///
    /// # Arguments
    ///
    /// * `bytes` - Encoded image
    /// * `format` - Picks the extension and the `Content-Type` attribute
    /// * `now` - Timestamp used in the key
    ///
    /// # Returns
    ///
    /// The object key the chart was stored under.
    #[instrument(level = "info", skip_all, fields(bytes = bytes.len()))]
    pub async fn put_chart(
        &self,
        bytes: Vec<u8>,
        format: ChartFormat,
        now: DateTime<Local>,
    ) -> Result<String> {
        let key = report_key(&self.settings.reports_prefix, now, format);
        self.put(&key, bytes, format.content_type()).await?;
        info!(%key, "Uploaded chart");
        Ok(key)
    }

    /// A time-limited GET URL for `key`, valid for `url_expiry_secs`.
    ///
    /// Stores without a signer (such as in-memory stores) return the key
    /// itself.
    ///
    /// # Errors
    ///
    /// Fails when signing credentials cannot be obtained.
    pub async fn url_for(&self, key: &str) -> Result<String> {
        match &self.signer {
            Some(signer) => {
                let expires = Duration::from_secs(self.settings.url_expiry_secs);
                let url = signer
                    .signed_url(http::Method::GET, &ObjectPath::from(key), expires)
                    .await?;
                Ok(url.to_string())
            }
            None => {
                warn!(%key, "Store cannot sign URLs; returning the object key");
                Ok(key.to_string())
            }
        }
    }

    /// Read an object as UTF-8 text. Invalid sequences are replaced.
    ///
    /// # Errors
    ///
    /// A missing object is [`Error::InputMissing`]; other store failures are
    /// [`Error::Storage`].
    #[instrument(level = "info", skip(self))]
    pub async fn fetch_text(&self, key: &str) -> Result<String> {
        let result = match self.store.get(&ObjectPath::from(key)).await {
            Ok(result) => result,
            Err(object_store::Error::NotFound { .. }) => {
                return Err(Error::InputMissing(key.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let bytes = result.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Resolve the key of the most recently published headlines file.
    pub async fn latest_headlines_key(&self) -> Result<String> {
        let pointer = self.fetch_text(&self.settings.latest_pointer).await?;
        let key = pointer.trim();
        if key.is_empty() {
            return Err(Error::InputMissing(self.settings.latest_pointer.clone()));
        }
        Ok(key.to_string())
    }

    /// Upload a headlines file and point the latest-headlines marker at it.
    ///
    /// # Arguments
    ///
    /// * `local` - Headlines file written by the collector
    /// * `now` - Timestamp appended to the file stem in the object key
    ///
    /// # Returns
    ///
    /// The key of the uploaded file, e.g.
    /// `headlines/36kr_headlines_20250816093000.txt`.
    ///
    /// # Errors
    ///
    /// Fails if the local file is missing or either upload fails. The
    /// pointer is only rewritten after the file upload succeeds.
    #[instrument(level = "info", skip(self, now), fields(path = %local.display()))]
    pub async fn publish_headlines(&self, local: &Path, now: DateTime<Local>) -> Result<String> {
        let text = read_local_text(local).await?;
        let key = format!(
            "{}{}_{}.txt",
            self.settings.headlines_prefix,
            local
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("headlines"),
            now.format("%Y%m%d%H%M%S")
        );
        self.put(&key, text.into_bytes(), "text/plain; charset=utf-8")
            .await?;
        self.put(
            &self.settings.latest_pointer,
            key.clone().into_bytes(),
            "text/plain; charset=utf-8",
        )
        .await?;
        info!(%key, pointer = %self.settings.latest_pointer, "Published headlines");
        Ok(key)
    }
}
