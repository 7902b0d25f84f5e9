use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn};
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;

use crate::decode::decode_page;
use crate::{BatchIndex, FailureKind, FetchError, FetchMetadata, FetchOutput, ScrapeEvent};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    /// Upper bound for one product page, from request to the last body byte.
    pub page_timeout: Duration,
    /// Upper bound for downloading the stock feed.
    pub feed_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    /// Size cap for the stock feed body.
    pub feed_max_bytes: u64,
    pub allowed_content_types: Vec<String>,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            page_timeout: Duration::from_secs(8),
            feed_timeout: Duration::from_secs(60),
            redirect_limit: 5,
            max_bytes: 5 * 1024 * 1024,
            feed_max_bytes: 50 * 1024 * 1024,
            allowed_content_types: vec![
                "text/html".to_string(),
                "application/xhtml+xml".to_string(),
            ],
            user_agent: concat!("catalog-enricher/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ScrapeEvent);
}

pub struct ChannelProgressSink {
    tx: mpsc::Sender<ScrapeEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<ScrapeEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: ScrapeEvent) {
        let _ = self.tx.send(event);
    }
}

/// Writes batch-level events to the log; per-URL events only at debug level.
#[derive(Debug, Default)]
pub struct LogProgressSink;

impl ProgressSink for LogProgressSink {
    fn emit(&self, event: ScrapeEvent) {
        match event {
            ScrapeEvent::BatchStarted { batch, url_count } => {
                engine_info!("Batch {} started with {} urls", batch, url_count);
            }
            ScrapeEvent::UrlScraped { batch, url, outcome } => {
                engine_debug!("Batch {} url={} outcome={}", batch, url, outcome);
            }
            ScrapeEvent::BatchCompleted {
                batch,
                priced,
                url_count,
            } => {
                engine_info!("Batch {} done: {}/{} priced", batch, priced, url_count);
            }
            ScrapeEvent::BatchFailed {
                batch,
                url_count,
                reason,
            } => {
                engine_warn!(
                    "Batch {} failed, {} urls default to NO: {}",
                    batch,
                    url_count,
                    reason
                );
            }
        }
    }
}

/// One page-fetching session, used sequentially by a single worker.
#[async_trait::async_trait]
pub trait PageSession: Send {
    async fn load(&mut self, url: &str) -> Result<FetchOutput, FetchError>;

    /// Give back whatever the session holds. Called exactly once per session by
    /// the owning guard; later loads must fail.
    fn release(&mut self);
}

/// Opens sessions; shared by all workers of a run.
pub trait SessionFactory: Send + Sync {
    fn open(&self, batch: BatchIndex) -> Result<Box<dyn PageSession>, FetchError>;
}

/// Load `url` and decode it to HTML text.
pub async fn fetch_html(session: &mut dyn PageSession, url: &str) -> Result<String, FetchError> {
    let output = session.load(url).await?;
    decode_page(&output.bytes, output.metadata.content_type.as_deref())
        .map(|page| page.html)
        .map_err(|err| FetchError::new(FailureKind::Decode, err.to_string()))
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestSessionFactory {
    settings: Arc<FetchSettings>,
}

impl ReqwestSessionFactory {
    pub fn new(settings: FetchSettings) -> Self {
        Self {
            settings: Arc::new(settings),
        }
    }
}

impl SessionFactory for ReqwestSessionFactory {
    fn open(&self, batch: BatchIndex) -> Result<Box<dyn PageSession>, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.page_timeout)
            .redirect(reqwest::redirect::Policy::limited(self.settings.redirect_limit))
            .user_agent(self.settings.user_agent.clone())
            .build()
            .map_err(|err| FetchError::new(FailureKind::SessionUnavailable, err.to_string()))?;
        engine_debug!("Session opened for batch {}", batch);
        Ok(Box::new(ReqwestSession {
            client: Some(client),
            settings: self.settings.clone(),
            batch,
            pages: 0,
        }))
    }
}

/// Keeps one connection pool alive for the whole batch.
pub struct ReqwestSession {
    client: Option<reqwest::Client>,
    settings: Arc<FetchSettings>,
    batch: BatchIndex,
    pages: usize,
}

impl ReqwestSession {
    fn is_content_type_allowed(&self, content_type: &str) -> bool {
        let ct = content_type.split(';').next().unwrap_or(content_type).trim();
        self.settings
            .allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ct))
    }
}

#[async_trait::async_trait]
impl PageSession for ReqwestSession {
    async fn load(&mut self, url: &str) -> Result<FetchOutput, FetchError> {
        let client = self.client.as_ref().ok_or_else(|| {
            FetchError::new(FailureKind::SessionUnavailable, "session already released")
        })?;
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        self.pages += 1;

        let response = client.get(parsed).send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        if let Some(ct) = content_type.as_deref() {
            if !self.is_content_type_allowed(ct) {
                return Err(FetchError::new(
                    FailureKind::UnsupportedContentType {
                        content_type: ct.to_string(),
                    },
                    "unsupported content type",
                ));
            }
        }

        let final_url = response.url().to_string();
        let bytes = read_capped_body(response, self.settings.max_bytes).await?;

        let metadata = FetchMetadata {
            original_url: url.to_string(),
            final_url,
            content_type,
            byte_len: bytes.len() as u64,
        };
        Ok(FetchOutput { bytes, metadata })
    }

    fn release(&mut self) {
        if self.client.take().is_some() {
            engine_debug!(
                "Session for batch {} released after {} pages",
                self.batch,
                self.pages
            );
        }
    }
}

/// Stream `response` into memory, failing once more than `max_bytes` arrive.
///
/// A declared Content-Length above the cap fails before any body byte is read.
pub(crate) async fn read_capped_body(
    response: reqwest::Response,
    max_bytes: u64,
) -> Result<Vec<u8>, FetchError> {
    let too_large = |actual: u64| {
        FetchError::new(
            FailureKind::TooLarge {
                max_bytes,
                actual: Some(actual),
            },
            "response too large",
        )
    };
    if let Some(content_len) = response.content_length() {
        if content_len > max_bytes {
            return Err(too_large(content_len));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(map_reqwest_error)?;
        let next_len = bytes.len() as u64 + chunk.len() as u64;
        if next_len > max_bytes {
            return Err(too_large(next_len));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_builder() {
        return FetchError::new(FailureKind::InvalidUrl, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
