use std::fmt;
use std::path::PathBuf;

use engine_logging::{engine_info, engine_warn, truncate_for_log, DEFAULT_REASON_CHARS};
use enricher_core::{index_stock_feed, StockIndex, StockParseError};
use reqwest::header::CONTENT_TYPE;

use crate::decode::{decode_page, DecodeError};
use crate::fetch::{map_reqwest_error, read_capped_body, FetchSettings};
use crate::{FailureKind, FetchError};

/// Where the stock feed comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockSource {
    Local(PathBuf),
    Remote(String),
}

impl fmt::Display for StockSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockSource::Local(path) => write!(f, "file {}", path.display()),
            StockSource::Remote(url) => write!(f, "url {url}"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StockFeedError {
    #[error("cannot read stock feed {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot download stock feed: {0}")]
    Fetch(#[from] FetchError),
    #[error("cannot decode stock feed: {0}")]
    Decode(#[from] DecodeError),
}

/// Read the raw feed text from `source`.
pub async fn load_stock_feed(
    source: &StockSource,
    settings: &FetchSettings,
) -> Result<String, StockFeedError> {
    match source {
        StockSource::Local(path) => {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|source| StockFeedError::Io {
                    path: path.clone(),
                    source,
                })?;
            Ok(decode_page(&bytes, None)?.html)
        }
        StockSource::Remote(url) => {
            let client = reqwest::Client::builder()
                .connect_timeout(settings.connect_timeout)
                .timeout(settings.feed_timeout)
                .user_agent(settings.user_agent.clone())
                .build()
                .map_err(map_reqwest_error)?;
            let response = client.get(url.as_str()).send().await.map_err(map_reqwest_error)?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::new(
                    FailureKind::HttpStatus(status.as_u16()),
                    status.to_string(),
                )
                .into());
            }
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);
            let bytes = read_capped_body(response, settings.feed_max_bytes).await?;
            Ok(decode_page(&bytes, content_type.as_deref())?.html)
        }
    }
}

/// Load and index the stock feed, degrading to an empty index on any failure.
pub async fn reconcile_stock(source: Option<&StockSource>, settings: &FetchSettings) -> StockIndex {
    let Some(source) = source else {
        engine_warn!("No stock feed configured; every row gets stock 0");
        return StockIndex::empty();
    };

    let text = match load_stock_feed(source, settings).await {
        Ok(text) => text,
        Err(err) => {
            engine_warn!(
                "Stock feed from {} unavailable, every row gets stock 0: {}",
                source,
                truncate_for_log(&err.to_string(), DEFAULT_REASON_CHARS)
            );
            return StockIndex::empty();
        }
    };

    match index_feed_text(&text) {
        Ok(index) => {
            engine_info!("Stock index built from {} with {} codes", source, index.len());
            index
        }
        Err(err) => {
            engine_warn!(
                "Stock feed from {} unparseable, every row gets stock 0: {}",
                source,
                truncate_for_log(&err.to_string(), DEFAULT_REASON_CHARS)
            );
            StockIndex::empty()
        }
    }
}

/// Parse feed text, logging how its columns were resolved.
pub fn index_feed_text(text: &str) -> Result<StockIndex, StockParseError> {
    let feed = index_stock_feed(text)?;
    match feed.columns {
        None => engine_warn!(
            "Stock feed has {} column(s), need a code and a quantity; treating as empty",
            feed.headers.len()
        ),
        Some(columns) if columns.positional => engine_warn!(
            "Stock feed headers {:?} not fully recognized; using code={:?} quantity={:?}",
            feed.headers,
            feed.headers[columns.code],
            feed.headers[columns.quantity]
        ),
        Some(_) => {}
    }
    Ok(feed.index)
}
