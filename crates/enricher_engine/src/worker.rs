use std::collections::HashMap;
use std::time::Duration;

use engine_logging::{engine_warn, truncate_for_log, DEFAULT_REASON_CHARS};
use enricher_core::{Batch, PriceOutcome};

use crate::fetch::{fetch_html, PageSession, ProgressSink, SessionFactory};
use crate::{BatchIndex, FetchError, ScrapeEvent};

/// Owns a session for the lifetime of one batch and releases it on drop.
///
/// Drop runs on normal completion, on early return and while unwinding from
/// a panic inside the batch loop.
pub struct SessionGuard {
    session: Box<dyn PageSession>,
    batch: BatchIndex,
}

impl SessionGuard {
    pub fn acquire(factory: &dyn SessionFactory, batch: BatchIndex) -> Result<Self, FetchError> {
        let session = factory.open(batch)?;
        Ok(Self { session, batch })
    }

    pub fn session(&mut self) -> &mut dyn PageSession {
        self.session.as_mut()
    }

    pub fn batch(&self) -> BatchIndex {
        self.batch
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.session.release();
    }
}

/// Visit every URL of `batch` in order with a single session.
///
/// Per-URL failures (timeout, HTTP error, missing price) become `NotFound` for
/// that URL and the loop moves on. Only failing to open the session is
/// returned as an error.
pub async fn scrape_batch(
    factory: &dyn SessionFactory,
    extractor: &dyn crate::PriceExtractor,
    batch: Batch,
    page_timeout: Duration,
    sink: &dyn ProgressSink,
) -> Result<HashMap<String, PriceOutcome>, FetchError> {
    let index = batch.index;
    let url_count = batch.len();
    let mut guard = SessionGuard::acquire(factory, index)?;
    sink.emit(ScrapeEvent::BatchStarted {
        batch: index,
        url_count,
    });

    let mut outcomes = HashMap::with_capacity(url_count);
    let mut priced = 0;
    for url in batch.urls {
        let outcome = if url.is_empty() {
            PriceOutcome::NoUrl
        } else {
            match tokio::time::timeout(page_timeout, fetch_html(guard.session(), &url)).await {
                Ok(Ok(html)) => extractor.extract(&url, &html),
                Ok(Err(err)) => {
                    engine_warn!(
                        "Scrape failed batch={} url={} reason={}",
                        index,
                        url,
                        truncate_for_log(&err.to_string(), DEFAULT_REASON_CHARS)
                    );
                    PriceOutcome::NotFound
                }
                Err(_) => {
                    engine_warn!(
                        "Scrape timed out batch={} url={} after {:?}",
                        index,
                        url,
                        page_timeout
                    );
                    PriceOutcome::NotFound
                }
            }
        };
        if outcome.is_found() {
            priced += 1;
        }
        sink.emit(ScrapeEvent::UrlScraped {
            batch: index,
            url: url.clone(),
            outcome: outcome.clone(),
        });
        outcomes.insert(url, outcome);
    }

    drop(guard);
    sink.emit(ScrapeEvent::BatchCompleted {
        batch: index,
        priced,
        url_count,
    });
    Ok(outcomes)
}
