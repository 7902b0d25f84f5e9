use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use engine_logging::{engine_error, engine_info};
use enricher_core::{partition_batches, ScrapeResult};
use futures_util::FutureExt;
use tokio::task::JoinSet;

use crate::fetch::{FetchSettings, ProgressSink, ReqwestSessionFactory, SessionFactory};
use crate::worker::scrape_batch;
use crate::{PriceExtractor, ScrapeEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeSettings {
    /// Number of batches, and so of concurrently open sessions.
    pub workers: usize,
    pub page_timeout: Duration,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            workers: 4,
            page_timeout: Duration::from_secs(8),
        }
    }
}

/// Fans a URL list out to one worker per batch and joins the results.
#[derive(Clone)]
pub struct ScrapeEngine {
    factory: Arc<dyn SessionFactory>,
    extractor: Arc<dyn PriceExtractor>,
    settings: ScrapeSettings,
}

impl ScrapeEngine {
    pub fn new(
        factory: Arc<dyn SessionFactory>,
        extractor: Arc<dyn PriceExtractor>,
        settings: ScrapeSettings,
    ) -> Self {
        Self {
            factory,
            extractor,
            settings,
        }
    }

    /// Engine backed by plain HTTP sessions sharing `fetch` settings.
    pub fn with_reqwest(
        fetch: FetchSettings,
        extractor: Arc<dyn PriceExtractor>,
        workers: usize,
    ) -> Self {
        let settings = ScrapeSettings {
            workers,
            page_timeout: fetch.page_timeout,
        };
        Self::new(Arc::new(ReqwestSessionFactory::new(fetch)), extractor, settings)
    }

    pub fn settings(&self) -> ScrapeSettings {
        self.settings
    }

    /// Scrape `urls`, which must be free of duplicates.
    ///
    /// A batch whose worker fails as a whole (session could not be opened,
    /// panic) contributes nothing; its URLs read as `NotFound` afterwards.
    pub async fn scrape_all(&self, urls: &[String], sink: Arc<dyn ProgressSink>) -> ScrapeResult {
        let batches = partition_batches(urls, self.settings.workers);
        engine_info!(
            "Scraping {} urls in {} batches",
            urls.len(),
            batches.len()
        );

        let mut workers = JoinSet::new();
        for batch in batches {
            let factory = self.factory.clone();
            let extractor = self.extractor.clone();
            let sink = sink.clone();
            let page_timeout = self.settings.page_timeout;
            workers.spawn(async move {
                let index = batch.index;
                let url_count = batch.len();
                let run = scrape_batch(
                    factory.as_ref(),
                    extractor.as_ref(),
                    batch,
                    page_timeout,
                    sink.as_ref(),
                );
                let outcome = match AssertUnwindSafe(run).catch_unwind().await {
                    Ok(Ok(partial)) => Ok(partial),
                    Ok(Err(err)) => Err(err.to_string()),
                    Err(panic) => Err(panic_message(panic.as_ref())),
                };
                (index, url_count, outcome)
            });
        }

        let mut result = ScrapeResult::new();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok((_, _, Ok(partial))) => result.absorb(partial),
                Ok((batch, url_count, Err(reason))) => {
                    engine_error!("Worker for batch {} failed: {}", batch, reason);
                    sink.emit(ScrapeEvent::BatchFailed {
                        batch,
                        url_count,
                        reason,
                    });
                }
                Err(err) => engine_error!("Worker task could not be joined: {}", err),
            }
        }
        result
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        format!("worker panicked: {msg}")
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        format!("worker panicked: {msg}")
    } else {
        "worker panicked".to_string()
    }
}
