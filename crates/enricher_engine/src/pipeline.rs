use std::sync::Arc;

use engine_logging::engine_info;
use enricher_core::{merge_rows, unique_scrape_urls, CatalogRow, MergedRow, RunSummary};

use crate::fetch::{FetchSettings, ProgressSink};
use crate::stock_feed::{reconcile_stock, StockSource};
use crate::ScrapeEngine;

/// One enrichment run: scrape prices and reconcile stock side by side, then merge.
pub struct Pipeline {
    engine: ScrapeEngine,
    stock_source: Option<StockSource>,
    fetch: FetchSettings,
}

impl Pipeline {
    pub fn new(
        engine: ScrapeEngine,
        stock_source: Option<StockSource>,
        fetch: FetchSettings,
    ) -> Self {
        Self {
            engine,
            stock_source,
            fetch,
        }
    }

    /// Produce exactly one merged row per catalog row, in catalog order.
    pub async fn run(&self, catalog: &[CatalogRow], sink: Arc<dyn ProgressSink>) -> Vec<MergedRow> {
        let urls = unique_scrape_urls(catalog);
        engine_info!(
            "Enriching {} catalog rows ({} distinct urls)",
            catalog.len(),
            urls.len()
        );

        let (scraped, stock) = tokio::join!(
            self.engine.scrape_all(&urls, sink),
            reconcile_stock(self.stock_source.as_ref(), &self.fetch)
        );
        let merged = merge_rows(catalog, &scraped, &stock);

        let summary = RunSummary::from_rows(&merged);
        engine_info!(
            "Run finished: rows={} priced={} no_price={} no_url={} in_stock={}",
            summary.rows,
            summary.priced,
            summary.not_found,
            summary.no_url,
            summary.in_stock
        );
        merged
    }

    /// Same as [`Pipeline::run`] on a runtime owned by this call.
    pub fn run_blocking(
        &self,
        catalog: &[CatalogRow],
        sink: Arc<dyn ProgressSink>,
    ) -> std::io::Result<Vec<MergedRow>> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        Ok(runtime.block_on(self.run(catalog, sink)))
    }
}
