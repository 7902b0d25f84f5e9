//! Enricher engine: page fetching, batch workers, stock feed and file IO.
mod catalog;
mod decode;
mod engine;
mod extract;
mod fetch;
mod output;
mod pipeline;
mod stock_feed;
mod types;
mod worker;

pub use catalog::{load_catalog, parse_catalog, CatalogError};
pub use decode::{decode_page, DecodeError, DecodedPage};
pub use engine::{ScrapeEngine, ScrapeSettings};
pub use extract::{ExtractError, PriceExtractor, SelectorPriceExtractor, DEFAULT_PRICE_SELECTOR};
pub use fetch::{
    fetch_html, ChannelProgressSink, FetchSettings, LogProgressSink, PageSession, ProgressSink,
    ReqwestSession, ReqwestSessionFactory, SessionFactory,
};
pub use output::{render_csv, write_output, OutputError, OutputWriter};
pub use pipeline::Pipeline;
pub use stock_feed::{
    index_feed_text, load_stock_feed, reconcile_stock, StockFeedError, StockSource,
};
pub use types::{BatchIndex, FailureKind, FetchError, FetchMetadata, FetchOutput, ScrapeEvent};
pub use worker::{scrape_batch, SessionGuard};
