//! Enricher core: catalog data model and the pure parts of the pipeline.
mod batch;
mod catalog;
mod merge;
mod outcome;
mod stock;
mod url;

pub use batch::{effective_batch_count, partition_batches, unique_scrape_urls, Batch};
pub use catalog::CatalogRow;
pub use merge::{merge_rows, MergedRow, OutputRecord, RunSummary, OUTPUT_COLUMNS};
pub use outcome::{PriceOutcome, ScrapeResult, NOT_FOUND_SENTINEL, NO_URL_SENTINEL};
pub use stock::{
    canonical_header, index_stock_feed, infer_columns, parse_quantity, parse_stock_feed,
    records_from_table, sniff_delimiter, ColumnRule, IndexedFeed, StockColumns, StockField,
    StockIndex, StockParseError, StockRecord, StockTable, COLUMN_RULES,
};
pub use url::normalize_url;
