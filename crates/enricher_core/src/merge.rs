use serde::Serialize;

use crate::{CatalogRow, PriceOutcome, ScrapeResult, StockIndex};

/// Output column order expected by downstream consumers.
pub const OUTPUT_COLUMNS: [&str; 6] = [
    "SKU",
    "MODELO",
    "CATEGORIA",
    "STOCK_LA62",
    "PVP_WEB",
    "URL",
];

/// One enriched catalog row, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedRow {
    pub sku: String,
    pub model: String,
    pub category: String,
    pub stock: u64,
    pub price: PriceOutcome,
    pub url: String,
}

/// Serialized shape of a [`MergedRow`]; field order matches [`OUTPUT_COLUMNS`].
#[derive(Debug, Serialize)]
pub struct OutputRecord<'a> {
    #[serde(rename = "SKU")]
    pub sku: &'a str,
    #[serde(rename = "MODELO")]
    pub model: &'a str,
    #[serde(rename = "CATEGORIA")]
    pub category: &'a str,
    #[serde(rename = "STOCK_LA62")]
    pub stock: u64,
    #[serde(rename = "PVP_WEB")]
    pub price: &'a str,
    #[serde(rename = "URL")]
    pub url: &'a str,
}

impl MergedRow {
    pub fn to_record(&self) -> OutputRecord<'_> {
        OutputRecord {
            sku: &self.sku,
            model: &self.model,
            category: &self.category,
            stock: self.stock,
            price: self.price.as_output(),
            url: &self.url,
        }
    }
}

/// Join catalog rows with scrape outcomes and stock, preserving catalog order.
///
/// Rows without a usable URL report `NoUrl`; URLs the scheduler never
/// produced an outcome for report `NotFound`.
pub fn merge_rows(
    rows: &[CatalogRow],
    scraped: &ScrapeResult,
    stock: &StockIndex,
) -> Vec<MergedRow> {
    rows.iter()
        .map(|row| {
            let url = row.normalized_url();
            let price = if url.is_empty() {
                PriceOutcome::NoUrl
            } else {
                scraped.outcome_for(&url)
            };
            MergedRow {
                sku: row.sku.clone(),
                model: row.model.clone().unwrap_or_default(),
                category: row.category.clone().unwrap_or_default(),
                stock: stock.quantity_for(&row.sku),
                price,
                url,
            }
        })
        .collect()
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub rows: usize,
    pub priced: usize,
    pub not_found: usize,
    pub no_url: usize,
    pub in_stock: usize,
}

impl RunSummary {
    pub fn from_rows(rows: &[MergedRow]) -> Self {
        rows.iter().fold(
            Self {
                rows: rows.len(),
                ..Self::default()
            },
            |mut summary, row| {
                match row.price {
                    PriceOutcome::Found(_) => summary.priced += 1,
                    PriceOutcome::NotFound => summary.not_found += 1,
                    PriceOutcome::NoUrl => summary.no_url += 1,
                }
                if row.stock > 0 {
                    summary.in_stock += 1;
                }
                summary
            },
        )
    }
}
