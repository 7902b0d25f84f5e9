use std::collections::HashSet;

use crate::CatalogRow;

/// A contiguous slice of the URL list assigned to one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub index: usize,
    pub urls: Vec<String>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Number of batches actually created for `url_count` URLs.
///
/// Runs smaller than the configured batch count collapse to a single batch so
/// no worker is started with nothing to do.
pub fn effective_batch_count(url_count: usize, configured: usize) -> usize {
    if url_count == 0 {
        return 0;
    }
    let configured = configured.max(1);
    if url_count < configured {
        1
    } else {
        configured
    }
}

/// Split `urls` into contiguous, order-preserving batches.
///
/// Sizes differ by at most one: the first `len % count` batches take the extra
/// URL. Every URL lands in exactly one batch and no batch is empty.
pub fn partition_batches(urls: &[String], configured: usize) -> Vec<Batch> {
    let count = effective_batch_count(urls.len(), configured);
    if count == 0 {
        return Vec::new();
    }

    let base = urls.len() / count;
    let extra = urls.len() % count;
    let mut batches = Vec::with_capacity(count);
    let mut start = 0;
    for index in 0..count {
        let size = base + usize::from(index < extra);
        batches.push(Batch {
            index,
            urls: urls[start..start + size].to_vec(),
        });
        start += size;
    }
    batches
}

/// Normalized URLs worth scraping, de-duplicated in first-occurrence catalog order.
///
/// Rows without a usable URL are left out; the merge step reports them as
/// `NoUrl` without a fetch.
pub fn unique_scrape_urls(rows: &[CatalogRow]) -> Vec<String> {
    let mut seen = HashSet::new();
    rows.iter()
        .map(CatalogRow::normalized_url)
        .filter(|url| !url.is_empty())
        .filter(|url| seen.insert(url.clone()))
        .collect()
}
