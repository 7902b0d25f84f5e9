use std::collections::HashMap;
use std::fmt;

/// Rendered value for a page that was fetched without a price, or not fetched at all.
pub const NOT_FOUND_SENTINEL: &str = "NO";
/// Rendered value for a row that had no usable URL.
pub const NO_URL_SENTINEL: &str = "NO_URL";

/// Result of scraping one product page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceOutcome {
    /// Price text as displayed on the page.
    Found(String),
    /// Page had no price element, or the fetch failed or timed out.
    NotFound,
    /// The catalog row carried no usable URL.
    NoUrl,
}

impl PriceOutcome {
    pub fn as_output(&self) -> &str {
        match self {
            PriceOutcome::Found(price) => price,
            PriceOutcome::NotFound => NOT_FOUND_SENTINEL,
            PriceOutcome::NoUrl => NO_URL_SENTINEL,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, PriceOutcome::Found(_))
    }
}

impl fmt::Display for PriceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_output())
    }
}

/// Global map from normalized URL to outcome, assembled after every worker joined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeResult {
    outcomes: HashMap<String, PriceOutcome>,
}

impl ScrapeResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Union a worker's partial map into the result.
    ///
    /// Batches are URL-disjoint, so keys never collide in practice; a repeated
    /// key keeps the later value.
    pub fn absorb(&mut self, partial: HashMap<String, PriceOutcome>) {
        self.outcomes.extend(partial);
    }

    /// Outcome for `url`; URLs that were never processed read as `NotFound`.
    pub fn outcome_for(&self, url: &str) -> PriceOutcome {
        self.outcomes
            .get(url)
            .cloned()
            .unwrap_or(PriceOutcome::NotFound)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.outcomes.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

impl FromIterator<(String, PriceOutcome)> for ScrapeResult {
    fn from_iter<T: IntoIterator<Item = (String, PriceOutcome)>>(iter: T) -> Self {
        Self {
            outcomes: iter.into_iter().collect(),
        }
    }
}
