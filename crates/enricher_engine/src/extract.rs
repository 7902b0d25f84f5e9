use engine_logging::{engine_debug, engine_warn};
use enricher_core::PriceOutcome;
use scraper::{Html, Selector};

/// Heading that carries the displayed retail price on product detail pages.
pub const DEFAULT_PRICE_SELECTOR: &str = "h2.product-price";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("invalid price selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },
}

pub trait PriceExtractor: Send + Sync {
    /// Price shown on `html`, fetched from `url`. Never fails: anything that
    /// is not a visible price is `NotFound`.
    fn extract(&self, url: &str, html: &str) -> PriceOutcome;
}

/// Takes the visible text of the first element matching a CSS selector.
#[derive(Debug, Clone)]
pub struct SelectorPriceExtractor {
    selector: Selector,
    source: String,
}

impl SelectorPriceExtractor {
    pub fn new(selector: &str) -> Result<Self, ExtractError> {
        let parsed = Selector::parse(selector).map_err(|err| ExtractError::InvalidSelector {
            selector: selector.to_string(),
            reason: err.to_string(),
        })?;
        Ok(Self {
            selector: parsed,
            source: selector.to_string(),
        })
    }

    pub fn selector(&self) -> &str {
        &self.source
    }
}

impl PriceExtractor for SelectorPriceExtractor {
    fn extract(&self, url: &str, html: &str) -> PriceOutcome {
        let doc = Html::parse_document(html);
        let text = doc
            .select(&self.selector)
            .next()
            .map(|node| collapse_whitespace(&node.text().collect::<String>()));

        match text {
            Some(price) if !price.is_empty() => {
                engine_debug!("Price found url={} price={}", url, price);
                PriceOutcome::Found(price)
            }
            Some(_) => {
                engine_warn!("Price element empty url={} selector={}", url, self.source);
                PriceOutcome::NotFound
            }
            None => {
                engine_warn!("Price element missing url={} selector={}", url, self.source);
                PriceOutcome::NotFound
            }
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
