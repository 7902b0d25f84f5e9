use std::sync::Arc;

use anyhow::Context;
use engine_logging::engine_info;
use enricher_core::RunSummary;
use enricher_engine::{
    load_catalog, write_output, FetchSettings, LogProgressSink, Pipeline, ScrapeEngine,
    SelectorPriceExtractor,
};

use super::config::Config;

/// Load the catalog, enrich it and write the output file.
///
/// Only catalog, selector and output problems fail the run; scrape and stock
/// feed failures degrade to sentinel prices and zero stock.
pub fn run(config: &Config) -> anyhow::Result<()> {
    let catalog = load_catalog(&config.catalog_path, Some(config.locale.as_str()))
        .with_context(|| format!("loading catalog {}", config.catalog_path.display()))?;

    let extractor = SelectorPriceExtractor::new(&config.price_selector)?;
    let fetch = FetchSettings {
        page_timeout: config.page_timeout,
        user_agent: config.user_agent.clone(),
        ..FetchSettings::default()
    };
    let engine = ScrapeEngine::with_reqwest(fetch.clone(), Arc::new(extractor), config.workers);
    let pipeline = Pipeline::new(engine, config.stock_source.clone(), fetch);

    let rows = pipeline
        .run_blocking(&catalog, Arc::new(LogProgressSink))
        .context("starting async runtime")?;

    let written = write_output(&config.output_path, &rows)
        .with_context(|| format!("writing {}", config.output_path.display()))?;

    let summary = RunSummary::from_rows(&rows);
    engine_info!(
        "{} rows written to {} ({} priced, {} in stock)",
        summary.rows,
        written.display(),
        summary.priced,
        summary.in_stock
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::Duration;

    use enricher_engine::StockSource;
    use tempfile::TempDir;

    use super::*;
    use crate::platform::logging::LogDestination;

    fn config_in(dir: &TempDir) -> Config {
        Config {
            catalog_path: dir.path().join("catalog.csv"),
            output_path: dir.path().join("output").join("enriched.csv"),
            locale: "es_ES".to_string(),
            stock_source: Some(StockSource::Local(dir.path().join("stock.csv"))),
            workers: 2,
            page_timeout: Duration::from_secs(1),
            price_selector: "h2.product-price".to_string(),
            user_agent: "test".to_string(),
            log_destination: LogDestination::Terminal,
        }
    }

    #[test]
    fn rows_without_urls_are_written_with_stock() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("catalog.csv"),
            "SKU,MODELLO,CATEGORY,LANG,URL\nA1,Horno,Cocina,es_ES,\nB2,Oven,Kitchen,en_GB,\n",
        )
        .unwrap();
        fs::write(dir.path().join("stock.csv"), "CodProd;StockContable\nA1;3\n").unwrap();
        let config = config_in(&dir);

        run(&config).unwrap();

        let text = fs::read_to_string(&config.output_path).unwrap();
        assert_eq!(
            text,
            "SKU,MODELO,CATEGORIA,STOCK_LA62,PVP_WEB,URL\nA1,Horno,Cocina,3,NO_URL,\n"
        );
    }

    #[test]
    fn missing_catalog_fails_the_run() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let err = run(&config).unwrap_err();
        assert!(err.to_string().contains("loading catalog"));
        assert!(!config.output_path.exists());
    }

    #[test]
    fn invalid_selector_fails_before_scraping() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("catalog.csv"), "SKU,LANG,URL\nA1,es_ES,\n").unwrap();
        let config = Config {
            price_selector: "h2..price".to_string(),
            ..config_in(&dir)
        };
        assert!(run(&config).is_err());
    }
}
