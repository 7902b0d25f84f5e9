mod platform;

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "catalog_enricher")]
#[command(about = "Adds web prices and stock to a product catalog export")]
#[command(long_about = "Adds web prices and stock to a product catalog export.\n\n\
The catalog is read as CSV (comma, semicolon, tab or pipe separated) with at least a SKU \
column. Catalog workbooks in .xlsx format must be saved as CSV first.")]
struct Cli {
    /// Catalog CSV to enrich (export .xlsx workbooks to CSV first).
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Where the enriched CSV is written.
    #[arg(long)]
    output: Option<PathBuf>,
    /// Keep only catalog rows with this locale.
    #[arg(long)]
    locale: Option<String>,
    /// Remote stock feed URL.
    #[arg(long, conflicts_with = "stock_file")]
    stock_url: Option<String>,
    /// Local stock feed file.
    #[arg(long)]
    stock_file: Option<PathBuf>,
    /// Number of scrape workers.
    #[arg(long)]
    workers: Option<usize>,
    /// Log at debug level.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = platform::config::load_config()?;
    cli.apply_to(&mut config)?;

    platform::logging::initialize(config.log_destination, cli.verbose);
    platform::app::run(&config)
}

impl Cli {
    /// Flags win over environment values.
    fn apply_to(&self, config: &mut platform::config::Config) -> anyhow::Result<()> {
        if let Some(path) = &self.catalog {
            config.catalog_path = path.clone();
        }
        if let Some(path) = &self.output {
            config.output_path = path.clone();
        }
        if let Some(locale) = &self.locale {
            config.locale = locale.clone();
        }
        if let Some(url) = &self.stock_url {
            config.stock_source = Some(enricher_engine::StockSource::Remote(url.clone()));
        }
        if let Some(path) = &self.stock_file {
            config.stock_source = Some(enricher_engine::StockSource::Local(path.clone()));
        }
        if let Some(workers) = self.workers {
            anyhow::ensure!(workers > 0, "--workers must be at least 1");
            config.workers = workers;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    fn defaults() -> platform::config::Config {
        platform::config::build_config(|_| Err(std::env::VarError::NotPresent)).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn help_explains_catalog_format() {
        let mut command = Cli::command();
        let help = command.render_long_help().to_string();
        assert!(help.contains(".xlsx"));
        assert!(help.contains("CSV"));
    }

    #[test]
    fn flags_override_environment() {
        let cli = Cli::parse_from([
            "catalog_enricher",
            "--catalog",
            "exports/catalog.csv",
            "--stock-file",
            "stock.csv",
            "--workers",
            "2",
        ]);
        let mut config = defaults();
        cli.apply_to(&mut config).unwrap();
        assert_eq!(config.catalog_path, PathBuf::from("exports/catalog.csv"));
        assert_eq!(
            config.stock_source,
            Some(enricher_engine::StockSource::Local(PathBuf::from("stock.csv")))
        );
        assert_eq!(config.workers, 2);
    }

    #[test]
    fn zero_workers_flag_is_rejected() {
        let cli = Cli::parse_from(["catalog_enricher", "--workers", "0"]);
        let mut config = defaults();
        assert!(cli.apply_to(&mut config).is_err());
    }
}
