use std::fs;
use std::path::{Path, PathBuf};

use engine_logging::engine_info;
use enricher_core::{sniff_delimiter, CatalogRow};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("cannot read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("catalog is not valid delimited text: {0}")]
    Csv(#[from] csv::Error),
    #[error("catalog has no {0} column")]
    MissingColumn(&'static str),
}

const SKU_HEADERS: &[&str] = &["sku"];
const MODEL_HEADERS: &[&str] = &["modello", "modelo", "model"];
const CATEGORY_HEADERS: &[&str] = &["category", "categoria"];
const LOCALE_HEADERS: &[&str] = &["lang", "locale", "idioma"];
const URL_HEADERS: &[&str] = &["url", "link"];

/// Read a catalog export from disk. See [`parse_catalog`].
pub fn load_catalog(path: &Path, locale: Option<&str>) -> Result<Vec<CatalogRow>, CatalogError> {
    let bytes = fs::read(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8_lossy(&bytes);
    let rows = parse_catalog(&text, locale)?;
    engine_info!("Loaded {} catalog rows from {:?}", rows.len(), path);
    Ok(rows)
}

/// Parse catalog CSV text, keeping only rows whose locale equals `locale`.
///
/// Headers are matched case-insensitively. Only the SKU column is mandatory;
/// the locale column is required when a locale filter is given. Blank cells
/// read as absent.
pub fn parse_catalog(text: &str, locale: Option<&str>) -> Result<Vec<CatalogRow>, CatalogError> {
    let text = text.trim_start_matches('\u{feff}');
    let delimiter = sniff_delimiter(text.lines().next().unwrap_or(""));
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    let find = |names: &[&str]| headers.iter().position(|h| names.contains(&h.as_str()));

    let sku = find(SKU_HEADERS).ok_or(CatalogError::MissingColumn("SKU"))?;
    let model = find(MODEL_HEADERS);
    let category = find(CATEGORY_HEADERS);
    let url = find(URL_HEADERS);
    let locale_filter = match locale {
        Some(wanted) => Some((
            find(LOCALE_HEADERS).ok_or(CatalogError::MissingColumn("lang"))?,
            wanted,
        )),
        None => None,
    };

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        if let Some((column, wanted)) = locale_filter {
            if cell(Some(column)).as_deref() != Some(wanted) {
                continue;
            }
        }
        rows.push(CatalogRow {
            sku: record.get(sku).unwrap_or("").to_string(),
            model: cell(model),
            category: cell(category),
            url: cell(url),
        });
    }
    Ok(rows)
}
