use std::fs;

use enricher_core::CatalogRow;
use enricher_engine::{load_catalog, parse_catalog, CatalogError};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const CATALOG: &str = "\
SKU,MODELLO,CATEGORY,LANG,URL
A1,Lavadora X,Lavado,es_ES,/es/lavadora-x
A1,Washer X,Laundry,en_GB,/en/washer-x
B2,Horno Y,,es_ES,
C3,Nevera Z,Frio,es_ES,https://shop.example.com/nevera-z
";

#[test]
fn locale_filter_keeps_matching_rows_in_order() {
    let rows = parse_catalog(CATALOG, Some("es_ES")).unwrap();
    assert_eq!(
        rows,
        vec![
            CatalogRow::new("A1")
                .with_model("Lavadora X")
                .with_category("Lavado")
                .with_url("/es/lavadora-x"),
            CatalogRow::new("B2").with_model("Horno Y"),
            CatalogRow::new("C3")
                .with_model("Nevera Z")
                .with_category("Frio")
                .with_url("https://shop.example.com/nevera-z"),
        ]
    );
}

#[test]
fn without_locale_every_row_is_kept() {
    let rows = parse_catalog(CATALOG, None).unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[1].model.as_deref(), Some("Washer X"));
}

#[test]
fn headers_match_case_insensitively_with_other_delimiters() {
    let text = "sku;Modelo;Categoria;Locale;Link\nD4;Secadora;Lavado;es_ES;d4\n";
    let rows = parse_catalog(text, Some("es_ES")).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].normalized_url(), "https://d4");
}

#[test]
fn missing_sku_column_is_rejected() {
    let err = parse_catalog("MODEL,URL\nX,/x\n", None).unwrap_err();
    assert!(matches!(err, CatalogError::MissingColumn("SKU")));
}

#[test]
fn locale_filter_needs_a_locale_column() {
    let err = parse_catalog("SKU,URL\nA1,/a\n", Some("es_ES")).unwrap_err();
    assert!(matches!(err, CatalogError::MissingColumn("lang")));
    assert_eq!(parse_catalog("SKU,URL\nA1,/a\n", None).unwrap().len(), 1);
}

#[test]
fn loads_catalog_from_disk() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("catalog-products.csv");
    fs::write(&path, CATALOG).unwrap();

    let rows = load_catalog(&path, Some("en_GB")).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].sku, "A1");

    let missing = load_catalog(&temp.path().join("nope.csv"), None).unwrap_err();
    assert!(matches!(missing, CatalogError::Io { .. }));
}
