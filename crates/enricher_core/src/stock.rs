//! Stock feed parsing, column inference and the SKU → quantity index.
//!
//! Feeds arrive with varying shapes (JSON lists, `{"value": [...]}`
//! envelopes, JSON encoded as a JSON string, delimited text) and varying
//! header names. Everything here is tolerant: a feed that cannot be
//! understood produces an empty index rather than an error at the caller.

use std::collections::HashMap;

use serde_json::{Map, Value};
use thiserror::Error;

/// Delimiters considered when sniffing tabular text, in tie-break order.
const DELIMITERS: [u8; 4] = [b';', b',', b'\t', b'|'];
/// JSON strings wrapping JSON are unwrapped at most this many times.
const MAX_JSON_NESTING: usize = 2;

#[derive(Debug, Error)]
pub enum StockParseError {
    #[error("stock feed is empty")]
    Empty,
    #[error("stock feed JSON carries no record list")]
    NoRecords,
    #[error("stock feed is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("stock feed is not valid delimited text: {0}")]
    Csv(#[from] csv::Error),
}

/// Feed contents as header names plus stringified cells.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StockTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl StockTable {
    fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Parse raw feed text into a table. JSON is tried first, then delimited text.
pub fn parse_stock_feed(text: &str) -> Result<StockTable, StockParseError> {
    let text = text.trim_start_matches('\u{feff}').trim();
    if text.is_empty() {
        return Err(StockParseError::Empty);
    }
    if text.starts_with(['[', '{']) {
        let value: Value = serde_json::from_str(text)?;
        return table_from_json(value, 0);
    }
    // A leading quote is either JSON encoded as a JSON string or a quoted header cell.
    if text.starts_with('"') {
        if let Ok(value) = serde_json::from_str::<Value>(text) {
            return table_from_json(value, 0);
        }
    }
    table_from_delimited(text)
}

fn table_from_json(value: Value, depth: usize) -> Result<StockTable, StockParseError> {
    match value {
        Value::String(inner) if depth < MAX_JSON_NESTING => {
            let value: Value = serde_json::from_str(inner.trim())?;
            table_from_json(value, depth + 1)
        }
        Value::Object(map) => match unwrap_envelope(map) {
            Some(inner) => table_from_json(inner, depth),
            None => Err(StockParseError::NoRecords),
        },
        Value::Array(items) => table_from_items(items),
        _ => Err(StockParseError::NoRecords),
    }
}

/// `{"value": ...}` wins, holding either the record list or that list encoded
/// as a JSON string. Otherwise an object with exactly one list field is unwrapped.
fn unwrap_envelope(mut map: Map<String, Value>) -> Option<Value> {
    if let Some(value @ (Value::Array(_) | Value::String(_))) = map.remove("value") {
        return Some(value);
    }
    let mut lists = map.into_iter().filter(|(_, v)| v.is_array()).map(|(_, v)| v);
    match (lists.next(), lists.next()) {
        (Some(items), None) => Some(items),
        _ => None,
    }
}

fn table_from_items(items: Vec<Value>) -> Result<StockTable, StockParseError> {
    if items.is_empty() {
        return Ok(StockTable::default());
    }

    if items.iter().all(Value::is_object) {
        let mut headers: Vec<String> = Vec::new();
        for item in &items {
            if let Value::Object(record) = item {
                for key in record.keys() {
                    if !headers.contains(key) {
                        headers.push(key.clone());
                    }
                }
            }
        }
        let rows = items
            .iter()
            .filter_map(Value::as_object)
            .map(|record| {
                headers
                    .iter()
                    .map(|h| record.get(h).map(cell_text).unwrap_or_default())
                    .collect()
            })
            .collect();
        return Ok(StockTable { headers, rows });
    }

    if items.iter().all(Value::is_array) {
        let mut rows = items.iter().filter_map(Value::as_array).map(|cells| {
            cells.iter().map(cell_text).collect::<Vec<_>>()
        });
        let headers = rows.next().unwrap_or_default();
        return Ok(StockTable {
            headers,
            rows: rows.collect(),
        });
    }

    Err(StockParseError::NoRecords)
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn table_from_delimited(text: &str) -> Result<StockTable, StockParseError> {
    let header_line = text.lines().next().unwrap_or("");
    let delimiter = sniff_delimiter(header_line);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok(StockTable { headers, rows })
}

/// Most frequent of `;`, `,`, tab and `|` in `header_line`; `,` when none occurs.
pub fn sniff_delimiter(header_line: &str) -> u8 {
    DELIMITERS
        .iter()
        .copied()
        .map(|d| (d, header_line.bytes().filter(|b| *b == d).count()))
        .filter(|(_, count)| *count > 0)
        // max_by_key keeps the last maximum; reverse so earlier delimiters win ties.
        .rev()
        .max_by_key(|(_, count)| *count)
        .map(|(d, _)| d)
        .unwrap_or(b',')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockField {
    ProductCode,
    Quantity,
}

/// Substring rule matched against canonical (lower-cased, separator-free) headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRule {
    pub pattern: &'static str,
    pub field: StockField,
}

const fn rule(pattern: &'static str, field: StockField) -> ColumnRule {
    ColumnRule { pattern, field }
}

/// Evaluated in order; product-code rules claim a column before quantity rules run.
pub const COLUMN_RULES: &[ColumnRule] = &[
    rule("codprod", StockField::ProductCode),
    rule("codigoproducto", StockField::ProductCode),
    rule("productcode", StockField::ProductCode),
    rule("codigo", StockField::ProductCode),
    rule("sku", StockField::ProductCode),
    rule("cod", StockField::ProductCode),
    rule("stockcontable", StockField::Quantity),
    rule("stock", StockField::Quantity),
    rule("cantidad", StockField::Quantity),
    rule("quantity", StockField::Quantity),
    rule("qty", StockField::Quantity),
    rule("existencia", StockField::Quantity),
    rule("unidades", StockField::Quantity),
];

/// Column positions chosen for the product code and the quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockColumns {
    pub code: usize,
    pub quantity: usize,
    /// True when at least one column was picked by position, not by name.
    pub positional: bool,
}

pub fn canonical_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '_' | '-' | '.'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Pick the code and quantity columns.
///
/// Names are matched through [`COLUMN_RULES`]. A field no rule matched takes
/// the first column the other field did not claim, so a feed without any
/// recognizable header reads as "column 0 = code, column 1 = quantity".
/// Returns `None` when fewer than two columns exist.
pub fn infer_columns(headers: &[String]) -> Option<StockColumns> {
    if headers.len() < 2 {
        return None;
    }
    let canonical: Vec<String> = headers.iter().map(|h| canonical_header(h)).collect();

    let code = match_field(&canonical, StockField::ProductCode, None);
    let quantity = match_field(&canonical, StockField::Quantity, code);
    let positional = code.is_none() || quantity.is_none();

    let code = code.unwrap_or_else(|| first_unclaimed(headers.len(), quantity));
    let quantity = quantity.unwrap_or_else(|| first_unclaimed(headers.len(), Some(code)));

    Some(StockColumns {
        code,
        quantity,
        positional,
    })
}

fn match_field(canonical: &[String], field: StockField, claimed: Option<usize>) -> Option<usize> {
    COLUMN_RULES
        .iter()
        .filter(|rule| rule.field == field)
        .find_map(|rule| {
            canonical
                .iter()
                .enumerate()
                .find(|(idx, header)| Some(*idx) != claimed && header.contains(rule.pattern))
                .map(|(idx, _)| idx)
        })
}

fn first_unclaimed(len: usize, claimed: Option<usize>) -> usize {
    (0..len).find(|idx| Some(*idx) != claimed).unwrap_or(0)
}

/// Coerce a raw quantity cell to a non-negative integer.
///
/// Blank, non-numeric and negative values become 0; decimals (either `.` or
/// `,` as separator) are truncated.
pub fn parse_quantity(raw: &str) -> u64 {
    let raw = raw.trim();
    if raw.is_empty() {
        return 0;
    }
    if let Ok(value) = raw.parse::<i64>() {
        return u64::try_from(value).unwrap_or(0);
    }
    let decimal = if raw.contains(',') && !raw.contains('.') {
        raw.replace(',', ".")
    } else {
        raw.to_string()
    };
    match decimal.parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => value.trunc() as u64,
        _ => 0,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockRecord {
    pub product_code: String,
    pub quantity: u64,
}

/// Normalized records of `table`; rows with a blank product code are skipped.
pub fn records_from_table(table: &StockTable, columns: StockColumns) -> Vec<StockRecord> {
    (0..table.rows.len())
        .filter_map(|row| {
            let product_code = table.cell(row, columns.code).trim();
            if product_code.is_empty() {
                return None;
            }
            Some(StockRecord {
                product_code: product_code.to_string(),
                quantity: parse_quantity(table.cell(row, columns.quantity)),
            })
        })
        .collect()
}

/// A feed turned into an index, with the column choice kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedFeed {
    pub index: StockIndex,
    pub headers: Vec<String>,
    /// `None` when the feed has fewer than two columns; the index is then empty.
    pub columns: Option<StockColumns>,
}

/// Parse `text`, infer its code and quantity columns and build the index.
pub fn index_stock_feed(text: &str) -> Result<IndexedFeed, StockParseError> {
    let table = parse_stock_feed(text)?;
    let columns = infer_columns(&table.headers);
    let index = match columns {
        Some(columns) => StockIndex::from_records(records_from_table(&table, columns)),
        None => StockIndex::empty(),
    };
    Ok(IndexedFeed {
        index,
        headers: table.headers,
        columns,
    })
}

/// Read-only SKU → quantity lookup built once per run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockIndex {
    quantities: HashMap<String, u64>,
}

impl StockIndex {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Later records overwrite earlier ones with the same product code.
    pub fn from_records(records: impl IntoIterator<Item = StockRecord>) -> Self {
        let mut quantities = HashMap::new();
        for record in records {
            quantities.insert(record.product_code.trim().to_string(), record.quantity);
        }
        Self { quantities }
    }

    /// Quantity for `sku`, matched after trimming; unknown SKUs have 0.
    pub fn quantity_for(&self, sku: &str) -> u64 {
        self.quantities.get(sku.trim()).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.quantities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }
}
