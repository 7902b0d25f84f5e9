/// Canonicalize a raw catalog URL cell into an absolute `https://` URL.
///
/// - absent or blank cells become `""`
/// - values already starting with `http` are kept as they are
/// - anything else loses its leading slashes and gains an `https://` prefix
///
/// Normalizing an already-normalized value returns it unchanged.
pub fn normalize_url(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim) else {
        return String::new();
    };
    if raw.is_empty() {
        return String::new();
    }
    if raw.starts_with("http") {
        return raw.to_string();
    }
    let path = raw.trim_start_matches('/');
    if path.is_empty() {
        return String::new();
    }
    format!("https://{path}")
}
