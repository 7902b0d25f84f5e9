use crate::url::normalize_url;

/// One product of the catalog, already filtered to the target locale.
///
/// Rows are immutable once loaded; their position in the loaded list is the
/// row identity used by the merge step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogRow {
    pub sku: String,
    pub model: Option<String>,
    pub category: Option<String>,
    pub url: Option<String>,
}

impl CatalogRow {
    pub fn new(sku: impl Into<String>) -> Self {
        Self {
            sku: sku.into(),
            ..Self::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn normalized_url(&self) -> String {
        normalize_url(self.url.as_deref())
    }
}
