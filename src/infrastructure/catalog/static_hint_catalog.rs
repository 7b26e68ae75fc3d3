use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::application::ports::HintCatalog;

const DEFAULT_CATEGORY: &str = "other";

/// Hint catalog loaded once at startup.
///
/// File format:
/// ```json
/// {
///   "extends": { "web-recommended": ["axe", "no-vulnerable-javascript-libraries"] },
///   "categories": { "axe": "accessibility" }
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StaticHintCatalog {
    #[serde(default)]
    extends: HashMap<String, Vec<String>>,
    #[serde(default)]
    categories: HashMap<String, String>,
}

impl StaticHintCatalog {
    pub fn new(extends: HashMap<String, Vec<String>>, categories: HashMap<String, String>) -> Self {
        Self {
            extends,
            categories,
        }
    }

    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CatalogError::Read(format!("{}: {}", path.display(), e)))?;
        let catalog: Self =
            serde_json::from_str(&raw).map_err(|e| CatalogError::Parse(e.to_string()))?;

        tracing::info!(
            path = %path.display(),
            hint_sets = catalog.extends.len(),
            categories = catalog.categories.len(),
            "Hint catalog loaded"
        );
        Ok(catalog)
    }
}

impl HintCatalog for StaticHintCatalog {
    fn extends(&self, name: &str) -> Option<Vec<String>> {
        self.extends.get(name).cloned()
    }

    fn category(&self, hint: &str) -> String {
        self.categories
            .get(hint)
            .cloned()
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Read(String),
    #[error("invalid catalog: {0}")]
    Parse(String),
}
