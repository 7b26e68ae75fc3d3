mod static_hint_catalog;

pub use static_hint_catalog::{CatalogError, StaticHintCatalog};
