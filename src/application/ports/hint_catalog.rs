/// Shared hint-set index and hint categories.
pub trait HintCatalog: Send + Sync {
    /// Non-off hint names declared by a shared hint set.
    fn extends(&self, name: &str) -> Option<Vec<String>>;

    fn category(&self, hint: &str) -> String;
}
