use std::collections::BTreeMap;

use crate::application::ports::HintCatalog;
use crate::domain::{Hint, HintConfig, HintSeverity};

/// Severity given to hints that only come in through `extends`.
const EXTENDED_HINT_SEVERITY: HintSeverity = HintSeverity::Warning;

/// Flattens a configuration into `hint name -> severity`: shared hint sets
/// first, then inline hints overriding them.
pub fn normalize_hints(
    config: &HintConfig,
    catalog: &dyn HintCatalog,
) -> BTreeMap<String, HintSeverity> {
    let mut normalized = BTreeMap::new();

    for name in &config.extends {
        match catalog.extends(name) {
            Some(hints) => {
                for hint in hints {
                    normalized.insert(hint, EXTENDED_HINT_SEVERITY);
                }
            }
            None => tracing::warn!(extends = %name, "Unknown shared hint set"),
        }
    }

    for (name, setting) in &config.hints {
        normalized.insert(name.clone(), setting.severity());
    }

    normalized
}

/// Builds the pending hint slots for a new job across all configurations.
pub fn plan_hints(configs: &[HintConfig], catalog: &dyn HintCatalog) -> Vec<Hint> {
    let mut hints: Vec<Hint> = Vec::new();

    for config in configs {
        let mut partial: Vec<Hint> = Vec::new();

        for set in &config.extends {
            let Some(names) = catalog.extends(set) else {
                tracing::warn!(extends = %set, "Unknown shared hint set");
                continue;
            };
            for name in names {
                push_unique(&mut partial, &name, catalog);
            }
        }

        for (name, setting) in &config.hints {
            if setting.is_off() {
                continue;
            }
            push_unique(&mut partial, name, catalog);
        }

        for hint in partial {
            if !hints.iter().any(|h| h.name == hint.name) {
                hints.push(hint);
            }
        }
    }

    hints
}

fn push_unique(hints: &mut Vec<Hint>, name: &str, catalog: &dyn HintCatalog) {
    if !hints.iter().any(|h| h.name == name) {
        hints.push(Hint::pending(name, catalog.category(name)));
    }
}
