use std::fmt;

use serde::{Deserialize, Serialize};

/// Position of a work unit within its job, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartInfo {
    pub part: u32,
    pub total_parts: u32,
}

impl fmt::Display for PartInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {}", self.part, self.total_parts)
    }
}
