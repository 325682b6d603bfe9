//! Whole-tree validation summary.

use crate::catalog::listing::DocumentFailure;
use crate::catalog::offers::ReferenceError;
use serde::Serialize;

/// Counts of valid entities per level plus everything that went wrong.
#[derive(Clone, Debug, Default, Serialize)]
pub struct CatalogReport {
    pub stores: usize,
    pub brands: usize,
    pub materials: usize,
    pub filaments: usize,
    pub variants: usize,
    pub offers: usize,
    pub failures: Vec<DocumentFailure>,
    pub unresolved: Vec<ReferenceError>,
}

impl CatalogReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.unresolved.is_empty()
    }

    /// Every problem rendered as `path: reason`, failures first.
    pub fn problems(&self) -> Vec<String> {
        self.failures
            .iter()
            .map(ToString::to_string)
            .chain(self.unresolved.iter().map(ToString::to_string))
            .collect()
    }
}
