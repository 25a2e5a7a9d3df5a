//! Analyzer configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What to do with a joined model that has more terms than allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ExcessTermPolicy {
    /// Report the excess and keep resolving every term.
    #[default]
    Report,
    /// Report the excess and skip the join expression entirely.
    Reject,
}

/// Options for [`DmdlAnalyzer`](crate::DmdlAnalyzer).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AnalyzerOptions {
    /// Maximum number of terms of a joined model.
    pub max_join_terms: usize,
    pub excess_join_terms: ExcessTermPolicy,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            max_join_terms: 2,
            excess_join_terms: ExcessTermPolicy::Report,
        }
    }
}

impl AnalyzerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_join_terms(mut self, max: usize) -> Self {
        self.max_join_terms = max;
        self
    }

    #[must_use]
    pub fn with_excess_join_terms(mut self, policy: ExcessTermPolicy) -> Self {
        self.excess_join_terms = policy;
        self
    }
}
