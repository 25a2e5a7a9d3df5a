//! Phase-boundary errors of the analyzer.

use dmdl_core::Diagnostic;
use miette::Diagnostic as MietteDiagnostic;
use std::fmt;
use thiserror::Error;

/// Result type for semantic analysis.
pub type SemanticResult<T> = Result<T, SemanticError>;

/// Analysis phase that stopped with errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Registration,
    SymbolResolution,
    AttributeResolution,
    AttributeVerification,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Registration => "model registration",
            Self::SymbolResolution => "symbol resolution",
            Self::AttributeResolution => "attribute resolution",
            Self::AttributeVerification => "attribute verification",
        };
        f.write_str(text)
    }
}

/// Analysis stopped at a phase boundary.
#[derive(Debug, Clone, Error, MietteDiagnostic)]
pub enum SemanticError {
    #[error("DMDL analysis was stopped by {error_count} error(s) during {phase}")]
    #[diagnostic(code(dmdl::analysis_failed))]
    Stopped {
        phase: Phase,
        error_count: usize,
        /// Every diagnostic collected so far, warnings included.
        #[related]
        diagnostics: Vec<Diagnostic>,
    },
}

impl SemanticError {
    pub fn phase(&self) -> Phase {
        match self {
            Self::Stopped { phase, .. } => *phase,
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Self::Stopped { diagnostics, .. } => diagnostics,
        }
    }

    /// Returns an iterator over error-severity diagnostics.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics().iter().filter(|d| d.is_error())
    }
}
