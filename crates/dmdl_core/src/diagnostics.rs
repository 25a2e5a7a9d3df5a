//! Diagnostic reporting for the DMDL analyzer.
//!
//! Diagnostics are accumulated rather than raised: a phase keeps going after
//! a problem so a single run reports as many independent issues as possible,
//! and the caller decides at phase boundaries whether to stop.

use crate::span::Span;
use std::fmt;

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiagnosticSeverity {
    /// An error that stops analysis at the next phase boundary.
    Error,
    /// A warning that doesn't stop analysis.
    Warning,
    /// An informational message.
    Info,
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        };
        f.write_str(text)
    }
}

/// A label attached to a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Label {
    /// The span this label points to.
    pub span: Span,
    /// The label message.
    pub message: String,
}

impl Label {
    /// Creates a new label.
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}

/// A diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostic {
    /// Severity level.
    pub severity: DiagnosticSeverity,
    /// Error code, one of [`codes`].
    pub code: String,
    /// Short title.
    pub title: String,
    /// Detailed message.
    pub message: Option<String>,
    /// Labels pointing to source locations.
    pub labels: Vec<Label>,
}

impl Diagnostic {
    /// Creates a new error diagnostic.
    pub fn error(code: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            code: code.into(),
            title: title.into(),
            message: None,
            labels: Vec::new(),
        }
    }

    /// Creates a new warning diagnostic.
    pub fn warning(code: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            code: code.into(),
            title: title.into(),
            message: None,
            labels: Vec::new(),
        }
    }

    /// Adds a message to the diagnostic.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Adds a label at a span.
    #[must_use]
    pub fn with_span(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::new(span, message));
        self
    }

    /// Returns the primary span, if any.
    pub fn primary_span(&self) -> Option<Span> {
        self.labels.first().map(|l| l.span)
    }

    /// Returns true if this diagnostic has error severity.
    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.title)?;
        if let Some(label) = self.labels.first() {
            write!(f, " ({}: {})", label.span, label.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostic {}

impl miette::Diagnostic for Diagnostic {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(&self.code))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(match self.severity {
            DiagnosticSeverity::Error => miette::Severity::Error,
            DiagnosticSeverity::Warning => miette::Severity::Warning,
            DiagnosticSeverity::Info => miette::Severity::Advice,
        })
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.message
            .as_ref()
            .map(|message| Box::new(message) as Box<dyn fmt::Display + 'a>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = miette::LabeledSpan> + '_>> {
        if self.labels.is_empty() {
            return None;
        }
        Some(Box::new(self.labels.iter().map(|label| {
            miette::LabeledSpan::new_with_span(Some(label.message.clone()), label.span)
        })))
    }
}

/// A collection of diagnostics.
#[derive(Debug, Default, Clone)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    /// Creates a new empty diagnostic bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a diagnostic.
    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Adds an error diagnostic.
    pub fn error(
        &mut self,
        code: impl Into<String>,
        title: impl Into<String>,
        span: Span,
        message: impl Into<String>,
    ) {
        self.add(Diagnostic::error(code, title).with_span(span, message));
    }

    /// Adds a warning diagnostic.
    pub fn warning(
        &mut self,
        code: impl Into<String>,
        title: impl Into<String>,
        span: Span,
        message: impl Into<String>,
    ) {
        self.add(Diagnostic::warning(code, title).with_span(span, message));
    }

    /// Moves every diagnostic of `other` into this bag, keeping their order.
    pub fn append(&mut self, other: &mut DiagnosticBag) {
        self.diagnostics.append(&mut other.diagnostics);
    }

    /// Returns true if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Returns the number of errors.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    /// Returns an iterator over all diagnostics.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Returns an iterator over errors.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    /// Returns an iterator over the diagnostics carrying `code`.
    pub fn with_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.diagnostics.iter().filter(move |d| d.code == code)
    }

    /// Returns true if there are no diagnostics.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Returns the number of diagnostics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Returns a copy of every diagnostic collected so far.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Diagnostic> {
        self.diagnostics.clone()
    }
}

/// Diagnostic codes raised by the analyzer.
pub mod codes {
    // Registration and dependency graph
    pub const DUPLICATE_MODEL: &str = "E0101";
    pub const CYCLIC_DEPENDENCY: &str = "E0102";
    pub const UNKNOWN_MODEL: &str = "E0103";

    // Record and projection properties
    pub const DUPLICATE_PROPERTY: &str = "E0201";
    pub const INCONSISTENT_TYPE: &str = "E0202";
    pub const UNKNOWN_TYPE: &str = "E0203";
    pub const UNKNOWN_PROPERTY: &str = "E0204";

    // Property references
    pub const INVALID_REFERENCE_TYPE: &str = "E0301";
    pub const MISSING_REFERENCE_TYPE: &str = "E0302";
    pub const INCONSISTENT_REFERENCE_TYPE: &str = "E0303";
    pub const IRRELEVANT_SELECTOR_TARGET: &str = "E0304";
    pub const MISSING_SELECTOR_TARGET: &str = "E0305";
    pub const INVALID_SELECTOR_TARGET: &str = "E0306";
    pub const STUB_SELECTOR_TARGET: &str = "E0307";
    pub const MISSING_REFERENCE_ELEMENT: &str = "E0308";
    pub const INVALID_REFERENCE_ELEMENT: &str = "E0309";
    pub const INVALID_MAP_KEY: &str = "E0310";
    pub const DUPLICATE_MAP_KEY: &str = "E0311";
    pub const INVALID_REFERENCE_EXPRESSION: &str = "E0312";
    pub const AMBIGUOUS_REFERENCE_PARENT: &str = "E0313";
    pub const MISSING_REFERENCE_BODY: &str = "E0314";

    // Join and summarize
    pub const TOO_MANY_JOIN_TERMS: &str = "E0401";
    pub const DUPLICATE_MAPPING_TARGET: &str = "E0402";
    pub const DUPLICATE_JOIN_GROUPING_PROPERTY: &str = "E0403";
    pub const INCONSISTENT_GROUPING_COUNT: &str = "E0404";
    pub const INCONSISTENT_GROUPING_TYPE: &str = "E0405";
    pub const UNKNOWN_AGGREGATE_FUNCTION: &str = "E0406";
    pub const INCONSISTENT_AGGREGATE_FUNCTION: &str = "E0407";
    pub const TOO_MANY_SUMMARIZE_TERMS: &str = "E0408";

    // Attributes
    pub const UNKNOWN_ATTRIBUTE: &str = "E0501";
    pub const INVALID_ATTRIBUTE: &str = "E0502";
}
