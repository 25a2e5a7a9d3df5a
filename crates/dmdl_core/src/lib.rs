//! Core utilities for the DMDL schema compiler.
//!
//! This crate provides foundational types shared by the syntax and
//! semantic layers:
//! - `span`: Source location tracking
//! - `diagnostics`: Error reporting

pub mod diagnostics;
pub mod span;

pub use diagnostics::{codes, Diagnostic, DiagnosticBag, DiagnosticSeverity, Label};
pub use span::Span;
