//! The core diagnostic type for the Zenith error system.

use std::fmt;

use crate::{
    error::{Severity, error_code::ErrorCode, label::Label},
    span::Span,
};

/// A single error or warning with source location information.
///
/// Diagnostics carry a severity, an optional [`ErrorCode`], a primary
/// message, any number of labeled spans and an optional help line.
///
/// # Example
///
/// ```
/// # use zenith_parser::error::{Diagnostic, ErrorCode};
/// # use zenith_parser::Span;
/// let diag = Diagnostic::error("expected newline, found `+`")
///     .with_code(ErrorCode::E100)
///     .with_label(Span::new(14..15), "unexpected token")
///     .with_help("statements end at the end of the line");
///
/// assert_eq!(diag.to_string(), "error[E100]: expected newline, found `+`");
/// ```
#[derive(Debug, Clone)]
pub struct Diagnostic {
    severity: Severity,
    code: Option<ErrorCode>,
    message: String,
    labels: Vec<Label>,
    help: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Create a diagnostic with the given severity.
    pub fn with_severity(severity: Severity, message: impl Into<String>) -> Self {
        Self::new(severity, message)
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Span of the first primary label, if any.
    pub fn primary_span(&self) -> Option<Span> {
        self.labels
            .iter()
            .find(|label| label.is_primary())
            .map(Label::span)
    }

    /// Set the error code.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Add a primary label to this diagnostic.
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::primary(span, message));
        self
    }

    /// Add a secondary label to this diagnostic.
    pub fn with_secondary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::secondary(span, message));
        self
    }

    /// Set the help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            help: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format: "error[E001]: message" or "error: message"
        write!(f, "{}", self.severity)?;
        if let Some(code) = self.code {
            write!(f, "[{code}]")?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_new() {
        let diag = Diagnostic::error("test error");

        assert!(diag.severity().is_error());
        assert_eq!(diag.message(), "test error");
        assert!(diag.code().is_none());
        assert!(diag.labels().is_empty());
        assert!(diag.help().is_none());
        assert!(diag.primary_span().is_none());
    }

    #[test]
    fn test_diagnostic_primary_span_skips_secondary() {
        let diag = Diagnostic::error("`end` name mismatch")
            .with_secondary_label(Span::new(9..15), "function declared here")
            .with_label(Span::new(40..43), "expected `square`");

        assert_eq!(diag.labels().len(), 2);
        assert_eq!(diag.primary_span(), Some(Span::new(40..43)));
    }

    #[test]
    fn test_diagnostic_display_with_code() {
        let diag = Diagnostic::error("unexpected character `$`").with_code(ErrorCode::E001);

        assert_eq!(diag.to_string(), "error[E001]: unexpected character `$`");
    }

    #[test]
    fn test_diagnostic_display_without_code() {
        let diag = Diagnostic::with_severity(Severity::Warning, "duplicate definition");

        assert_eq!(diag.to_string(), "warning: duplicate definition");
    }

    #[test]
    fn test_diagnostic_with_help() {
        let diag = Diagnostic::warning("duplicate definition `square`")
            .with_help("rename one of the definitions");

        assert_eq!(diag.help(), Some("rename one of the definitions"));
    }
}
