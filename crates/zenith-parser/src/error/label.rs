//! Labeled source spans for diagnostic messages.

use crate::span::Span;

/// A message attached to a span of the source.
///
/// A diagnostic usually has one primary label marking the offending text,
/// plus optional secondary labels for related places, for example:
///
/// ```text
/// error[E200]: `end` name `Sqr` does not match function `square`
///   |
/// 1 | function square(x : i32) => i32
///   |          ------ function declared here
/// 3 | end Sqr
///   |     ^^^ expected `square`
/// ```
#[derive(Debug, Clone)]
pub struct Label {
    span: Span,
    message: String,
    is_primary: bool,
}

impl Label {
    /// Create a new primary label.
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: true,
        }
    }

    /// Create a new secondary label.
    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: false,
        }
    }

    /// Get the span this label applies to.
    pub fn span(&self) -> Span {
        self.span
    }

    /// Get the label message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Check if this is a primary label.
    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    /// Check if this is a secondary label.
    pub fn is_secondary(&self) -> bool {
        !self.is_primary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_label() {
        let label = Label::primary(Span::new(10..20), "expected `square`");

        assert_eq!(label.span(), Span::new(10..20));
        assert_eq!(label.message(), "expected `square`");
        assert!(label.is_primary());
        assert!(!label.is_secondary());
    }

    #[test]
    fn test_secondary_label() {
        let label = Label::secondary(Span::new(5..15), "function declared here");

        assert_eq!(label.span().start(), 5);
        assert!(label.is_secondary());
    }
}
