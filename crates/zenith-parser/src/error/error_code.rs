//! Error codes for the Zenith diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Lexer errors
//! - `E1xx` - Parser errors
//! - `E2xx` - Validation errors

use std::fmt;

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Lexer Errors (E0xx)
    // =========================================================================
    /// Unexpected character.
    ///
    /// A character was found that does not start any Zenith token.
    E001,

    /// Stray backslash.
    ///
    /// A `\` is only allowed as a line continuation, directly followed by
    /// optional whitespace and a newline.
    E002,

    // =========================================================================
    // Parser Errors (E1xx)
    // =========================================================================
    /// Unexpected token.
    E100,

    /// Unexpected end of input.
    ///
    /// The file ended in the middle of a definition, usually a missing `end`.
    E101,

    /// Nesting limit exceeded.
    ///
    /// An expression or a chain of nested definitions is deeper than the
    /// parser accepts.
    E102,

    // =========================================================================
    // Validation Errors (E2xx)
    // =========================================================================
    /// Mismatched `end` name.
    ///
    /// The identifier after `end` must repeat the name of the definition it closes.
    E200,

    /// Duplicate definition.
    ///
    /// Two definitions in the same scope share a name.
    E201,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "unexpected character",
            ErrorCode::E002 => "stray backslash",
            ErrorCode::E100 => "unexpected token",
            ErrorCode::E101 => "unexpected end of input",
            ErrorCode::E102 => "nesting limit exceeded",
            ErrorCode::E200 => "mismatched end name",
            ErrorCode::E201 => "duplicate definition",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::E001.to_string(), "E001");
        assert_eq!(ErrorCode::E101.to_string(), "E101");
        assert_eq!(ErrorCode::E201.to_string(), "E201");
    }

    #[test]
    fn test_error_code_description() {
        assert_eq!(ErrorCode::E002.description(), "stray backslash");
        assert_eq!(ErrorCode::E200.description(), "mismatched end name");
        assert_eq!(ErrorCode::E102.description(), "nesting limit exceeded");
    }
}
