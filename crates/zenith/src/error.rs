//! Error types for Zenith operations.
//!
//! This module provides the main error type [`ZenithError`] which wraps
//! the error conditions that can occur while loading and parsing sources.

use std::io;

use thiserror::Error;

use zenith_parser::{LanguageError, error::ParseError};

/// The main error type for Zenith operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant keeps the source text next to the diagnostics so that
/// reporters can show labelled snippets.
#[derive(Debug, Error)]
pub enum ZenithError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("Language error: {0}")]
    Language(#[from] LanguageError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ZenithError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
